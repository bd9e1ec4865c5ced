//! Sparse format identity and the shared coordinate-export contract
//!
//! Every layout in this crate can describe itself as a list of
//! `(row, col, value)` triples. That coordinate form is the interchange
//! format: anything that implements [`SparseMatrix`] can be handed to the
//! DIA constructor, and the DIA type hands its own entries to the
//! compressed layouts the same way.

use crate::coo::CooMatrix;

/// Sparse matrix storage format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SparseFormat {
    /// Coordinate format (COO)
    ///
    /// Stores explicit (row, col, value) triplets.
    /// Best for: construction and format conversion
    Coo,

    /// Compressed Sparse Row (CSR)
    ///
    /// Best for: row slicing, SpMV, sparse × sparse products
    Csr,

    /// Compressed Sparse Column (CSC)
    ///
    /// Best for: column slicing, transposed operations
    Csc,

    /// Diagonal format (DIA)
    ///
    /// One dense strip per stored diagonal offset.
    /// Best for: banded matrices with few diagonals
    Dia,
}

impl SparseFormat {
    /// Returns the format name as a string
    pub fn name(&self) -> &'static str {
        match self {
            SparseFormat::Coo => "COO",
            SparseFormat::Csr => "CSR",
            SparseFormat::Csc => "CSC",
            SparseFormat::Dia => "DIA",
        }
    }
}

impl std::fmt::Display for SparseFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Common interface of all sparse layouts.
///
/// `to_coo` must export exactly the structurally stored entries, so that
/// any other layout can be rebuilt from it without loss.
pub trait SparseMatrix<T> {
    /// Returns the sparse format type
    fn format(&self) -> SparseFormat;

    /// Returns the shape as `(nrows, ncols)`
    fn shape(&self) -> (usize, usize);

    /// Returns the number of structural nonzeros.
    ///
    /// For the compressed and coordinate layouts this is the number of
    /// stored entries. DIA reports the full length of every stored
    /// diagonal, which overstates when a strip is shorter than its
    /// diagonal; [`crate::dia::DiaMatrix::stored_nnz`] gives the count
    /// [`SparseMatrix::to_coo`] actually exports.
    fn nnz(&self) -> usize;

    /// Exports the stored entries in coordinate form
    fn to_coo(&self) -> CooMatrix<T>;
}

/// Returns true only if `matrix` is stored in DIA format.
///
/// Being *some* sparse matrix is not enough: conversion code uses this to
/// decide whether the no-op `to_dia` path applies.
pub fn is_dia<T>(matrix: &dyn SparseMatrix<T>) -> bool {
    matrix.format() == SparseFormat::Dia
}
