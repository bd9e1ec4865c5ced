//! CSC (Compressed Sparse Column) format for 2D matrices
//!
//! Column-compressed counterpart of [`crate::csr`]. Only construction,
//! coordinate interchange and densification live here; DIA matrices reach
//! this layout through [`crate::dia::DiaMatrix::to_csc`].
//!
//! # Format
//!
//! - `col_ptr`: length ncols+1, col_ptr\[j\] points to start of column j
//! - `row_indices`: row index for each non-zero
//! - `values`: the non-zero values

use crate::coo::CooMatrix;
use crate::csr::{CsrError, CsrMatrix};
use crate::format::{SparseFormat, SparseMatrix};
use scirs2_core::ndarray_ext::Array2;
use scirs2_core::numeric::Float;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CscError {
    #[error("Invalid column pointers: length {len} for {ncols} columns (expected {expected})")]
    InvalidColPtr {
        len: usize,
        ncols: usize,
        expected: usize,
    },

    #[error("Column pointer not sorted at index {idx}: {curr} > {next}")]
    ColPtrNotSorted {
        idx: usize,
        curr: usize,
        next: usize,
    },

    #[error("Length mismatch: {row_indices} row_indices but {values} values")]
    LengthMismatch { row_indices: usize, values: usize },

    #[error("Row index out of bounds: {row_idx} >= {nrows}")]
    RowIndexOutOfBounds { row_idx: usize, nrows: usize },
}

/// CSC (Compressed Sparse Column) matrix
#[derive(Debug, Clone, PartialEq)]
pub struct CscMatrix<T> {
    /// Column pointers, length ncols + 1
    col_ptr: Vec<usize>,

    /// Row indices for each non-zero element
    row_indices: Vec<usize>,

    /// Values of non-zero elements
    values: Vec<T>,

    /// Shape: (nrows, ncols)
    shape: (usize, usize),
}

impl<T: Clone> CscMatrix<T> {
    /// Create a new CSC matrix
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - col_ptr length is incorrect
    /// - row_indices and values have different lengths
    /// - col_ptr is not monotonically increasing
    /// - any row index is out of bounds
    pub fn new(
        col_ptr: Vec<usize>,
        row_indices: Vec<usize>,
        values: Vec<T>,
        shape: (usize, usize),
    ) -> Result<Self, CscError> {
        let (nrows, ncols) = shape;

        if col_ptr.len() != ncols + 1 {
            return Err(CscError::InvalidColPtr {
                len: col_ptr.len(),
                ncols,
                expected: ncols + 1,
            });
        }

        if row_indices.len() != values.len() {
            return Err(CscError::LengthMismatch {
                row_indices: row_indices.len(),
                values: values.len(),
            });
        }

        for j in 0..ncols {
            if col_ptr[j] > col_ptr[j + 1] {
                return Err(CscError::ColPtrNotSorted {
                    idx: j,
                    curr: col_ptr[j],
                    next: col_ptr[j + 1],
                });
            }
        }

        let nnz = row_indices.len();
        if col_ptr[0] != 0 || col_ptr[ncols] != nnz {
            return Err(CscError::InvalidColPtr {
                len: col_ptr[ncols],
                ncols,
                expected: nnz,
            });
        }

        if let Some(&row_idx) = row_indices.iter().find(|&&row| row >= nrows) {
            return Err(CscError::RowIndexOutOfBounds { row_idx, nrows });
        }

        Ok(Self {
            col_ptr,
            row_indices,
            values,
            shape,
        })
    }

    /// Number of non-zero elements
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Shape as (nrows, ncols)
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Column pointers
    pub fn col_ptr(&self) -> &[usize] {
        &self.col_ptr
    }

    /// Row indices
    pub fn row_indices(&self) -> &[usize] {
        &self.row_indices
    }

    /// Values
    pub fn values(&self) -> &[T] {
        &self.values
    }
}

impl<T: Float> CscMatrix<T> {
    /// Convert from COO format
    ///
    /// Duplicate coordinates are summed; row indices come out sorted within
    /// each column.
    pub fn from_coo(coo: &CooMatrix<T>) -> Result<Self, CscError> {
        let (nrows, ncols) = coo.shape();

        let mut deduped = coo.clone();
        deduped.deduplicate();

        let mut triplets: Vec<(usize, usize, T)> =
            deduped.iter().map(|(row, col, &val)| (row, col, val)).collect();
        triplets.sort_by_key(|&(row, col, _)| (col, row));

        let mut col_ptr = vec![0; ncols + 1];
        for &(_, col, _) in &triplets {
            col_ptr[col + 1] += 1;
        }
        for j in 0..ncols {
            col_ptr[j + 1] += col_ptr[j];
        }

        let row_indices = triplets.iter().map(|&(row, _, _)| row).collect();
        let values = triplets.iter().map(|&(_, _, val)| val).collect();

        Self::new(col_ptr, row_indices, values, (nrows, ncols))
    }

    /// Convert to COO format (column-major order)
    pub fn to_coo(&self) -> CooMatrix<T> {
        let mut cols = Vec::with_capacity(self.nnz());
        for col in 0..self.shape.1 {
            cols.extend(std::iter::repeat(col).take(self.col_ptr[col + 1] - self.col_ptr[col]));
        }
        CooMatrix::from_parts_unchecked(
            self.row_indices.clone(),
            cols,
            self.values.clone(),
            self.shape,
        )
    }

    /// Convert to CSR format
    pub fn to_csr(&self) -> Result<CsrMatrix<T>, CsrError> {
        CsrMatrix::from_coo(&self.to_coo())
    }

    /// Convert to dense matrix
    pub fn to_dense(&self) -> Array2<T> {
        let mut dense = Array2::zeros(self.shape);
        for col in 0..self.shape.1 {
            for idx in self.col_ptr[col]..self.col_ptr[col + 1] {
                let row = self.row_indices[idx];
                dense[[row, col]] = dense[[row, col]] + self.values[idx];
            }
        }
        dense
    }
}

impl<T: Float> SparseMatrix<T> for CscMatrix<T> {
    fn format(&self) -> SparseFormat {
        SparseFormat::Csc
    }

    fn shape(&self) -> (usize, usize) {
        self.shape
    }

    fn nnz(&self) -> usize {
        self.values.len()
    }

    fn to_coo(&self) -> CooMatrix<T> {
        CscMatrix::to_coo(self)
    }
}
