//! DIA (Diagonal) Sparse Matrix Format
//!
//! The Diagonal format stores sparse matrices as a set of diagonals.
//! This format is highly efficient for banded matrices, which are common in
//! PDE solvers, finite difference/element methods, and image processing.
//!
//! # Structure
//!
//! - `data`: 2D array of diagonal values `(num_diagonals × strip_len)`
//! - `offsets`: diagonal offsets, `col - row` (0 = main, +k = kth super, -k = kth sub)
//!
//! `data[[i, c]]` holds entry `(c - offsets[i], c)`. It is live only when
//! that row lies in `0..nrows` and `c < ncols`; every other position of the
//! strip is padding and structurally absent. The strip width is chosen by
//! whoever built the matrix and may be shorter than `ncols`, in which case
//! columns past the strip are simply not stored.
//!
//! Offsets must be unique but need not be sorted or contiguous.
//!
//! # Buffer sharing
//!
//! Both buffers are reference counted. [`CopyMode::Share`] constructions and
//! `Clone` alias the source buffers, [`CopyMode::Duplicate`] and
//! [`DiaMatrix::duplicate`] make independent copies. No method mutates a
//! buffer in place; values change only through whole-buffer replacement
//! ([`DiaMatrix::with_data`], [`DiaMatrix::scale`]).
//!
//! # Performance
//!
//! - **SpMV**: O(num_diagonals × strip_len)
//! - **Memory**: O(num_diagonals × strip_len)
//! - **Best for**: Matrices with few diagonals (bandwidth << n)
//!
//! # Example
//!
//! ```
//! use dia_sparse::dia::DiaMatrix;
//! use scirs2_core::ndarray_ext::array;
//!
//! // [1 0 3 0]
//! // [1 2 0 4]
//! // [0 2 3 0]
//! // [0 0 3 4]
//! let data = array![[1.0, 2.0, 3.0, 4.0], [1.0, 2.0, 3.0, 4.0], [1.0, 2.0, 3.0, 4.0]];
//! let dia = DiaMatrix::new(data, vec![0, -1, 2], (4, 4)).unwrap();
//!
//! assert_eq!(dia.nnz(), 9);
//! let y = dia.matvec(&array![1.0, 1.0, 1.0, 1.0].view()).unwrap();
//! assert_eq!(y, array![4.0, 7.0, 5.0, 7.0]);
//! ```

use crate::coo::CooMatrix;
use crate::csc::CscMatrix;
use crate::csr::CsrMatrix;
use crate::error::{ConversionError, SparseResult};
use crate::format::{SparseFormat, SparseMatrix};
use scirs2_core::ndarray_ext::{
    Array1, Array2, ArrayD, ArrayView1, ArrayView2, ArrayViewD, Axis, Ix2,
};
use scirs2_core::numeric::Float;
use std::collections::HashSet;
use std::ops::{Mul, Neg};
use std::sync::Arc;
use thiserror::Error;

/// Structural invariant violations detected after construction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructureError {
    #[error("offsets array must have rank 1, got rank {ndim}")]
    OffsetsRank { ndim: usize },

    #[error("data array must have rank 2, got rank {ndim}")]
    DataRank { ndim: usize },

    #[error("number of diagonals ({data_rows}) does not match the number of offsets ({offsets})")]
    DiagonalCountMismatch { data_rows: usize, offsets: usize },

    #[error("offset array contains duplicate value {offset}")]
    DuplicateOffset { offset: isize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiaError {
    #[error("Invalid shape: {reason}")]
    InvalidShape { reason: String },

    #[error("Expected a shape argument for (data, offsets) construction")]
    MissingShape,

    #[error("Unrecognized form for DIA construction: {reason}")]
    UnrecognizedInput { reason: String },

    #[error("Malformed structure: {0}")]
    MalformedStructure(#[from] StructureError),

    #[error("Dimension mismatch: matrix of shape {lhs:?} cannot multiply operand of shape {rhs:?}")]
    DimensionMismatch { lhs: (usize, usize), rhs: Vec<usize> },
}

/// Whether a construction aliases the source buffers or copies them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CopyMode {
    /// New matrix and source share `data` and `offsets`
    #[default]
    Share,
    /// New matrix owns independent copies of `data` and `offsets`
    Duplicate,
}

/// Every input a DIA matrix can be built from
pub enum DiaSource<'a, T> {
    /// Empty matrix of the given shape; must have exactly two dimensions
    Shape(&'a [usize]),

    /// Explicit diagonals. `data` is promoted to rank 2 and `offsets` to
    /// rank 1 when given with fewer dimensions. `shape` is mandatory.
    DataOffsets {
        data: ArrayD<T>,
        offsets: ArrayD<isize>,
        shape: Option<(usize, usize)>,
    },

    /// Another DIA matrix
    SameFormat(&'a DiaMatrix<T>, CopyMode),

    /// Any sparse layout, rebuilt through its coordinate export
    Sparse(&'a dyn SparseMatrix<T>),

    /// Dense array of rank 0, 1 or 2, rebuilt through coordinate form
    Dense(ArrayViewD<'a, T>),
}

impl<T> DiaSource<'_, T> {
    fn kind(&self) -> &'static str {
        match self {
            DiaSource::Shape(_) => "shape",
            DiaSource::DataOffsets { .. } => "data_offsets",
            DiaSource::SameFormat(..) => "same_format",
            DiaSource::Sparse(_) => "sparse",
            DiaSource::Dense(_) => "dense",
        }
    }
}

/// Right-hand side of [`DiaMatrix::multiply`]
pub enum Operand<'a, T> {
    Scalar(T),
    Vector(ArrayView1<'a, T>),
    Matrix(ArrayView2<'a, T>),
    Sparse(&'a dyn SparseMatrix<T>),
}

/// Result of [`DiaMatrix::multiply`]; its form follows the operand's
#[derive(Debug, Clone, PartialEq)]
pub enum Product<T> {
    Dia(DiaMatrix<T>),
    Vector(Array1<T>),
    Matrix(Array2<T>),
    Csr(CsrMatrix<T>),
}

impl<T> Product<T> {
    pub fn into_dia(self) -> Option<DiaMatrix<T>> {
        match self {
            Product::Dia(dia) => Some(dia),
            _ => None,
        }
    }

    pub fn into_vector(self) -> Option<Array1<T>> {
        match self {
            Product::Vector(y) => Some(y),
            _ => None,
        }
    }

    pub fn into_matrix(self) -> Option<Array2<T>> {
        match self {
            Product::Matrix(y) => Some(y),
            _ => None,
        }
    }

    pub fn into_csr(self) -> Option<CsrMatrix<T>> {
        match self {
            Product::Csr(csr) => Some(csr),
            _ => None,
        }
    }
}

/// Live part of one diagonal: data columns `j_start..j_start + len` map to
/// output rows `i_start..i_start + len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LiveWindow {
    j_start: usize,
    i_start: usize,
    len: usize,
}

/// DIA (Diagonal) sparse matrix format.
///
/// `Clone` is cheap and shares both buffers; see the module docs.
#[derive(Debug, Clone, PartialEq)]
pub struct DiaMatrix<T> {
    /// Diagonal data `(num_diagonals × strip_len)`
    data: Arc<Array2<T>>,
    /// Diagonal offsets, one per data row
    offsets: Arc<[isize]>,
    /// Number of rows
    nrows: usize,
    /// Number of columns
    ncols: usize,
}

impl<T: Float> DiaMatrix<T> {
    /// Builds a DIA matrix from any supported source.
    ///
    /// # Errors
    ///
    /// - [`DiaError::InvalidShape`] if a `Shape` source is not two dimensional
    /// - [`DiaError::MissingShape`] if `DataOffsets` comes without a shape
    /// - [`DiaError::UnrecognizedInput`] if a `Dense` source has rank > 2
    /// - [`DiaError::MalformedStructure`] if the assembled fields break an invariant
    pub fn from_source(source: DiaSource<'_, T>) -> SparseResult<Self> {
        tracing::debug!(source = source.kind(), "constructing DIA matrix");
        match source {
            DiaSource::Shape(shape) => Self::from_shape(shape),
            DiaSource::DataOffsets {
                data,
                offsets,
                shape,
            } => Self::from_data_offsets(data, offsets, shape),
            DiaSource::SameFormat(other, mode) => Self::from_dia(other, mode),
            DiaSource::Sparse(other) => Self::from_sparse(other),
            DiaSource::Dense(dense) => Self::from_dense(dense),
        }
    }

    /// Creates a new DIA matrix from diagonal data and offsets.
    ///
    /// # Examples
    ///
    /// ```
    /// use dia_sparse::dia::DiaMatrix;
    /// use scirs2_core::ndarray_ext::array;
    ///
    /// let data = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
    /// let dia = DiaMatrix::new(data, vec![0, 1], (3, 3)).unwrap();
    /// assert_eq!(dia.num_diagonals(), 2);
    /// ```
    pub fn new(data: Array2<T>, offsets: Vec<isize>, shape: (usize, usize)) -> SparseResult<Self> {
        Ok(Self::assemble(Arc::new(data), Arc::from(offsets), shape)?)
    }

    /// Creates an empty matrix (no diagonals, 0×0 data strip).
    pub fn from_shape(shape: &[usize]) -> SparseResult<Self> {
        let &[nrows, ncols] = shape else {
            return Err(DiaError::InvalidShape {
                reason: format!("expected (rows, cols), got {} dimensions", shape.len()),
            }
            .into());
        };
        Self::new(Array2::zeros((0, 0)), Vec::new(), (nrows, ncols))
    }

    /// Creates a matrix from dynamically shaped `(data, offsets)` buffers.
    ///
    /// A scalar or 1-D `data` is promoted to a single-row strip, a scalar
    /// `offsets` to a one-element list.
    pub fn from_data_offsets(
        data: ArrayD<T>,
        offsets: ArrayD<isize>,
        shape: Option<(usize, usize)>,
    ) -> SparseResult<Self> {
        let shape = shape.ok_or(DiaError::MissingShape)?;

        let mut data = data;
        while data.ndim() < 2 {
            data = data.insert_axis(Axis(0));
        }
        let mut offsets = offsets;
        if offsets.ndim() == 0 {
            offsets = offsets.insert_axis(Axis(0));
        }

        if offsets.ndim() != 1 {
            return Err(DiaError::from(StructureError::OffsetsRank {
                ndim: offsets.ndim(),
            })
            .into());
        }
        let ndim = data.ndim();
        let data = data
            .into_dimensionality::<Ix2>()
            .map_err(|_| DiaError::from(StructureError::DataRank { ndim }))?;
        let offsets: Vec<isize> = offsets.iter().copied().collect();

        Self::new(data, offsets, shape)
    }

    /// Creates a matrix from another DIA matrix, sharing or copying its buffers.
    pub fn from_dia(other: &DiaMatrix<T>, mode: CopyMode) -> SparseResult<Self> {
        let source = match mode {
            CopyMode::Share => other.clone(),
            CopyMode::Duplicate => other.duplicate(),
        };
        let shape = source.shape();
        Ok(Self::assemble(source.data, source.offsets, shape)?)
    }

    /// Creates a matrix from any sparse layout via its coordinate export.
    pub fn from_sparse(other: &dyn SparseMatrix<T>) -> SparseResult<Self> {
        tracing::debug!(
            format = other.format().name(),
            nnz = other.nnz(),
            "converting sparse source to DIA"
        );
        other.to_coo().to_dia()
    }

    /// Creates a matrix from a dense array, keeping its nonzero entries.
    pub fn from_dense(dense: ArrayViewD<'_, T>) -> SparseResult<Self> {
        if dense.ndim() > 2 {
            return Err(DiaError::UnrecognizedInput {
                reason: format!("dense input must have rank <= 2, got rank {}", dense.ndim()),
            }
            .into());
        }
        let mut owned = dense.to_owned();
        while owned.ndim() < 2 {
            owned = owned.insert_axis(Axis(0));
        }
        let ndim = owned.ndim();
        let dense = owned
            .into_dimensionality::<Ix2>()
            .map_err(|_| DiaError::UnrecognizedInput {
                reason: format!("dense input of rank {ndim} is not a matrix"),
            })?;
        CooMatrix::from_dense(&dense.view(), T::zero()).to_dia()
    }

    /// Returns a matrix with the same structure and new values.
    ///
    /// `mode` decides whether the offsets buffer is shared with `self` or
    /// copied. `data` must have one row per stored diagonal.
    pub fn with_data(&self, data: Array2<T>, mode: CopyMode) -> SparseResult<Self> {
        let offsets = match mode {
            CopyMode::Share => Arc::clone(&self.offsets),
            CopyMode::Duplicate => Arc::from(self.offsets.to_vec()),
        };
        Ok(Self::assemble(Arc::new(data), offsets, self.shape())?)
    }

    /// Returns a deep copy with independent buffers.
    pub fn duplicate(&self) -> Self {
        Self {
            data: Arc::new(self.data.as_ref().clone()),
            offsets: Arc::from(self.offsets.to_vec()),
            nrows: self.nrows,
            ncols: self.ncols,
        }
    }

    /// Conversion to this same format.
    ///
    /// `Share` is a no-op returning a handle to the same buffers; `Duplicate`
    /// copies both buffers.
    pub fn to_dia(&self, mode: CopyMode) -> Self {
        match mode {
            CopyMode::Share => self.clone(),
            CopyMode::Duplicate => self.duplicate(),
        }
    }

    /// Returns the number of rows.
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Returns the number of columns.
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Returns the shape as `(nrows, ncols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    /// Returns the number of stored diagonals.
    pub fn num_diagonals(&self) -> usize {
        self.offsets.len()
    }

    /// Returns the stored width of every diagonal strip.
    pub fn strip_len(&self) -> usize {
        self.data.ncols()
    }

    /// Returns a reference to the diagonal offsets.
    pub fn offsets(&self) -> &[isize] {
        &self.offsets
    }

    /// Returns a reference to the data array.
    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    /// Returns the stored strip of diagonal `offset`, if present.
    pub fn diagonal(&self, offset: isize) -> Option<ArrayView1<'_, T>> {
        let position = self.offsets.iter().position(|&k| k == offset)?;
        Some(self.data.row(position))
    }

    /// Returns true if both buffers are shared with `other`.
    pub fn shares_buffers_with(&self, other: &DiaMatrix<T>) -> bool {
        Arc::ptr_eq(&self.data, &other.data) && Arc::ptr_eq(&self.offsets, &other.offsets)
    }

    /// Number of structural nonzeros, explicit zeros included.
    ///
    /// Each diagonal contributes its full length in an `nrows × ncols`
    /// matrix: `min(nrows, ncols - k)` for `k >= 0`, `min(nrows + k, ncols)`
    /// otherwise, never below zero. The strip width is not consulted, so
    /// a strip shorter than its diagonal makes this overstate what is
    /// actually stored. Use [`DiaMatrix::stored_nnz`] for that.
    pub fn nnz(&self) -> usize {
        let m = self.nrows as isize;
        let n = self.ncols as isize;
        self.offsets
            .iter()
            .map(|&k| {
                let len = if k >= 0 { m.min(n - k) } else { (m + k).min(n) };
                len.max(0) as usize
            })
            .sum()
    }

    /// Number of live entries actually present in the data strips.
    ///
    /// Equals `nnz()` clipped per diagonal by the strip width, and equals the
    /// number of triples [`DiaMatrix::to_coo`] produces.
    pub fn stored_nnz(&self) -> usize {
        self.offsets
            .iter()
            .filter_map(|&k| self.live_window(k))
            .map(|window| window.len)
            .sum()
    }

    /// Computes the density of the matrix.
    pub fn density(&self) -> f64 {
        let total = self.nrows * self.ncols;
        if total == 0 {
            0.0
        } else {
            self.nnz() as f64 / total as f64
        }
    }

    /// Computes the bandwidth of the matrix.
    ///
    /// Returns `(lower_bandwidth, upper_bandwidth)`.
    pub fn bandwidth(&self) -> (usize, usize) {
        let lower = self
            .offsets
            .iter()
            .filter(|&&o| o < 0)
            .map(|&o| o.unsigned_abs())
            .max()
            .unwrap_or(0);
        let upper = self
            .offsets
            .iter()
            .filter(|&&o| o > 0)
            .map(|&o| o as usize)
            .max()
            .unwrap_or(0);
        (lower, upper)
    }

    /// Multiplies every stored value by `scalar`; structure is unchanged
    /// and the offsets buffer is shared with `self`.
    pub fn scale(&self, scalar: T) -> Self {
        Self {
            data: Arc::new(self.data.mapv(|v| v * scalar)),
            offsets: Arc::clone(&self.offsets),
            nrows: self.nrows,
            ncols: self.ncols,
        }
    }

    /// Scalar, vector, dense-matrix or sparse-matrix multiplication.
    ///
    /// Scalars scale the matrix, dense operands go through the diagonal
    /// kernel, sparse operands are multiplied in CSR.
    pub fn multiply(&self, operand: Operand<'_, T>) -> SparseResult<Product<T>> {
        match operand {
            Operand::Scalar(scalar) => Ok(Product::Dia(self.scale(scalar))),
            Operand::Vector(x) => Ok(Product::Vector(self.matvec(&x)?)),
            Operand::Matrix(x) => Ok(Product::Matrix(self.matmat(&x)?)),
            Operand::Sparse(other) => Ok(Product::Csr(self.matmat_sparse(other)?)),
        }
    }

    /// Sparse matrix-vector multiplication: `y = A * x`
    ///
    /// # Complexity
    ///
    /// O(num_diagonals × strip_len)
    ///
    /// # Examples
    ///
    /// ```
    /// use dia_sparse::dia::DiaMatrix;
    /// use scirs2_core::ndarray_ext::array;
    ///
    /// // Tridiagonal matrix
    /// let data = array![[-1.0, -1.0, 0.0], [2.0, 2.0, 2.0], [0.0, -1.0, -1.0]];
    /// let dia = DiaMatrix::new(data, vec![-1, 0, 1], (3, 3)).unwrap();
    ///
    /// let y = dia.matvec(&array![1.0, 1.0, 1.0].view()).unwrap();
    /// assert_eq!(y, array![1.0, 0.0, 1.0]);
    /// ```
    pub fn matvec(&self, x: &ArrayView1<'_, T>) -> SparseResult<Array1<T>> {
        if x.len() != self.ncols {
            return Err(self.dimension_mismatch(vec![x.len()]).into());
        }
        let mut y = Array2::zeros((self.nrows, 1));
        self.accumulate(&x.view().insert_axis(Axis(1)), &mut y);
        Ok(y.index_axis_move(Axis(1), 0))
    }

    /// Sparse × dense product: `Y = A * X` with `X` of shape `(ncols, p)`
    pub fn matmat(&self, x: &ArrayView2<'_, T>) -> SparseResult<Array2<T>> {
        if x.nrows() != self.ncols {
            return Err(self.dimension_mismatch(vec![x.nrows(), x.ncols()]).into());
        }
        let mut y = Array2::zeros((self.nrows, x.ncols()));
        self.accumulate(x, &mut y);
        Ok(y)
    }

    /// Sparse × sparse product, computed in CSR.
    pub fn matmat_sparse(&self, other: &dyn SparseMatrix<T>) -> SparseResult<CsrMatrix<T>> {
        let (k2, n) = other.shape();
        if k2 != self.ncols {
            return Err(self.dimension_mismatch(vec![k2, n]).into());
        }
        tracing::debug!(
            rhs_format = other.format().name(),
            "DIA × sparse product delegated to CSR"
        );
        let lhs = self.to_csr()?;
        let rhs = CsrMatrix::from_coo(&other.to_coo())?;
        Ok(lhs.spspmm(&rhs)?)
    }

    /// Exports the live entries as coordinates, diagonal by diagonal.
    ///
    /// Within a diagonal, entries come in increasing column order.
    pub fn to_coo(&self) -> CooMatrix<T> {
        let capacity = self.stored_nnz();
        let mut rows = Vec::with_capacity(capacity);
        let mut cols = Vec::with_capacity(capacity);
        let mut values = Vec::with_capacity(capacity);

        for (strip, &offset) in self.data.outer_iter().zip(self.offsets.iter()) {
            for (col, &value) in strip.iter().enumerate() {
                let Some(row) = (col as isize).checked_sub(offset) else {
                    continue;
                };
                if row >= 0 && (row as usize) < self.nrows && col < self.ncols {
                    rows.push(row as usize);
                    cols.push(col);
                    values.push(value);
                }
            }
        }

        CooMatrix::from_parts_unchecked(rows, cols, values, self.shape())
    }

    /// Converts DIA matrix to CSR format.
    pub fn to_csr(&self) -> SparseResult<CsrMatrix<T>> {
        Ok(CsrMatrix::from_coo(&self.to_coo())?)
    }

    /// Converts DIA matrix to CSC format.
    pub fn to_csc(&self) -> SparseResult<CscMatrix<T>> {
        Ok(CscMatrix::from_coo(&self.to_coo())?)
    }

    /// Materializes the matrix by walking each diagonal's live window.
    pub fn to_dense(&self) -> Array2<T> {
        let mut dense = Array2::zeros(self.shape());
        for (strip, &offset) in self.data.outer_iter().zip(self.offsets.iter()) {
            let Some(window) = self.live_window(offset) else {
                continue;
            };
            for t in 0..window.len {
                dense[[window.i_start + t, window.j_start + t]] = strip[window.j_start + t];
            }
        }
        dense
    }

    /// Returns the transpose, still in DIA format.
    ///
    /// Offsets are negated and the strips re-laid so that the new strip
    /// width is the old row count.
    pub fn transpose(&self) -> Self {
        let mut data = Array2::zeros((self.num_diagonals(), self.nrows));
        for (i, &offset) in self.offsets.iter().enumerate() {
            let Some(window) = self.live_window(offset) else {
                continue;
            };
            for t in 0..window.len {
                data[[i, window.i_start + t]] = self.data[[i, window.j_start + t]];
            }
        }
        // isize::MIN maps to itself; such a diagonal has no live entries either way.
        let offsets: Vec<isize> = self.offsets.iter().map(|k| k.wrapping_neg()).collect();

        Self {
            data: Arc::new(data),
            offsets: Arc::from(offsets),
            nrows: self.ncols,
            ncols: self.nrows,
        }
    }

    /// Converts every stored value to another float type.
    pub fn cast<U: Float>(&self) -> SparseResult<DiaMatrix<U>> {
        let mut data = Array2::zeros(self.data.dim());
        for ((row, col), &value) in self.data.indexed_iter() {
            data[[row, col]] = U::from(value).ok_or(ConversionError::ElementCast {
                row,
                col,
                target: std::any::type_name::<U>(),
            })?;
        }
        Ok(DiaMatrix {
            data: Arc::new(data),
            offsets: Arc::clone(&self.offsets),
            nrows: self.nrows,
            ncols: self.ncols,
        })
    }

    /// Checks the structural invariants and builds the matrix.
    fn assemble(
        data: Arc<Array2<T>>,
        offsets: Arc<[isize]>,
        shape: (usize, usize),
    ) -> Result<Self, DiaError> {
        let (nrows, ncols) = shape;
        if nrows > isize::MAX as usize || ncols > isize::MAX as usize {
            return Err(DiaError::InvalidShape {
                reason: format!(
                    "dimensions ({nrows}, {ncols}) exceed the largest signed offset {}",
                    isize::MAX
                ),
            });
        }

        if data.nrows() != offsets.len() {
            return Err(StructureError::DiagonalCountMismatch {
                data_rows: data.nrows(),
                offsets: offsets.len(),
            }
            .into());
        }

        let mut seen = HashSet::with_capacity(offsets.len());
        if let Some(&offset) = offsets.iter().find(|&&k| !seen.insert(k)) {
            return Err(StructureError::DuplicateOffset { offset }.into());
        }

        Ok(Self {
            data,
            offsets,
            nrows,
            ncols,
        })
    }

    /// Live window of diagonal `offset`.
    ///
    /// Data columns are bounded by `ncols`, by `nrows + offset` (the
    /// diagonal leaves the last row) and by the strip width. The row window
    /// is the column window shifted by `-offset`.
    fn live_window(&self, offset: isize) -> Option<LiveWindow> {
        let j_start = offset.max(0);
        let j_end = (self.nrows as isize)
            .saturating_add(offset)
            .min(self.ncols as isize)
            .min(self.strip_len() as isize);
        if j_end <= j_start {
            return None;
        }
        let i_start = j_start - offset;
        Some(LiveWindow {
            j_start: j_start as usize,
            i_start: i_start as usize,
            len: (j_end - j_start) as usize,
        })
    }

    /// Fused multiply-accumulate of every diagonal into `y`.
    fn accumulate(&self, x: &ArrayView2<'_, T>, y: &mut Array2<T>) {
        for (strip, &offset) in self.data.outer_iter().zip(self.offsets.iter()) {
            let Some(window) = self.live_window(offset) else {
                continue;
            };
            tracing::trace!(
                offset,
                j_start = window.j_start,
                i_start = window.i_start,
                len = window.len,
                "accumulating diagonal"
            );
            for t in 0..window.len {
                let a = strip[window.j_start + t];
                let x_row = x.row(window.j_start + t);
                let mut y_row = y.row_mut(window.i_start + t);
                y_row.zip_mut_with(&x_row, |acc, &xv| *acc = *acc + a * xv);
            }
        }
    }

    fn dimension_mismatch(&self, rhs: Vec<usize>) -> DiaError {
        DiaError::DimensionMismatch {
            lhs: self.shape(),
            rhs,
        }
    }
}

impl<T: Float> SparseMatrix<T> for DiaMatrix<T> {
    fn format(&self) -> SparseFormat {
        SparseFormat::Dia
    }

    fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    fn nnz(&self) -> usize {
        DiaMatrix::nnz(self)
    }

    fn to_coo(&self) -> CooMatrix<T> {
        DiaMatrix::to_coo(self)
    }
}

impl<T: Float> Mul<T> for &DiaMatrix<T> {
    type Output = DiaMatrix<T>;

    fn mul(self, scalar: T) -> DiaMatrix<T> {
        self.scale(scalar)
    }
}

impl<T: Float> Neg for &DiaMatrix<T> {
    type Output = DiaMatrix<T>;

    fn neg(self) -> DiaMatrix<T> {
        self.scale(-T::one())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SparseError;
    use scirs2_core::ndarray_ext::{array, Array3, IxDyn};

    /// data = three rows of [1, 2, 3, 4], offsets [0, -1, 2], 4×4
    fn banded() -> DiaMatrix<f64> {
        let data = array![[1.0, 2.0, 3.0, 4.0], [1.0, 2.0, 3.0, 4.0], [1.0, 2.0, 3.0, 4.0]];
        DiaMatrix::new(data, vec![0, -1, 2], (4, 4)).unwrap()
    }

    fn dia_err(result: SparseResult<DiaMatrix<f64>>) -> DiaError {
        match result {
            Err(SparseError::Dia(err)) => err,
            other => panic!("expected DIA error, got {:?}", other),
        }
    }

    #[test]
    fn test_dia_creation() {
        let dia = DiaMatrix::new(array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]], vec![0, 1], (3, 3)).unwrap();

        assert_eq!(dia.nrows(), 3);
        assert_eq!(dia.ncols(), 3);
        assert_eq!(dia.num_diagonals(), 2);
        assert_eq!(dia.strip_len(), 3);
    }

    #[test]
    fn test_dia_dense_layout() {
        let expected = array![
            [1.0, 0.0, 3.0, 0.0],
            [1.0, 2.0, 0.0, 4.0],
            [0.0, 2.0, 3.0, 0.0],
            [0.0, 0.0, 3.0, 4.0]
        ];
        assert_eq!(banded().to_dense(), expected);
    }

    #[test]
    fn test_dia_nnz_ideal_lengths() {
        // 4 + 3 + 2
        assert_eq!(banded().nnz(), 9);
        assert_eq!(banded().stored_nnz(), 9);
    }

    #[test]
    fn test_dia_nnz_rectangular_and_out_of_range() {
        let data = Array2::<f64>::ones((4, 6));
        let dia = DiaMatrix::new(data, vec![0, 3, -2, 5], (3, 5)).unwrap();
        // k=0: min(3,5)=3, k=3: min(3,2)=2, k=-2: min(1,5)=1, k=5: min(3,0)=0
        assert_eq!(dia.nnz(), 6);

        let far = DiaMatrix::new(Array2::<f64>::ones((2, 3)), vec![-7, 9], (3, 3)).unwrap();
        assert_eq!(far.nnz(), 0);
        assert_eq!(far.stored_nnz(), 0);
        assert!(far.to_coo().values().is_empty());
    }

    #[test]
    fn test_dia_truncated_strip() {
        let dia = DiaMatrix::new(array![[5.0, 6.0]], vec![0], (4, 4)).unwrap();

        // the ideal count ignores the strip width, the stored count does not
        assert_eq!(dia.nnz(), 4);
        assert_eq!(dia.stored_nnz(), 2);

        let coo = dia.to_coo();
        assert_eq!(coo.row_indices(), &[0, 1]);
        assert_eq!(coo.col_indices(), &[0, 1]);
        assert_eq!(coo.values(), &[5.0, 6.0]);

        let mut expected = Array2::zeros((4, 4));
        expected[[0, 0]] = 5.0;
        expected[[1, 1]] = 6.0;
        assert_eq!(dia.to_dense(), expected);

        let y = dia.matvec(&array![1.0, 1.0, 1.0, 1.0].view()).unwrap();
        assert_eq!(y, array![5.0, 6.0, 0.0, 0.0]);
    }

    #[test]
    fn test_dia_strip_wider_than_matrix() {
        // padding past ncols must never leak into results
        let dia = DiaMatrix::new(array![[1.0, 2.0, 99.0, 99.0]], vec![0], (2, 2)).unwrap();
        assert_eq!(dia.stored_nnz(), 2);
        assert_eq!(dia.to_dense(), array![[1.0, 0.0], [0.0, 2.0]]);
        assert_eq!(dia.matvec(&array![1.0, 1.0].view()).unwrap(), array![1.0, 2.0]);
    }

    #[test]
    fn test_dia_matvec_worked_example() {
        let y = banded().matvec(&array![1.0, 1.0, 1.0, 1.0].view()).unwrap();
        assert_eq!(y, array![4.0, 7.0, 5.0, 7.0]);
    }

    #[test]
    fn test_dia_matmat_matches_dense() {
        let dia = banded();
        let x = array![[1.0, 0.0], [2.0, 1.0], [0.0, -1.0], [1.0, 3.0]];
        let y = dia.matmat(&x.view()).unwrap();
        assert_eq!(y, dia.to_dense().dot(&x));
        assert_eq!(y.dim(), (4, 2));
    }

    #[test]
    fn test_dia_matvec_rectangular() {
        // 2×4: offset -1 keeps only (1, 0), offset 3 only (0, 3)
        let data = array![[9.0, 9.0, 9.0, 9.0], [1.0, 2.0, 3.0, 4.0], [5.0, 6.0, 7.0, 8.0]];
        let dia = DiaMatrix::new(data, vec![-1, 1, 3], (2, 4)).unwrap();
        let x = array![1.0, 10.0, 100.0, 1000.0];
        let y = dia.matvec(&x.view()).unwrap();
        assert_eq!(y, dia.to_dense().dot(&x));
        // row 0: (0,1)=2, (0,3)=8; row 1: (1,0)=9, (1,2)=3
        assert_eq!(y, array![8020.0, 309.0]);
    }

    #[test]
    fn test_dia_scale() {
        let dia = banded();
        let scaled = dia.scale(2.0);
        assert_eq!(scaled.offsets(), dia.offsets());
        assert_eq!(scaled.data(), &(dia.data() * 2.0));

        let same = dia.multiply(Operand::Scalar(1.0)).unwrap().into_dia().unwrap();
        assert_eq!(same.data(), dia.data());
        assert_eq!(same.offsets(), &[0, -1, 2]);
        assert_eq!(same.shape(), (4, 4));
    }

    #[test]
    fn test_dia_operator_sugar() {
        let dia = banded();
        assert_eq!((&dia * 3.0).to_dense(), dia.to_dense() * 3.0);
        assert_eq!((-&dia).to_dense(), -dia.to_dense());
    }

    #[test]
    fn test_dia_multiply_dispatch() {
        let dia = banded();
        let x = array![1.0, 1.0, 1.0, 1.0];
        let y = dia.multiply(Operand::Vector(x.view())).unwrap();
        assert_eq!(y.into_vector().unwrap(), array![4.0, 7.0, 5.0, 7.0]);

        let xm = Array2::<f64>::eye(4);
        let ym = dia.multiply(Operand::Matrix(xm.view())).unwrap();
        assert_eq!(ym.into_matrix().unwrap(), dia.to_dense());
    }

    #[test]
    fn test_dia_multiply_sparse_delegates_to_csr() {
        let dia = banded();
        let other = DiaMatrix::new(array![[1.0, 1.0, 1.0, 1.0]], vec![1], (4, 4)).unwrap();
        let product = dia.multiply(Operand::Sparse(&other)).unwrap().into_csr().unwrap();
        assert_eq!(product.to_dense(), dia.to_dense().dot(&other.to_dense()));
    }

    #[test]
    fn test_dia_dimension_mismatch() {
        let dia = banded();
        let err = dia_err(dia.matvec(&array![1.0, 1.0, 1.0].view()).map(|_| dia.clone()));
        assert_eq!(
            err,
            DiaError::DimensionMismatch {
                lhs: (4, 4),
                rhs: vec![3]
            }
        );

        let x = Array2::<f64>::zeros((3, 2));
        assert!(matches!(
            dia.matmat(&x.view()),
            Err(SparseError::Dia(DiaError::DimensionMismatch { .. }))
        ));

        let other = CsrMatrix::<f64>::zeros((5, 4));
        let err = dia.multiply(Operand::Sparse(&other)).unwrap_err();
        assert_eq!(
            err.as_dia(),
            Some(&DiaError::DimensionMismatch {
                lhs: (4, 4),
                rhs: vec![5, 4]
            })
        );
    }

    #[test]
    fn test_dia_empty_from_shape() {
        let dia = DiaMatrix::<f64>::from_shape(&[3, 4]).unwrap();
        assert_eq!(dia.shape(), (3, 4));
        assert_eq!(dia.nnz(), 0);
        assert_eq!(dia.num_diagonals(), 0);

        let y = dia.matvec(&Array1::zeros(4).view()).unwrap();
        assert_eq!(y, Array1::<f64>::zeros(3));
    }

    #[test]
    fn test_dia_invalid_shape() {
        let err = dia_err(DiaMatrix::from_shape(&[3]));
        assert!(matches!(err, DiaError::InvalidShape { .. }));
        let err = dia_err(DiaMatrix::from_shape(&[1, 2, 3]));
        assert!(matches!(err, DiaError::InvalidShape { .. }));
    }

    #[test]
    fn test_dia_oversized_dimensions_rejected() {
        let err = dia_err(DiaMatrix::new(Array2::zeros((1, 0)), vec![0], (usize::MAX, 3)));
        assert!(matches!(err, DiaError::InvalidShape { .. }));

        let err = dia_err(DiaMatrix::from_shape(&[3, isize::MAX as usize + 1]));
        assert!(matches!(err, DiaError::InvalidShape { .. }));

        let dia = DiaMatrix::<f64>::from_shape(&[isize::MAX as usize, 3]).unwrap();
        let dia = dia.with_data(Array2::zeros((0, 3)), CopyMode::Share).unwrap();
        assert_eq!(dia.nnz(), 0);

        let wide = DiaMatrix::new(Array2::<f64>::zeros((1, 0)), vec![0], (isize::MAX as usize, 3))
            .unwrap();
        assert_eq!(wide.nnz(), 3);
    }

    #[test]
    fn test_dia_duplicate_offsets_rejected() {
        let err = dia_err(DiaMatrix::new(array![[1.0, 2.0], [3.0, 4.0]], vec![0, 0], (2, 2)));
        assert_eq!(
            err,
            DiaError::MalformedStructure(StructureError::DuplicateOffset { offset: 0 })
        );
    }

    #[test]
    fn test_dia_invalid_offset_count() {
        let err = dia_err(DiaMatrix::new(array![[1.0, 2.0, 3.0]], vec![0, 1], (3, 3)));
        assert_eq!(
            err,
            DiaError::MalformedStructure(StructureError::DiagonalCountMismatch {
                data_rows: 1,
                offsets: 2
            })
        );
    }

    #[test]
    fn test_dia_data_offsets_requires_shape() {
        let data = array![[1.0, 2.0]].into_dyn();
        let offsets = array![0isize].into_dyn();
        let err = dia_err(DiaMatrix::from_source(DiaSource::DataOffsets {
            data,
            offsets,
            shape: None,
        }));
        assert_eq!(err, DiaError::MissingShape);
    }

    #[test]
    fn test_dia_data_offsets_promotes_low_rank() {
        // 1-D data becomes one strip, scalar offset becomes one offset
        let data = array![1.0, 2.0, 3.0].into_dyn();
        let offsets = ArrayD::from_elem(IxDyn(&[]), 1isize);
        let dia = DiaMatrix::from_data_offsets(data, offsets, Some((3, 3))).unwrap();
        assert_eq!(dia.offsets(), &[1]);
        assert_eq!(dia.data().dim(), (1, 3));
        assert_eq!(
            dia.to_dense(),
            array![[0.0, 2.0, 0.0], [0.0, 0.0, 3.0], [0.0, 0.0, 0.0]]
        );

        let scalar = ArrayD::from_elem(IxDyn(&[]), 7.0);
        let dia = DiaMatrix::from_data_offsets(scalar, array![0isize].into_dyn(), Some((2, 2))).unwrap();
        assert_eq!(dia.data().dim(), (1, 1));
        assert_eq!(dia.to_dense(), array![[7.0, 0.0], [0.0, 0.0]]);
    }

    #[test]
    fn test_dia_data_offsets_rank_errors() {
        let data = Array3::<f64>::zeros((1, 2, 2)).into_dyn();
        let err = dia_err(DiaMatrix::from_data_offsets(data, array![0isize].into_dyn(), Some((2, 2))));
        assert_eq!(
            err,
            DiaError::MalformedStructure(StructureError::DataRank { ndim: 3 })
        );

        let offsets = array![[0isize, 1]].into_dyn();
        let err = dia_err(DiaMatrix::from_data_offsets(
            Array2::<f64>::zeros((2, 2)).into_dyn(),
            offsets,
            Some((2, 2)),
        ));
        assert_eq!(
            err,
            DiaError::MalformedStructure(StructureError::OffsetsRank { ndim: 2 })
        );
    }

    #[test]
    fn test_dia_same_format_share_and_duplicate() {
        let dia = banded();

        let shared = DiaMatrix::from_source(DiaSource::SameFormat(&dia, CopyMode::Share)).unwrap();
        assert!(shared.shares_buffers_with(&dia));
        assert_eq!(shared, dia);

        let copied = DiaMatrix::from_source(DiaSource::SameFormat(&dia, CopyMode::Duplicate)).unwrap();
        assert!(!copied.shares_buffers_with(&dia));
        assert_eq!(copied, dia);
    }

    #[test]
    fn test_dia_to_dia_identity() {
        let dia = banded();
        assert!(dia.to_dia(CopyMode::Share).shares_buffers_with(&dia));
        let deep = dia.to_dia(CopyMode::Duplicate);
        assert!(!Arc::ptr_eq(&deep.data, &dia.data));
        assert!(!Arc::ptr_eq(&deep.offsets, &dia.offsets));
        assert_eq!(deep, dia);
    }

    #[test]
    fn test_dia_with_data() {
        let dia = banded();
        let replaced = dia.with_data(Array2::zeros((3, 2)), CopyMode::Share).unwrap();
        assert!(Arc::ptr_eq(&replaced.offsets, &dia.offsets));
        assert_eq!(replaced.strip_len(), 2);

        let copied = dia.with_data(Array2::zeros((3, 4)), CopyMode::Duplicate).unwrap();
        assert!(!Arc::ptr_eq(&copied.offsets, &dia.offsets));

        let err = dia_err(dia.with_data(Array2::zeros((2, 4)), CopyMode::Share));
        assert!(matches!(err, DiaError::MalformedStructure(_)));
    }

    #[test]
    fn test_dia_from_sparse_source() {
        let dia = banded();
        let csr = dia.to_csr().unwrap();
        let rebuilt = DiaMatrix::from_source(DiaSource::Sparse(&csr)).unwrap();
        assert_eq!(rebuilt.to_dense(), dia.to_dense());
        assert_eq!(rebuilt.offsets(), &[-1, 0, 2]);
    }

    #[test]
    fn test_dia_from_dense_source() {
        let dense = array![[2.0, -1.0, 0.0], [-1.0, 2.0, -1.0], [0.0, -1.0, 2.0]];
        let dia = DiaMatrix::from_source(DiaSource::Dense(dense.view().into_dyn())).unwrap();
        assert_eq!(dia.offsets(), &[-1, 0, 1]);
        assert_eq!(dia.to_dense(), dense);

        let row = array![0.0, 3.0];
        let dia = DiaMatrix::from_source(DiaSource::Dense(row.view().into_dyn())).unwrap();
        assert_eq!(dia.shape(), (1, 2));
        assert_eq!(dia.offsets(), &[1]);
    }

    #[test]
    fn test_dia_from_dense_rank_three_unrecognized() {
        let cube = Array3::<f64>::zeros((2, 2, 2));
        let err = dia_err(DiaMatrix::from_source(DiaSource::Dense(cube.view().into_dyn())));
        assert!(matches!(err, DiaError::UnrecognizedInput { .. }));
    }

    #[test]
    fn test_dia_unsorted_gapped_offsets() {
        let data = array![[1.0, 1.0, 1.0, 1.0, 1.0], [2.0, 2.0, 2.0, 2.0, 2.0]];
        let dia = DiaMatrix::new(data, vec![3, -3], (5, 5)).unwrap();
        assert_eq!(dia.nnz(), 4);
        assert_eq!(dia.bandwidth(), (3, 3));
        assert_eq!(dia.to_coo().to_dense(), dia.to_dense());
    }

    #[test]
    fn test_dia_coo_order_is_diagonal_major() {
        let coo = banded().to_coo();
        assert_eq!(coo.nnz(), 9);
        assert_eq!(coo.row_indices(), &[0, 1, 2, 3, 1, 2, 3, 0, 1]);
        assert_eq!(coo.col_indices(), &[0, 1, 2, 3, 0, 1, 2, 2, 3]);
    }

    #[test]
    fn test_dia_transpose() {
        let dia = banded();
        let t = dia.transpose();
        assert_eq!(t.offsets(), &[0, 1, -2]);
        assert_eq!(t.to_dense(), dia.to_dense().t().to_owned());

        let rect = DiaMatrix::new(array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]], vec![0, 1], (2, 3)).unwrap();
        let rt = rect.transpose();
        assert_eq!(rt.shape(), (3, 2));
        assert_eq!(rt.to_dense(), rect.to_dense().t().to_owned());
    }

    #[test]
    fn test_dia_cast() {
        let dia = banded();
        let single: DiaMatrix<f32> = dia.cast().unwrap();
        assert_eq!(single.offsets(), dia.offsets());
        assert_eq!(single.data()[[0, 3]], 4.0f32);
    }

    #[test]
    fn test_dia_diagonal_lookup() {
        let dia = banded();
        assert_eq!(dia.diagonal(-1).unwrap(), array![1.0, 2.0, 3.0, 4.0]);
        assert!(dia.diagonal(1).is_none());
    }

    #[test]
    fn test_dia_density() {
        assert_eq!(banded().density(), 9.0 / 16.0);
        assert_eq!(DiaMatrix::<f64>::from_shape(&[0, 3]).unwrap().density(), 0.0);
    }
}
