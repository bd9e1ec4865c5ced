//! COO (Coordinate) sparse matrix format
//!
//! The Coordinate format stores a sparse matrix as three parallel lists
//! `(rows, cols, values)` plus the shape. It is the interchange format of
//! this crate: every other layout can export itself to COO and be rebuilt
//! from it.
//!
//! Duplicate coordinates are allowed and mean "sum these values"; dense
//! materialization and every conversion honour that.
//!
//! # Examples
//!
//! ```
//! use dia_sparse::coo::CooMatrix;
//!
//! // 3×4 matrix with 3 entries
//! let coo = CooMatrix::new(vec![0, 1, 2], vec![1, 2, 0], vec![2.5, 3.0, 1.5], (3, 4)).unwrap();
//! assert_eq!(coo.nnz(), 3);
//! assert_eq!(coo.shape(), (3, 4));
//!
//! // Main diagonal is empty, offsets 1 and -2 are used
//! let dia = coo.to_dia().unwrap();
//! assert_eq!(dia.offsets(), &[-2, 1]);
//! ```

use crate::config::ConversionConfig;
use crate::csc::{CscError, CscMatrix};
use crate::csr::{CsrError, CsrMatrix};
use crate::dia::DiaMatrix;
use crate::error::SparseResult;
use crate::format::{SparseFormat, SparseMatrix};
use scirs2_core::ndarray_ext::{Array2, ArrayView2};
use scirs2_core::numeric::Float;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CooError {
    #[error("Length mismatch: {rows} row indices, {cols} column indices, {values} values")]
    LengthMismatch {
        rows: usize,
        cols: usize,
        values: usize,
    },

    #[error("Index out of bounds: ({row}, {col}) exceeds shape {nrows}×{ncols}")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        nrows: usize,
        ncols: usize,
    },
}

/// COO (Coordinate) sparse matrix
///
/// Flexible and easy to construct, but not optimized for arithmetic.
#[derive(Debug, Clone, PartialEq)]
pub struct CooMatrix<T> {
    /// Row index of each entry
    rows: Vec<usize>,

    /// Column index of each entry
    cols: Vec<usize>,

    /// Value of each entry
    values: Vec<T>,

    /// Shape: (nrows, ncols)
    shape: (usize, usize),
}

impl<T: Clone> CooMatrix<T> {
    /// Create a new COO matrix
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - the three lists have different lengths
    /// - any coordinate lies outside `shape`
    pub fn new(
        rows: Vec<usize>,
        cols: Vec<usize>,
        values: Vec<T>,
        shape: (usize, usize),
    ) -> Result<Self, CooError> {
        if rows.len() != values.len() || cols.len() != values.len() {
            return Err(CooError::LengthMismatch {
                rows: rows.len(),
                cols: cols.len(),
                values: values.len(),
            });
        }

        let (nrows, ncols) = shape;
        for (&row, &col) in rows.iter().zip(&cols) {
            if row >= nrows || col >= ncols {
                return Err(CooError::IndexOutOfBounds {
                    row,
                    col,
                    nrows,
                    ncols,
                });
            }
        }

        Ok(Self {
            rows,
            cols,
            values,
            shape,
        })
    }

    /// Assemble from parts already known to be consistent with `shape`
    pub(crate) fn from_parts_unchecked(
        rows: Vec<usize>,
        cols: Vec<usize>,
        values: Vec<T>,
        shape: (usize, usize),
    ) -> Self {
        debug_assert_eq!(rows.len(), values.len());
        debug_assert_eq!(cols.len(), values.len());
        Self {
            rows,
            cols,
            values,
            shape,
        }
    }

    /// Create an empty COO matrix with given shape
    pub fn zeros(shape: (usize, usize)) -> Self {
        Self {
            rows: Vec::new(),
            cols: Vec::new(),
            values: Vec::new(),
            shape,
        }
    }

    /// Number of stored entries (duplicates counted separately)
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Shape as `(nrows, ncols)`
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Number of rows
    pub fn nrows(&self) -> usize {
        self.shape.0
    }

    /// Number of columns
    pub fn ncols(&self) -> usize {
        self.shape.1
    }

    /// Row indices
    pub fn row_indices(&self) -> &[usize] {
        &self.rows
    }

    /// Column indices
    pub fn col_indices(&self) -> &[usize] {
        &self.cols
    }

    /// Values
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Iterate over `(row, col, value)` triples in storage order
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> + '_ {
        self.rows
            .iter()
            .zip(&self.cols)
            .zip(&self.values)
            .map(|((&row, &col), value)| (row, col, value))
    }

    /// Decompose into `(rows, cols, values, shape)`
    pub fn into_parts(self) -> (Vec<usize>, Vec<usize>, Vec<T>, (usize, usize)) {
        (self.rows, self.cols, self.values, self.shape)
    }

    /// Compute density (nnz / total_elements), 0 for an empty shape
    pub fn density(&self) -> f64 {
        let total = self.shape.0 * self.shape.1;
        if total == 0 {
            0.0
        } else {
            self.nnz() as f64 / total as f64
        }
    }

    /// Add an entry
    ///
    /// Note: Does not check for duplicates. Use `deduplicate()` to merge them.
    pub fn push(&mut self, row: usize, col: usize, value: T) -> Result<(), CooError> {
        let (nrows, ncols) = self.shape;
        if row >= nrows || col >= ncols {
            return Err(CooError::IndexOutOfBounds {
                row,
                col,
                nrows,
                ncols,
            });
        }

        self.rows.push(row);
        self.cols.push(col);
        self.values.push(value);
        Ok(())
    }

    /// Sort entries in row-major order (stable for equal coordinates)
    pub fn sort(&mut self) {
        let mut perm: Vec<usize> = (0..self.nnz()).collect();
        perm.sort_by_key(|&i| (self.rows[i], self.cols[i]));

        self.rows = perm.iter().map(|&i| self.rows[i]).collect();
        self.cols = perm.iter().map(|&i| self.cols[i]).collect();
        self.values = perm.iter().map(|&i| self.values[i].clone()).collect();
    }
}

impl<T: Float> CooMatrix<T> {
    /// Convert to a dense matrix, summing duplicate coordinates
    ///
    /// # Complexity
    ///
    /// Time: O(nnz + nrows × ncols)
    pub fn to_dense(&self) -> Array2<T> {
        let mut dense = Array2::zeros(self.shape);
        for (row, col, &value) in self.iter() {
            dense[[row, col]] = dense[[row, col]] + value;
        }
        dense
    }

    /// Create COO matrix from a dense matrix
    ///
    /// Only stores elements where |value| > threshold. NaN entries are kept.
    pub fn from_dense(dense: &ArrayView2<T>, threshold: T) -> Self {
        let mut coo = Self::zeros(dense.dim());
        for ((row, col), &value) in dense.indexed_iter() {
            if !(value.abs() <= threshold) {
                coo.rows.push(row);
                coo.cols.push(col);
                coo.values.push(value);
            }
        }
        coo
    }

    /// Merge duplicate coordinates by summing their values
    ///
    /// Leaves the entries sorted in row-major order.
    pub fn deduplicate(&mut self) {
        if self.nnz() <= 1 {
            return;
        }

        self.sort();

        let mut write_idx = 0;
        for read_idx in 1..self.nnz() {
            if self.rows[write_idx] == self.rows[read_idx]
                && self.cols[write_idx] == self.cols[read_idx]
            {
                self.values[write_idx] = self.values[write_idx] + self.values[read_idx];
            } else {
                write_idx += 1;
                self.rows[write_idx] = self.rows[read_idx];
                self.cols[write_idx] = self.cols[read_idx];
                self.values[write_idx] = self.values[read_idx];
            }
        }

        self.rows.truncate(write_idx + 1);
        self.cols.truncate(write_idx + 1);
        self.values.truncate(write_idx + 1);
    }

    /// Remove entries whose value is exactly zero
    pub fn eliminate_zeros(&mut self) {
        let mut write_idx = 0;
        for read_idx in 0..self.nnz() {
            if self.values[read_idx] != T::zero() {
                self.rows[write_idx] = self.rows[read_idx];
                self.cols[write_idx] = self.cols[read_idx];
                self.values[write_idx] = self.values[read_idx];
                write_idx += 1;
            }
        }

        self.rows.truncate(write_idx);
        self.cols.truncate(write_idx);
        self.values.truncate(write_idx);
    }

    /// Convert to DIA format with the default [`ConversionConfig`]
    pub fn to_dia(&self) -> SparseResult<DiaMatrix<T>> {
        self.to_dia_with(&ConversionConfig::default())
    }

    /// Convert to DIA format
    ///
    /// One diagonal is stored per distinct `col - row` offset (sorted
    /// ascending). The strip width is `max(col) + 1`, so columns beyond the
    /// last stored entry are not materialized. Duplicate coordinates are
    /// summed.
    ///
    /// # Complexity
    ///
    /// O(nnz × log(num_diagonals) + num_diagonals × strip_len)
    pub fn to_dia_with(&self, config: &ConversionConfig) -> SparseResult<DiaMatrix<T>> {
        let keep = |value: T| !(config.drop_zeros && value == T::zero());

        let mut diag_index: BTreeMap<isize, usize> = BTreeMap::new();
        let mut strip_len = 0;
        for (row, col, &value) in self.iter() {
            if keep(value) {
                diag_index.insert(col as isize - row as isize, 0);
                strip_len = strip_len.max(col + 1);
            }
        }
        for (position, slot) in diag_index.values_mut().enumerate() {
            *slot = position;
        }

        let offsets: Vec<isize> = diag_index.keys().copied().collect();
        let mut data = Array2::zeros((offsets.len(), strip_len));
        for (row, col, &value) in self.iter() {
            if keep(value) {
                let diag = diag_index[&(col as isize - row as isize)];
                data[[diag, col]] = data[[diag, col]] + value;
            }
        }

        if config.is_inefficient(offsets.len()) {
            tracing::warn!(
                num_diagonals = offsets.len(),
                threshold = config.efficiency_warning_diagonals,
                "DIA storage with this many diagonals is inefficient"
            );
        }
        tracing::debug!(
            nnz = self.nnz(),
            num_diagonals = offsets.len(),
            strip_len,
            "built DIA matrix from coordinates"
        );

        DiaMatrix::new(data, offsets, self.shape)
    }

    /// Convert to CSR format
    pub fn to_csr(&self) -> Result<CsrMatrix<T>, CsrError> {
        CsrMatrix::from_coo(self)
    }

    /// Convert to CSC format
    pub fn to_csc(&self) -> Result<CscMatrix<T>, CscError> {
        CscMatrix::from_coo(self)
    }
}

impl<T: Float> SparseMatrix<T> for CooMatrix<T> {
    fn format(&self) -> SparseFormat {
        SparseFormat::Coo
    }

    fn shape(&self) -> (usize, usize) {
        self.shape
    }

    fn nnz(&self) -> usize {
        self.values.len()
    }

    fn to_coo(&self) -> CooMatrix<T> {
        self.clone()
    }
}
