//! CSR (Compressed Sparse Row) format for 2D matrices
//!
//! CSR is the layout sparse × sparse products are computed in. DIA matrices
//! multiplied by another sparse operand are converted here first.
//!
//! # Format
//!
//! For an m×n sparse matrix with nnz non-zeros:
//! - `row_ptr`: `Vec<usize>` of length m+1 - row_ptr\[i\] points to start of row i
//! - `col_indices`: `Vec<usize>` of length nnz - column index for each non-zero
//! - `values`: `Vec<T>` of length nnz - the non-zero values
//! - `shape`: (m, n) - dimensions of the matrix
//!
//! # Examples
//!
//! ```
//! use dia_sparse::csr::CsrMatrix;
//!
//! // [1.0  0   2.0  0  ]
//! // [0    3.0 0    0  ]
//! // [4.0  0   0    5.0]
//! let row_ptr = vec![0, 2, 3, 5];
//! let col_indices = vec![0, 2, 1, 0, 3];
//! let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
//!
//! let csr = CsrMatrix::new(row_ptr, col_indices, values, (3, 4)).unwrap();
//! assert_eq!(csr.nnz(), 5);
//! ```

use crate::coo::CooMatrix;
use crate::format::{SparseFormat, SparseMatrix};
use scirs2_core::ndarray_ext::{Array1, Array2, ArrayView1, ArrayView2};
use scirs2_core::numeric::Float;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CsrError {
    #[error("Invalid row pointers: length {len} for {nrows} rows (expected {expected})")]
    InvalidRowPtr {
        len: usize,
        nrows: usize,
        expected: usize,
    },

    #[error("Row pointer not sorted at index {idx}: {curr} > {next}")]
    RowPtrNotSorted {
        idx: usize,
        curr: usize,
        next: usize,
    },

    #[error("Length mismatch: {col_indices} col_indices but {values} values")]
    LengthMismatch { col_indices: usize, values: usize },

    #[error("Column index out of bounds: {col_idx} >= {ncols}")]
    ColIndexOutOfBounds { col_idx: usize, ncols: usize },

    #[error("Shape mismatch: matrix is {nrows}×{ncols}, vector has length {vec_len}")]
    ShapeMismatch {
        nrows: usize,
        ncols: usize,
        vec_len: usize,
    },

    #[error("Matrix shape mismatch: cannot multiply {m1}×{n1} by {m2}×{n2}")]
    MatrixShapeMismatch {
        m1: usize,
        n1: usize,
        m2: usize,
        n2: usize,
    },
}

/// CSR (Compressed Sparse Row) matrix
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix<T> {
    /// Row pointers: row_ptr[i] = start index of row i in col_indices/values
    /// Length: nrows + 1, with row_ptr[nrows] = nnz
    row_ptr: Vec<usize>,

    /// Column indices for each non-zero element
    col_indices: Vec<usize>,

    /// Values of non-zero elements
    values: Vec<T>,

    /// Shape: (nrows, ncols)
    shape: (usize, usize),
}

impl<T: Clone> CsrMatrix<T> {
    /// Create a new CSR matrix
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - row_ptr length is incorrect
    /// - col_indices and values have different lengths
    /// - row_ptr is not monotonically increasing
    /// - any column index is out of bounds
    pub fn new(
        row_ptr: Vec<usize>,
        col_indices: Vec<usize>,
        values: Vec<T>,
        shape: (usize, usize),
    ) -> Result<Self, CsrError> {
        let (nrows, ncols) = shape;

        if row_ptr.len() != nrows + 1 {
            return Err(CsrError::InvalidRowPtr {
                len: row_ptr.len(),
                nrows,
                expected: nrows + 1,
            });
        }

        if col_indices.len() != values.len() {
            return Err(CsrError::LengthMismatch {
                col_indices: col_indices.len(),
                values: values.len(),
            });
        }

        for i in 0..nrows {
            if row_ptr[i] > row_ptr[i + 1] {
                return Err(CsrError::RowPtrNotSorted {
                    idx: i,
                    curr: row_ptr[i],
                    next: row_ptr[i + 1],
                });
            }
        }

        let nnz = col_indices.len();
        if row_ptr[0] != 0 || row_ptr[nrows] != nnz {
            return Err(CsrError::InvalidRowPtr {
                len: row_ptr[nrows],
                nrows,
                expected: nnz,
            });
        }

        for &col_idx in &col_indices {
            if col_idx >= ncols {
                return Err(CsrError::ColIndexOutOfBounds { col_idx, ncols });
            }
        }

        Ok(Self {
            row_ptr,
            col_indices,
            values,
            shape,
        })
    }

    /// Create an empty CSR matrix with given shape
    pub fn zeros(shape: (usize, usize)) -> Self {
        Self {
            row_ptr: vec![0; shape.0 + 1],
            col_indices: Vec::new(),
            values: Vec::new(),
            shape,
        }
    }

    /// Number of non-zero elements
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Shape as (nrows, ncols)
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

    /// Row pointers
    pub fn row_ptr(&self) -> &[usize] {
        &self.row_ptr
    }

    /// Column indices
    pub fn col_indices(&self) -> &[usize] {
        &self.col_indices
    }

    /// Values
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Get the column indices and values of row `i`
    pub fn row(&self, i: usize) -> Option<(&[usize], &[T])> {
        if i >= self.nrows() {
            return None;
        }
        let start = self.row_ptr[i];
        let end = self.row_ptr[i + 1];
        Some((&self.col_indices[start..end], &self.values[start..end]))
    }
}

impl<T: Float> CsrMatrix<T> {
    /// Convert from COO format
    ///
    /// Duplicate coordinates are summed; column indices come out sorted
    /// within each row.
    pub fn from_coo(coo: &CooMatrix<T>) -> Result<Self, CsrError> {
        let (nrows, ncols) = coo.shape();

        let mut coo_sorted = coo.clone();
        coo_sorted.deduplicate();

        let mut row_ptr = vec![0; nrows + 1];
        for &row in coo_sorted.row_indices() {
            row_ptr[row + 1] += 1;
        }
        for i in 0..nrows {
            row_ptr[i + 1] += row_ptr[i];
        }

        let (_, col_indices, values, _) = coo_sorted.into_parts();
        Self::new(row_ptr, col_indices, values, (nrows, ncols))
    }

    /// Convert to COO format (row-major order)
    pub fn to_coo(&self) -> CooMatrix<T> {
        let mut rows = Vec::with_capacity(self.nnz());
        for row in 0..self.nrows() {
            rows.extend(std::iter::repeat(row).take(self.row_ptr[row + 1] - self.row_ptr[row]));
        }
        CooMatrix::from_parts_unchecked(
            rows,
            self.col_indices.clone(),
            self.values.clone(),
            self.shape,
        )
    }

    /// Convert to dense matrix
    pub fn to_dense(&self) -> Array2<T> {
        let mut dense = Array2::zeros(self.shape);
        for row in 0..self.nrows() {
            for idx in self.row_ptr[row]..self.row_ptr[row + 1] {
                let col = self.col_indices[idx];
                dense[[row, col]] = dense[[row, col]] + self.values[idx];
            }
        }
        dense
    }

    /// Sparse matrix-vector product: `y = A * x`
    ///
    /// # Examples
    ///
    /// ```
    /// use dia_sparse::csr::CsrMatrix;
    /// use scirs2_core::ndarray_ext::array;
    ///
    /// // Matrix: [1 0 2]
    /// //         [0 3 0]
    /// let csr = CsrMatrix::new(vec![0, 2, 3], vec![0, 2, 1], vec![1.0, 2.0, 3.0], (2, 3)).unwrap();
    ///
    /// let x = array![1.0, 2.0, 3.0];
    /// let y = csr.spmv(&x.view()).unwrap();
    /// assert_eq!(y[0], 7.0);  // 1*1 + 2*3
    /// assert_eq!(y[1], 6.0);  // 3*2
    /// ```
    pub fn spmv(&self, x: &ArrayView1<T>) -> Result<Array1<T>, CsrError> {
        if x.len() != self.ncols() {
            return Err(CsrError::ShapeMismatch {
                nrows: self.nrows(),
                ncols: self.ncols(),
                vec_len: x.len(),
            });
        }

        let mut y = Array1::<T>::zeros(self.nrows());
        for row in 0..self.nrows() {
            let mut sum = T::zero();
            for idx in self.row_ptr[row]..self.row_ptr[row + 1] {
                sum = sum + self.values[idx] * x[self.col_indices[idx]];
            }
            y[row] = sum;
        }

        Ok(y)
    }

    /// Sparse × dense product: `C = A * B`
    ///
    /// # Errors
    ///
    /// Returns error if A.ncols != B.nrows
    pub fn spmm(&self, b: &ArrayView2<T>) -> Result<Array2<T>, CsrError> {
        let (b_rows, b_cols) = b.dim();
        if self.ncols() != b_rows {
            return Err(CsrError::MatrixShapeMismatch {
                m1: self.nrows(),
                n1: self.ncols(),
                m2: b_rows,
                n2: b_cols,
            });
        }

        let mut c = Array2::<T>::zeros((self.nrows(), b_cols));
        for row in 0..self.nrows() {
            for idx in self.row_ptr[row]..self.row_ptr[row + 1] {
                let a_val = self.values[idx];
                let b_row = b.row(self.col_indices[idx]);
                for (k, &b_val) in b_row.iter().enumerate() {
                    c[[row, k]] = c[[row, k]] + a_val * b_val;
                }
            }
        }

        Ok(c)
    }

    /// Sparse × sparse product: `C = A * B`
    ///
    /// Row-by-row accumulation; entries that cancel to exactly zero are
    /// not stored.
    ///
    /// # Complexity
    ///
    /// Time: O(m × nnz_per_row_A × nnz_per_row_B × log(nnz_per_row_C))
    pub fn spspmm(&self, b: &CsrMatrix<T>) -> Result<CsrMatrix<T>, CsrError> {
        if self.ncols() != b.nrows() {
            return Err(CsrError::MatrixShapeMismatch {
                m1: self.nrows(),
                n1: self.ncols(),
                m2: b.nrows(),
                n2: b.ncols(),
            });
        }

        let m = self.nrows();
        let k = b.ncols();

        let mut result_row_ptr = Vec::with_capacity(m + 1);
        result_row_ptr.push(0);
        let mut result_col_indices = Vec::new();
        let mut result_values = Vec::new();

        for i in 0..m {
            let mut row_map: BTreeMap<usize, T> = BTreeMap::new();

            for a_idx in self.row_ptr[i]..self.row_ptr[i + 1] {
                let j = self.col_indices[a_idx];
                let a_val = self.values[a_idx];

                for b_idx in b.row_ptr[j]..b.row_ptr[j + 1] {
                    let entry = row_map.entry(b.col_indices[b_idx]).or_insert(T::zero());
                    *entry = *entry + a_val * b.values[b_idx];
                }
            }

            for (col, val) in row_map {
                if val != T::zero() {
                    result_col_indices.push(col);
                    result_values.push(val);
                }
            }
            result_row_ptr.push(result_col_indices.len());
        }

        CsrMatrix::new(result_row_ptr, result_col_indices, result_values, (m, k))
    }
}

impl<T: Float> SparseMatrix<T> for CsrMatrix<T> {
    fn format(&self) -> SparseFormat {
        SparseFormat::Csr
    }

    fn shape(&self) -> (usize, usize) {
        self.shape
    }

    fn nnz(&self) -> usize {
        self.values.len()
    }

    fn to_coo(&self) -> CooMatrix<T> {
        CsrMatrix::to_coo(self)
    }
}
