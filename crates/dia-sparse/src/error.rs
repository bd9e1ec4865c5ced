//! Unified error types for sparse matrix operations
//!
//! Every storage format owns a format-specific error enum next to its type
//! (`DiaError` in [`crate::dia`], `CooError` in [`crate::coo`], ...). This
//! module ties them together under [`SparseError`] so that operations which
//! cross format boundaries (DIA × sparse, conversions) can use `?` freely.
//!
//! # Examples
//!
//! ```
//! use dia_sparse::error::SparseError;
//! use dia_sparse::dia::{DiaError, DiaMatrix};
//!
//! let err = DiaMatrix::<f64>::from_shape(&[3, 4, 5]).unwrap_err();
//! assert!(matches!(err, SparseError::Dia(DiaError::InvalidShape { .. })));
//! ```

use thiserror::Error;

/// Top-level error type for all sparse matrix operations
#[derive(Error, Debug)]
pub enum SparseError {
    /// DIA format errors
    #[error("DIA error: {0}")]
    Dia(#[from] crate::dia::DiaError),

    /// COO format errors
    #[error("COO error: {0}")]
    Coo(#[from] crate::coo::CooError),

    /// CSR format errors
    #[error("CSR error: {0}")]
    Csr(#[from] crate::csr::CsrError),

    /// CSC format errors
    #[error("CSC error: {0}")]
    Csc(#[from] crate::csc::CscError),

    /// Format conversion errors
    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),
}

/// Format conversion errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("Cannot represent value at data position ({row}, {col}) as {target}")]
    ElementCast {
        row: usize,
        col: usize,
        target: &'static str,
    },
}

/// Result type alias for sparse matrix operations
pub type SparseResult<T> = Result<T, SparseError>;

impl SparseError {
    /// Returns the DIA error, if this is one
    pub fn as_dia(&self) -> Option<&crate::dia::DiaError> {
        match self {
            SparseError::Dia(err) => Some(err),
            _ => None,
        }
    }
}
