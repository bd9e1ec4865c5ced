//! # dia-sparse
//!
//! Diagonal-storage (DIA) sparse matrices.
//!
//! This crate provides:
//! - DIA format: construction from shapes, explicit diagonals, dense arrays
//!   and other sparse layouts
//! - Structural nonzero counting
//! - Diagonal-kernel products with vectors and dense matrices
//! - Sparse × sparse products through CSR
//! - Coordinate export and conversion to COO/CSR/CSC
//! - `tracing` instrumentation with an optional subscriber setup
//!
//! # Example
//!
//! ```
//! use dia_sparse::{DiaMatrix, DiaSource};
//! use scirs2_core::ndarray_ext::array;
//!
//! let dense = array![[2.0, -1.0, 0.0], [-1.0, 2.0, -1.0], [0.0, -1.0, 2.0]];
//! let dia = DiaMatrix::from_source(DiaSource::Dense(dense.view().into_dyn())).unwrap();
//!
//! assert_eq!(dia.offsets(), &[-1, 0, 1]);
//! assert_eq!(dia.matvec(&array![1.0, 1.0, 1.0].view()).unwrap(), array![1.0, 0.0, 1.0]);
//! ```

#![deny(warnings)]

pub mod config;
pub mod coo;
pub mod csc;
pub mod csr;
pub mod dia;
pub mod error;
pub mod format;
pub mod tracing_support;

// Re-exports
pub use config::*;
pub use coo::*;
pub use csc::*;
pub use csr::*;
pub use dia::*;
pub use error::*;
pub use format::*;
