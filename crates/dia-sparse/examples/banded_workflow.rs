//! Banded-matrix workflow example
//!
//! 1. Build a 1-D Poisson stencil directly from diagonals
//! 2. Apply it to a vector and a block of vectors
//! 3. Round-trip through coordinates and CSR
//! 4. Rebuild a DIA matrix from a dense array
//!
//! Run with `DIA_LOG_FORMAT=compact RUST_LOG=dia_sparse=debug` and the
//! `subscriber` feature to see the library's tracing output.

use anyhow::Result;
use dia_sparse::tracing_support::{init_tracing, TracingConfig};
use dia_sparse::{CopyMode, DiaMatrix, DiaSource, Operand};
use scirs2_core::ndarray_ext::{array, Array1, Array2};

fn main() -> Result<()> {
    init_tracing(TracingConfig::default())?;

    println!("=== DIA Banded Workflow ===\n");

    let n = 6;
    let poisson = poisson_1d(n)?;
    println!("1. Poisson stencil {:?}", poisson.shape());
    println!("   offsets:    {:?}", poisson.offsets());
    println!("   nnz:        {}", poisson.nnz());
    println!("   stored nnz: {}", poisson.stored_nnz());
    println!("   bandwidth:  {:?}\n", poisson.bandwidth());

    let ones = Array1::<f64>::ones(n);
    let y = poisson.matvec(&ones.view())?;
    println!("2. A · 1 = {}", y);

    let block = Array2::from_shape_fn((n, 2), |(i, j)| (i + j) as f64);
    let product = poisson
        .multiply(Operand::Matrix(block.view()))?
        .into_matrix()
        .unwrap_or_default();
    println!("   A · X =\n{}\n", product);

    let coo = poisson.to_coo();
    let csr = poisson.to_csr()?;
    println!("3. COO entries: {}, CSR entries: {}", coo.nnz(), csr.nnz());
    let rebuilt = DiaMatrix::from_source(DiaSource::Sparse(&csr))?;
    println!("   rebuilt from CSR matches: {}", rebuilt.to_dense() == poisson.to_dense());

    let shared = poisson.to_dia(CopyMode::Share);
    println!("   shared handle aliases buffers: {}\n", shared.shares_buffers_with(&poisson));

    let dense = array![[4.0, 1.0, 0.0], [0.0, 4.0, 1.0], [2.0, 0.0, 4.0]];
    let from_dense = DiaMatrix::from_source(DiaSource::Dense(dense.view().into_dyn()))?;
    println!("4. From dense: offsets {:?}", from_dense.offsets());
    println!("   transpose offsets {:?}", from_dense.transpose().offsets());

    Ok(())
}

/// Tridiagonal `[-1, 2, -1]` stencil of order `n`
fn poisson_1d(n: usize) -> Result<DiaMatrix<f64>> {
    let mut data = Array2::zeros((3, n));
    data.row_mut(0).fill(-1.0);
    data.row_mut(1).fill(2.0);
    data.row_mut(2).fill(-1.0);
    Ok(DiaMatrix::new(data, vec![-1, 0, 1], (n, n))?)
}
