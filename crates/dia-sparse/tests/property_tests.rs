//! Property-based tests for the DIA format
//!
//! These tests use proptest to check counting, export and multiplication
//! against a dense baseline built independently from the element mapping.

use dia_sparse::{CooMatrix, CopyMode, DiaError, DiaMatrix, DiaSource, SparseError, StructureError};
use proptest::prelude::*;
use scirs2_core::ndarray_ext::{array, Array1, Array2};

// ============================================================================
// Test Utilities
// ============================================================================

type DiaParts = (Array2<f64>, Vec<isize>, (usize, usize));

/// Random shape, unique (possibly out-of-range) offsets and a strip whose
/// width may be shorter or longer than the column count.
fn dia_strategy() -> impl Strategy<Value = DiaParts> {
    (1usize..8, 1usize..8)
        .prop_flat_map(|(m, n)| {
            (
                prop::collection::btree_set(-10isize..10, 0..6),
                0usize..10,
                Just((m, n)),
            )
        })
        .prop_flat_map(|(offsets, strip_len, shape)| {
            let offsets: Vec<isize> = offsets.into_iter().collect();
            let k = offsets.len();
            (
                prop::collection::vec(-100.0..100.0f64, k * strip_len..=k * strip_len),
                Just(offsets),
                Just(strip_len),
                Just(shape),
            )
        })
        .prop_map(|(values, offsets, strip_len, shape)| {
            let data = Array2::from_shape_vec((offsets.len(), strip_len), values)
                .expect("strategy produces matching lengths");
            (data, offsets, shape)
        })
}

/// Dense reference straight from the element mapping
fn reference_dense(data: &Array2<f64>, offsets: &[isize], shape: (usize, usize)) -> Array2<f64> {
    let mut dense = Array2::zeros(shape);
    for (i, &k) in offsets.iter().enumerate() {
        for c in 0..data.ncols() {
            let r = c as isize - k;
            if r >= 0 && (r as usize) < shape.0 && c < shape.1 {
                dense[[r as usize, c]] = data[[i, c]];
            }
        }
    }
    dense
}

fn vector_strategy(len: usize) -> impl Strategy<Value = Array1<f64>> {
    prop::collection::vec(-10.0..10.0f64, len..=len).prop_map(Array1::from_vec)
}

fn assert_close(a: &Array2<f64>, b: &Array2<f64>) -> Result<(), TestCaseError> {
    prop_assert_eq!(a.dim(), b.dim());
    for (x, y) in a.iter().zip(b.iter()) {
        prop_assert!((x - y).abs() < 1e-9, "{} != {}", x, y);
    }
    Ok(())
}

// ============================================================================
// Export and Counting Properties
// ============================================================================

proptest! {
    /// Property: coordinate export densifies to the element-mapping baseline
    #[test]
    fn prop_coo_export_matches_reference((data, offsets, shape) in dia_strategy()) {
        let expected = reference_dense(&data, &offsets, shape);
        let dia = DiaMatrix::new(data, offsets, shape).unwrap();

        prop_assert_eq!(dia.to_coo().to_dense(), expected.clone());
        prop_assert_eq!(dia.to_dense(), expected);
    }

    /// Property: every exported coordinate lies inside the shape and on its diagonal
    #[test]
    fn prop_coo_export_in_bounds((data, offsets, shape) in dia_strategy()) {
        let dia = DiaMatrix::new(data, offsets.clone(), shape).unwrap();
        for (row, col, _) in dia.to_coo().iter() {
            prop_assert!(row < shape.0 && col < shape.1);
            prop_assert!(offsets.contains(&(col as isize - row as isize)));
        }
    }

    /// Property: stored count equals the export length and never exceeds the ideal count
    #[test]
    fn prop_stored_nnz_bounds((data, offsets, shape) in dia_strategy()) {
        let dia = DiaMatrix::new(data, offsets, shape).unwrap();
        prop_assert_eq!(dia.stored_nnz(), dia.to_coo().nnz());
        prop_assert!(dia.stored_nnz() <= dia.nnz());
    }

    /// Property: with a full-width strip the ideal and stored counts agree
    #[test]
    fn prop_full_strip_counts_agree((_, offsets, shape) in dia_strategy()) {
        let wide = Array2::from_elem((offsets.len(), shape.1), 1.0);
        let dia = DiaMatrix::new(wide, offsets, shape).unwrap();
        prop_assert_eq!(dia.nnz(), dia.stored_nnz());
    }
}

// ============================================================================
// Multiplication Properties
// ============================================================================

proptest! {
    /// Property: matvec agrees with the dense product
    #[test]
    fn prop_matvec_matches_dense(
        ((data, offsets, shape), x) in dia_strategy()
            .prop_flat_map(|parts| {
                let n = (parts.2).1;
                (Just(parts), vector_strategy(n))
            })
    ) {
        let expected = reference_dense(&data, &offsets, shape).dot(&x);
        let dia = DiaMatrix::new(data, offsets, shape).unwrap();
        let y = dia.matvec(&x.view()).unwrap();

        prop_assert_eq!(y.len(), shape.0);
        for (a, b) in y.iter().zip(expected.iter()) {
            prop_assert!((a - b).abs() < 1e-9);
        }
    }

    /// Property: matmat agrees with the dense product column by column
    #[test]
    fn prop_matmat_matches_dense(
        (data, offsets, shape) in dia_strategy(),
        p in 1usize..4,
    ) {
        let x = Array2::from_shape_fn((shape.1, p), |(i, j)| (i * p + j) as f64 - 3.0);
        let expected = reference_dense(&data, &offsets, shape).dot(&x);
        let dia = DiaMatrix::new(data, offsets, shape).unwrap();

        assert_close(&dia.matmat(&x.view()).unwrap(), &expected)?;
    }

    /// Property: a wrong operand length is always a dimension mismatch
    #[test]
    fn prop_matvec_rejects_wrong_length(
        (data, offsets, shape) in dia_strategy(),
        extra in 1usize..3,
    ) {
        let dia = DiaMatrix::new(data, offsets, shape).unwrap();
        let x = Array1::<f64>::zeros(shape.1 + extra);
        let is_mismatch = matches!(
            dia.matvec(&x.view()),
            Err(SparseError::Dia(DiaError::DimensionMismatch { .. }))
        );
        prop_assert!(is_mismatch);
    }

    /// Property: transposing in DIA matches the dense transpose
    #[test]
    fn prop_transpose_matches_dense((data, offsets, shape) in dia_strategy()) {
        let dia = DiaMatrix::new(data, offsets, shape).unwrap();
        prop_assert_eq!(dia.transpose().to_dense(), dia.to_dense().t().to_owned());
    }
}

// ============================================================================
// Construction Properties
// ============================================================================

proptest! {
    /// Property: any repeated offset is rejected
    #[test]
    fn prop_duplicate_offsets_rejected(
        mut offsets in prop::collection::vec(-5isize..5, 1..5),
        repeat in any::<prop::sample::Index>(),
    ) {
        let repeated = offsets[repeat.index(offsets.len())];
        offsets.push(repeated);

        let data = Array2::<f64>::zeros((offsets.len(), 3));
        let is_duplicate = matches!(
            DiaMatrix::new(data, offsets, (3, 3)),
            Err(SparseError::Dia(DiaError::MalformedStructure(
                StructureError::DuplicateOffset { .. }
            )))
        );
        prop_assert!(is_duplicate);
    }

    /// Property: dense → DIA reproduces the dense matrix
    #[test]
    fn prop_dense_roundtrip(
        values in prop::collection::vec(prop_oneof![Just(0.0), -5.0..5.0f64], 12..=12),
    ) {
        let dense = Array2::from_shape_vec((3, 4), values).unwrap();
        let dia = DiaMatrix::from_source(DiaSource::Dense(dense.view().into_dyn())).unwrap();

        prop_assert_eq!(dia.to_dense(), dense);
        let mut sorted = dia.offsets().to_vec();
        sorted.sort_unstable();
        prop_assert_eq!(dia.offsets(), sorted.as_slice());
    }

    /// Property: rebuilding from a DIA matrix's own coordinates is lossless
    #[test]
    fn prop_sparse_source_roundtrip((data, offsets, shape) in dia_strategy()) {
        let dia = DiaMatrix::new(data, offsets, shape).unwrap();
        let csr = dia.to_csr().unwrap();
        let rebuilt = DiaMatrix::from_source(DiaSource::Sparse(&csr)).unwrap();
        prop_assert_eq!(rebuilt.to_dense(), dia.to_dense());
        prop_assert_eq!(rebuilt.shape(), dia.shape());
    }
}

// ============================================================================
// Fixed Scenarios
// ============================================================================

#[test]
fn test_scale_by_one_is_identity() {
    let data = array![[1.0, 2.0, 3.0, 4.0], [1.0, 2.0, 3.0, 4.0], [1.0, 2.0, 3.0, 4.0]];
    let dia = DiaMatrix::new(data, vec![0, -1, 2], (4, 4)).unwrap();
    let scaled = dia.scale(1.0);
    assert_eq!(scaled.data(), dia.data());
    assert_eq!(scaled.offsets(), dia.offsets());
}

#[test]
fn test_share_vs_duplicate_independence() {
    let data = array![[1.0, 2.0, 3.0]];
    let dia = DiaMatrix::new(data, vec![0], (3, 3)).unwrap();

    let shared = DiaMatrix::from_source(DiaSource::SameFormat(&dia, CopyMode::Share)).unwrap();
    let copied = DiaMatrix::from_source(DiaSource::SameFormat(&dia, CopyMode::Duplicate)).unwrap();
    assert!(shared.shares_buffers_with(&dia));
    assert!(!copied.shares_buffers_with(&dia));

    // replacing values on the shared handle leaves the original untouched
    let replaced = shared.with_data(array![[7.0, 8.0, 9.0]], CopyMode::Share).unwrap();
    assert_eq!(dia.data(), &array![[1.0, 2.0, 3.0]]);
    assert_eq!(replaced.offsets(), dia.offsets());
}

#[test]
fn test_coo_to_dia_sums_duplicates() {
    let coo = CooMatrix::new(vec![0, 0, 1], vec![1, 1, 0], vec![1.5, 2.5, 3.0], (2, 2)).unwrap();
    let dia = coo.to_dia().unwrap();
    assert_eq!(dia.to_dense(), array![[0.0, 4.0], [3.0, 0.0]]);
}
