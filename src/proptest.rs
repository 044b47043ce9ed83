//! Strategies for property-based testing of assembly code.
use crate::pattern::{AxisPattern, TensorPattern};
use ::proptest::collection::vec;
use ::proptest::prelude::*;
use ::proptest::sample::subsequence;
use itertools::iproduct;

/// An arbitrary axis pattern with up to `max_rows` rows and `max_cols` columns.
///
/// Pairs appear at most once and in row-major order.
pub fn axis_pattern(max_rows: usize, max_cols: usize) -> impl Strategy<Value = AxisPattern> {
    (1..=max_rows.max(1), 1..=max_cols.max(1))
        .prop_flat_map(|(num_rows, num_cols)| {
            let pairs: Vec<_> = iproduct!(0..num_rows, 0..num_cols).collect();
            let len = pairs.len();
            (Just(num_rows), Just(num_cols), subsequence(pairs, 0..=len))
        })
        .prop_filter_map("pairs must be in bounds", |(num_rows, num_cols, pairs)| {
            AxisPattern::try_from_pairs(num_rows, num_cols, pairs).ok()
        })
}

/// An arbitrary symmetric axis pattern over `2 ..= max_dofs` degrees of freedom.
///
/// Pairs are shuffled, so that the transposed pair of a position may be found anywhere in the
/// pattern.
pub fn symmetric_axis_pattern(max_dofs: usize) -> impl Strategy<Value = AxisPattern> {
    (2..=max_dofs.max(2))
        .prop_flat_map(|n| {
            let lower: Vec<_> = (0..n)
                .flat_map(|row| (0..=row).map(move |col| (row, col)))
                .collect();
            let len = lower.len();
            (Just(n), subsequence(lower, 0..=len))
        })
        .prop_flat_map(|(n, lower)| {
            let mut pairs = Vec::with_capacity(2 * lower.len());
            for (row, col) in lower {
                pairs.push((row, col));
                if row != col {
                    pairs.push((col, row));
                }
            }
            (Just(n), Just(pairs).prop_shuffle())
        })
        .prop_filter_map("pairs must be in bounds", |(n, pairs)| {
            AxisPattern::try_from_pairs(n, n, pairs).ok()
        })
}

/// A tensor pattern with a symmetric pattern on each of its `D` axes.
pub fn symmetric_tensor_pattern<const D: usize>(max_dofs: usize) -> impl Strategy<Value = TensorPattern<D>> {
    vec(symmetric_axis_pattern(max_dofs), D)
        .prop_map(|axes| TensorPattern::new(std::array::from_fn(|d| axes[d].clone())))
}
