use ndarray::{s, Array2, ArrayView1};
use num_complex::Complex64;

/// Builds memory-polynomial design matrices.
pub struct BasisHelper;

impl BasisHelper {
    /// Number of odd-order branches retained for `order` (1, 3, ..., order).
    pub fn num_branches(order: usize) -> usize {
        (order + 1) / 2
    }

    pub fn num_coeffs(order: usize, memory_depth: usize) -> usize {
        Self::num_branches(order) * memory_depth
    }

    /// Design matrix of shape `[signal.len(), num_coeffs]`.
    ///
    /// Branch `p` is `x * |x|^(p-1)`; tap `t` of that branch is the branch
    /// delayed by `t * memory_stride` samples with zeros shifted in at the
    /// head. Columns run branch-major, tap-minor, matching the row-major
    /// flattening of a `[num_branches, memory_depth]` coefficient table.
    pub fn build(
        signal: ArrayView1<'_, Complex64>,
        order: usize,
        memory_depth: usize,
        memory_stride: usize,
    ) -> Array2<Complex64> {
        let len = signal.len();
        let mut basis = Array2::<Complex64>::zeros((len, Self::num_coeffs(order, memory_depth)));

        let mut column = 0;
        for power in (1..=order).step_by(2) {
            let exponent = (power - 1) as i32;
            let branch = signal.mapv(|sample| sample * sample.norm().powi(exponent));
            for tap in 0..memory_depth {
                let delay = tap.saturating_mul(memory_stride);
                if delay < len {
                    basis
                        .slice_mut(s![delay.., column])
                        .assign(&branch.slice(s![..len - delay]));
                }
                column += 1;
            }
        }

        basis
    }
}
