//! Conversion between linear indices and multi-indices.
//!
//! All conversions use row-major ordering: the first axis is the most significant and the last
//! axis varies fastest. For vector-valued spaces, a component index is appended as the fastest
//! varying position of all.

/// Decompose a linear index into a multi-index for an array with dimensions `dims`.
///
/// The result is only meaningful if `linear < dims.iter().product()`.
pub fn decode<const D: usize>(linear: usize, dims: &[usize; D]) -> [usize; D] {
    let mut multi = [0; D];
    let mut remainder = linear;
    for k in (0..D).rev() {
        multi[k] = remainder % dims[k];
        remainder /= dims[k];
    }
    multi
}

/// The inverse of [`decode`].
pub fn encode<const D: usize>(multi: &[usize; D], dims: &[usize; D]) -> usize {
    multi
        .iter()
        .zip(dims)
        .fold(0, |linear, (&i, &n)| linear * n + i)
}

/// Decompose a linear index of a vector-valued space into a multi-index and a component.
///
/// The component is the fastest varying position, so it is taken modulo `num_components`
/// before the remaining index is decomposed into the axis indices.
pub fn decode_with_component<const D: usize>(
    linear: usize,
    dims: &[usize; D],
    num_components: usize,
) -> ([usize; D], usize) {
    let component = linear % num_components;
    (decode(linear / num_components, dims), component)
}

/// The inverse of [`decode_with_component`].
pub fn encode_with_component<const D: usize>(
    multi: &[usize; D],
    component: usize,
    dims: &[usize; D],
    num_components: usize,
) -> usize {
    encode(multi, dims) * num_components + component
}

/// Step `index` to its successor in row-major order within the box `[lower, upper)`.
///
/// Returns `false` exactly when `index` was the last index of the box, in which case `index`
/// is left reset to `lower`.
pub fn advance<const D: usize>(index: &mut [usize; D], lower: &[usize; D], upper: &[usize; D]) -> bool {
    for k in (0..D).rev() {
        index[k] += 1;
        if index[k] < upper[k] {
            return true;
        }
        index[k] = lower[k];
    }
    false
}

/// Iterator over all multi-indices in the box `[lower, upper)`, in row-major order.
#[derive(Debug, Clone)]
pub struct MultiIndexIter<const D: usize> {
    current: Option<[usize; D]>,
    lower: [usize; D],
    upper: [usize; D],
}

impl<const D: usize> MultiIndexIter<D> {
    pub fn new(lower: [usize; D], upper: [usize; D]) -> Self {
        let is_empty = lower.iter().zip(&upper).any(|(l, u)| l >= u);
        Self {
            current: (!is_empty).then_some(lower),
            lower,
            upper,
        }
    }

    /// All multi-indices of an array with the given dimensions.
    pub fn from_dims(dims: [usize; D]) -> Self {
        Self::new([0; D], dims)
    }
}

impl<const D: usize> Iterator for MultiIndexIter<D> {
    type Item = [usize; D];

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;
        let mut next = current;
        self.current = advance(&mut next, &self.lower, &self.upper).then_some(next);
        Some(current)
    }
}
