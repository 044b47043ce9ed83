//! paradis
//! =======
//!
//! Parallel access to disjoint, possibly scattered, records of a collection.
//!
//! Safe Rust lets threads split a slice into *contiguous* mutable pieces, but many assembly
//! algorithms write to scattered locations that are known to be disjoint only by construction
//! (for example, a cell and its mirror image under a fixed involution). This crate provides the
//! minimal unsafe vocabulary for such algorithms, so that the pointer arithmetic lives in one place.

pub mod slice;

pub use slice::ParallelSliceAccess;

/// An indexed collection that exposes parallel indexed access to its contents.
///
/// Creating an access requires a mutable borrow of the collection, so the creator is guaranteed
/// to hold the only parallel access for as long as the access lives.
///
/// # Examples
///
/// Double every number, handling even and odd positions on two different rayon tasks:
///
/// ```rust
/// use fenris_paradis::ParallelIndexedCollection;
///
/// fn par_double_all_numbers(numbers: &mut [i32]) {
///     let n = numbers.len();
///     let access = unsafe { numbers.create_access() };
///     rayon::join(
///         || {
///             for i in (0..n).step_by(2) {
///                 unsafe { access.block_mut(i, 1)[0] *= 2; }
///             }
///         },
///         || {
///             for i in (1..n).step_by(2) {
///                 unsafe { access.block_mut(i, 1)[0] *= 2; }
///             }
///         },
///     );
/// }
///
/// let mut numbers = [0, 1, 2, 3, 4, 5, 6, 7];
/// par_double_all_numbers(&mut numbers);
/// assert_eq!(numbers, [0, 2, 4, 6, 8, 10, 12, 14]);
/// ```
///
/// # Safety
///
/// This trait is unsafe because the soundness of consuming code relies on the correctness of
/// the implementation of [`ParallelIndexedCollection::len`].
/// Consumers of this trait are permitted to access records
/// (accessed through [`ParallelIndexedCollection::Access`]) with indices `[0, len)`. Therefore,
/// an incorrect length may lead to unsoundness.
pub unsafe trait ParallelIndexedCollection<'a> {
    type Access;

    unsafe fn create_access(&'a mut self) -> Self::Access;
    fn len(&self) -> usize;
}
