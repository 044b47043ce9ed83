use crate::ParallelIndexedCollection;
use std::marker::PhantomData;
use std::ops::Range;

/// Parallel access to the elements of a mutable slice.
///
/// Besides single records, the access hands out fixed-size *blocks*, which is the natural
/// unit for tensors whose cells carry several values.
#[derive(Copy)]
pub struct ParallelSliceAccess<'a, T> {
    ptr: *mut T,
    len: usize,
    marker: PhantomData<&'a mut T>,
}

impl<'a, T> ParallelSliceAccess<'a, T> {
    /// The length of the underlying slice.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Construct a subslice for the given range.
    ///
    /// # Safety
    ///
    /// The range must be valid for the slice.
    ///
    /// Multiple threads must not call this function with overlapping ranges without synchronization.
    pub unsafe fn subslice_mut(&self, range: Range<usize>) -> &'a mut [T] {
        let Range { start, end } = range;
        debug_assert!(end >= start);
        debug_assert!(end <= self.len);
        let ptr = self.ptr.add(start);
        let len = end - start;
        std::slice::from_raw_parts_mut(ptr, len)
    }

    /// The block with index `block_index` when the slice is viewed as consecutive blocks
    /// of length `block_len`.
    ///
    /// # Safety
    ///
    /// Same as [`subslice_mut`](Self::subslice_mut): the block must lie within the slice, and
    /// no two threads may hold the same block at the same time.
    pub unsafe fn block_mut(&self, block_index: usize, block_len: usize) -> &'a mut [T] {
        let start = block_index * block_len;
        self.subslice_mut(start..start + block_len)
    }
}

impl<'a, T> Clone for ParallelSliceAccess<'a, T> {
    fn clone(&self) -> Self {
        Self {
            ptr: self.ptr,
            len: self.len,
            marker: PhantomData,
        }
    }
}

unsafe impl<'a, T: Sync> Sync for ParallelSliceAccess<'a, T> {}
unsafe impl<'a, T: Send> Send for ParallelSliceAccess<'a, T> {}

unsafe impl<'a, T: 'a + Sync + Send> ParallelIndexedCollection<'a> for [T] {
    type Access = ParallelSliceAccess<'a, T>;

    unsafe fn create_access(&'a mut self) -> Self::Access {
        ParallelSliceAccess {
            ptr: self.as_mut_ptr(),
            len: <[T]>::len(self),
            marker: PhantomData,
        }
    }

    fn len(&self) -> usize {
        <[T]>::len(self)
    }
}
