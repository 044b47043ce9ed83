use crate::error::{AssemblyError, EntryKind};
use crate::state::AssemblerState;
use nalgebra::Scalar;

/// Computes individual entries of a discretized form.
///
/// Indices are per-axis multi-indices: `i` always refers to the test space (rows) and `j` to the
/// trial space (columns). Implementations must be pure functions of their arguments, since the
/// assemblers call them concurrently from several threads without any synchronization.
///
/// Every method has a default implementation that reports
/// [`AssemblyError::EntryNotImplemented`], so an evaluator only implements what its form supports.
/// The block methods are used for vector-valued spaces; their defaults delegate to the scalar
/// methods when the block has a single entry.
pub trait EntryEvaluator<T: Scalar, const D: usize>: Sync {
    fn linear_entry(&self, _state: &AssemblerState<T, D>, _i: &[usize; D]) -> Result<T, AssemblyError> {
        Err(AssemblyError::EntryNotImplemented(EntryKind::Linear))
    }

    fn bilinear_entry(
        &self,
        _state: &AssemblerState<T, D>,
        _i: &[usize; D],
        _j: &[usize; D],
    ) -> Result<T, AssemblyError> {
        Err(AssemblyError::EntryNotImplemented(EntryKind::Bilinear))
    }

    /// Populate the entries of all test components of function `i`.
    fn linear_block(&self, state: &AssemblerState<T, D>, i: &[usize; D], block: &mut [T]) -> Result<(), AssemblyError> {
        match block {
            [entry] => {
                *entry = self.linear_entry(state, i)?;
                Ok(())
            }
            _ => Err(AssemblyError::EntryNotImplemented(EntryKind::LinearBlock)),
        }
    }

    /// Populate the `test components x trial components` block, stored row-major.
    fn bilinear_block(
        &self,
        state: &AssemblerState<T, D>,
        i: &[usize; D],
        j: &[usize; D],
        block: &mut [T],
    ) -> Result<(), AssemblyError> {
        match block {
            [entry] => {
                *entry = self.bilinear_entry(state, i, j)?;
                Ok(())
            }
            _ => Err(AssemblyError::EntryNotImplemented(EntryKind::BilinearBlock)),
        }
    }
}

impl<'a, T, E, const D: usize> EntryEvaluator<T, D> for &'a E
where
    T: Scalar,
    E: ?Sized + EntryEvaluator<T, D>,
{
    fn linear_entry(&self, state: &AssemblerState<T, D>, i: &[usize; D]) -> Result<T, AssemblyError> {
        (**self).linear_entry(state, i)
    }

    fn bilinear_entry(&self, state: &AssemblerState<T, D>, i: &[usize; D], j: &[usize; D]) -> Result<T, AssemblyError> {
        (**self).bilinear_entry(state, i, j)
    }

    fn linear_block(&self, state: &AssemblerState<T, D>, i: &[usize; D], block: &mut [T]) -> Result<(), AssemblyError> {
        (**self).linear_block(state, i, block)
    }

    fn bilinear_block(
        &self,
        state: &AssemblerState<T, D>,
        i: &[usize; D],
        j: &[usize; D],
        block: &mut [T],
    ) -> Result<(), AssemblyError> {
        (**self).bilinear_block(state, i, j, block)
    }
}

/// A linear functional defined by a closure `f(state, i)`.
#[derive(Debug, Clone, Copy)]
pub struct FnLinear<F>(pub F);

/// A bilinear form defined by a closure `f(state, i, j)`.
#[derive(Debug, Clone, Copy)]
pub struct FnBilinear<F>(pub F);

/// A vector-valued bilinear form defined by a closure `f(state, i, j, block)`.
#[derive(Debug, Clone, Copy)]
pub struct FnBilinearBlock<F>(pub F);

impl<T, F, const D: usize> EntryEvaluator<T, D> for FnLinear<F>
where
    T: Scalar,
    F: Sync + Fn(&AssemblerState<T, D>, &[usize; D]) -> T,
{
    fn linear_entry(&self, state: &AssemblerState<T, D>, i: &[usize; D]) -> Result<T, AssemblyError> {
        Ok((self.0)(state, i))
    }
}

impl<T, F, const D: usize> EntryEvaluator<T, D> for FnBilinear<F>
where
    T: Scalar,
    F: Sync + Fn(&AssemblerState<T, D>, &[usize; D], &[usize; D]) -> T,
{
    fn bilinear_entry(&self, state: &AssemblerState<T, D>, i: &[usize; D], j: &[usize; D]) -> Result<T, AssemblyError> {
        Ok((self.0)(state, i, j))
    }
}

impl<T, F, const D: usize> EntryEvaluator<T, D> for FnBilinearBlock<F>
where
    T: Scalar,
    F: Sync + Fn(&AssemblerState<T, D>, &[usize; D], &[usize; D], &mut [T]),
{
    fn bilinear_block(
        &self,
        state: &AssemblerState<T, D>,
        i: &[usize; D],
        j: &[usize; D],
        block: &mut [T],
    ) -> Result<(), AssemblyError> {
        (self.0)(state, i, j, block);
        Ok(())
    }
}
