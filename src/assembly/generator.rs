use super::{Assembler, EntryEvaluator};
use crate::error::AssemblyError;
use crate::pattern::TensorPattern;
use crate::state::Arity;
use crate::Real;

/// Ad hoc evaluation of single entries of a pattern-restricted tensor.
///
/// Algorithms that only sample a few entries of the tensor assembled by
/// [`Assembler::assemble_tensor`] (such as low-rank cross approximation) can use a generator
/// instead of assembling the full tensor. Indices follow [`EntryTensor::shape`]: one pattern
/// position per axis, followed by the block entry for vector forms.
///
/// [`EntryTensor::shape`]: crate::tensor::EntryTensor::shape
#[derive(Debug)]
pub struct EntryGenerator<'a, T: Real, const D: usize, E> {
    assembler: &'a Assembler<T, D, E>,
    pattern: &'a TensorPattern<D>,
}

impl<T, E, const D: usize> Assembler<T, D, E>
where
    T: Real,
    E: EntryEvaluator<T, D>,
{
    /// A generator for the entries of the tensor assembled on `pattern`.
    pub fn entry_generator<'a>(&'a self, pattern: &'a TensorPattern<D>) -> Result<EntryGenerator<'a, T, D, E>, AssemblyError> {
        if self.arity() == Arity::Bilinear {
            self.validate_pattern(pattern)?;
        }
        Ok(EntryGenerator {
            assembler: self,
            pattern,
        })
    }
}

impl<'a, T, E, const D: usize> EntryGenerator<'a, T, D, E>
where
    T: Real,
    E: EntryEvaluator<T, D>,
{
    pub fn shape(&self) -> Vec<usize> {
        let mut shape = self.pattern.shape().to_vec();
        let (m, n) = self.assembler.block_shape();
        if (m, n) != (1, 1) {
            shape.push(m * n);
        }
        shape
    }

    /// The entry at `index`.
    ///
    /// Returns zero if the assembler does not hold a bilinear form. An index with the wrong
    /// number of positions is reported as out of bounds, with the lengths taking the place of
    /// index and bound.
    pub fn entry(&self, index: &[usize]) -> Result<T, AssemblyError> {
        if self.assembler.arity() != Arity::Bilinear {
            return Ok(T::zero());
        }
        let shape = self.shape();
        if index.len() != shape.len() {
            return Err(AssemblyError::IndexOutOfBounds {
                index: index.len(),
                len: shape.len(),
            });
        }
        for (&i, &len) in index.iter().zip(&shape) {
            if i >= len {
                return Err(AssemblyError::IndexOutOfBounds { index: i, len });
            }
        }

        let rows: [usize; D] = std::array::from_fn(|d| self.pattern.axis(d).pairs()[index[d]].0);
        let cols: [usize; D] = std::array::from_fn(|d| self.pattern.axis(d).pairs()[index[d]].1);
        let (m, n) = self.assembler.block_shape();
        let state = self.assembler.state();
        let evaluator = self.assembler.evaluator();
        if m * n == 1 {
            evaluator.bilinear_entry(state, &rows, &cols)
        } else {
            let mut block = vec![T::zero(); m * n];
            evaluator.bilinear_block(state, &rows, &cols, &mut block)?;
            Ok(block[index[D]])
        }
    }

    /// Evaluate a list of entries on the worker pool of the assembler.
    pub fn entries(&self, indices: &[Vec<usize>]) -> Result<Vec<T>, AssemblyError> {
        let mut entries = vec![T::zero(); indices.len()];
        self.assembler
            .pool()
            .for_each_chunk(indices, &mut entries, |index, entry| {
                *entry = self.entry(index)?;
                Ok(())
            })?;
        Ok(entries)
    }

    /// Export the generator as an opaque callback.
    pub fn into_fn(self) -> impl Fn(&[usize]) -> Result<T, AssemblyError> + Sync + 'a {
        move |index| self.entry(index)
    }
}
