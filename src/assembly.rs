//! Assembly of entries, vectors, matrices and pattern-restricted tensors.
//!
//! An [`Assembler`] combines an immutable [`AssemblerState`] with an [`EntryEvaluator`] and a
//! [`WorkerPool`]. Scalar and vector-valued forms go through the same code paths: every entry
//! evaluation produces a block of `test components x trial components` values, which is `1 x 1`
//! for scalar forms.
//!
//! Calls that do not apply to the arity of the state (for example, asking a linear functional
//! for a matrix entry) are not errors: they yield zero or empty results, so that generic code can
//! query an assembler without knowing the form.
use crate::error::AssemblyError;
use crate::index::{decode_with_component, encode_with_component, MultiIndexIter};
use crate::pool::WorkerPool;
use crate::state::{Arity, AssemblerState};
use crate::Real;
use log::debug;
use nalgebra::{DMatrix, DVector, Scalar};

mod evaluator;
mod generator;
pub mod operators;
mod parallel;

pub use evaluator::*;
pub use generator::EntryGenerator;

#[derive(Debug, Clone)]
pub struct Assembler<T: Scalar, const D: usize, E> {
    state: AssemblerState<T, D>,
    evaluator: E,
    pool: WorkerPool,
}

impl<T, E, const D: usize> Assembler<T, D, E>
where
    T: Real,
    E: EntryEvaluator<T, D>,
{
    /// Create an assembler that partitions work for the global rayon pool.
    pub fn new(state: AssemblerState<T, D>, evaluator: E) -> Self {
        Self {
            state,
            evaluator,
            pool: WorkerPool::default(),
        }
    }

    pub fn with_pool(self, pool: WorkerPool) -> Self {
        Self { pool, ..self }
    }

    pub fn state(&self) -> &AssemblerState<T, D> {
        &self.state
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub fn arity(&self) -> Arity {
        self.state.arity()
    }

    fn test_components(&self) -> usize {
        self.state.test_space().num_components()
    }

    fn trial_components(&self) -> usize {
        self.state
            .trial_space()
            .map(|space| space.num_components())
            .unwrap_or(1)
    }

    /// Shape of the block produced by one evaluation, `(test components, trial components)`.
    ///
    /// Linear functionals have a single trial "component".
    pub fn block_shape(&self) -> (usize, usize) {
        (self.test_components(), self.trial_components())
    }

    /// Entry `i` of a linear functional.
    ///
    /// `i` is a linear index over the test space, with the component varying fastest.
    /// Returns zero if the state does not describe a linear functional.
    pub fn linear_entry(&self, i: usize) -> Result<T, AssemblyError> {
        if self.arity() != Arity::Linear {
            return Ok(T::zero());
        }
        let test = self.state.test_space();
        check_index(i, test.num_dofs())?;
        let (multi, a) = decode_with_component(i, &test.dims(), test.num_components());
        if test.num_components() == 1 {
            self.evaluator.linear_entry(&self.state, &multi)
        } else {
            let mut block = vec![T::zero(); test.num_components()];
            self.evaluator.linear_block(&self.state, &multi, &mut block)?;
            Ok(block[a])
        }
    }

    /// Entry `(i, j)` of a bilinear form.
    ///
    /// `i` indexes the test space and `j` the trial space, each as a linear index with the
    /// component varying fastest. Returns zero if the state does not describe a bilinear form.
    pub fn bilinear_entry(&self, i: usize, j: usize) -> Result<T, AssemblyError> {
        let trial = match (self.arity(), self.state.trial_space()) {
            (Arity::Bilinear, Some(trial)) => trial,
            _ => return Ok(T::zero()),
        };
        let test = self.state.test_space();
        check_index(i, test.num_dofs())?;
        check_index(j, trial.num_dofs())?;
        let (m, n) = self.block_shape();
        let (row, a) = decode_with_component(i, &test.dims(), m);
        let (col, b) = decode_with_component(j, &trial.dims(), n);
        if m * n == 1 {
            self.evaluator.bilinear_entry(&self.state, &row, &col)
        } else {
            let mut block = vec![T::zero(); m * n];
            self.evaluator
                .bilinear_block(&self.state, &row, &col, &mut block)?;
            Ok(block[a * n + b])
        }
    }

    /// Evaluate an arbitrary list of linear functional entries.
    ///
    /// The list is split into contiguous chunks, one per worker. Returns zeros if the state does
    /// not describe a linear functional.
    pub fn linear_entries(&self, indices: &[usize]) -> Result<Vec<T>, AssemblyError> {
        let mut entries = vec![T::zero(); indices.len()];
        if self.arity() == Arity::Linear {
            self.pool
                .for_each_chunk(indices, &mut entries, |&i, entry| {
                    *entry = self.linear_entry(i)?;
                    Ok(())
                })?;
        }
        Ok(entries)
    }

    /// Evaluate an arbitrary list of `(row, column)` entries of a bilinear form.
    ///
    /// The list is split into contiguous chunks, one per worker. Returns zeros if the state does
    /// not describe a bilinear form.
    pub fn bilinear_entries(&self, indices: &[(usize, usize)]) -> Result<Vec<T>, AssemblyError> {
        let mut entries = vec![T::zero(); indices.len()];
        if self.arity() == Arity::Bilinear {
            self.pool
                .for_each_chunk(indices, &mut entries, |&(i, j), entry| {
                    *entry = self.bilinear_entry(i, j)?;
                    Ok(())
                })?;
        }
        Ok(entries)
    }

    /// Assemble the full vector of a linear functional.
    ///
    /// Every test function is visited in row-major order, so this is only suitable for
    /// moderately sized spaces. Returns an empty vector if the state does not describe a
    /// linear functional.
    pub fn assemble_vector(&self) -> Result<DVector<T>, AssemblyError> {
        if self.arity() != Arity::Linear {
            return Ok(DVector::zeros(0));
        }
        let test = self.state.test_space();
        let m = test.num_components();
        debug!(
            "Assembling dense vector with {} entries ({} components)",
            test.num_dofs(),
            m
        );
        let mut entries = Vec::with_capacity(test.num_dofs());
        let mut block = vec![T::zero(); m];
        for i in MultiIndexIter::from_dims(test.dims()) {
            self.evaluator.linear_block(&self.state, &i, &mut block)?;
            entries.extend_from_slice(&block);
        }
        Ok(DVector::from_vec(entries))
    }

    /// Assemble the full matrix of a bilinear form, including structural zeros.
    ///
    /// This evaluates every combination of test and trial functions and is intended as a
    /// reference for the pattern-restricted [`assemble_tensor`](Self::assemble_tensor).
    /// Returns an empty matrix if the state does not describe a bilinear form.
    pub fn assemble_matrix(&self) -> Result<DMatrix<T>, AssemblyError> {
        let trial = match (self.arity(), self.state.trial_space()) {
            (Arity::Bilinear, Some(trial)) => trial,
            _ => return Ok(DMatrix::zeros(0, 0)),
        };
        let test = self.state.test_space();
        let (m, n) = self.block_shape();
        let (test_dims, trial_dims) = (test.dims(), trial.dims());
        debug!(
            "Assembling dense {}x{} matrix",
            test.num_dofs(),
            trial.num_dofs()
        );
        let mut matrix = DMatrix::zeros(test.num_dofs(), trial.num_dofs());
        let mut block = vec![T::zero(); m * n];
        for row in MultiIndexIter::from_dims(test_dims) {
            for col in MultiIndexIter::from_dims(trial_dims) {
                self.evaluator
                    .bilinear_block(&self.state, &row, &col, &mut block)?;
                for a in 0..m {
                    for b in 0..n {
                        let i = encode_with_component(&row, a, &test_dims, m);
                        let j = encode_with_component(&col, b, &trial_dims, n);
                        matrix[(i, j)] = block[a * n + b];
                    }
                }
            }
        }
        Ok(matrix)
    }
}

fn check_index(index: usize, len: usize) -> Result<(), AssemblyError> {
    if index < len {
        Ok(())
    } else {
        Err(AssemblyError::IndexOutOfBounds { index, len })
    }
}
