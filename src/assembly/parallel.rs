//! Pattern-restricted assembly of entry tensors.
use super::{Assembler, EntryEvaluator};
use crate::error::AssemblyError;
use crate::pattern::{TensorPattern, TransposeMap};
use crate::state::{Arity, AssemblerState};
use crate::tensor::EntryTensor;
use crate::Real;
use fenris_paradis::slice::ParallelSliceAccess;
use fenris_paradis::ParallelIndexedCollection;
use log::debug;
use std::cmp::Ordering;

impl<T, E, const D: usize> Assembler<T, D, E>
where
    T: Real,
    E: EntryEvaluator<T, D>,
{
    /// Assemble the entries of a bilinear form on every cell of a tensor pattern.
    ///
    /// Cell `(p_0, ..., p_{D-1})` of the result holds the entry (or component block) for the
    /// test multi-index formed by the rows of `pattern.axis(d).pairs()[p_d]` and the trial
    /// multi-index formed by the columns. Positions of axis 0 are distributed over the workers of
    /// the pool; the remaining axes are traversed sequentially by each worker.
    ///
    /// If `transposes` is given, the form is assumed to be symmetric. The evaluator is then only
    /// called for cells whose first nonzero `col - row` difference (taken in axis order) is
    /// negative, and for cells on the diagonal. Every other cell receives a copy of its
    /// transposed partner, with the component block transposed for vector forms. The maps are
    /// checked against the pattern before any work is done, and a mismatch is reported as
    /// [`AssemblyError::Pattern`].
    ///
    /// Returns an empty tensor if the state does not describe a bilinear form.
    pub fn assemble_tensor(
        &self,
        pattern: &TensorPattern<D>,
        transposes: Option<&[TransposeMap; D]>,
    ) -> Result<EntryTensor<T>, AssemblyError> {
        if self.arity() != Arity::Bilinear {
            return Ok(EntryTensor::empty());
        }
        let (m, n) = self.block_shape();
        let shape = pattern.shape();
        let block_len = m * n;
        let len = pattern
            .num_cells()
            .and_then(|cells| cells.checked_mul(block_len))
            .ok_or_else(|| AssemblyError::TensorTooLarge {
                pattern_shape: shape.to_vec(),
                block_len,
            })?;
        self.validate_pattern(pattern)?;

        if let Some(maps) = transposes {
            if m != n {
                return Err(AssemblyError::NonSquareBlock {
                    test_components: m,
                    trial_components: n,
                });
            }
            for (axis, (map, axis_pattern)) in maps.iter().zip(pattern.axes()).enumerate() {
                map.check_pattern(axis_pattern)
                    .map_err(|error| AssemblyError::Pattern { axis, error })?;
            }
        }

        let mut data = vec![T::zero(); len];
        let num_workers = self.pool.num_workers().min(shape[0]).max(1);
        debug!(
            "Assembling tensor of shape {:?} with {}x{} blocks (symmetric: {}, workers: {})",
            shape,
            m,
            n,
            transposes.is_some(),
            num_workers
        );

        if !data.is_empty() {
            // SAFETY: The access is dropped before `data` is used again, and workers only write
            // disjoint cells, see `TensorWorker::evaluate_cell`.
            let output = unsafe { data.as_mut_slice().create_access() };
            let worker = TensorWorker {
                state: &self.state,
                evaluator: &self.evaluator,
                pattern,
                transposes,
                shape,
                block_shape: (m, n),
                output,
            };
            self.pool.run(num_workers, |w| {
                let mut cursor = Cursor::new();
                for p in (w..shape[0]).step_by(num_workers) {
                    worker.process_position(0, p, &mut cursor, true)?;
                }
                Ok(())
            })?;
        }

        Ok(EntryTensor::from_parts(shape.to_vec(), (m, n), data))
    }

    /// Check that every axis pattern matches the dimensions of the test and trial spaces.
    ///
    /// Patterns may have been deserialized, so the pairs themselves are checked as well.
    pub(crate) fn validate_pattern(&self, pattern: &TensorPattern<D>) -> Result<(), AssemblyError> {
        let test_dims = self.state.test_dims();
        let trial_dims = self
            .state
            .trial_dims()
            .ok_or(AssemblyError::MissingTrialSpace)?;
        for (axis, axis_pattern) in pattern.axes().iter().enumerate() {
            let (num_rows, num_cols) = (test_dims[axis], trial_dims[axis]);
            let in_bounds = axis_pattern.num_rows() == num_rows
                && axis_pattern.num_cols() == num_cols
                && axis_pattern
                    .pairs()
                    .iter()
                    .all(|&(row, col)| row < num_rows && col < num_cols);
            if !in_bounds {
                return Err(AssemblyError::PatternOutOfBounds { axis });
            }
        }
        Ok(())
    }
}

/// The multi-indices of the cell currently being visited.
struct Cursor<const D: usize> {
    positions: [usize; D],
    rows: [usize; D],
    cols: [usize; D],
}

impl<const D: usize> Cursor<D> {
    fn new() -> Self {
        Self {
            positions: [0; D],
            rows: [0; D],
            cols: [0; D],
        }
    }
}

struct TensorWorker<'a, T: Real, E, const D: usize> {
    state: &'a AssemblerState<T, D>,
    evaluator: &'a E,
    pattern: &'a TensorPattern<D>,
    transposes: Option<&'a [TransposeMap; D]>,
    shape: [usize; D],
    block_shape: (usize, usize),
    output: ParallelSliceAccess<'a, T>,
}

impl<'a, T, E, const D: usize> TensorWorker<'a, T, E, D>
where
    T: Real,
    E: EntryEvaluator<T, D>,
{
    /// Visit position `p` of `axis` and all cells below it.
    ///
    /// `on_diagonal` is true if all preceding axes are on their diagonal (`row == col`).
    fn process_position(
        &self,
        axis: usize,
        p: usize,
        cursor: &mut Cursor<D>,
        on_diagonal: bool,
    ) -> Result<(), AssemblyError> {
        let (row, col) = self.pattern.axis(axis).pairs()[p];
        let mut on_diagonal = on_diagonal;
        if self.transposes.is_some() && on_diagonal {
            match col.cmp(&row) {
                // The partner cell is responsible for this one
                Ordering::Greater => return Ok(()),
                Ordering::Less => on_diagonal = false,
                Ordering::Equal => {}
            }
        }
        cursor.positions[axis] = p;
        cursor.rows[axis] = row;
        cursor.cols[axis] = col;

        if axis + 1 == D {
            self.evaluate_cell(cursor, on_diagonal)
        } else {
            for q in 0..self.shape[axis + 1] {
                self.process_position(axis + 1, q, cursor, on_diagonal)?;
            }
            Ok(())
        }
    }

    /// Row-major cell index. Cannot overflow, since the cell count fits in `usize`.
    fn cell_index(&self, positions: &[usize; D]) -> usize {
        positions
            .iter()
            .zip(&self.shape)
            .fold(0, |cell, (&p, &n)| cell * n + p)
    }

    fn evaluate_cell(&self, cursor: &Cursor<D>, on_diagonal: bool) -> Result<(), AssemblyError> {
        let (m, n) = self.block_shape;
        let block_len = m * n;
        let cell = self.cell_index(&cursor.positions);

        // SAFETY: Cells are owned by the worker that owns their axis-0 position, and each cell is
        // visited exactly once, so no other thread accesses this block.
        let block = unsafe { self.output.block_mut(cell, block_len) };
        self.evaluator
            .bilinear_block(self.state, &cursor.rows, &cursor.cols, block)?;

        if let (Some(maps), false) = (self.transposes, on_diagonal) {
            let partner_positions: [usize; D] = std::array::from_fn(|d| maps[d].apply(cursor.positions[d]));
            let partner_cell = self.cell_index(&partner_positions);
            // SAFETY: The transpose maps have been verified to be in-bounds involutions that send
            // each pattern pair to its transposed pair. The partner cell is therefore skipped by the traversal and
            // written only here, and it differs from `cell` since the cell is off the diagonal.
            // Its axis-0 position may belong to another worker, but that worker never touches it.
            let partner = unsafe { self.output.block_mut(partner_cell, block_len) };
            for a in 0..m {
                for b in 0..n {
                    partner[b * n + a] = block[a * n + b];
                }
            }
        }
        Ok(())
    }
}
