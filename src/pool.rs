//! Fork/join execution of assembly work.
use eyre::WrapErr;
use log::debug;
use num::integer::div_ceil;
use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
use rayon::slice::{ParallelSlice, ParallelSliceMut};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::Arc;

#[derive(Debug, Clone)]
enum PoolKind {
    Sequential,
    Global,
    Dedicated(Arc<ThreadPool>),
}

/// A bounded set of workers that executes one fork/join round per call.
///
/// The pool is cheap to clone and may be shared by any number of assemblers. With a single
/// worker, all work runs inline on the calling thread and no threads are involved at all.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    num_workers: usize,
    kind: PoolKind,
}

impl Default for WorkerPool {
    /// Partition work for the threads of the global rayon pool.
    fn default() -> Self {
        Self::global(rayon::current_num_threads())
    }
}

impl WorkerPool {
    /// Run all work inline on the calling thread.
    pub fn sequential() -> Self {
        Self {
            num_workers: 1,
            kind: PoolKind::Sequential,
        }
    }

    /// Partition work into `num_workers` tasks executed on the global rayon pool.
    pub fn global(num_workers: usize) -> Self {
        if num_workers <= 1 {
            Self::sequential()
        } else {
            Self {
                num_workers,
                kind: PoolKind::Global,
            }
        }
    }

    /// Create a dedicated thread pool with `num_workers` threads.
    pub fn dedicated(num_workers: usize) -> eyre::Result<Self> {
        if num_workers <= 1 {
            return Ok(Self::sequential());
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(num_workers)
            .thread_name(|i| format!("fenris-iga-worker-{i}"))
            .build()
            .wrap_err("failed to build assembly thread pool")?;
        debug!("Created assembly thread pool with {} threads", num_workers);
        Ok(Self {
            num_workers,
            kind: PoolKind::Dedicated(Arc::new(pool)),
        })
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    pub fn is_sequential(&self) -> bool {
        matches!(self.kind, PoolKind::Sequential)
    }

    fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        match &self.kind {
            PoolKind::Dedicated(pool) => pool.install(op),
            PoolKind::Sequential | PoolKind::Global => op(),
        }
    }

    /// Run `f(partition)` for every partition in `0 .. num_partitions` and wait for all of them.
    ///
    /// The first error aborts the remaining partitions and is returned. A panic in any partition
    /// propagates to the caller.
    pub fn run<E, F>(&self, num_partitions: usize, f: F) -> Result<(), E>
    where
        E: Send,
        F: Fn(usize) -> Result<(), E> + Sync + Send,
    {
        if self.is_sequential() || num_partitions <= 1 {
            return (0..num_partitions).try_for_each(f);
        }
        self.install(move || (0..num_partitions).into_par_iter().try_for_each(f))
    }

    /// Apply `f` to corresponding items of `input` and `output`.
    ///
    /// Both slices are split into one contiguous chunk per worker, so every output item is
    /// written by exactly one worker.
    ///
    /// # Panics
    ///
    /// Panics if the slices have different lengths.
    pub fn for_each_chunk<I, O, E, F>(&self, input: &[I], output: &mut [O], f: F) -> Result<(), E>
    where
        I: Sync,
        O: Send,
        E: Send,
        F: Fn(&I, &mut O) -> Result<(), E> + Sync + Send,
    {
        assert_eq!(input.len(), output.len(), "input and output must have the same length");
        if self.is_sequential() || input.len() <= 1 {
            return input.iter().zip(output).try_for_each(|(i, o)| f(i, o));
        }
        let chunk_size = div_ceil(input.len(), self.num_workers);
        self.install(move || {
            input
                .par_chunks(chunk_size)
                .zip(output.par_chunks_mut(chunk_size))
                .try_for_each(|(input, output)| {
                    input
                        .iter()
                        .zip(output)
                        .try_for_each(|(i, o)| f(i, o))
                })
        })
    }
}
