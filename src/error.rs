//! Error types reported by assembly routines.
use crate::pattern::PatternError;
use std::error::Error;
use std::fmt;

/// The kind of entry evaluation that was requested from an [`EntryEvaluator`](crate::assembly::EntryEvaluator).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EntryKind {
    Linear,
    Bilinear,
    LinearBlock,
    BilinearBlock,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Linear => write!(f, "linear entry"),
            Self::Bilinear => write!(f, "bilinear entry"),
            Self::LinearBlock => write!(f, "linear component block"),
            Self::BilinearBlock => write!(f, "bilinear component block"),
        }
    }
}

/// Errors that abort an assembly call.
///
/// Queries that do not fit the form (asking a linear form for a matrix entry and vice versa) are
/// *not* errors; such calls yield zero or empty results.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AssemblyError {
    /// The evaluator does not implement the requested kind of entry.
    EntryNotImplemented(EntryKind),
    /// A bilinear form was evaluated without a trial space.
    MissingTrialSpace,
    /// Symmetric assembly of a vector form requires as many test as trial components.
    NonSquareBlock { test_components: usize, trial_components: usize },
    /// A pattern or transpose map handed to the assembler is inconsistent.
    Pattern { axis: usize, error: PatternError },
    /// A pattern references a degree of freedom outside the corresponding space.
    PatternOutOfBounds { axis: usize },
    /// A linear index is out of range for the space it indexes.
    IndexOutOfBounds { index: usize, len: usize },
    /// The number of entries of the requested tensor does not fit in `usize`.
    TensorTooLarge { pattern_shape: Vec<usize>, block_len: usize },
}

impl fmt::Display for AssemblyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::EntryNotImplemented(kind) => write!(f, "evaluator does not implement {kind}"),
            Self::MissingTrialSpace => write!(f, "bilinear evaluation requires a trial space"),
            Self::NonSquareBlock {
                test_components,
                trial_components,
            } => write!(
                f,
                "symmetric assembly requires square component blocks, got {test_components}x{trial_components}"
            ),
            Self::Pattern { axis, error } => write!(f, "invalid pattern on axis {axis}: {error}"),
            Self::PatternOutOfBounds { axis } => {
                write!(f, "pattern on axis {axis} references degrees of freedom out of bounds")
            }
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds for length {len}")
            }
            Self::TensorTooLarge {
                pattern_shape,
                block_len,
            } => write!(
                f,
                "tensor with pattern shape {pattern_shape:?} and blocks of length {block_len} is too large"
            ),
        }
    }
}

impl Error for AssemblyError {}
