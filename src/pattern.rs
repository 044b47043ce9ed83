//! Per-axis nonzero patterns and their transpose maps.
//!
//! A tensor-product matrix entry can only be nonzero if, on every axis, the supports of the
//! corresponding univariate test and trial functions overlap. The candidate `(row, col)` pairs
//! of each axis form an [`AxisPattern`], and the combinations of one pair per axis address the
//! cells of the assembled tensor.
use crate::error::AssemblyError;
use itertools::iproduct;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// A pair lies outside the declared number of rows and columns.
    IndexOutOfBounds { row: usize, col: usize },
    /// The transposed counterpart of a pair is missing from the pattern.
    NotSymmetric { row: usize, col: usize },
    /// Applying the map twice does not return to the starting position.
    NotInvolution { position: usize },
    /// The map does not send a pair to its transposed pair.
    MapMismatch { position: usize },
    LengthMismatch { pattern_len: usize, map_len: usize },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::IndexOutOfBounds { row, col } => write!(f, "pair ({row}, {col}) is out of bounds"),
            Self::NotSymmetric { row, col } => {
                write!(f, "pair ({row}, {col}) has no transposed counterpart")
            }
            Self::NotInvolution { position } => {
                write!(f, "transpose map is not an involution at position {position}")
            }
            Self::MapMismatch { position } => {
                write!(f, "transpose map does not send position {position} to its transposed pair")
            }
            Self::LengthMismatch { pattern_len, map_len } => write!(
                f,
                "transpose map has length {map_len}, but the pattern has length {pattern_len}"
            ),
        }
    }
}

impl Error for PatternError {}

/// Candidate nonzero `(row, col)` pairs of a single axis.
///
/// Rows refer to test functions and columns to trial functions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AxisPatternData")]
pub struct AxisPattern {
    num_rows: usize,
    num_cols: usize,
    pairs: Vec<(usize, usize)>,
}

#[derive(Deserialize)]
struct AxisPatternData {
    num_rows: usize,
    num_cols: usize,
    pairs: Vec<(usize, usize)>,
}

impl TryFrom<AxisPatternData> for AxisPattern {
    type Error = PatternError;

    fn try_from(data: AxisPatternData) -> Result<Self, Self::Error> {
        Self::try_from_pairs(data.num_rows, data.num_cols, data.pairs)
    }
}

impl AxisPattern {
    pub fn try_from_pairs(num_rows: usize, num_cols: usize, pairs: Vec<(usize, usize)>) -> Result<Self, PatternError> {
        if let Some(&(row, col)) = pairs
            .iter()
            .find(|(row, col)| *row >= num_rows || *col >= num_cols)
        {
            return Err(PatternError::IndexOutOfBounds { row, col });
        }
        Ok(Self {
            num_rows,
            num_cols,
            pairs,
        })
    }

    /// All pairs, in row-major order.
    pub fn full(num_rows: usize, num_cols: usize) -> Self {
        let pairs = iproduct!(0..num_rows, 0..num_cols).collect();
        Self {
            num_rows,
            num_cols,
            pairs,
        }
    }

    /// The pairs of a square banded matrix of size `n` with the given bandwidth.
    ///
    /// Pairs are ordered column by column, and by row within each column.
    pub fn banded(n: usize, bandwidth: usize) -> Self {
        let mut pairs = Vec::new();
        for col in 0..n {
            let rows = col.saturating_sub(bandwidth)..usize::min(n, col + bandwidth + 1);
            pairs.extend(rows.map(|row| (row, col)));
        }
        Self {
            num_rows: n,
            num_cols: n,
            pairs,
        }
    }

    /// The pairs whose element supports overlap, in row-major order.
    pub fn from_supports(test_supports: &[Range<usize>], trial_supports: &[Range<usize>]) -> Self {
        let mut pairs = Vec::new();
        for (row, test) in test_supports.iter().enumerate() {
            for (col, trial) in trial_supports.iter().enumerate() {
                if test.start < trial.end && trial.start < test.end {
                    pairs.push((row, col));
                }
            }
        }
        Self {
            num_rows: test_supports.len(),
            num_cols: trial_supports.len(),
            pairs,
        }
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    /// Compute the map that sends every position to the position of its transposed pair.
    ///
    /// Duplicate pairs are matched with duplicates of the transposed pair in order of appearance.
    pub fn transpose_map(&self) -> Result<TransposeMap, PatternError> {
        let mut positions: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
        for (p, &pair) in self.pairs.iter().enumerate() {
            positions.entry(pair).or_default().push(p);
        }

        let mut occurrence: HashMap<(usize, usize), usize> = HashMap::new();
        let mut perm = Vec::with_capacity(self.pairs.len());
        for &(row, col) in &self.pairs {
            let k = occurrence.entry((row, col)).or_insert(0);
            let target = positions
                .get(&(col, row))
                .and_then(|candidates| candidates.get(*k))
                .ok_or(PatternError::NotSymmetric { row, col })?;
            perm.push(*target);
            *k += 1;
        }

        let map = TransposeMap::try_from_vec(perm)?;
        map.check_pattern(self)?;
        Ok(map)
    }

    pub fn is_symmetric(&self) -> bool {
        self.num_rows == self.num_cols && self.transpose_map().is_ok()
    }
}

/// A permutation of pattern positions that sends `(row, col)` to `(col, row)`.
///
/// The map is an involution: applying it twice gives the identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct TransposeMap {
    perm: Vec<usize>,
}

impl TryFrom<Vec<usize>> for TransposeMap {
    type Error = PatternError;

    fn try_from(perm: Vec<usize>) -> Result<Self, Self::Error> {
        Self::try_from_vec(perm)
    }
}

impl From<TransposeMap> for Vec<usize> {
    fn from(map: TransposeMap) -> Self {
        map.perm
    }
}

impl TransposeMap {
    pub fn try_from_vec(perm: Vec<usize>) -> Result<Self, PatternError> {
        for (position, &target) in perm.iter().enumerate() {
            if perm.get(target) != Some(&position) {
                return Err(PatternError::NotInvolution { position });
            }
        }
        Ok(Self { perm })
    }

    pub fn apply(&self, position: usize) -> usize {
        self.perm[position]
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.perm
    }

    pub fn len(&self) -> usize {
        self.perm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.perm.is_empty()
    }

    /// Verify that the map sends every pair of `pattern` to its transposed pair.
    ///
    /// A map passing this check also proves that the pattern is symmetric. The involution
    /// property is checked again, so that parallel assembly can rely on this check alone.
    pub fn check_pattern(&self, pattern: &AxisPattern) -> Result<(), PatternError> {
        if self.len() != pattern.len() {
            return Err(PatternError::LengthMismatch {
                pattern_len: pattern.len(),
                map_len: self.len(),
            });
        }
        let pairs = pattern.pairs();
        for (position, &target) in self.perm.iter().enumerate() {
            if self.perm.get(target) != Some(&position) {
                return Err(PatternError::NotInvolution { position });
            }
            let (row, col) = pairs[position];
            if pairs[target] != (col, row) {
                return Err(PatternError::MapMismatch { position });
            }
        }
        Ok(())
    }
}

/// One [`AxisPattern`] per axis.
///
/// The cells of the assembled tensor are the combinations of one position per axis, laid out in
/// row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorPattern<const D: usize> {
    axes: [AxisPattern; D],
}

impl<const D: usize> TensorPattern<D> {
    pub fn new(axes: [AxisPattern; D]) -> Self {
        Self { axes }
    }

    pub fn full(row_dims: [usize; D], col_dims: [usize; D]) -> Self {
        Self::new(std::array::from_fn(|d| AxisPattern::full(row_dims[d], col_dims[d])))
    }

    pub fn banded(dims: [usize; D], bandwidths: [usize; D]) -> Self {
        Self::new(std::array::from_fn(|d| AxisPattern::banded(dims[d], bandwidths[d])))
    }

    pub fn axis(&self, d: usize) -> &AxisPattern {
        &self.axes[d]
    }

    pub fn axes(&self) -> &[AxisPattern; D] {
        &self.axes
    }

    /// Number of pattern positions per axis.
    pub fn shape(&self) -> [usize; D] {
        std::array::from_fn(|d| self.axes[d].len())
    }

    /// Number of cells, or `None` if the count does not fit in `usize`.
    pub fn num_cells(&self) -> Option<usize> {
        self.shape()
            .iter()
            .try_fold(1usize, |cells, &n| cells.checked_mul(n))
    }

    pub fn row_dims(&self) -> [usize; D] {
        std::array::from_fn(|d| self.axes[d].num_rows())
    }

    pub fn col_dims(&self) -> [usize; D] {
        std::array::from_fn(|d| self.axes[d].num_cols())
    }

    /// Transpose maps for all axes, as needed for symmetric assembly.
    pub fn transpose_maps(&self) -> Result<[TransposeMap; D], AssemblyError> {
        let maps: [Result<TransposeMap, PatternError>; D] = std::array::from_fn(|d| self.axes[d].transpose_map());
        for (axis, map) in maps.iter().enumerate() {
            if let Err(error) = map {
                return Err(AssemblyError::Pattern {
                    axis,
                    error: error.clone(),
                });
            }
        }
        Ok(maps.map(Result::unwrap_or_default))
    }
}
