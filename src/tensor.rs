//! Dense storage for entries assembled on a nonzero pattern.
use crate::index::{encode, encode_with_component, MultiIndexIter};
use crate::pattern::TensorPattern;
use crate::Real;
use eyre::eyre;
use nalgebra::DMatrix;
use nalgebra_sparse::CooMatrix;
use serde::{Deserialize, Serialize};

/// Entries of a discretized form, one cell per combination of pattern positions.
///
/// Each cell holds a block of `test components x trial components` values in row-major order.
/// For scalar forms the block is `1 x 1` and the tensor has one axis per pattern axis; otherwise
/// a trailing axis enumerates the block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EntryTensorData<T>")]
pub struct EntryTensor<T> {
    pattern_shape: Vec<usize>,
    block_shape: (usize, usize),
    data: Vec<T>,
}

#[derive(Deserialize)]
struct EntryTensorData<T> {
    pattern_shape: Vec<usize>,
    block_shape: (usize, usize),
    data: Vec<T>,
}

impl<T> TryFrom<EntryTensorData<T>> for EntryTensor<T> {
    type Error = eyre::Report;

    fn try_from(tensor: EntryTensorData<T>) -> eyre::Result<Self> {
        let EntryTensorData {
            pattern_shape,
            block_shape,
            data,
        } = tensor;
        if pattern_shape.is_empty() && data.is_empty() {
            return Ok(Self::empty());
        }
        if block_shape.0 == 0 || block_shape.1 == 0 {
            return Err(eyre!("block shape {:?} must be nonempty", block_shape));
        }
        let len = data_len(&pattern_shape, block_shape)
            .ok_or_else(|| eyre!("tensor shape {:?} overflows", pattern_shape))?;
        if data.len() != len {
            return Err(eyre!(
                "tensor with pattern shape {:?} and block shape {:?} needs {} values, got {}",
                pattern_shape,
                block_shape,
                len,
                data.len()
            ));
        }
        Ok(Self {
            pattern_shape,
            block_shape,
            data,
        })
    }
}

fn data_len(pattern_shape: &[usize], block_shape: (usize, usize)) -> Option<usize> {
    pattern_shape
        .iter()
        .try_fold(block_shape.0.checked_mul(block_shape.1)?, |len, &n| len.checked_mul(n))
}

impl<T> EntryTensor<T> {
    /// The result of a call that does not apply to the form at hand.
    pub fn empty() -> Self {
        Self {
            pattern_shape: Vec::new(),
            block_shape: (1, 1),
            data: Vec::new(),
        }
    }

    pub(crate) fn from_parts(pattern_shape: Vec<usize>, block_shape: (usize, usize), data: Vec<T>) -> Self {
        assert_eq!(
            Some(data.len()),
            data_len(&pattern_shape, block_shape),
            "Internal error: data length must match tensor shape"
        );
        Self {
            pattern_shape,
            block_shape,
            data,
        }
    }

    /// Number of pattern positions per axis.
    pub fn pattern_shape(&self) -> &[usize] {
        &self.pattern_shape
    }

    pub fn block_shape(&self) -> (usize, usize) {
        self.block_shape
    }

    pub fn block_len(&self) -> usize {
        self.block_shape.0 * self.block_shape.1
    }

    /// The full shape, including the trailing block axis for vector-valued forms.
    pub fn shape(&self) -> Vec<usize> {
        let mut shape = self.pattern_shape.clone();
        if self.block_shape != (1, 1) {
            shape.push(self.block_len());
        }
        shape
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    fn cell_index(&self, positions: &[usize]) -> Option<usize> {
        if positions.len() != self.pattern_shape.len() || self.data.is_empty() {
            return None;
        }
        let mut cell = 0;
        for (&p, &n) in positions.iter().zip(&self.pattern_shape) {
            if p >= n {
                return None;
            }
            cell = cell * n + p;
        }
        Some(cell)
    }

    /// The block stored for the given pattern positions.
    pub fn block(&self, positions: &[usize]) -> Option<&[T]> {
        let len = self.block_len();
        self.cell_index(positions)
            .map(|cell| &self.data[cell * len..(cell + 1) * len])
    }

    /// The entry at a full index, see [`shape`](Self::shape).
    pub fn get(&self, index: &[usize]) -> Option<&T> {
        let d = self.pattern_shape.len();
        if self.block_shape == (1, 1) {
            self.block(index).map(|block| &block[0])
        } else if index.len() == d + 1 {
            self.block(&index[..d])
                .and_then(|block| block.get(index[d]))
        } else {
            None
        }
    }
}

impl<T: Real> EntryTensor<T> {
    /// Extract the scalar tensor of block entry `(a, b)`.
    pub fn component(&self, a: usize, b: usize) -> Option<EntryTensor<T>> {
        let (m, n) = self.block_shape;
        if a >= m || b >= n {
            return None;
        }
        let len = self.block_len();
        let data = self
            .data
            .chunks_exact(len)
            .map(|block| block[a * n + b])
            .collect();
        Some(Self::from_parts(self.pattern_shape.clone(), (1, 1), data))
    }

    /// Visit every stored entry together with its global (row, column) index.
    fn for_each_global_entry<const D: usize>(
        &self,
        pattern: &TensorPattern<D>,
        mut f: impl FnMut(usize, usize, T),
    ) -> eyre::Result<()> {
        let shape = pattern.shape();
        if self.pattern_shape.as_slice() != shape.as_slice() {
            return Err(eyre!(
                "tensor has pattern shape {:?}, but the pattern has shape {:?}",
                self.pattern_shape,
                shape
            ));
        }
        let (m, n) = self.block_shape;
        let row_dims = pattern.row_dims();
        let col_dims = pattern.col_dims();
        let len = self.block_len();
        for positions in MultiIndexIter::from_dims(shape) {
            let rows: [usize; D] = std::array::from_fn(|d| pattern.axis(d).pairs()[positions[d]].0);
            let cols: [usize; D] = std::array::from_fn(|d| pattern.axis(d).pairs()[positions[d]].1);
            let cell = encode(&positions, &shape);
            let block = &self.data[cell * len..(cell + 1) * len];
            for a in 0..m {
                for b in 0..n {
                    let i = encode_with_component(&rows, a, &row_dims, m);
                    let j = encode_with_component(&cols, b, &col_dims, n);
                    f(i, j, block[a * n + b]);
                }
            }
        }
        Ok(())
    }

    fn global_shape<const D: usize>(&self, pattern: &TensorPattern<D>) -> eyre::Result<(usize, usize)> {
        let (m, n) = self.block_shape;
        let nrows = pattern.row_dims().iter().try_fold(m, |len, &k| len.checked_mul(k));
        let ncols = pattern.col_dims().iter().try_fold(n, |len, &k| len.checked_mul(k));
        nrows.zip(ncols).ok_or_else(|| {
            eyre!(
                "global matrix for dimensions {:?} x {:?} is too large",
                pattern.row_dims(),
                pattern.col_dims()
            )
        })
    }

    /// Expand the tensor into the global matrix it represents.
    ///
    /// Row `i` of the result is the test degree of freedom with multi-index `rows` and component
    /// `a`, encoded as in [`encode_with_component`]; columns are numbered likewise over the trial
    /// space. Entries outside the pattern are zero.
    pub fn to_dense_matrix<const D: usize>(&self, pattern: &TensorPattern<D>) -> eyre::Result<DMatrix<T>> {
        let (nrows, ncols) = self.global_shape(pattern)?;
        let mut matrix = DMatrix::zeros(nrows, ncols);
        self.for_each_global_entry(pattern, |i, j, v| matrix[(i, j)] = v)?;
        Ok(matrix)
    }

    /// Like [`to_dense_matrix`](Self::to_dense_matrix), but only storing the pattern entries.
    pub fn to_coo_matrix<const D: usize>(&self, pattern: &TensorPattern<D>) -> eyre::Result<CooMatrix<T>> {
        let (nrows, ncols) = self.global_shape(pattern)?;
        let mut coo = CooMatrix::new(nrows, ncols);
        self.for_each_global_entry(pattern, |i, j, v| coo.push(i, j, v))?;
        Ok(coo)
    }
}
