//! Immutable data shared by all workers of an assembly.
use crate::space::{QuadratureGrid, TensorSpace};
use crate::Real;
use eyre::eyre;
use nalgebra::Scalar;
use serde::{Deserialize, Serialize};

/// The number of basis-function arguments of a form.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arity {
    /// A linear functional of a test function, discretized into a vector.
    Linear,
    /// A bilinear form of a trial and a test function, discretized into a matrix.
    Bilinear,
}

/// Everything an entry evaluator may read: the test space, the trial space (bilinear forms only),
/// the quadrature grid and optional geometry weights.
///
/// Rows of a discretized form are indexed by the test space and columns by the trial space.
/// The state is validated once on construction and never mutated afterwards, so that it can be
/// shared by reference between any number of threads.
#[derive(Debug, Clone)]
pub struct AssemblerState<T: Scalar, const D: usize> {
    arity: Arity,
    test: TensorSpace<T, D>,
    trial: Option<TensorSpace<T, D>>,
    quadrature: QuadratureGrid<T, D>,
    geometry_weights: Option<Vec<T>>,
}

impl<T: Real, const D: usize> AssemblerState<T, D> {
    /// State for a linear functional over the given test space.
    pub fn linear(test: TensorSpace<T, D>, quadrature: QuadratureGrid<T, D>) -> eyre::Result<Self> {
        validate_space(&test, &quadrature, "test")?;
        Ok(Self {
            arity: Arity::Linear,
            test,
            trial: None,
            quadrature,
            geometry_weights: None,
        })
    }

    /// State for a bilinear form over the given trial and test spaces.
    pub fn bilinear(
        trial: TensorSpace<T, D>,
        test: TensorSpace<T, D>,
        quadrature: QuadratureGrid<T, D>,
    ) -> eyre::Result<Self> {
        validate_space(&trial, &quadrature, "trial")?;
        validate_space(&test, &quadrature, "test")?;
        Ok(Self {
            arity: Arity::Bilinear,
            test,
            trial: Some(trial),
            quadrature,
            geometry_weights: None,
        })
    }

    /// Attach weights that replace the tensor-product quadrature weights.
    ///
    /// The weights are given for every point of the full quadrature grid in row-major order and
    /// typically combine the quadrature weights with the Jacobian determinant of the geometry map.
    pub fn with_geometry_weights(self, weights: Vec<T>) -> eyre::Result<Self> {
        let expected = self.quadrature.total_num_points();
        if weights.len() != expected {
            return Err(eyre!(
                "expected {} geometry weights for the quadrature grid, got {}",
                expected,
                weights.len()
            ));
        }
        Ok(Self {
            geometry_weights: Some(weights),
            ..self
        })
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    pub fn test_space(&self) -> &TensorSpace<T, D> {
        &self.test
    }

    pub fn trial_space(&self) -> Option<&TensorSpace<T, D>> {
        self.trial.as_ref()
    }

    pub fn quadrature(&self) -> &QuadratureGrid<T, D> {
        &self.quadrature
    }

    pub fn geometry_weights(&self) -> Option<&[T]> {
        self.geometry_weights.as_deref()
    }

    /// Number of test (row) functions per axis.
    pub fn test_dims(&self) -> [usize; D] {
        self.test.dims()
    }

    /// Number of trial (column) functions per axis, if the state describes a bilinear form.
    pub fn trial_dims(&self) -> Option<[usize; D]> {
        self.trial.as_ref().map(TensorSpace::dims)
    }
}

fn validate_space<T: Real, const D: usize>(
    space: &TensorSpace<T, D>,
    quadrature: &QuadratureGrid<T, D>,
    name: &str,
) -> eyre::Result<()> {
    let num_points = quadrature.num_points();
    let num_elements = quadrature.num_elements();
    for (d, axis) in space.axes().iter().enumerate() {
        if axis.num_points() != num_points[d] {
            return Err(eyre!(
                "{} space is tabulated at {} points on axis {}, but the quadrature grid has {}",
                name,
                axis.num_points(),
                d,
                num_points[d]
            ));
        }
        if axis.supports().iter().any(|s| s.end > num_elements[d]) {
            return Err(eyre!(
                "{} space has supports beyond the {} elements of axis {}",
                name,
                num_elements[d],
                d
            ));
        }
    }
    Ok(())
}
