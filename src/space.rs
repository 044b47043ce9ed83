//! Tabulated univariate bases and their tensor products.
use crate::Real;
use eyre::eyre;
use nalgebra::{DMatrix, Scalar};
use std::ops::Range;

/// A univariate basis tabulated at the quadrature points of one axis.
///
/// Each basis function is supported on a contiguous, half-open range of elements. The values and
/// first derivatives of all functions are stored as `num_dofs x num_points` matrices, where the
/// quadrature points are ordered element by element.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisSpace<T: Scalar> {
    supports: Vec<Range<usize>>,
    values: DMatrix<T>,
    derivatives: DMatrix<T>,
}

impl<T: Real> AxisSpace<T> {
    pub fn try_new(supports: Vec<Range<usize>>, values: DMatrix<T>, derivatives: DMatrix<T>) -> eyre::Result<Self> {
        if values.shape() != derivatives.shape() {
            return Err(eyre!(
                "shape of basis values {:?} does not match shape of derivatives {:?}",
                values.shape(),
                derivatives.shape()
            ));
        }
        if supports.len() != values.nrows() {
            return Err(eyre!(
                "number of supports ({}) must match number of tabulated functions ({})",
                supports.len(),
                values.nrows()
            ));
        }
        if let Some(dof) = supports.iter().position(|s| s.start > s.end) {
            return Err(eyre!("support of basis function {} is not a valid range", dof));
        }
        Ok(Self {
            supports,
            values,
            derivatives,
        })
    }

    pub fn num_dofs(&self) -> usize {
        self.values.nrows()
    }

    pub fn num_points(&self) -> usize {
        self.values.ncols()
    }

    pub fn supports(&self) -> &[Range<usize>] {
        &self.supports
    }

    /// The elements on which basis function `dof` is supported.
    ///
    /// # Panics
    ///
    /// Panics if `dof` is out of bounds.
    pub fn support(&self, dof: usize) -> Range<usize> {
        self.supports[dof].clone()
    }

    pub fn values(&self) -> &DMatrix<T> {
        &self.values
    }

    pub fn derivatives(&self) -> &DMatrix<T> {
        &self.derivatives
    }

    /// The value (`derivative == false`) or first derivative of function `dof` at point `q`.
    pub fn evaluate(&self, dof: usize, q: usize, derivative: bool) -> T {
        if derivative {
            self.derivatives[(dof, q)]
        } else {
            self.values[(dof, q)]
        }
    }
}

/// The tensor product of `D` univariate bases, possibly with several components per function.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorSpace<T: Scalar, const D: usize> {
    axes: [AxisSpace<T>; D],
    num_components: usize,
}

impl<T: Real, const D: usize> TensorSpace<T, D> {
    /// A scalar-valued tensor-product space.
    pub fn new(axes: [AxisSpace<T>; D]) -> Self {
        Self {
            axes,
            num_components: 1,
        }
    }

    /// Use `num_components` copies of the scalar basis, one per component of a vector field.
    ///
    /// # Panics
    ///
    /// Panics if `num_components` is zero.
    pub fn with_components(self, num_components: usize) -> Self {
        assert!(num_components > 0, "a space needs at least one component");
        Self { num_components, ..self }
    }

    pub fn axis(&self, d: usize) -> &AxisSpace<T> {
        &self.axes[d]
    }

    pub fn axes(&self) -> &[AxisSpace<T>; D] {
        &self.axes
    }

    pub fn num_components(&self) -> usize {
        self.num_components
    }

    /// Number of univariate functions per axis.
    pub fn dims(&self) -> [usize; D] {
        std::array::from_fn(|d| self.axes[d].num_dofs())
    }

    /// Number of scalar tensor-product functions, ignoring components.
    pub fn num_functions(&self) -> usize {
        self.dims().iter().product()
    }

    /// Total number of degrees of freedom, including components.
    pub fn num_dofs(&self) -> usize {
        self.num_functions() * self.num_components
    }
}

/// A tensor-product quadrature grid.
///
/// Every axis is subdivided into elements, each of which carries the same number of
/// quadrature points.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadratureGrid<T, const D: usize> {
    points: [Vec<T>; D],
    weights: [Vec<T>; D],
    points_per_element: [usize; D],
}

impl<T: Real, const D: usize> QuadratureGrid<T, D> {
    pub fn try_new(points: [Vec<T>; D], weights: [Vec<T>; D], points_per_element: [usize; D]) -> eyre::Result<Self> {
        for d in 0..D {
            if points[d].len() != weights[d].len() {
                return Err(eyre!("number of points and weights differ on axis {}", d));
            }
            let k = points_per_element[d];
            if k == 0 || points[d].len() % k != 0 {
                return Err(eyre!(
                    "{} points on axis {} cannot be divided into elements of {} points",
                    points[d].len(),
                    d,
                    k
                ));
            }
        }
        Ok(Self {
            points,
            weights,
            points_per_element,
        })
    }

    pub fn points(&self, d: usize) -> &[T] {
        &self.points[d]
    }

    pub fn weights(&self, d: usize) -> &[T] {
        &self.weights[d]
    }

    pub fn points_per_element(&self) -> [usize; D] {
        self.points_per_element
    }

    /// Number of quadrature points per axis.
    pub fn num_points(&self) -> [usize; D] {
        std::array::from_fn(|d| self.points[d].len())
    }

    pub fn total_num_points(&self) -> usize {
        self.num_points().iter().product()
    }

    pub fn num_elements(&self) -> [usize; D] {
        std::array::from_fn(|d| self.points[d].len() / self.points_per_element[d])
    }

    /// The quadrature points on axis `d` that belong to the given range of elements.
    pub fn element_points(&self, d: usize, elements: Range<usize>) -> Range<usize> {
        let k = self.points_per_element[d];
        elements.start * k..elements.end * k
    }
}
