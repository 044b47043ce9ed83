//! Standard forms on tensor-product spaces.
//!
//! All operators integrate over the intersection of the supports of the functions involved,
//! using the quadrature grid of the assembler state. Without geometry weights the integrals are
//! taken over the parameter domain and factor into products of univariate sums. With geometry
//! weights, the weight at each grid point replaces the product of the per-axis quadrature weights.
use crate::error::{AssemblyError, EntryKind};
use crate::index::{encode, MultiIndexIter};
use crate::space::{QuadratureGrid, TensorSpace};
use crate::state::AssemblerState;
use crate::Real;
use davenport::{define_thread_local_workspace, with_thread_local_workspace};
use std::ops::Range;

use super::EntryEvaluator;

define_thread_local_workspace!(WORKSPACE);

/// Per-axis factors of a separable integrand, tabulated over the quadrature box.
#[derive(Debug)]
struct FactorBuffer<T> {
    factors: Vec<Vec<T>>,
}

impl<T> Default for FactorBuffer<T> {
    fn default() -> Self {
        Self { factors: Vec::new() }
    }
}

impl<T: Real> FactorBuffer<T> {
    fn populate<const D: usize>(&mut self, boxes: &[Range<usize>; D], factor: impl Fn(usize, usize) -> T) {
        self.factors.resize_with(D, Vec::new);
        for (d, (points, buffer)) in boxes.iter().zip(&mut self.factors).enumerate() {
            buffer.clear();
            buffer.extend(points.clone().map(|q| factor(d, q)));
        }
    }
}

/// The quadrature points, per axis, on which all given functions are supported.
///
/// Returns `None` if the supports do not overlap.
fn support_box<T: Real, const D: usize>(
    grid: &QuadratureGrid<T, D>,
    functions: &[(&TensorSpace<T, D>, &[usize; D])],
) -> Option<[Range<usize>; D]> {
    let mut boxes: [Range<usize>; D] = std::array::from_fn(|_| 0..usize::MAX);
    for (d, elements) in boxes.iter_mut().enumerate() {
        for (space, index) in functions {
            let support = space.axis(d).support(index[d]);
            elements.start = elements.start.max(support.start);
            elements.end = elements.end.min(support.end);
        }
        if elements.start >= elements.end {
            return None;
        }
        *elements = grid.element_points(d, elements.clone());
    }
    Some(boxes)
}

/// Integrate the product of the tabulated factors over a quadrature box.
fn tensor_integral<T: Real, const D: usize>(
    state: &AssemblerState<T, D>,
    boxes: &[Range<usize>; D],
    factors: &[Vec<T>],
) -> T {
    let grid = state.quadrature();
    match state.geometry_weights() {
        None => (0..D)
            .map(|d| {
                grid.weights(d)[boxes[d].clone()]
                    .iter()
                    .zip(&factors[d])
                    .fold(T::zero(), |sum, (&w, &f)| sum + w * f)
            })
            .fold(T::one(), |product, integral| product * integral),
        Some(weights) => {
            let num_points = grid.num_points();
            let lower: [usize; D] = std::array::from_fn(|d| boxes[d].start);
            let upper: [usize; D] = std::array::from_fn(|d| boxes[d].end);
            MultiIndexIter::new(lower, upper).fold(T::zero(), |sum, q| {
                let mut value = weights[encode(&q, &num_points)];
                for d in 0..D {
                    value *= factors[d][q[d] - lower[d]];
                }
                sum + value
            })
        }
    }
}

/// Integrate a separable integrand `factor(d, q)` over the common support of the given functions.
fn integrate_separable<T: Real, const D: usize>(
    state: &AssemblerState<T, D>,
    functions: &[(&TensorSpace<T, D>, &[usize; D])],
    factor: impl Fn(usize, usize) -> T,
) -> T {
    let Some(boxes) = support_box(state.quadrature(), functions) else {
        return T::zero();
    };
    with_thread_local_workspace(&WORKSPACE, |buffer: &mut FactorBuffer<T>| {
        buffer.populate(&boxes, factor);
        tensor_integral(state, &boxes, &buffer.factors)
    })
}

fn trial_space<T: Real, const D: usize>(state: &AssemblerState<T, D>) -> Result<&TensorSpace<T, D>, AssemblyError> {
    state.trial_space().ok_or(AssemblyError::MissingTrialSpace)
}

/// The mass form $\int \varphi_j \psi_i$.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MassOperator;

impl<T: Real, const D: usize> EntryEvaluator<T, D> for MassOperator {
    fn bilinear_entry(&self, state: &AssemblerState<T, D>, i: &[usize; D], j: &[usize; D]) -> Result<T, AssemblyError> {
        let (test, trial) = (state.test_space(), trial_space(state)?);
        Ok(integrate_separable(state, &[(test, i), (trial, j)], |d, q| {
            test.axis(d).evaluate(i[d], q, false) * trial.axis(d).evaluate(j[d], q, false)
        }))
    }
}

/// The stiffness form $\int \nabla \varphi_j \cdot \nabla \psi_i$ of the Laplace operator.
///
/// Derivatives are taken with respect to the parameter coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LaplaceOperator;

impl<T: Real, const D: usize> EntryEvaluator<T, D> for LaplaceOperator {
    fn bilinear_entry(&self, state: &AssemblerState<T, D>, i: &[usize; D], j: &[usize; D]) -> Result<T, AssemblyError> {
        let (test, trial) = (state.test_space(), trial_space(state)?);
        let functions = [(test, i), (trial, j)];
        // One separable term per partial derivative
        let mut entry = T::zero();
        for k in 0..D {
            entry += integrate_separable(state, &functions, |d, q| {
                test.axis(d).evaluate(i[d], q, d == k) * trial.axis(d).evaluate(j[d], q, d == k)
            });
        }
        Ok(entry)
    }
}

/// The linear functional $\int \psi_i$, i.e. a unit source term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceFunctional;

impl<T: Real, const D: usize> EntryEvaluator<T, D> for SourceFunctional {
    fn linear_entry(&self, state: &AssemblerState<T, D>, i: &[usize; D]) -> Result<T, AssemblyError> {
        let test = state.test_space();
        Ok(integrate_separable(state, &[(test, i)], |d, q| test.axis(d).evaluate(i[d], q, false)))
    }
}

/// The vector form $\int (\nabla \cdot \mathbf{u}) (\nabla \cdot \mathbf{v})$.
///
/// Both spaces must have `D` components. Block entry `(a, b)` is $\int \partial_a \psi_i \,
/// \partial_b \varphi_j$.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DivDivOperator;

impl<T: Real, const D: usize> EntryEvaluator<T, D> for DivDivOperator {
    fn bilinear_block(
        &self,
        state: &AssemblerState<T, D>,
        i: &[usize; D],
        j: &[usize; D],
        block: &mut [T],
    ) -> Result<(), AssemblyError> {
        let (test, trial) = (state.test_space(), trial_space(state)?);
        if test.num_components() != D || trial.num_components() != D || block.len() != D * D {
            return Err(AssemblyError::EntryNotImplemented(EntryKind::BilinearBlock));
        }
        let functions = [(test, i), (trial, j)];
        for a in 0..D {
            for b in 0..D {
                block[a * D + b] = integrate_separable(state, &functions, |d, q| {
                    test.axis(d).evaluate(i[d], q, d == a) * trial.axis(d).evaluate(j[d], q, d == b)
                });
            }
        }
        Ok(())
    }
}
