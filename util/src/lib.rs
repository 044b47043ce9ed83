use nalgebra::DMatrix;
use std::ops::Range;

/// Poor man's approx assertion for matrices
#[macro_export]
macro_rules! assert_approx_matrix_eq {
    ($x:expr, $y:expr, abstol = $tol:expr) => {{
        let diff = $x - $y;

        let max_absdiff = diff.abs().max();
        let approx_eq = max_absdiff <= $tol;

        if !approx_eq {
            println!("abstol: {:e}", $tol);
            println!("left: {}", $x);
            println!("right: {}", $y);
            println!("diff: {:e}", diff);
        }
        assert!(approx_eq);
    }};
}

/// Raw tabulation of a univariate basis on a uniform grid of `[0, 1]`.
///
/// The layout matches what `fenris_iga::space::AxisSpace` expects: one row per basis function,
/// one column per quadrature point, with quadrature points ordered element by element.
#[derive(Debug, Clone)]
pub struct AxisTabulation {
    pub supports: Vec<Range<usize>>,
    pub values: DMatrix<f64>,
    pub derivatives: DMatrix<f64>,
    pub points: Vec<f64>,
    pub weights: Vec<f64>,
    pub points_per_element: usize,
}

impl AxisTabulation {
    pub fn num_dofs(&self) -> usize {
        self.values.nrows()
    }

    pub fn num_elements(&self) -> usize {
        self.points.len() / self.points_per_element
    }
}

/// Two-point Gauss-Legendre rule on `[-1, 1]`, exact for cubics.
pub fn gauss_legendre_2() -> ([f64; 2], [f64; 2]) {
    let xi = 1.0 / f64::sqrt(3.0);
    ([-xi, xi], [1.0, 1.0])
}

/// Piecewise linear hat functions on a uniform grid with `num_elements` elements.
///
/// There are `num_elements + 1` functions. Function `k` is supported on the elements
/// adjacent to node `k`.
pub fn uniform_hat_axis(num_elements: usize) -> AxisTabulation {
    assert!(num_elements > 0, "need at least one element");
    let n = num_elements;
    let h = 1.0 / n as f64;
    let (ref_points, ref_weights) = gauss_legendre_2();
    let num_points = 2 * n;

    let mut points = Vec::with_capacity(num_points);
    let mut weights = Vec::with_capacity(num_points);
    for e in 0..n {
        let midpoint = (e as f64 + 0.5) * h;
        for (xi, w) in ref_points.iter().zip(&ref_weights) {
            points.push(midpoint + 0.5 * h * xi);
            weights.push(0.5 * h * w);
        }
    }

    let mut values = DMatrix::zeros(n + 1, num_points);
    let mut derivatives = DMatrix::zeros(n + 1, num_points);
    for e in 0..n {
        for q in 2 * e..2 * e + 2 {
            let x = points[q];
            let t = (x - e as f64 * h) / h;
            values[(e, q)] = 1.0 - t;
            values[(e + 1, q)] = t;
            derivatives[(e, q)] = -1.0 / h;
            derivatives[(e + 1, q)] = 1.0 / h;
        }
    }

    let supports = (0..=n).map(|k| k.saturating_sub(1)..usize::min(k + 1, n)).collect();

    AxisTabulation {
        supports,
        values,
        derivatives,
        points,
        weights,
        points_per_element: 2,
    }
}

/// The exact 1D mass matrix of [`uniform_hat_axis`].
pub fn hat_mass_matrix(num_elements: usize) -> DMatrix<f64> {
    let n = num_elements;
    let h = 1.0 / n as f64;
    let mut m = DMatrix::zeros(n + 1, n + 1);
    for e in 0..n {
        m[(e, e)] += h / 3.0;
        m[(e + 1, e + 1)] += h / 3.0;
        m[(e, e + 1)] += h / 6.0;
        m[(e + 1, e)] += h / 6.0;
    }
    m
}

/// The exact 1D stiffness matrix of [`uniform_hat_axis`].
pub fn hat_stiffness_matrix(num_elements: usize) -> DMatrix<f64> {
    let n = num_elements;
    let h = 1.0 / n as f64;
    let mut a = DMatrix::zeros(n + 1, n + 1);
    for e in 0..n {
        a[(e, e)] += 1.0 / h;
        a[(e + 1, e + 1)] += 1.0 / h;
        a[(e, e + 1)] -= 1.0 / h;
        a[(e + 1, e)] -= 1.0 / h;
    }
    a
}

/// Kronecker product of a sequence of matrices, first factor most significant.
pub fn kron_all(factors: &[DMatrix<f64>]) -> DMatrix<f64> {
    factors
        .iter()
        .fold(DMatrix::from_element(1, 1, 1.0), |acc, f| acc.kronecker(f))
}
