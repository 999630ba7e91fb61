//! Damped Newton iteration.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::cancel::CancelToken;
use crate::error::{SolverError, SolverResult};

/// Newton solver configuration.
pub struct NewtonConfig {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Converged once every residual component is below this
    pub abs_tol: f64,
    /// Line search backtracking factor
    pub line_search_beta: f64,
    /// Maximum line search iterations
    pub max_line_search_iters: usize,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            abs_tol: 1e-6,
            line_search_beta: 0.5,
            max_line_search_iters: 20,
        }
    }
}

/// Newton iteration result.
pub struct NewtonResult {
    /// Solution vector
    pub x: DVector<f64>,
    /// Final residual (max norm)
    pub residual_norm: f64,
    /// Number of iterations
    pub iterations: usize,
}

/// Newton solver with backtracking line search on the residual 2-norm.
///
/// The cancel token is polled once per iteration; `on_iteration` receives the
/// iteration number and the max-norm of the residual before the step.
pub fn newton_solve<F, J, P>(
    x0: DVector<f64>,
    residual_fn: F,
    jacobian_fn: J,
    config: &NewtonConfig,
    cancel: &CancelToken,
    mut on_iteration: P,
) -> SolverResult<NewtonResult>
where
    F: Fn(&DVector<f64>) -> DVector<f64>,
    J: Fn(&DVector<f64>) -> DMatrix<f64>,
    P: FnMut(usize, f64),
{
    let mut x = x0;
    let mut r = residual_fn(&x);

    for iter in 0..config.max_iterations {
        if cancel.is_cancelled() {
            return Err(SolverError::Cancelled);
        }

        let r_max = r.amax();
        if !r_max.is_finite() {
            return Err(SolverError::Numeric {
                what: format!("non-finite residual at iteration {iter}"),
            });
        }
        on_iteration(iter, r_max);
        if r_max < config.abs_tol {
            return Ok(NewtonResult {
                x,
                residual_norm: r_max,
                iterations: iter,
            });
        }

        let jac = jacobian_fn(&x);
        let dx = jac.lu().solve(&(-&r)).ok_or_else(|| SolverError::Numeric {
            what: "Jacobian solve failed".to_string(),
        })?;

        let r_norm = r.norm();
        let mut alpha = 1.0;
        let mut x_new = &x + &dx;
        let mut r_new = residual_fn(&x_new);

        for _ in 0..config.max_line_search_iters {
            if r_new.norm() < r_norm {
                break;
            }
            alpha *= config.line_search_beta;
            x_new = &x + alpha * &dx;
            r_new = residual_fn(&x_new);
        }
        debug!(iteration = iter, residual = r_max, step = alpha, "newton step");

        x = x_new;
        r = r_new;
    }

    Err(SolverError::ConvergenceFailed {
        what: format!(
            "Maximum iterations {} reached, residual = {}",
            config.max_iterations,
            r.amax()
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_quadratic() {
        // Solve x^2 - 4 = 0 from x = 3
        let residual = |x: &DVector<f64>| DVector::from_element(1, x[0] * x[0] - 4.0);
        let jacobian = |x: &DVector<f64>| DMatrix::from_element(1, 1, 2.0 * x[0]);

        let x0 = DVector::from_element(1, 3.0);
        let config = NewtonConfig::default();
        let mut seen = 0;
        let result = newton_solve(x0, residual, jacobian, &config, &CancelToken::new(), |_, _| {
            seen += 1
        })
        .unwrap();

        assert!((result.x[0] - 2.0).abs() < 1e-6);
        assert_eq!(seen, result.iterations + 1);
    }

    #[test]
    fn cancelled_before_first_step() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let result = newton_solve(
            DVector::from_element(1, 3.0),
            |x: &DVector<f64>| DVector::from_element(1, x[0] - 1.0),
            |_: &DVector<f64>| DMatrix::from_element(1, 1, 1.0),
            &NewtonConfig::default(),
            &cancel,
            |_, _| {},
        );
        assert!(matches!(result, Err(SolverError::Cancelled)));
    }

    #[test]
    fn singular_jacobian_is_numeric_error() {
        let result = newton_solve(
            DVector::from_element(1, 3.0),
            |_: &DVector<f64>| DVector::from_element(1, 1.0),
            |_: &DVector<f64>| DMatrix::from_element(1, 1, 0.0),
            &NewtonConfig::default(),
            &CancelToken::new(),
            |_, _| {},
        );
        assert!(matches!(result, Err(SolverError::Numeric { .. })));
    }
}
