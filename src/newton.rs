//! # Newton–Raphson solver for vector equations
//!
//! Solves `f(x) = 0` for `x ∈ ℝⁿ` with the classical iteration
//!
//! ```text
//! x_{k+1} = x_k − solve(Df(x_k), f(x_k))
//! ```
//!
//! using one LU linear solve per iteration (never an explicit inverse). The iteration stops
//! when the step norm `‖x_{k+1} − x_k‖₂` drops below the tolerance.
//!
//! Failure semantics
//! -----------------
//! Non-convergence is **a value, not an error**: [`NewtonSolver::solve`] returns a
//! [`NewtonOutcome`] whose `converged` flag must be checked before trusting `x`. The
//! reasons are a singular Jacobian, a non-finite residual or step, or the iteration budget
//! running out.
//!
//! The only `Err` returned is a structural error raised by `f` or `df` themselves (e.g.
//! degenerate geometry in a force model), which is forwarded untouched.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::constants::{NEWTON_EPS, NEWTON_MAX_IT};
use crate::linalg::lu_solve;
use crate::syzygy_errors::SyzygyError;

/// Reason why a Newton solve did not converge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NewtonFailure {
    /// The Jacobian could not be factorized at the given iteration.
    SingularJacobian { iteration: usize },
    /// The residual or the step became NaN or infinite at the given iteration.
    NonFiniteStep { iteration: usize },
    /// The tolerance was not met within the iteration budget.
    MaxIterations { iterations: usize, last_error: f64 },
}

/// Result of a Newton solve.
#[derive(Debug, Clone)]
pub struct NewtonOutcome {
    /// `true` when the step norm fell below the tolerance.
    pub converged: bool,
    /// Last accepted iterate (the root estimate when `converged`).
    pub x: DVector<f64>,
    /// Step norms `‖x_{k+1} − x_k‖₂`, one per completed iteration.
    pub errors: Vec<f64>,
    /// Every iterate including `x0`, only when history was requested.
    pub history: Option<Vec<DVector<f64>>>,
    /// Why the solve failed, `None` on success.
    pub failure: Option<NewtonFailure>,
}

impl NewtonOutcome {
    /// Number of completed Newton iterations.
    pub fn iterations(&self) -> usize {
        self.errors.len()
    }

    /// Last step norm, or `None` if no iteration completed.
    pub fn final_error(&self) -> Option<f64> {
        self.errors.last().copied()
    }
}

/// Newton–Raphson iteration with a bounded number of steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewtonSolver {
    eps: f64,
    max_it: usize,
    keep_history: bool,
}

impl Default for NewtonSolver {
    fn default() -> Self {
        NewtonSolver {
            eps: NEWTON_EPS,
            max_it: NEWTON_MAX_IT,
            keep_history: false,
        }
    }
}

impl NewtonSolver {
    /// Create a solver with tolerance `eps` on the step norm and at most `max_it` iterations.
    ///
    /// Return
    /// ----------
    /// * `SyzygyError::InvalidConfiguration` unless `eps > 0` (finite) and `max_it ≥ 1`.
    pub fn new(eps: f64, max_it: usize) -> Result<Self, SyzygyError> {
        if !(eps.is_finite() && eps > 0.0) {
            return Err(SyzygyError::InvalidConfiguration(format!(
                "newton_eps must be finite and > 0, got {eps}"
            )));
        }
        if max_it == 0 {
            return Err(SyzygyError::InvalidConfiguration(
                "newton_max_it must be >= 1".into(),
            ));
        }
        Ok(NewtonSolver {
            eps,
            max_it,
            keep_history: false,
        })
    }

    /// Keep every iterate in [`NewtonOutcome::history`]. Off by default.
    pub fn with_history(mut self, keep_history: bool) -> Self {
        self.keep_history = keep_history;
        self
    }

    pub fn eps(&self) -> f64 {
        self.eps
    }

    pub fn max_it(&self) -> usize {
        self.max_it
    }

    /// Solve `f(x) = 0` starting from `x0`.
    ///
    /// Arguments
    /// -----------------
    /// * `f`: residual function.
    /// * `df`: Jacobian of the residual, a square matrix of the size of `x`.
    /// * `x0`: initial guess.
    ///
    /// The closures are only called through shared references; they may capture outer state
    /// (e.g. the previous time step) but must be pure in their argument.
    ///
    /// Return
    /// ----------
    /// * `Ok(NewtonOutcome)` in every numerical situation, converged or not,
    /// * `Err(_)` only if `f` or `df` returns an error.
    pub fn solve<F, DF>(&self, f: F, df: DF, x0: &DVector<f64>) -> Result<NewtonOutcome, SyzygyError>
    where
        F: Fn(&DVector<f64>) -> Result<DVector<f64>, SyzygyError>,
        DF: Fn(&DVector<f64>) -> Result<DMatrix<f64>, SyzygyError>,
    {
        let mut x = x0.clone();
        let mut errors = Vec::new();
        let mut history = self.keep_history.then(|| vec![x0.clone()]);

        let outcome = |x: DVector<f64>,
                       errors: Vec<f64>,
                       history: Option<Vec<DVector<f64>>>,
                       failure: Option<NewtonFailure>| NewtonOutcome {
            converged: failure.is_none(),
            x,
            errors,
            history,
            failure,
        };

        for iteration in 0..self.max_it {
            let residual = f(&x)?;
            if !residual.iter().all(|v| v.is_finite()) {
                log::trace!("newton: non-finite residual at iteration {iteration}");
                return Ok(outcome(
                    x,
                    errors,
                    history,
                    Some(NewtonFailure::NonFiniteStep { iteration }),
                ));
            }
            let jac = df(&x)?;

            let dx = match lu_solve(jac, &residual) {
                Ok(dx) => dx,
                Err(_) => {
                    log::trace!("newton: singular Jacobian at iteration {iteration}");
                    return Ok(outcome(
                        x,
                        errors,
                        history,
                        Some(NewtonFailure::SingularJacobian { iteration }),
                    ));
                }
            };

            let err = dx.norm();
            if !err.is_finite() {
                return Ok(outcome(
                    x,
                    errors,
                    history,
                    Some(NewtonFailure::NonFiniteStep { iteration }),
                ));
            }

            x -= dx;
            errors.push(err);
            if let Some(h) = history.as_mut() {
                h.push(x.clone());
            }
            log::trace!("newton: iteration {iteration}, step norm {err:.3e}");

            if err < self.eps {
                return Ok(outcome(x, errors, history, None));
            }
        }

        let last_error = errors.last().copied().unwrap_or(f64::INFINITY);
        Ok(outcome(
            x,
            errors,
            history,
            Some(NewtonFailure::MaxIterations {
                iterations: self.max_it,
                last_error,
            }),
        ))
    }
}
