//! # β-method integrator
//!
//! Single-step integrator over the uniform grid described in
//! [`crate::integration`]. The explicit member (`β = 0`) is a plain forward Euler update;
//! every other member solves, at each step, for `x = u_{k+1}` in
//!
//! ```text
//! F(x)  = x − u_k − h · f(t_k + β·h, (1 − β)·u_k + β·x) = 0
//! DF(x) = I − h·β · ∂f/∂y (t_k + β·h, (1 − β)·u_k + β·x)
//! ```
//!
//! with Newton's method seeded at `x0 = u_k`.
//!
//! When a Newton solve fails the run stops early: the trajectory keeps every converged
//! sample and its [`IntegrationStatus`](crate::integration::trajectory::IntegrationStatus)
//! records the failing step. Structural errors (degenerate geometry in the field) abort the
//! run with an `Err`.

use nalgebra::DMatrix;

use crate::constants::StateVector;
use crate::integration::ode_system::OdeSystem;
use crate::integration::trajectory::Trajectory;
use crate::integration::IntegrationParams;
use crate::newton::{NewtonOutcome, NewtonSolver};
use crate::syzygy_errors::SyzygyError;

/// Fixed-step β-method integrator.
#[derive(Debug, Clone)]
pub struct BetaIntegrator {
    params: IntegrationParams,
    newton: NewtonSolver,
}

impl BetaIntegrator {
    /// Create an integrator, validating the parameters first.
    ///
    /// Return
    /// ----------
    /// * `SyzygyError::InvalidConfiguration` for a non-positive step, a reversed horizon,
    ///   `β ∉ [0, 1]` or invalid Newton settings.
    pub fn new(params: IntegrationParams) -> Result<Self, SyzygyError> {
        params.validate()?;
        let newton = params.newton_solver()?;
        Ok(BetaIntegrator { params, newton })
    }

    pub fn params(&self) -> &IntegrationParams {
        &self.params
    }

    /// Explicit forward Euler update `u + h·f(t, u)`.
    pub fn explicit_step<S: OdeSystem>(
        system: &S,
        t: f64,
        u: &StateVector,
        h: f64,
    ) -> Result<StateVector, SyzygyError> {
        Ok(u + system.rhs(t, u)? * h)
    }

    /// Solve one implicit step from `(t, u)` with step `h` and parameter `beta`.
    ///
    /// The returned outcome must be checked for convergence by the caller.
    pub fn implicit_step<S: OdeSystem>(
        &self,
        system: &S,
        t: f64,
        u: &StateVector,
        h: f64,
    ) -> Result<NewtonOutcome, SyzygyError> {
        let beta = self.params.beta;
        let t_eval = t + beta * h;
        let u_weighted = u * (1.0 - beta);
        let identity = DMatrix::<f64>::identity(u.len(), u.len());

        let residual = |x: &StateVector| -> Result<StateVector, SyzygyError> {
            let y = &u_weighted + x * beta;
            Ok(x - u - system.rhs(t_eval, &y)? * h)
        };
        let residual_jacobian = |x: &StateVector| -> Result<DMatrix<f64>, SyzygyError> {
            let y = &u_weighted + x * beta;
            Ok(&identity - system.jacobian(t_eval, &y)? * (h * beta))
        };

        self.newton.solve(residual, residual_jacobian, u)
    }

    /// Integrate `system` from `y0` over the configured grid.
    ///
    /// Return
    /// ----------
    /// * `Ok(Trajectory)` with `M + 1` samples when completed, or fewer samples and a
    ///   `Stalled` status when a Newton solve failed,
    /// * `Err(SyzygyError::InvalidConfiguration)` if `y0` does not match the system dimension,
    /// * `Err(_)` forwarded from the system for structural failures.
    pub fn integrate<S: OdeSystem>(
        &self,
        system: &S,
        y0: &StateVector,
    ) -> Result<Trajectory, SyzygyError> {
        if y0.len() != system.dimension() {
            return Err(SyzygyError::InvalidConfiguration(format!(
                "initial state has length {}, system dimension is {}",
                y0.len(),
                system.dimension()
            )));
        }

        let p = &self.params;
        let n_steps = p.num_steps();
        let h = p.step;
        log::debug!("integrating {n_steps} steps: {p}");

        let mut trajectory = Trajectory::start(p.t0, y0.clone(), p.keep_newton_history);
        let mut u = y0.clone();

        for k in 0..n_steps {
            let t_k = p.time_at(k);

            let next = if p.is_explicit() {
                Self::explicit_step(system, t_k, &u, h)?
            } else {
                let outcome = self.implicit_step(system, t_k, &u, h)?;
                let iterations = outcome.iterations();
                let final_error = outcome.final_error().unwrap_or(0.0);

                if let Some(reason) = outcome.failure {
                    log::warn!(
                        "Newton failed at step {k} (t = {t_k}): {reason:?}; trajectory truncated to {} samples",
                        trajectory.len()
                    );
                    trajectory.stall(k, t_k, reason);
                    return Ok(trajectory);
                }

                log::trace!("step {k}: t = {t_k}, {iterations} Newton iterations");
                trajectory.record_newton(iterations, final_error, outcome.history);
                outcome.x
            };

            trajectory.push(p.time_at(k + 1), next.clone());
            u = next;
        }

        log::debug!(
            "integration completed: {} samples, {} Newton iterations",
            trajectory.len(),
            trajectory.stats().newton_iterations
        );
        Ok(trajectory)
    }
}
