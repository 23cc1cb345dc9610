//! # Fixed-step β-method integration parameters
//!
//! This module defines the [`IntegrationParams`] configuration struct and its builder, which
//! control how the [`BetaIntegrator`](crate::integration::beta_method::BetaIntegrator) walks the
//! uniform time grid and how its inner Newton solves are tuned.
//!
//! ## The β-method family
//!
//! On the grid `t_k = t0 + k·h`, `k = 0..M` with `M = ceil((T − t0)/h)`, one step reads
//!
//! ```text
//! u_{k+1} = u_k + h · f(t_k + β·h, (1 − β)·u_k + β·u_{k+1})
//! ```
//!
//! * `β = 0` – explicit (forward) Euler, no root finding,
//! * `β = 1/2` – implicit midpoint rule,
//! * `β = 1` – implicit (backward) Euler.
//!
//! For `β ≠ 0` each step is a nonlinear equation in `u_{k+1}` solved with
//! [`NewtonSolver`](crate::newton::NewtonSolver).
//!
//! ## Example
//!
//! ```rust
//! use syzygy::integration::IntegrationParams;
//!
//! let params = IntegrationParams::builder()
//!     .t0(0.0)
//!     .t_end(1.0)
//!     .step(1.0 / 365.25)
//!     .beta(0.5)
//!     .newton_eps(1e-12)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(params.num_steps(), 366);
//! ```
use crate::constants::{NEWTON_EPS, NEWTON_MAX_IT};
use crate::newton::NewtonSolver;
use crate::syzygy_errors::SyzygyError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering::{Equal, Greater, Less};
use std::fmt;

pub mod beta_method;
pub mod ode_system;
pub mod trajectory;

/// Relative slack absorbing rounding when `(T − t0)/h` is an exact integer.
const STEP_COUNT_SLACK: f64 = 1e-9;

/// Configuration of a fixed-step β-method integration.
///
/// Fields
/// -----------------
/// * `t0`, `t_end` – integration horizon `[t0, T]` (years in the solar-system setting).
/// * `step` – fixed step size `h > 0`.
/// * `beta` – method parameter in `[0, 1]`.
/// * `newton_eps` – tolerance on the Newton step norm for implicit steps.
/// * `newton_max_it` – maximum Newton iterations per implicit step.
/// * `keep_newton_history` – keep every Newton iterate of every step (diagnostics only,
///   memory grows with the number of steps).
///
/// Defaults
/// -----------------
/// * `t0`: 0.0
/// * `t_end`: 1.0
/// * `step`: 1.0e-4 (≈ 53 min)
/// * `beta`: 0.5
/// * `newton_eps`: 1.0e-12
/// * `newton_max_it`: 50
/// * `keep_newton_history`: false
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationParams {
    pub t0: f64,
    pub t_end: f64,
    pub step: f64,
    pub beta: f64,

    /// Newton–Raphson absolute tolerance on the step norm.
    pub newton_eps: f64,
    /// Maximum Newton–Raphson iterations per implicit step.
    pub newton_max_it: usize,
    /// Keep the full iterate history of every Newton solve.
    pub keep_newton_history: bool,
}

impl IntegrationParams {
    /// Construct a new [`IntegrationParams`] with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new [`IntegrationParamsBuilder`].
    pub fn builder() -> IntegrationParamsBuilder {
        IntegrationParamsBuilder::new()
    }

    /// Number of steps `M = ceil((T − t0)/h)`.
    ///
    /// A ratio within a relative `1e-9` of an integer is rounded to it, so that an
    /// exact multiple of the step does not gain a spurious extra step.
    pub fn num_steps(&self) -> usize {
        let ratio = (self.t_end - self.t0) / self.step;
        let rounded = ratio.round();
        if (ratio - rounded).abs() <= STEP_COUNT_SLACK * ratio.max(1.0) {
            rounded as usize
        } else {
            ratio.ceil() as usize
        }
    }

    /// Time of grid node `k`, `t0 + k·h`.
    #[inline]
    pub fn time_at(&self, k: usize) -> f64 {
        self.t0 + k as f64 * self.step
    }

    /// `true` for the explicit (forward Euler) member of the family.
    pub fn is_explicit(&self) -> bool {
        self.beta == 0.0
    }

    /// Newton solver configured from these parameters.
    pub fn newton_solver(&self) -> Result<NewtonSolver, SyzygyError> {
        Ok(NewtonSolver::new(self.newton_eps, self.newton_max_it)?
            .with_history(self.keep_newton_history))
    }

    /// Re-run the builder validation on an existing value (e.g. after deserialization).
    pub fn validate(&self) -> Result<(), SyzygyError> {
        IntegrationParamsBuilder {
            params: self.clone(),
        }
        .build()
        .map(|_| ())
    }
}

impl Default for IntegrationParams {
    fn default() -> Self {
        IntegrationParams {
            t0: 0.0,
            t_end: 1.0,
            step: 1.0e-4,
            beta: 0.5,

            newton_eps: NEWTON_EPS,
            newton_max_it: NEWTON_MAX_IT,
            keep_newton_history: false,
        }
    }
}

/// Builder for [`IntegrationParams`], with validation.
#[derive(Debug, Clone)]
pub struct IntegrationParamsBuilder {
    params: IntegrationParams,
}

impl Default for IntegrationParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl IntegrationParamsBuilder {
    /// Create a new builder initialized with default values.
    pub fn new() -> Self {
        Self {
            params: IntegrationParams::default(),
        }
    }

    // --- Time grid ---
    pub fn t0(mut self, v: f64) -> Self {
        self.params.t0 = v;
        self
    }
    pub fn t_end(mut self, v: f64) -> Self {
        self.params.t_end = v;
        self
    }
    pub fn step(mut self, v: f64) -> Self {
        self.params.step = v;
        self
    }
    pub fn beta(mut self, v: f64) -> Self {
        self.params.beta = v;
        self
    }

    // --- Newton ---
    pub fn newton_eps(mut self, v: f64) -> Self {
        self.params.newton_eps = v;
        self
    }
    pub fn newton_max_it(mut self, v: usize) -> Self {
        self.params.newton_max_it = v;
        self
    }
    pub fn keep_newton_history(mut self, v: bool) -> Self {
        self.params.keep_newton_history = v;
        self
    }

    // ---- Numeric helpers for PartialOrd (handle NaN as invalid) ----

    /// Return true iff x > 0.0 and comparable (i.e., not NaN).
    #[inline]
    fn gt0(x: f64) -> bool {
        x.partial_cmp(&0.0) == Some(Greater)
    }

    /// Return true iff a <= b and comparable (i.e., not NaN).
    #[inline]
    fn le(a: f64, b: f64) -> bool {
        matches!(a.partial_cmp(&b), Some(Less) | Some(Equal))
    }

    /// Finalize the builder and produce an [`IntegrationParams`] instance.
    ///
    /// Validation rules
    /// -----------------
    /// * `t0` and `t_end` finite, `t0 ≤ t_end`,
    /// * `step` finite and `> 0`,
    /// * `0 ≤ beta ≤ 1`,
    /// * `newton_eps > 0` (finite), `newton_max_it ≥ 1`.
    ///
    /// Returns
    /// -----------------
    /// * `Err(SyzygyError::InvalidConfiguration)` if any validation rule fails.
    pub fn build(self) -> Result<IntegrationParams, SyzygyError> {
        let p = &self.params;

        if !(p.t0.is_finite() && p.t_end.is_finite()) {
            return Err(SyzygyError::InvalidConfiguration(
                "t0 and t_end must be finite".into(),
            ));
        }
        if !Self::le(p.t0, p.t_end) {
            return Err(SyzygyError::InvalidConfiguration(format!(
                "require t0 <= t_end, got [{}, {}]",
                p.t0, p.t_end
            )));
        }
        if !(Self::gt0(p.step) && p.step.is_finite()) {
            return Err(SyzygyError::InvalidConfiguration(format!(
                "step must be finite and > 0, got {}",
                p.step
            )));
        }
        if !(Self::le(0.0, p.beta) && Self::le(p.beta, 1.0)) {
            return Err(SyzygyError::InvalidConfiguration(format!(
                "require 0 <= beta <= 1, got {}",
                p.beta
            )));
        }
        if !(Self::gt0(p.newton_eps) && p.newton_eps.is_finite()) {
            return Err(SyzygyError::InvalidConfiguration(
                "newton_eps must be > 0".into(),
            ));
        }
        if p.newton_max_it == 0 {
            return Err(SyzygyError::InvalidConfiguration(
                "newton_max_it must be >= 1".into(),
            ));
        }

        Ok(self.params)
    }
}

impl fmt::Display for IntegrationParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            const PARAM_COL: usize = 40;
            writeln!(f, "Beta-method Integration Parameters")?;
            writeln!(f, "----------------------------------")?;

            macro_rules! line {
                ($fmt:expr, $val:expr, $comment:expr) => {{
                    let s = format!($fmt, $val);
                    let pad = if s.len() < PARAM_COL {
                        " ".repeat(PARAM_COL - s.len())
                    } else {
                        " ".to_string()
                    };
                    writeln!(f, "  {}{}# {}", s, pad, $comment)
                }};
            }

            writeln!(f, "[Time grid]")?;
            line!("t0            = {:.6}", self.t0, "Start of the horizon")?;
            line!("t_end         = {:.6}", self.t_end, "End of the horizon")?;
            line!("step          = {:.3e}", self.step, "Fixed step size")?;
            line!("num_steps     = {}", self.num_steps(), "ceil((t_end - t0) / step)")?;
            line!("beta          = {:.3}", self.beta, "0 explicit, 1/2 midpoint, 1 backward")?;

            writeln!(f, "\n[Newton solver]")?;
            line!("newton_eps    = {:.1e}", self.newton_eps, "Tolerance on step norm")?;
            line!("newton_max_it = {}", self.newton_max_it, "Max iterations per step")?;
            line!(
                "history       = {}",
                self.keep_newton_history,
                "Keep every Newton iterate"
            )?;

            Ok(())
        } else {
            write!(
                f,
                "IntegrationParams(t∈[{}, {}], h={:.3e}, beta={}, newton_eps={:.1e}, newton_max_it={})",
                self.t0, self.t_end, self.step, self.beta, self.newton_eps, self.newton_max_it,
            )
        }
    }
}
