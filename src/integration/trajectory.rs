//! Trajectory produced by the β-method integrator.
//!
//! A [`Trajectory`] is the append-only sequence of `(t_k, u_k)` samples, together with an
//! explicit [`IntegrationStatus`] telling whether the whole horizon was covered. A stalled
//! run is never signalled by the number of samples alone.

use nalgebra::{DVector, Vector3};
use serde::{Deserialize, Serialize};

use crate::constants::{StateVector, BODY_STATE_DIM};
use crate::nbody::NBodySystem;
use crate::newton::NewtonFailure;
use crate::syzygy_errors::SyzygyError;

/// How an integration run ended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum IntegrationStatus {
    /// Every step of the grid was taken.
    Completed,
    /// The Newton solve of step `step` (from `time` to `time + h`) failed; the trajectory stops
    /// at `time`.
    Stalled {
        step: usize,
        time: f64,
        reason: NewtonFailure,
    },
}

/// Counters collected while integrating.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntegrationStats {
    /// Number of accepted steps.
    pub steps: usize,
    /// Newton iterations summed over all steps.
    pub newton_iterations: usize,
    /// Largest number of Newton iterations needed by one step.
    pub max_newton_iterations: usize,
    /// Largest final Newton step norm over all accepted steps.
    pub max_final_error: f64,
}

/// Time grid and states of an integration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    times: Vec<f64>,
    states: Vec<StateVector>,
    status: IntegrationStatus,
    stats: IntegrationStats,
    newton_history: Option<Vec<Vec<DVector<f64>>>>,
}

impl Trajectory {
    pub(crate) fn start(t0: f64, y0: StateVector, keep_newton_history: bool) -> Self {
        Trajectory {
            times: vec![t0],
            states: vec![y0],
            status: IntegrationStatus::Completed,
            stats: IntegrationStats::default(),
            newton_history: keep_newton_history.then(Vec::new),
        }
    }

    pub(crate) fn push(&mut self, t: f64, y: StateVector) {
        self.times.push(t);
        self.states.push(y);
        self.stats.steps += 1;
    }

    pub(crate) fn record_newton(
        &mut self,
        iterations: usize,
        final_error: f64,
        history: Option<Vec<DVector<f64>>>,
    ) {
        self.stats.newton_iterations += iterations;
        self.stats.max_newton_iterations = self.stats.max_newton_iterations.max(iterations);
        self.stats.max_final_error = self.stats.max_final_error.max(final_error);
        if let (Some(all), Some(step)) = (self.newton_history.as_mut(), history) {
            all.push(step);
        }
    }

    pub(crate) fn stall(&mut self, step: usize, time: f64, reason: NewtonFailure) {
        self.status = IntegrationStatus::Stalled { step, time, reason };
    }

    /// Build a trajectory from already computed samples (e.g. loaded by an outer collaborator).
    ///
    /// Return
    /// ----------
    /// * `SyzygyError::InvalidConfiguration` if the two sequences differ in length, are
    ///   empty, if the times are not strictly increasing, or if the states do not all share
    ///   one length that is a multiple of 6.
    pub fn from_samples(times: Vec<f64>, states: Vec<StateVector>) -> Result<Self, SyzygyError> {
        if times.is_empty() || times.len() != states.len() {
            return Err(SyzygyError::InvalidConfiguration(format!(
                "trajectory needs as many times as states (got {} and {})",
                times.len(),
                states.len()
            )));
        }
        if times.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(SyzygyError::InvalidConfiguration(
                "trajectory times must be strictly increasing".into(),
            ));
        }
        let dim = states[0].len();
        if let Some(k) = states
            .iter()
            .position(|y| y.len() != dim || y.len() % BODY_STATE_DIM != 0)
        {
            return Err(SyzygyError::InvalidConfiguration(format!(
                "state {k} has length {}; all states must share one length, a multiple of {BODY_STATE_DIM}",
                states[k].len()
            )));
        }
        let steps = times.len() - 1;
        Ok(Trajectory {
            times,
            states,
            status: IntegrationStatus::Completed,
            stats: IntegrationStats {
                steps,
                ..Default::default()
            },
            newton_history: None,
        })
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn states(&self) -> &[StateVector] {
        &self.states
    }

    pub fn status(&self) -> IntegrationStatus {
        self.status
    }

    pub fn stats(&self) -> &IntegrationStats {
        &self.stats
    }

    /// Newton iterates of every implicit step, when history was requested.
    pub fn newton_history(&self) -> Option<&[Vec<DVector<f64>>]> {
        self.newton_history.as_deref()
    }

    /// Number of samples, including the initial state.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.status == IntegrationStatus::Completed
    }

    /// Turn a stalled run into `SyzygyError::IntegrationStalled`.
    pub fn ensure_complete(&self) -> Result<(), SyzygyError> {
        match self.status {
            IntegrationStatus::Completed => Ok(()),
            IntegrationStatus::Stalled { step, time, .. } => {
                Err(SyzygyError::IntegrationStalled { step, time })
            }
        }
    }

    /// Last sample `(t, u)`.
    pub fn last(&self) -> Option<(f64, &StateVector)> {
        self.times.last().copied().zip(self.states.last())
    }

    /// Iterate over `(t, u)` samples in time order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, &StateVector)> {
        self.times.iter().copied().zip(self.states.iter())
    }

    /// Positions of body `b` at every sample, for an N-body state layout.
    pub fn positions_of(&self, b: usize) -> Vec<Vector3<f64>> {
        self.states
            .iter()
            .map(|y| NBodySystem::position(y, b))
            .collect()
    }
}
