//! # Eclipse detection from an N-body trajectory
//!
//! Eclipses are located through the **alignment signal**
//!
//! ```text
//! α(t) = (d_ME · d_MS) / (‖d_ME‖ · ‖d_MS‖),    d_ME = x_Moon − x_Earth,  d_MS = x_Moon − x_Sun
//! ```
//!
//! the cosine of the angle at the Moon between the directions to the Earth and to the Sun.
//!
//! * `α → +1`: Earth and Sun lie on the same side of the Moon, the Earth between them:
//!   the Moon crosses the Earth's shadow, a **lunar** eclipse.
//! * `α → −1`: the Moon lies between the Earth and the Sun, a **solar** eclipse.
//!
//! ## Pipeline
//!
//! 1. [`alignment_signal`] computes `α` at every trajectory sample.
//! 2. [`extrema::find_maxima`] / [`extrema::find_minima`] flag interior samples strictly above
//!    (below) both neighbours and refine them with a three-point parabola.
//! 3. [`detect_events`] keeps maxima with `|α − 1| < τ` (lunar) and minima with `|α + 1| < τ`
//!    (solar), ordered by time.
//!
//! Event times are offsets in the time unit of the trajectory (years from the epoch of the
//! initial conditions); turning them into calendar dates is left to the caller.
//!
//! ## Example
//!
//! ```rust
//! use syzygy::eclipse::{detect_events, EclipseKind};
//!
//! let times: Vec<f64> = (0..=2000).map(|k| -0.05 + k as f64 * 0.0066).collect();
//! let alpha: Vec<f64> = times.iter().map(|t| t.cos()).collect();
//!
//! let events = detect_events(&times, &alpha, 3e-4).unwrap();
//! assert_eq!(events[0].kind, EclipseKind::Lunar);
//! assert_eq!(events[1].kind, EclipseKind::Solar);
//! ```
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{SolarSystemBody, BODY_STATE_DIM, ECLIPSE_TOLERANCE};
use crate::integration::trajectory::Trajectory;
use crate::linalg::nonzero_norm;
use crate::nbody::NBodySystem;
use crate::syzygy_errors::SyzygyError;

pub mod extrema;

use extrema::{find_maxima, find_minima};

/// Kind of eclipse, from the sign of the alignment extremum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EclipseKind {
    /// Moon between Earth and Sun (`α ≈ −1`).
    Solar,
    /// Earth between Moon and Sun (`α ≈ +1`).
    Lunar,
}

impl fmt::Display for EclipseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EclipseKind::Solar => write!(f, "solar"),
            EclipseKind::Lunar => write!(f, "lunar"),
        }
    }
}

/// A detected eclipse.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EclipseEvent {
    /// Refined time of maximal alignment, in trajectory time units.
    pub time: f64,
    /// Refined alignment value `α` at that time.
    pub value: f64,
    pub kind: EclipseKind,
}

impl fmt::Display for EclipseEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} eclipse at t = {:.6} (alpha = {:+.6})",
            self.kind, self.time, self.value
        )
    }
}

/// Indices of the three bodies defining the alignment signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentBodies {
    pub sun: usize,
    pub earth: usize,
    pub moon: usize,
}

impl Default for AlignmentBodies {
    fn default() -> Self {
        AlignmentBodies {
            sun: SolarSystemBody::Sun.index(),
            earth: SolarSystemBody::Earth.index(),
            moon: SolarSystemBody::Moon.index(),
        }
    }
}

impl AlignmentBodies {
    /// Check that the three indices are distinct and below `n_bodies`.
    pub fn validate(&self, n_bodies: usize) -> Result<(), SyzygyError> {
        let AlignmentBodies { sun, earth, moon } = *self;
        if sun == earth || sun == moon || earth == moon {
            return Err(SyzygyError::InvalidConfiguration(format!(
                "alignment bodies must be distinct, got sun={sun}, earth={earth}, moon={moon}"
            )));
        }
        if let Some(max) = [sun, earth, moon].into_iter().find(|&b| b >= n_bodies) {
            return Err(SyzygyError::InvalidConfiguration(format!(
                "body index {max} out of range for {n_bodies} bodies"
            )));
        }
        Ok(())
    }
}

/// Configuration of the eclipse detector.
///
/// Defaults
/// -----------------
/// * `tolerance`: 3.0e-4
/// * `bodies`: Sun = 0, Earth = 3, Moon = 4 (see [`SolarSystemBody`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EclipseParams {
    /// Maximal distance `τ` between a refined extremum and `±1`.
    pub tolerance: f64,
    pub bodies: AlignmentBodies,
}

impl Default for EclipseParams {
    fn default() -> Self {
        EclipseParams {
            tolerance: ECLIPSE_TOLERANCE,
            bodies: AlignmentBodies::default(),
        }
    }
}

impl EclipseParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> EclipseParamsBuilder {
        EclipseParamsBuilder::new()
    }
}

/// Builder for [`EclipseParams`], with validation.
#[derive(Debug, Clone, Default)]
pub struct EclipseParamsBuilder {
    params: EclipseParams,
}

impl EclipseParamsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tolerance(mut self, v: f64) -> Self {
        self.params.tolerance = v;
        self
    }
    pub fn sun(mut self, v: usize) -> Self {
        self.params.bodies.sun = v;
        self
    }
    pub fn earth(mut self, v: usize) -> Self {
        self.params.bodies.earth = v;
        self
    }
    pub fn moon(mut self, v: usize) -> Self {
        self.params.bodies.moon = v;
        self
    }

    /// Finalize the builder.
    ///
    /// Validation rules
    /// -----------------
    /// * `tolerance` finite and `> 0`,
    /// * the three body indices are distinct (range is checked against the trajectory).
    pub fn build(self) -> Result<EclipseParams, SyzygyError> {
        let p = &self.params;
        if !(p.tolerance.is_finite() && p.tolerance > 0.0) {
            return Err(SyzygyError::InvalidConfiguration(format!(
                "eclipse tolerance must be finite and > 0, got {}",
                p.tolerance
            )));
        }
        p.bodies.validate(usize::MAX)?;
        Ok(self.params)
    }
}

impl fmt::Display for EclipseParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "Eclipse Detection Parameters")?;
            writeln!(f, "----------------------------")?;
            writeln!(f, "  tolerance = {:.1e}", self.tolerance)?;
            writeln!(f, "  sun       = {}", self.bodies.sun)?;
            writeln!(f, "  earth     = {}", self.bodies.earth)?;
            writeln!(f, "  moon      = {}", self.bodies.moon)
        } else {
            write!(
                f,
                "EclipseParams(tolerance={:.1e}, sun={}, earth={}, moon={})",
                self.tolerance, self.bodies.sun, self.bodies.earth, self.bodies.moon
            )
        }
    }
}

/// Alignment signal `α` at every sample of `trajectory`.
///
/// Return
/// ----------
/// * one value per sample, in `[−1, 1]` up to rounding (never clamped, so that adjacent
///   near-aligned samples keep their order for the extremum scan),
/// * `SyzygyError::DegenerateGeometry` if the Moon coincides with the Earth or the Sun,
/// * `SyzygyError::InvalidConfiguration` if a body index is out of range for the states.
pub fn alignment_signal(
    trajectory: &Trajectory,
    bodies: &AlignmentBodies,
) -> Result<Vec<f64>, SyzygyError> {
    let n_bodies = trajectory.states().first().map_or(0, |y| y.len() / BODY_STATE_DIM);
    bodies.validate(n_bodies)?;

    trajectory
        .states()
        .iter()
        .map(|y| {
            let moon = NBodySystem::position(y, bodies.moon);
            let d_me = moon - NBodySystem::position(y, bodies.earth);
            let d_ms = moon - NBodySystem::position(y, bodies.sun);
            let r_me = nonzero_norm(&d_me, "Moon-Earth displacement")?;
            let r_ms = nonzero_norm(&d_ms, "Moon-Sun displacement")?;
            Ok(d_me.dot(&d_ms) / (r_me * r_ms))
        })
        .collect()
}

/// Classify the refined extrema of an alignment signal into eclipse events.
///
/// Arguments
/// -----------------
/// * `times`, `alpha`: the sampled signal.
/// * `tolerance`: proximity `τ` to `±1` required for an extremum to count.
///
/// Return
/// ----------
/// * events ordered by time: maxima with `|α − 1| < τ` are lunar, minima with `|α + 1| < τ`
///   are solar.
pub fn detect_events(
    times: &[f64],
    alpha: &[f64],
    tolerance: f64,
) -> Result<Vec<EclipseEvent>, SyzygyError> {
    let lunar = find_maxima(times, alpha)?
        .into_iter()
        .filter(|ext| (ext.value - 1.0).abs() < tolerance)
        .map(|ext| EclipseEvent {
            time: ext.time,
            value: ext.value,
            kind: EclipseKind::Lunar,
        });

    let solar = find_minima(times, alpha)?
        .into_iter()
        .filter(|ext| (-ext.value - 1.0).abs() < tolerance)
        .map(|ext| EclipseEvent {
            time: ext.time,
            value: ext.value,
            kind: EclipseKind::Solar,
        });

    let mut events: Vec<EclipseEvent> = lunar.chain(solar).collect();
    events.sort_by(|a, b| a.time.total_cmp(&b.time));
    Ok(events)
}

/// Eclipses along an integrated trajectory.
///
/// A stalled trajectory is scanned as far as it goes; check
/// [`Trajectory::is_complete`] to know whether the whole horizon was covered.
pub fn find_eclipses(
    trajectory: &Trajectory,
    params: &EclipseParams,
) -> Result<Vec<EclipseEvent>, SyzygyError> {
    if !trajectory.is_complete() {
        log::warn!(
            "scanning a truncated trajectory ({} samples, status {:?})",
            trajectory.len(),
            trajectory.status()
        );
    }
    let alpha = alignment_signal(trajectory, &params.bodies)?;
    let events = detect_events(trajectory.times(), &alpha, params.tolerance)?;
    log::debug!("{} eclipse events found with {}", events.len(), params);
    Ok(events)
}
