//! # Constants and type definitions for Syzygy
//!
//! This module centralizes the **physical constants**, **numerical defaults**, and **common type
//! definitions** used throughout the `syzygy` library.
//!
//! ## Overview
//!
//! - Gravitational constant in the AU / year / solar-mass unit system
//! - Default tolerances for the Newton solver and the eclipse classifier
//! - Core type aliases for state vectors and Jacobians
//! - Identifiers for the solar system bodies, in the order of the initial-condition data
//!
//! Units
//! -----------------
//! Distances are in astronomical units, times in Julian years and masses in solar masses.
//! In that system Kepler's third law gives `G = 4π²` exactly.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

// -------------------------------------------------------------------------------------------------
// Physical constants
// -------------------------------------------------------------------------------------------------

/// 2π, useful for trigonometric conversions
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// Gravitational constant in AU³ / (M☉ · yr²)
pub const GRAV_AU_YEAR: f64 = DPI * DPI;

/// Number of state components carried by one body: velocity (3) then position (3)
pub const BODY_STATE_DIM: usize = 6;

// -------------------------------------------------------------------------------------------------
// Numerical defaults
// -------------------------------------------------------------------------------------------------

/// Default absolute tolerance on the Newton step norm
pub const NEWTON_EPS: f64 = 1e-12;

/// Default maximum number of Newton iterations per implicit step
pub const NEWTON_MAX_IT: usize = 50;

/// Default proximity tolerance between a refined alignment extremum and ±1
pub const ECLIPSE_TOLERANCE: f64 = 3e-4;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Full state vector of an N-body system (length 6·N)
pub type StateVector = DVector<f64>;

/// Dense Jacobian of a vector field ((6·N) × (6·N))
pub type JacobianMatrix = DMatrix<f64>;

// -------------------------------------------------------------------------------------------------
// Solar system bodies
// -------------------------------------------------------------------------------------------------

/// The eleven bodies of the reference solar system run, in the order they appear in the
/// initial-condition data (and therefore in the state vector).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolarSystemBody {
    Sun,
    Mercury,
    Venus,
    Earth,
    Moon,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
}

impl SolarSystemBody {
    /// All bodies, in state-vector order.
    pub const ALL: [SolarSystemBody; 11] = [
        SolarSystemBody::Sun,
        SolarSystemBody::Mercury,
        SolarSystemBody::Venus,
        SolarSystemBody::Earth,
        SolarSystemBody::Moon,
        SolarSystemBody::Mars,
        SolarSystemBody::Jupiter,
        SolarSystemBody::Saturn,
        SolarSystemBody::Uranus,
        SolarSystemBody::Neptune,
        SolarSystemBody::Pluto,
    ];

    /// Index of the body in the state vector.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            SolarSystemBody::Sun => "Sun",
            SolarSystemBody::Mercury => "Mercury",
            SolarSystemBody::Venus => "Venus",
            SolarSystemBody::Earth => "Earth",
            SolarSystemBody::Moon => "Moon",
            SolarSystemBody::Mars => "Mars",
            SolarSystemBody::Jupiter => "Jupiter",
            SolarSystemBody::Saturn => "Saturn",
            SolarSystemBody::Uranus => "Uranus",
            SolarSystemBody::Neptune => "Neptune",
            SolarSystemBody::Pluto => "Pluto",
        }
    }
}
