//! # N-body vector field
//!
//! State-space formulation of the gravitational N-body problem.
//!
//! ## State layout
//!
//! The state of `N` bodies is a vector of `6·N` reals made of `N` consecutive blocks,
//! one per body in index order:
//!
//! ```text
//! y = [ v_0 (3) | x_0 (3) | v_1 (3) | x_1 (3) | ... | v_{N-1} (3) | x_{N-1} (3) ]
//! ```
//!
//! so that `dy/dt = [ a_0 | v_0 | a_1 | v_1 | ... ]`.
//!
//! ## Field and Jacobian
//!
//! With `g` the pairwise law of [`crate::gravity`]:
//!
//! ```text
//! a_b = Σ_{p ≠ b} g(x_b − x_p, G, m_p)
//! ```
//!
//! Each acceleration is summed once into a per-body accumulator. Differentiating gives, for
//! every ordered pair `(b, p)` with `J_bp = ∂g/∂d (x_b − x_p)`:
//!
//! * `∂a_b/∂x_b += J_bp` (self-term),
//! * `∂a_b/∂x_p −= J_bp` (cross-term),
//! * `∂x_b/∂t = v_b`, i.e. an identity block in (position-rows of `b`, velocity-columns of `b`).
//!
//! All other blocks are zero. Both the field and the Jacobian are rebuilt from scratch on
//! every call.

use nalgebra::{DMatrix, DVector, Vector3};
use serde::{Deserialize, Serialize};

use crate::constants::{JacobianMatrix, StateVector, BODY_STATE_DIM, GRAV_AU_YEAR};
use crate::gravity::{acceleration, acceleration_jacobian};
use crate::integration::ode_system::OdeSystem;
use crate::linalg::nonzero_norm;
use crate::syzygy_errors::SyzygyError;

/// Offset of the velocity slot of body `b` in the state vector.
#[inline]
fn vel_offset(b: usize) -> usize {
    BODY_STATE_DIM * b
}

/// Offset of the position slot of body `b` in the state vector.
#[inline]
fn pos_offset(b: usize) -> usize {
    BODY_STATE_DIM * b + 3
}

/// A closed system of `N ≥ 2` point masses interacting through Newtonian gravity.
///
/// The masses and the gravitational constant are fixed at construction; the state is
/// passed explicitly to every evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NBodySystem {
    masses: Vec<f64>,
    grav: f64,
}

impl NBodySystem {
    /// Build a system in AU / year / solar-mass units (`G = 4π²`).
    ///
    /// See [`NBodySystem::with_gravitational_constant`] for the validation rules.
    pub fn new(masses: Vec<f64>) -> Result<Self, SyzygyError> {
        Self::with_gravitational_constant(masses, GRAV_AU_YEAR)
    }

    /// Build a system with an explicit gravitational constant.
    ///
    /// Validation rules
    /// -----------------
    /// * at least two bodies,
    /// * every mass is finite and strictly positive,
    /// * `grav` is finite and strictly positive.
    pub fn with_gravitational_constant(masses: Vec<f64>, grav: f64) -> Result<Self, SyzygyError> {
        if masses.len() < 2 {
            return Err(SyzygyError::InvalidConfiguration(format!(
                "an N-body system needs at least 2 bodies, got {}",
                masses.len()
            )));
        }
        if let Some((b, m)) = masses
            .iter()
            .enumerate()
            .find(|(_, m)| !(m.is_finite() && **m > 0.0))
        {
            return Err(SyzygyError::InvalidConfiguration(format!(
                "mass of body {b} must be finite and > 0, got {m}"
            )));
        }
        if !(grav.is_finite() && grav > 0.0) {
            return Err(SyzygyError::InvalidConfiguration(format!(
                "gravitational constant must be finite and > 0, got {grav}"
            )));
        }
        Ok(NBodySystem { masses, grav })
    }

    pub fn n_bodies(&self) -> usize {
        self.masses.len()
    }

    pub fn masses(&self) -> &[f64] {
        &self.masses
    }

    pub fn gravitational_constant(&self) -> f64 {
        self.grav
    }

    /// Length `6·N` of the state vector.
    pub fn state_dim(&self) -> usize {
        BODY_STATE_DIM * self.n_bodies()
    }

    /// Position of body `b` read from the state vector `y`.
    pub fn position(y: &StateVector, b: usize) -> Vector3<f64> {
        y.fixed_rows::<3>(pos_offset(b)).into_owned()
    }

    /// Velocity of body `b` read from the state vector `y`.
    pub fn velocity(y: &StateVector, b: usize) -> Vector3<f64> {
        y.fixed_rows::<3>(vel_offset(b)).into_owned()
    }

    /// Assemble a state vector from per-body `(velocity, position)` pairs, in body order.
    pub fn state_from_bodies(bodies: &[(Vector3<f64>, Vector3<f64>)]) -> StateVector {
        let mut y = DVector::zeros(BODY_STATE_DIM * bodies.len());
        for (b, (vel, pos)) in bodies.iter().enumerate() {
            y.fixed_rows_mut::<3>(vel_offset(b)).copy_from(vel);
            y.fixed_rows_mut::<3>(pos_offset(b)).copy_from(pos);
        }
        y
    }

    fn check_state(&self, y: &StateVector) -> Result<(), SyzygyError> {
        if y.len() != self.state_dim() {
            return Err(SyzygyError::InvalidConfiguration(format!(
                "state vector has length {}, expected 6·{} = {}",
                y.len(),
                self.n_bodies(),
                self.state_dim()
            )));
        }
        Ok(())
    }

    /// Evaluate the vector field `F(t, y)`.
    ///
    /// The system is autonomous: `t` is accepted for the [`OdeSystem`] signature only.
    ///
    /// Return
    /// ----------
    /// * `dy/dt` in the layout of the state vector,
    /// * `SyzygyError::DegenerateGeometry` if two bodies coincide,
    /// * `SyzygyError::InvalidConfiguration` if `y` does not have length `6·N`.
    pub fn field(&self, _t: f64, y: &StateVector) -> Result<StateVector, SyzygyError> {
        self.check_state(y)?;
        let n = self.n_bodies();
        let positions: Vec<Vector3<f64>> = (0..n).map(|b| Self::position(y, b)).collect();

        let mut dydt = DVector::zeros(self.state_dim());
        for b in 0..n {
            let mut acc = Vector3::zeros();
            for p in (0..n).filter(|&p| p != b) {
                acc += acceleration(&(positions[b] - positions[p]), self.grav, self.masses[p])?;
            }
            dydt.fixed_rows_mut::<3>(vel_offset(b)).copy_from(&acc);
            dydt.fixed_rows_mut::<3>(pos_offset(b))
                .copy_from(&y.fixed_rows::<3>(vel_offset(b)));
        }
        Ok(dydt)
    }

    /// Evaluate the Jacobian `∂F/∂y (t, y)` as a dense `6N × 6N` matrix.
    ///
    /// See the module documentation for the block structure.
    pub fn jacobian(&self, _t: f64, y: &StateVector) -> Result<JacobianMatrix, SyzygyError> {
        self.check_state(y)?;
        let n = self.n_bodies();
        let dim = self.state_dim();
        let positions: Vec<Vector3<f64>> = (0..n).map(|b| Self::position(y, b)).collect();

        let mut jac = DMatrix::zeros(dim, dim);
        for b in 0..n {
            for p in (0..n).filter(|&p| p != b) {
                let block =
                    acceleration_jacobian(&(positions[b] - positions[p]), self.grav, self.masses[p])?;

                let mut self_term = jac.fixed_view_mut::<3, 3>(vel_offset(b), pos_offset(b));
                self_term += block;
                let mut cross_term = jac.fixed_view_mut::<3, 3>(vel_offset(b), pos_offset(p));
                cross_term -= block;
            }
            jac.fixed_view_mut::<3, 3>(pos_offset(b), vel_offset(b))
                .fill_with_identity();
        }
        Ok(jac)
    }

    /// Total kinetic energy `Σ ½ m_b |v_b|²`.
    pub fn kinetic_energy(&self, y: &StateVector) -> Result<f64, SyzygyError> {
        self.check_state(y)?;
        Ok(self
            .masses
            .iter()
            .enumerate()
            .map(|(b, m)| 0.5 * m * Self::velocity(y, b).norm_squared())
            .sum())
    }

    /// Total potential energy `−Σ_{b<p} G m_b m_p / |x_b − x_p|`, each pair counted once.
    pub fn potential_energy(&self, y: &StateVector) -> Result<f64, SyzygyError> {
        self.check_state(y)?;
        let n = self.n_bodies();
        let mut energy = 0.0;
        for b in 0..n {
            for p in (b + 1)..n {
                let r = nonzero_norm(
                    &(Self::position(y, b) - Self::position(y, p)),
                    "pairwise displacement",
                )?;
                energy -= self.grav * self.masses[b] * self.masses[p] / r;
            }
        }
        Ok(energy)
    }

    /// Total mechanical energy (kinetic + potential).
    pub fn total_energy(&self, y: &StateVector) -> Result<f64, SyzygyError> {
        Ok(self.kinetic_energy(y)? + self.potential_energy(y)?)
    }
}

impl OdeSystem for NBodySystem {
    fn dimension(&self) -> usize {
        self.state_dim()
    }

    fn rhs(&self, t: f64, y: &StateVector) -> Result<StateVector, SyzygyError> {
        self.field(t, y)
    }

    fn jacobian(&self, t: f64, y: &StateVector) -> Result<JacobianMatrix, SyzygyError> {
        NBodySystem::jacobian(self, t, y)
    }
}

#[cfg(test)]
mod nbody_test {
    use super::*;
    use approx::assert_relative_eq;

    fn three_body() -> (NBodySystem, StateVector) {
        let system = NBodySystem::new(vec![1.0, 3.0e-6, 3.7e-8]).unwrap();
        let y = NBodySystem::state_from_bodies(&[
            (Vector3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 0.0)),
            (Vector3::new(0.0, 6.28, 0.0), Vector3::new(1.0, 0.0, 0.0)),
            (Vector3::new(0.0, 6.5, 0.01), Vector3::new(1.00257, 0.0, 1e-4)),
        ]);
        (system, y)
    }

    #[test]
    fn test_invalid_configurations() {
        assert!(matches!(
            NBodySystem::new(vec![1.0]),
            Err(SyzygyError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            NBodySystem::new(vec![1.0, 0.0]),
            Err(SyzygyError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            NBodySystem::new(vec![1.0, f64::NAN]),
            Err(SyzygyError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            NBodySystem::with_gravitational_constant(vec![1.0, 1.0], -1.0),
            Err(SyzygyError::InvalidConfiguration(_))
        ));

        let system = NBodySystem::new(vec![1.0, 1.0]).unwrap();
        assert!(matches!(
            system.field(0.0, &DVector::zeros(6)),
            Err(SyzygyError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_state_layout_accessors() {
        let (system, y) = three_body();
        assert_eq!(system.state_dim(), 18);
        assert_eq!(NBodySystem::velocity(&y, 1), Vector3::new(0.0, 6.28, 0.0));
        assert_eq!(NBodySystem::position(&y, 1), Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(y[9], 1.0);
    }

    #[test]
    fn test_field_copies_velocities_and_attracts() {
        let (system, y) = three_body();
        let dydt = system.field(0.0, &y).unwrap();

        for b in 0..3 {
            assert_eq!(
                dydt.fixed_rows::<3>(pos_offset(b)).into_owned(),
                NBodySystem::velocity(&y, b)
            );
        }

        // The planet at +x is pulled toward the Sun at the origin, and the Sun toward +x.
        assert!(dydt[vel_offset(1)] < 0.0);
        assert!(dydt[vel_offset(0)] > 0.0);
    }

    #[test]
    fn test_momentum_is_conserved_by_field() {
        let (system, y) = three_body();
        let dydt = system.field(0.0, &y).unwrap();
        let total_force: Vector3<f64> = (0..3)
            .map(|b| dydt.fixed_rows::<3>(vel_offset(b)).into_owned() * system.masses()[b])
            .sum();
        assert!(total_force.norm() < 1e-15);
    }

    #[test]
    fn test_jacobian_matches_finite_differences() {
        let (system, y) = three_body();
        let jac = system.jacobian(0.0, &y).unwrap();

        let dim = system.state_dim();
        for k in 0..dim {
            let step = 1e-7;
            let mut plus = y.clone();
            let mut minus = y.clone();
            plus[k] += step;
            minus[k] -= step;
            let column =
                (system.field(0.0, &plus).unwrap() - system.field(0.0, &minus).unwrap()) / (2.0 * step);
            for i in 0..dim {
                let scale = jac.column(k).amax().max(1.0);
                assert!(
                    (jac[(i, k)] - column[i]).abs() / scale < 1e-5,
                    "entry ({i}, {k}): analytic {} vs numeric {}",
                    jac[(i, k)],
                    column[i]
                );
            }
        }
    }

    #[test]
    fn test_jacobian_block_structure() {
        let (system, y) = three_body();
        let jac = system.jacobian(0.0, &y).unwrap();

        for b in 0..3 {
            let identity = jac.fixed_view::<3, 3>(pos_offset(b), vel_offset(b)).into_owned();
            assert_eq!(identity, nalgebra::Matrix3::identity());

            // Velocity rows never depend on velocities, position rows never on positions.
            for p in 0..3 {
                assert!(jac.fixed_view::<3, 3>(vel_offset(b), vel_offset(p)).iter().all(|v| *v == 0.0));
                assert!(jac.fixed_view::<3, 3>(pos_offset(b), pos_offset(p)).iter().all(|v| *v == 0.0));
                if p != b {
                    assert!(jac.fixed_view::<3, 3>(pos_offset(b), vel_offset(p)).iter().all(|v| *v == 0.0));
                }
            }
        }
    }

    #[test]
    fn test_field_and_jacobian_are_pure() {
        let (system, y) = three_body();
        assert_eq!(system.field(0.0, &y).unwrap(), system.field(0.0, &y).unwrap());
        assert_eq!(system.jacobian(0.0, &y).unwrap(), system.jacobian(0.0, &y).unwrap());
        assert_eq!(system.field(0.0, &y).unwrap(), system.field(42.0, &y).unwrap());
    }

    #[test]
    fn test_coincident_bodies_fail() {
        let system = NBodySystem::new(vec![1.0, 1.0]).unwrap();
        let y = NBodySystem::state_from_bodies(&[
            (Vector3::new(0.0, 1.0, 0.0), Vector3::new(0.5, 0.5, 0.5)),
            (Vector3::new(0.0, -1.0, 0.0), Vector3::new(0.5, 0.5, 0.5)),
        ]);
        assert!(matches!(system.field(0.0, &y), Err(SyzygyError::DegenerateGeometry(_))));
        assert!(matches!(system.jacobian(0.0, &y), Err(SyzygyError::DegenerateGeometry(_))));
        assert!(matches!(system.total_energy(&y), Err(SyzygyError::DegenerateGeometry(_))));
    }

    #[test]
    fn test_energies_reject_wrong_state_length() {
        let system = NBodySystem::new(vec![1.0, 1.0e-3]).unwrap();
        let short = DVector::zeros(6);
        for energy in [
            system.kinetic_energy(&short),
            system.potential_energy(&short),
            system.total_energy(&short),
        ] {
            assert!(matches!(energy, Err(SyzygyError::InvalidConfiguration(_))));
        }
    }

    #[test]
    fn test_two_body_energy() {
        let system = NBodySystem::new(vec![1.0, 1.0e-3]).unwrap();
        let y = NBodySystem::state_from_bodies(&[
            (Vector3::zeros(), Vector3::zeros()),
            (Vector3::new(0.0, 2.0, 0.0), Vector3::new(2.0, 0.0, 0.0)),
        ]);
        assert_relative_eq!(system.kinetic_energy(&y).unwrap(), 2.0e-3, epsilon = 1e-15);
        assert_relative_eq!(
            system.potential_energy(&y).unwrap(),
            -GRAV_AU_YEAR * 1.0e-3 / 2.0,
            epsilon = 1e-15
        );
    }
}
