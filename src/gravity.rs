//! # Pairwise Newtonian gravity
//!
//! Acceleration exerted by a single point mass and its derivative with respect to the
//! relative displacement.
//!
//! Sign convention
//! -----------------
//! `d = x_b − x_p` is the displacement **from the source body `p` to the attracted body `b`**.
//! The acceleration of `b` is then
//!
//! ```text
//! g(d) = −G·M / |d|³ · d
//! ```
//!
//! which points from `b` back toward `p` (attraction). Its Jacobian with respect to `d` is
//!
//! ```text
//! ∂g/∂d = G·M / |d|³ · (−I₃ + 3 / |d|² · d dᵀ)
//! ```
//!
//! a symmetric matrix, even in `d`. Both functions share the same norm and sign so that the
//! field assembled in [`crate::nbody`] and its Jacobian stay consistent.

use nalgebra::{Matrix3, Vector3};

use crate::linalg::{nonzero_norm, outer3};
use crate::syzygy_errors::SyzygyError;

/// Gravitational acceleration of a body displaced by `d` from a source of mass `mass`.
///
/// Arguments
/// -----------------
/// * `d`: displacement `x_b − x_p` from the source to the attracted body.
/// * `grav`: gravitational constant `G`.
/// * `mass`: mass `M` of the source body.
///
/// Return
/// ----------
/// * `−G·M / |d|³ · d`, or `SyzygyError::DegenerateGeometry` when the two bodies coincide.
pub fn acceleration(d: &Vector3<f64>, grav: f64, mass: f64) -> Result<Vector3<f64>, SyzygyError> {
    let r = nonzero_norm(d, "pairwise displacement")?;
    Ok(d * (-grav * mass / (r * r * r)))
}

/// Jacobian of [`acceleration`] with respect to the displacement `d`.
///
/// Return
/// ----------
/// * `G·M/|d|³ · (−I₃ + 3/|d|² · d dᵀ)`, or `SyzygyError::DegenerateGeometry` when `d = 0`.
pub fn acceleration_jacobian(
    d: &Vector3<f64>,
    grav: f64,
    mass: f64,
) -> Result<Matrix3<f64>, SyzygyError> {
    let r = nonzero_norm(d, "pairwise displacement")?;
    let r2 = r * r;
    let scale = grav * mass / (r2 * r);
    Ok((outer3(d) * (3.0 / r2) - Matrix3::identity()) * scale)
}
