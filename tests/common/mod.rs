#![allow(dead_code)]

use nalgebra::Vector3;
use syzygy::constants::{StateVector, GRAV_AU_YEAR};
use syzygy::nbody::NBodySystem;

pub const EARTH_MASS: f64 = 3.003_489_6e-6;
pub const MOON_MASS: f64 = 3.694_303_3e-8;
pub const MOON_DISTANCE_AU: f64 = 2.569_555e-3;

/// Remove the total momentum by adjusting the velocity of body 0.
pub fn zero_momentum(masses: &[f64], bodies: &mut [(Vector3<f64>, Vector3<f64>)]) {
    let momentum: Vector3<f64> = masses
        .iter()
        .zip(bodies.iter())
        .skip(1)
        .map(|(m, (v, _))| v * *m)
        .sum();
    bodies[0].0 = -momentum / masses[0];
}

/// Sun + one planet starting at perihelion `q` with eccentricity `ecc`, in the xy plane.
///
/// Returns the system, its initial state and the orbital period (years).
pub fn sun_planet(planet_mass: f64, q: f64, ecc: f64) -> (NBodySystem, StateVector, f64) {
    let masses = vec![1.0, planet_mass];
    let mu = GRAV_AU_YEAR * (1.0 + planet_mass);
    let v_peri = (mu * (1.0 + ecc) / q).sqrt();
    let a = q / (1.0 - ecc);
    let period = 2.0 * std::f64::consts::PI * (a.powi(3) / mu).sqrt();

    let mut bodies = vec![
        (Vector3::zeros(), Vector3::zeros()),
        (Vector3::new(0.0, v_peri, 0.0), Vector3::new(q, 0.0, 0.0)),
    ];
    zero_momentum(&masses, &mut bodies);

    (
        NBodySystem::new(masses).unwrap(),
        NBodySystem::state_from_bodies(&bodies),
        period,
    )
}

/// Coplanar Sun–Earth–Moon system starting at full moon (Moon beyond the Earth on the x axis).
pub fn sun_earth_moon() -> (NBodySystem, StateVector) {
    let masses = vec![1.0, EARTH_MASS, MOON_MASS];
    let v_earth = (GRAV_AU_YEAR * (1.0 + EARTH_MASS + MOON_MASS)).sqrt();
    let v_moon = (GRAV_AU_YEAR * (EARTH_MASS + MOON_MASS) / MOON_DISTANCE_AU).sqrt();

    let mut bodies = vec![
        (Vector3::zeros(), Vector3::zeros()),
        (Vector3::new(0.0, v_earth, 0.0), Vector3::new(1.0, 0.0, 0.0)),
        (
            Vector3::new(0.0, v_earth + v_moon, 0.0),
            Vector3::new(1.0 + MOON_DISTANCE_AU, 0.0, 0.0),
        ),
    ];
    zero_momentum(&masses, &mut bodies);

    (
        NBodySystem::new(masses).unwrap(),
        NBodySystem::state_from_bodies(&bodies),
    )
}

/// Largest relative deviation of the total energy from its initial value.
pub fn max_relative_energy_drift(system: &NBodySystem, states: &[StateVector]) -> f64 {
    let e0 = system.total_energy(&states[0]).unwrap();
    states
        .iter()
        .map(|y| ((system.total_energy(y).unwrap() - e0) / e0).abs())
        .fold(0.0, f64::max)
}
