mod common;

use approx::assert_relative_eq;
use nalgebra::Vector3;
use syzygy::constants::{SolarSystemBody, GRAV_AU_YEAR};
use syzygy::eclipse::{alignment_signal, find_eclipses, AlignmentBodies, EclipseKind, EclipseParams};
use syzygy::integration::beta_method::BetaIntegrator;
use syzygy::integration::IntegrationParams;
use syzygy::nbody::NBodySystem;

use crate::common::{
    max_relative_energy_drift, sun_earth_moon, zero_momentum, EARTH_MASS, MOON_DISTANCE_AU,
    MOON_MASS,
};

const SEM_BODIES: AlignmentBodies = AlignmentBodies {
    sun: 0,
    earth: 1,
    moon: 2,
};

fn midpoint(t_end: f64, step: f64) -> BetaIntegrator {
    BetaIntegrator::new(
        IntegrationParams::builder()
            .t_end(t_end)
            .step(step)
            .beta(0.5)
            .build()
            .unwrap(),
    )
    .unwrap()
}

#[test]
fn test_coplanar_moon_eclipses_every_syzygy() {
    let (system, y0) = sun_earth_moon();
    let trajectory = midpoint(0.18, 2.5e-4).integrate(&system, &y0).unwrap();
    assert!(trajectory.is_complete());

    let params = EclipseParams::builder()
        .sun(0)
        .earth(1)
        .moon(2)
        .build()
        .unwrap();
    let events = find_eclipses(&trajectory, &params).unwrap();

    // The run starts at full moon (an endpoint, never reported), then alternates
    // new moon / full moon every half synodic month (~0.0404 yr).
    let kinds: Vec<EclipseKind> = events.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            EclipseKind::Solar,
            EclipseKind::Lunar,
            EclipseKind::Solar,
            EclipseKind::Lunar
        ]
    );
    assert_relative_eq!(events[0].time, 0.0399, epsilon = 1e-3);
    for pair in events.windows(2) {
        let gap = pair[1].time - pair[0].time;
        assert!((0.038..0.042).contains(&gap), "gap {gap}");
    }
    for event in &events {
        let target = match event.kind {
            EclipseKind::Lunar => 1.0,
            EclipseKind::Solar => -1.0,
        };
        assert_relative_eq!(event.value, target, epsilon = 1e-6);
    }
}

#[test]
fn test_inclined_moon_misses_eclipses() {
    // Moon orbit tilted by 5.145°, line of nodes perpendicular to the Sun direction.
    let masses = vec![1.0, EARTH_MASS, MOON_MASS];
    let inc = 5.145_f64.to_radians();
    let v_earth = (GRAV_AU_YEAR * (1.0 + EARTH_MASS + MOON_MASS)).sqrt();
    let v_moon = (GRAV_AU_YEAR * (EARTH_MASS + MOON_MASS) / MOON_DISTANCE_AU).sqrt();
    let mut bodies = vec![
        (Vector3::zeros(), Vector3::zeros()),
        (Vector3::new(0.0, v_earth, 0.0), Vector3::new(1.0, 0.0, 0.0)),
        (
            Vector3::new(-v_moon * inc.cos(), v_earth, v_moon * inc.sin()),
            Vector3::new(1.0, MOON_DISTANCE_AU, 0.0),
        ),
    ];
    zero_momentum(&masses, &mut bodies);
    let system = NBodySystem::new(masses).unwrap();
    let y0 = NBodySystem::state_from_bodies(&bodies);

    let trajectory = midpoint(0.18, 2.5e-4).integrate(&system, &y0).unwrap();

    let strict = EclipseParams {
        bodies: SEM_BODIES,
        ..Default::default()
    };
    assert!(find_eclipses(&trajectory, &strict).unwrap().is_empty());

    // The alignment extrema are still there, only farther than τ from ±1.
    let loose = EclipseParams {
        tolerance: 1e-2,
        bodies: SEM_BODIES,
    };
    assert_eq!(find_eclipses(&trajectory, &loose).unwrap().len(), 4);
}

#[test]
fn test_alignment_signal_stays_in_range() {
    let (system, y0) = sun_earth_moon();
    let trajectory = midpoint(0.05, 5e-4).integrate(&system, &y0).unwrap();
    let alpha = alignment_signal(&trajectory, &SEM_BODIES).unwrap();

    assert_eq!(alpha.len(), trajectory.len());
    assert_relative_eq!(alpha[0], 1.0, epsilon = 1e-12);
    assert!(alpha.iter().all(|a| a.abs() <= 1.0 + 1e-12));
}

/// Eleven bodies on coplanar circular orbits, in the order of [`SolarSystemBody`].
fn toy_solar_system() -> (NBodySystem, nalgebra::DVector<f64>) {
    // (mass [M☉], orbital radius [AU], phase [rad]); Earth and Moon handled separately.
    let planets: [(SolarSystemBody, f64, f64, f64); 8] = [
        (SolarSystemBody::Mercury, 1.660_1e-7, 0.387, 1.0),
        (SolarSystemBody::Venus, 2.447_8e-6, 0.723, 2.0),
        (SolarSystemBody::Mars, 3.227_2e-7, 1.524, 3.0),
        (SolarSystemBody::Jupiter, 9.547_9e-4, 5.203, 4.0),
        (SolarSystemBody::Saturn, 2.858_9e-4, 9.537, 5.0),
        (SolarSystemBody::Uranus, 4.366_2e-5, 19.19, 6.0),
        (SolarSystemBody::Neptune, 5.151_4e-5, 30.07, 0.5),
        (SolarSystemBody::Pluto, 6.58e-9, 39.48, 1.5),
    ];

    let mut masses = vec![0.0; SolarSystemBody::ALL.len()];
    let mut bodies = vec![(Vector3::zeros(), Vector3::zeros()); SolarSystemBody::ALL.len()];
    masses[SolarSystemBody::Sun.index()] = 1.0;

    for (body, mass, radius, phase) in planets {
        let speed = (GRAV_AU_YEAR / radius).sqrt();
        masses[body.index()] = mass;
        bodies[body.index()] = (
            Vector3::new(-phase.sin(), phase.cos(), 0.0) * speed,
            Vector3::new(phase.cos(), phase.sin(), 0.0) * radius,
        );
    }

    let v_earth = (GRAV_AU_YEAR * (1.0 + EARTH_MASS + MOON_MASS)).sqrt();
    let v_moon = (GRAV_AU_YEAR * (EARTH_MASS + MOON_MASS) / MOON_DISTANCE_AU).sqrt();
    masses[SolarSystemBody::Earth.index()] = EARTH_MASS;
    masses[SolarSystemBody::Moon.index()] = MOON_MASS;
    bodies[SolarSystemBody::Earth.index()] =
        (Vector3::new(0.0, v_earth, 0.0), Vector3::new(1.0, 0.0, 0.0));
    bodies[SolarSystemBody::Moon.index()] = (
        Vector3::new(0.0, v_earth + v_moon, 0.0),
        Vector3::new(1.0 + MOON_DISTANCE_AU, 0.0, 0.0),
    );

    zero_momentum(&masses, &mut bodies);
    (
        NBodySystem::new(masses).unwrap(),
        NBodySystem::state_from_bodies(&bodies),
    )
}

#[test]
fn test_eleven_body_run_with_default_ordering() {
    let (system, y0) = toy_solar_system();
    assert_eq!(system.state_dim(), 66);

    let trajectory = midpoint(0.1, 2.5e-4).integrate(&system, &y0).unwrap();
    assert!(trajectory.is_complete());
    assert_eq!(trajectory.len(), 401);
    assert!(max_relative_energy_drift(&system, trajectory.states()) < 1e-8);

    let events = find_eclipses(&trajectory, &EclipseParams::default()).unwrap();
    let kinds: Vec<EclipseKind> = events.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![EclipseKind::Solar, EclipseKind::Lunar]);
    assert_relative_eq!(events[0].time, 0.0399, epsilon = 2e-3);
    assert_relative_eq!(events[1].time, 0.0801, epsilon = 2e-3);
}
