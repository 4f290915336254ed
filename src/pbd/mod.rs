
//! Position-based cloth dynamics.
//!
//! The frame pipeline is strictly ordered: external forces, velocity
//! damping, position prediction, constraint relaxation, velocity/position
//! reconciliation. Every stage works in place on the particle system.
//!
//! References:
//!     [MHHR06] Matthias Müller, Bruno Heidelberger, Marcus Hennix, and John Ratcliff, 2006,
//!              Position based dynamics,
//!              In Proceedings of Virtual Reality Interactions and Physical Simulations (VRIPHYS 2006), 71-80

pub mod constraint;
pub mod property;

use self::property::*;

use cgmath::{Array, Matrix, Matrix3, SquareMatrix, Vector3};
use rayon::prelude::*;

use math::{cross_matrix, Real};
use particle::{Particles, Processor};

/// Register the properties the cloth pipeline operates on.
pub fn init<T: Real>(particles: &mut Particles) {
    particles.add_property::<Position<T>>();
    particles.add_property::<PredPosition<T>>();
    particles.add_property::<Velocity<T>>();
    particles.add_property::<Mass<T>>();
    particles.add_property::<Fixed>();
}

// Alg. 1 `Simulation Loop`, 5
/// Apply a uniform external acceleration (gravity) to every free particle.
pub fn apply_forces<T: Real>(p: &Processor, (gravity, timestep): (Vector3<T>, T)) {
    let (velocities, fixed) = (
        p.write_property::<Velocity<T>>().unwrap(),
        p.read_property::<Fixed>().unwrap(),
    );

    velocities.par_iter_mut()
        .zip(fixed.par_iter())
        .for_each(|(vel, &held)| {
            if !held {
                *vel += gravity * timestep;
            }
        });
}

// Alg. 1 `Simulation Loop`, 6
/// Rigid body style damping of the velocity field ([MHHR06] Sec. 3.5).
///
/// The free particles' best-fit rigid motion (center-of-mass velocity plus
/// one angular velocity) is extracted, and each free velocity is pulled
/// toward its rigid prediction by `coefficient`. Bulk translation and
/// rotation survive; relative motion decays.
pub fn damp_velocities<T: Real>(p: &Processor, coefficient: T) {
    let (velocities, positions, masses, fixed) = (
        p.write_property::<Velocity<T>>().unwrap(),
        p.read_property::<Position<T>>().unwrap(),
        p.read_property::<Mass<T>>().unwrap(),
        p.read_property::<Fixed>().unwrap(),
    );

    let zero = Vector3::from_value(T::zero());

    // mass-weighted center of mass and velocity over the free particles only
    let mut weighted_pos = zero;
    let mut weighted_vel = zero;
    let mut total_mass = T::zero();
    for i in 0..positions.len() {
        if fixed[i] {
            continue;
        }
        weighted_pos += positions[i] * masses[i];
        weighted_vel += velocities[i] * masses[i];
        total_mass += masses[i];
    }
    if total_mass == T::zero() {
        // every particle is held, nothing to damp
        return;
    }
    let center = weighted_pos / total_mass;
    let center_vel = weighted_vel / total_mass;

    // angular momentum and inertia tensor about the center of mass
    let mut angular = zero;
    let mut inertia = Matrix3::from_value(T::zero());
    for i in 0..positions.len() {
        if fixed[i] {
            continue;
        }
        let r = positions[i] - center;
        angular += r.cross(velocities[i]) * masses[i];
        let skew = cross_matrix(r);
        inertia = inertia + skew * skew.transpose() * masses[i];
    }

    // The tensor is singular when the free particles are collinear or
    // coincident; no rigid rotation can be extracted that frame.
    let inverse = match inertia.invert() {
        Some(inverse) => inverse,
        None => {
            warn!("singular inertia tensor, skipping damping pass");
            return;
        }
    };
    let spin = inverse * angular;

    velocities.par_iter_mut()
        .zip(positions.par_iter())
        .zip(fixed.par_iter())
        .for_each(|((vel, &pos), &held)| {
            if held {
                return;
            }
            let rigid = center_vel + spin.cross(pos - center);
            *vel += (rigid - *vel) * coefficient;
        });
}

// Alg. 1 `Simulation Loop`, 7
/// Predict where each particle ends up absent constraints. Held particles
/// predict their current position, so no later stage can displace them.
pub fn predict_position<T: Real>(p: &Processor, timestep: T) {
    let (pred_positions, positions, velocities, fixed) = (
        p.write_property::<PredPosition<T>>().unwrap(),
        p.read_property::<Position<T>>().unwrap(),
        p.read_property::<Velocity<T>>().unwrap(),
        p.read_property::<Fixed>().unwrap(),
    );

    pred_positions.par_iter_mut()
        .zip(positions.par_iter())
        .zip(velocities.par_iter())
        .zip(fixed.par_iter())
        .for_each(|(((pred, &pos), &vel), &held)| {
            *pred = if held { pos } else { pos + vel * timestep };
        });
}

// Alg. 1 `Simulation Loop`, 12
/// Derive velocities from the corrected predictions. Held particles are
/// reset to zero velocity.
pub fn update_velocity<T: Real>(p: &Processor, timestep: T) {
    let (velocities, positions, pred_positions, fixed) = (
        p.write_property::<Velocity<T>>().unwrap(),
        p.read_property::<Position<T>>().unwrap(),
        p.read_property::<PredPosition<T>>().unwrap(),
        p.read_property::<Fixed>().unwrap(),
    );

    velocities.par_iter_mut()
        .zip(positions.par_iter())
        .zip(pred_positions.par_iter())
        .zip(fixed.par_iter())
        .for_each(|(((vel, &pos), &pred), &held)| {
            *vel = if held {
                Vector3::from_value(T::zero())
            } else {
                (pred - pos) / timestep
            };
        });
}

// Alg. 1 `Simulation Loop`, 13
/// Commit the corrected predictions as the new authoritative positions.
pub fn update_position<T: Real>(p: &Processor) {
    let (positions, pred_positions) = (
        p.write_property::<Position<T>>().unwrap(),
        p.read_property::<PredPosition<T>>().unwrap(),
    );

    positions.par_iter_mut()
        .zip(pred_positions.par_iter())
        .for_each(|(pos, &pred)| {
            *pos = pred;
        });
}
