
//! Stretch constraints.
//!
//! Position-based dynamics is built on top of a system of non-linear
//! constraints over the predicted particle positions. The cloth uses a single
//! kind: pairwise stretch constraints that drive two particles back toward
//! their rest distance.

use cgmath::{InnerSpace, Vector3};

use math::Real;
use particle::Processor;
use super::property::{Fixed, Mass, PredPosition};

/// Pairwise distance constraint between the particles at index `a` and `b`.
///
/// The rest length is fixed when the constraint is generated and never
/// changes afterwards.
#[derive(Clone, Debug)]
pub struct Stretch<T> {
    pub a: usize,
    pub b: usize,
    pub rest_length: T,
}

impl<T: Real> Stretch<T> {
    /// Constraint whose rest length is the current distance of the endpoints.
    pub fn between(a: usize, b: usize, positions: &[Vector3<T>]) -> Self {
        Stretch {
            a: a,
            b: b,
            rest_length: (positions[a] - positions[b]).magnitude(),
        }
    }
}

// Alg. 1 `Simulation Loop`, 9-11
/// One relaxation sweep over all stretch constraints, in list order.
///
/// This is Gauss-Seidel: a constraint sees the corrections of every
/// constraint before it in the same sweep, so the sweep must stay
/// sequential. `stiffness` is the sub-step factor applied per sweep; sweep
/// count and stiffness jointly determine how rigid the cloth ends up.
pub fn solve_stretch<T: Real>(p: &Processor, (constraints, stiffness): (&[Stretch<T>], T)) {
    let (pred_positions, masses, fixed) = (
        p.write_property::<PredPosition<T>>().unwrap(),
        p.read_property::<Mass<T>>().unwrap(),
        p.read_property::<Fixed>().unwrap(),
    );

    for constraint in constraints {
        let (a, b) = (constraint.a, constraint.b);

        let delta = pred_positions[a] - pred_positions[b];
        let len = delta.magnitude();
        if len == T::zero() {
            // coincident predictions, correction direction undefined
            continue;
        }

        let w_a = if fixed[a] { T::zero() } else { T::one() / masses[a] };
        let w_b = if fixed[b] { T::zero() } else { T::one() / masses[b] };
        let w_sum = w_a + w_b;
        if w_sum == T::zero() {
            // both endpoints held in place
            continue;
        }

        let err = len - constraint.rest_length;
        let correction = delta * (err * stiffness / (len * w_sum));
        if !fixed[a] {
            pred_positions[a] -= correction * w_a;
        }
        if !fixed[b] {
            pred_positions[b] += correction * w_b;
        }
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Vector3;
    use particle::Particles;
    use pbd;
    use pbd::property::{Fixed, Mass, Position, PredPosition};
    use super::{solve_stretch, Stretch};

    fn pair(separation: f32) -> Particles {
        let mut particles = Particles::new();
        pbd::init::<f32>(&mut particles);
        let positions = vec![
            Vector3::new(0.0f32, 0.0, 0.0),
            Vector3::new(separation, 0.0, 0.0),
        ];
        particles.add_particles(2)
            .with::<Position<f32>>(&positions)
            .with::<PredPosition<f32>>(&positions)
            .with::<Mass<f32>>(&[1.0, 1.0]);
        particles
    }

    #[test]
    fn equal_masses_split_the_correction_symmetrically() {
        let mut particles = pair(2.0);
        let constraints = vec![Stretch { a: 0, b: 1, rest_length: 1.0 }];

        particles.run1(solve_stretch, (constraints.as_slice(), 0.25f32));

        let pred = particles.read_property::<PredPosition<f32>>().unwrap();
        // error 1.0, stiffness 0.25, each free endpoint takes half
        assert_eq!(pred[0], Vector3::new(0.125, 0.0, 0.0));
        assert_eq!(pred[1], Vector3::new(1.875, 0.0, 0.0));
        assert_eq!((pred[1] - pred[0]).x, 1.75);
    }

    #[test]
    fn fixed_endpoint_leaves_the_whole_correction_to_the_free_one() {
        let mut particles = pair(2.0);
        particles.write_property::<Fixed>().unwrap()[0] = true;
        let constraints = vec![Stretch { a: 0, b: 1, rest_length: 1.0 }];

        particles.run1(solve_stretch, (constraints.as_slice(), 0.25f32));

        let pred = particles.read_property::<PredPosition<f32>>().unwrap();
        assert_eq!(pred[0], Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(pred[1], Vector3::new(1.75, 0.0, 0.0));
    }

    #[test]
    fn fully_fixed_constraint_is_skipped() {
        let mut particles = pair(2.0);
        for held in particles.write_property::<Fixed>().unwrap() {
            *held = true;
        }
        let constraints = vec![Stretch { a: 0, b: 1, rest_length: 1.0 }];

        particles.run1(solve_stretch, (constraints.as_slice(), 0.25f32));

        let pred = particles.read_property::<PredPosition<f32>>().unwrap();
        assert_eq!(pred[0], Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(pred[1], Vector3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn coincident_predictions_are_skipped() {
        let mut particles = pair(0.0);
        let constraints = vec![Stretch { a: 0, b: 1, rest_length: 1.0 }];

        particles.run1(solve_stretch, (constraints.as_slice(), 0.25f32));

        let pred = particles.read_property::<PredPosition<f32>>().unwrap();
        assert_eq!(pred[0], pred[1]);
    }

    #[test]
    fn rest_length_is_measured_from_the_given_positions() {
        let positions = vec![
            Vector3::new(0.0f32, 0.0, 0.0),
            Vector3::new(3.0f32, 4.0, 0.0),
        ];
        let constraint = Stretch::between(0, 1, &positions);
        assert_eq!(constraint.rest_length, 5.0);
    }
}
