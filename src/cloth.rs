
//! Cloth mesh construction and frame stepping.
//!
//! `Grid` derives everything the simulation needs from the two numbers that
//! describe an N×N cloth; `Cloth` owns the particle system and drives the
//! solver stages in their fixed per-frame order. A renderer reads positions
//! and the triangulated index list between steps.

use cgmath::Vector3;
use num::cast;

use error::ClothError;
use math::Real;
use particle::Particles;
use pbd::{self, constraint};
use pbd::constraint::Stretch;
use pbd::property::{Fixed, Mass, Position, PredPosition, Velocity};

/// Immutable N×N grid layout. Owns no particle state; derives indices,
/// rest positions, anchoring, constraints and render topology.
#[derive(Clone, Copy, Debug)]
pub struct Grid<T: Real> {
    pub edge_count: usize,
    pub max_edge_width: T,
}

impl<T: Real> Grid<T> {
    pub fn new(edge_count: usize, max_edge_width: T) -> Result<Self, ClothError> {
        if edge_count < 2 {
            return Err(ClothError::InvalidTopology(edge_count));
        }
        if max_edge_width <= T::zero() || !max_edge_width.is_finite() {
            return Err(ClothError::InvalidExtent);
        }
        Ok(Grid {
            edge_count: edge_count,
            max_edge_width: max_edge_width,
        })
    }

    pub fn len(&self) -> usize {
        self.edge_count * self.edge_count
    }

    /// Row-major particle index of grid point `(i, j)`.
    pub fn index(&self, i: usize, j: usize) -> usize {
        i * self.edge_count + j
    }

    pub fn spacing(&self) -> T {
        self.max_edge_width / cast::<usize, T>(self.edge_count - 1).unwrap()
    }

    /// Rest-state vertex layout, centered on the origin in the z = 0 plane.
    pub fn positions(&self) -> Vec<Vector3<T>> {
        let spacing = self.spacing();
        let half = self.max_edge_width / cast::<f64, T>(2.0).unwrap();
        let mut positions = Vec::with_capacity(self.len());
        for i in 0..self.edge_count {
            let y = spacing * cast::<usize, T>(i).unwrap() - half;
            for j in 0..self.edge_count {
                let x = spacing * cast::<usize, T>(j).unwrap() - half;
                positions.push(Vector3::new(x, y, T::zero()));
            }
        }
        positions
    }

    /// Anchoring mask: the two corners of the last grid row start held.
    pub fn anchors(&self) -> Vec<bool> {
        let n = self.edge_count;
        let mut anchors = vec![false; self.len()];
        anchors[self.index(n - 1, 0)] = true;
        anchors[self.index(n - 1, n - 1)] = true;
        anchors
    }

    /// Render topology: two triangles per grid cell, `u32` indices.
    pub fn triangle_indices(&self) -> Vec<u32> {
        let n = self.edge_count;
        let mut indices = Vec::with_capacity((n - 1) * (n - 1) * 6);
        for i in 0..n - 1 {
            for j in 0..n - 1 {
                let top_left = self.index(i, j) as u32;
                let top_right = self.index(i, j + 1) as u32;
                let bottom_left = self.index(i + 1, j) as u32;
                let bottom_right = self.index(i + 1, j + 1) as u32;
                indices.extend_from_slice(&[
                    top_left, top_right, bottom_right,
                    top_left, bottom_right, bottom_left,
                ]);
            }
        }
        indices
    }

    /// Structural and shear stretch constraints over the grid.
    ///
    /// Each point links to its right, down, down-right and (where present)
    /// down-left neighbor; rest lengths are measured from `positions`. The
    /// emission order fixes the solver's sweep order.
    pub fn stretch_constraints(&self, positions: &[Vector3<T>]) -> Vec<Stretch<T>> {
        let n = self.edge_count;
        let mut constraints = Vec::new();
        for i in 0..n {
            for j in 0..n {
                if i + 1 < n {
                    if j + 1 < n {
                        constraints.push(Stretch::between(self.index(i, j), self.index(i, j + 1), positions));
                        constraints.push(Stretch::between(self.index(i, j), self.index(i + 1, j), positions));
                        constraints.push(Stretch::between(self.index(i, j), self.index(i + 1, j + 1), positions));
                        if j > 0 {
                            constraints.push(Stretch::between(self.index(i, j), self.index(i + 1, j - 1), positions));
                        }
                    } else {
                        constraints.push(Stretch::between(self.index(i, j), self.index(i + 1, j), positions));
                        constraints.push(Stretch::between(self.index(i, j), self.index(i + 1, j - 1), positions));
                    }
                } else if j + 1 < n {
                    constraints.push(Stretch::between(self.index(i, j), self.index(i, j + 1), positions));
                }
            }
        }
        constraints
    }
}

/// Per-frame solve parameters, passed explicitly into [`Cloth::step`]
/// instead of living in process-wide state.
///
/// `stiffness` is applied once per relaxation sweep, so `iterations` and
/// `stiffness` jointly set the final rigidity; tune them as a pair. The
/// defaults are the tuning of the interactive 40×40 drape demo.
#[derive(Clone, Copy, Debug)]
pub struct StepParams<T> {
    pub gravity: Vector3<T>,
    pub damping: T,
    pub iterations: usize,
    pub stiffness: T,
}

impl<T: Real> Default for StepParams<T> {
    fn default() -> Self {
        StepParams {
            gravity: Vector3::new(T::zero(), cast::<f64, T>(-0.5).unwrap(), T::zero()),
            damping: cast::<f64, T>(0.01).unwrap(),
            iterations: 20,
            stiffness: cast::<f64, T>(0.25).unwrap(),
        }
    }
}

/// External per-point override, applied between frames (drag interaction,
/// moving boundary conditions). Fields left `None` keep the simulated state.
#[derive(Clone, Copy, Debug)]
pub struct PointOverride<T> {
    pub position: Option<Vector3<T>>,
    pub velocity: Option<Vector3<T>>,
    pub fixed: Option<bool>,
}

impl<T> Default for PointOverride<T> {
    fn default() -> Self {
        PointOverride {
            position: None,
            velocity: None,
            fixed: None,
        }
    }
}

/// A simulated cloth: particle state, stretch constraints, render topology.
pub struct Cloth<T: Real> {
    grid: Grid<T>,
    particles: Particles,
    constraints: Vec<Stretch<T>>,
    triangle_indices: Vec<u32>,
}

impl<T: Real> Cloth<T> {
    /// Build the rest-state cloth. Every particle shares `mass`; the two
    /// corners of the last grid row start held.
    pub fn new(edge_count: usize, max_edge_width: T, mass: T) -> Result<Self, ClothError> {
        let grid = Grid::new(edge_count, max_edge_width)?;
        if mass <= T::zero() || !mass.is_finite() {
            return Err(ClothError::InvalidMass);
        }

        let positions = grid.positions();
        let constraints = grid.stretch_constraints(&positions);

        let mut particles = Particles::new();
        pbd::init::<T>(&mut particles);
        particles.add_particles(grid.len())
            .with::<Position<T>>(&positions)
            .with::<PredPosition<T>>(&positions)
            .with::<Mass<T>>(&vec![mass; grid.len()])
            .with::<Fixed>(&grid.anchors());

        debug!("built {0}x{0} cloth: {1} particles, {2} stretch constraints",
               edge_count, grid.len(), constraints.len());

        Ok(Cloth {
            grid: grid,
            particles: particles,
            constraints: constraints,
            triangle_indices: grid.triangle_indices(),
        })
    }

    /// Advance the simulation by one frame of `timestep` seconds.
    ///
    /// Pipeline order is fixed: external forces, damping, prediction,
    /// `iterations` relaxation sweeps, velocity/position reconciliation.
    /// Positions are stable once this returns; sample them for rendering
    /// only between calls.
    pub fn step(&mut self, timestep: T, params: &StepParams<T>) -> Result<(), ClothError> {
        if timestep <= T::zero() || !timestep.is_finite() {
            return Err(ClothError::InvalidTimestep);
        }

        let Cloth { ref mut particles, ref constraints, .. } = *self;
        particles
            .run1(pbd::apply_forces, (params.gravity, timestep))
            .run1(pbd::damp_velocities, params.damping)
            .run1(pbd::predict_position, timestep);
        for _ in 0..params.iterations {
            particles.run1(constraint::solve_stretch, (constraints.as_slice(), params.stiffness));
        }
        particles
            .run1(pbd::update_velocity, timestep)
            .run(pbd::update_position::<T>);
        Ok(())
    }

    /// Force a particle's state from outside the simulation, ahead of the
    /// next `step`. Used for drag interaction: fix the grabbed point and
    /// feed it the pointer position/velocity, release it by unfixing.
    pub fn override_point(&mut self, index: usize, update: PointOverride<T>) {
        if let Some(position) = update.position {
            self.particles.write_property::<Position<T>>().unwrap()[index] = position;
        }
        if let Some(velocity) = update.velocity {
            self.particles.write_property::<Velocity<T>>().unwrap()[index] = velocity;
        }
        if let Some(held) = update.fixed {
            self.particles.write_property::<Fixed>().unwrap()[index] = held;
        }
    }

    pub fn positions(&self) -> &[Vector3<T>] {
        self.particles.read_property::<Position<T>>().unwrap()
    }

    pub fn velocities(&self) -> &[Vector3<T>] {
        self.particles.read_property::<Velocity<T>>().unwrap()
    }

    pub fn triangle_indices(&self) -> &[u32] {
        &self.triangle_indices
    }

    pub fn constraints(&self) -> &[Stretch<T>] {
        &self.constraints
    }

    pub fn grid(&self) -> &Grid<T> {
        &self.grid
    }

    pub fn point_count(&self) -> usize {
        self.particles.num_particles()
    }

    pub fn particles(&self) -> &Particles {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut Particles {
        &mut self.particles
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Vector3;
    use error::ClothError;
    use super::{Cloth, Grid};

    #[test]
    fn degenerate_grids_are_rejected() {
        assert_eq!(Grid::<f32>::new(0, 1.0).unwrap_err(), ClothError::InvalidTopology(0));
        assert_eq!(Grid::<f32>::new(1, 1.0).unwrap_err(), ClothError::InvalidTopology(1));
        assert_eq!(Grid::<f32>::new(3, 0.0).unwrap_err(), ClothError::InvalidExtent);
        assert_eq!(Grid::<f32>::new(3, -1.0).unwrap_err(), ClothError::InvalidExtent);
        assert!(Grid::<f32>::new(2, 1.0).is_ok());
    }

    #[test]
    fn nonpositive_mass_is_rejected() {
        assert_eq!(Cloth::<f32>::new(3, 1.0, 0.0).err().unwrap(), ClothError::InvalidMass);
        assert_eq!(Cloth::<f32>::new(3, 1.0, -0.5).err().unwrap(), ClothError::InvalidMass);
    }

    #[test]
    fn rest_layout_is_centered() {
        let grid = Grid::<f32>::new(3, 1.0).unwrap();
        assert_eq!(grid.spacing(), 0.5);

        let positions = grid.positions();
        assert_eq!(positions.len(), 9);
        assert_eq!(positions[0], Vector3::new(-0.5, -0.5, 0.0));
        assert_eq!(positions[4], Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(positions[8], Vector3::new(0.5, 0.5, 0.0));
    }

    #[test]
    fn only_the_last_row_corners_are_anchored() {
        let grid = Grid::<f32>::new(3, 1.0).unwrap();
        let anchors = grid.anchors();
        for (index, &held) in anchors.iter().enumerate() {
            assert_eq!(held, index == 6 || index == 8, "anchor mask wrong at {}", index);
        }
    }

    #[test]
    fn constraint_census_for_a_three_by_three_grid() {
        let grid = Grid::<f32>::new(3, 1.0).unwrap();
        let positions = grid.positions();
        let constraints = grid.stretch_constraints(&positions);
        assert_eq!(constraints.len(), 20);

        let spacing = grid.spacing();
        let shear = spacing * 2.0f32.sqrt();
        let structural_count = constraints.iter()
            .filter(|c| (c.rest_length - spacing).abs() < 1e-6)
            .count();
        let shear_count = constraints.iter()
            .filter(|c| (c.rest_length - shear).abs() < 1e-6)
            .count();
        assert_eq!(structural_count, 12);
        assert_eq!(shear_count, 8);
    }

    #[test]
    fn triangulation_covers_every_cell() {
        let grid = Grid::<f32>::new(3, 1.0).unwrap();
        let indices = grid.triangle_indices();
        assert_eq!(indices.len(), 24);
        assert_eq!(&indices[..6], &[0u32, 1, 4, 0, 4, 3][..]);
        assert!(indices.iter().all(|&index| (index as usize) < grid.len()));
    }
}
