
//! Error conditions surfaced by cloth construction and stepping.

use thiserror::Error;

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ClothError {
    /// The grid spacing divides by `edge_count - 1`.
    #[error("cloth grid needs an edge count of at least 2, got {0}")]
    InvalidTopology(usize),
    #[error("cloth extent must be positive and finite")]
    InvalidExtent,
    #[error("particle mass must be positive and finite")]
    InvalidMass,
    /// Velocity reconciliation divides by the timestep.
    #[error("timestep must be positive and finite")]
    InvalidTimestep,
}
