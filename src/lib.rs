
pub extern crate cgmath;
#[macro_use]
extern crate log;
#[macro_use]
extern crate mopa;
extern crate num;
extern crate rayon;
extern crate thiserror;

pub mod cloth;
pub mod error;
pub mod math;
pub mod particle;
pub mod pbd;

pub use cloth::{Cloth, Grid, PointOverride, StepParams};
pub use error::ClothError;
pub use particle::{Particles, Processor, Property};
