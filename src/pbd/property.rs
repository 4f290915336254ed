
//! Cloth particle properties.

use cgmath::{Array, Vector3};

use math::Real;
use particle::Property;

/// Authoritative particle position, stable between frames.
#[derive(Clone, Debug)]
pub struct Position<T: Real>(pub Vector3<T>);
impl<T: Real> Property for Position<T> {
    type Subtype = Vector3<T>;
    fn new() -> Self::Subtype {
        Vector3::from_value(T::zero())
    }
}

/// Predicted position, scratch state of a single frame's solve.
#[derive(Clone, Debug)]
pub struct PredPosition<T: Real>(pub Vector3<T>);
impl<T: Real> Property for PredPosition<T> {
    type Subtype = Vector3<T>;
    fn new() -> Self::Subtype {
        Vector3::from_value(T::zero())
    }
}

#[derive(Clone, Debug)]
pub struct Velocity<T: Real>(pub Vector3<T>);
impl<T: Real> Property for Velocity<T> {
    type Subtype = Vector3<T>;
    fn new() -> Self::Subtype {
        Vector3::from_value(T::zero())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Mass<T: Real>(pub T);
impl<T: Real> Property for Mass<T> {
    type Subtype = T;
    fn new() -> Self::Subtype {
        T::zero()
    }
}

/// Particles held in place by an external authority (boundary condition or
/// user interaction); excluded from every solver stage.
#[derive(Clone, Copy, Debug)]
pub struct Fixed(pub bool);
impl Property for Fixed {
    type Subtype = bool;
    fn new() -> Self::Subtype {
        false
    }
}
