
use cgmath::{BaseFloat, Matrix3, Vector3};

pub trait Real: BaseFloat + Send + Sync + 'static { }
impl<T> Real for T where T: BaseFloat + Send + Sync + 'static { }

/// Skew-symmetric cross-product matrix: `cross_matrix(r) * v == r.cross(v)`.
pub fn cross_matrix<S: Real>(r: Vector3<S>) -> Matrix3<S> {
    Matrix3::new(
        S::zero(), r.z, -r.y,
        -r.z, S::zero(), r.x,
        r.y, -r.x, S::zero(),
    )
}
