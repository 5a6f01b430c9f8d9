//! Basic geometry primitives for surface operations.

mod bounds;
mod point;

pub use bounds::BoundingBox;
pub use point::{Point, Point3};

/// Calculates the Euclidean distance between two points.
pub fn distance(a: Point, b: Point) -> f64 {
    ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt()
}

/// Calculates the Euclidean distance between two 3D points.
pub fn distance3(a: Point3, b: Point3) -> f64 {
    ((b.x - a.x).powi(2) + (b.y - a.y).powi(2) + (b.z - a.z).powi(2)).sqrt()
}

pub fn subtract(a: Point3, b: Point3) -> Point3 {
    Point3::new(a.x - b.x, a.y - b.y, a.z - b.z)
}

pub fn cross(a: Point3, b: Point3) -> Point3 {
    Point3 {
        x: a.y * b.z - a.z * b.y,
        y: a.z * b.x - a.x * b.z,
        z: a.x * b.y - a.y * b.x,
    }
}

pub fn dot(a: Point3, b: Point3) -> f64 {
    a.x * b.x + a.y * b.y + a.z * b.z
}

/// Angle between two vectors in radians. Zero-length input yields zero.
pub fn angle_between(a: Point3, b: Point3) -> f64 {
    let denom = a.length() * b.length();
    if denom <= f64::EPSILON {
        return 0.0;
    }
    (dot(a, b) / denom).clamp(-1.0, 1.0).acos()
}

/// Azimuth in degrees clockwise from north (+y) of the plan direction
/// `(dx, dy)`, normalised to `[0, 360)`.
pub fn azimuth_degrees(dx: f64, dy: f64) -> f64 {
    let az = dx.atan2(dy).to_degrees();
    if az < 0.0 {
        az + 360.0
    } else {
        az
    }
}
