use crate::geometry::{Point, Point3};
use crate::lidar::LidarPoint;

/// Decimetre grid cell used to detect coincident points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridKey {
    pub x: i64,
    pub y: i64,
}

impl GridKey {
    pub fn of(x: f64, y: f64) -> Self {
        Self {
            x: (x * 10.0).round() as i64,
            y: (y * 10.0).round() as i64,
        }
    }
}

/// A surface vertex with its position in the surface point array.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TinPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub classification: u8,
    index: usize,
}

impl TinPoint {
    pub fn new(index: usize, x: f64, y: f64, z: f64, classification: u8) -> Self {
        Self {
            x,
            y,
            z,
            classification,
            index,
        }
    }

    pub fn from_lidar(index: usize, p: &LidarPoint) -> Self {
        Self::new(index, p.x, p.y, p.z, p.classification)
    }

    pub fn to_lidar(&self) -> LidarPoint {
        LidarPoint::new(self.x, self.y, self.z, self.classification)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn position(&self) -> Point3 {
        Point3::new(self.x, self.y, self.z)
    }

    pub fn plan(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn grid_key(&self) -> GridKey {
        GridKey::of(self.x, self.y)
    }
}
