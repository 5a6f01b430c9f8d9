//! LIDAR point records and classification filtering.

use std::collections::BTreeSet;

use crate::geometry::{BoundingBox, Point3};

/// ASPRS classification codes used by LAS point clouds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Classification {
    Created = 0,
    Unclassified = 1,
    Ground = 2,
    LowVegetation = 3,
    MediumVegetation = 4,
    HighVegetation = 5,
    Building = 6,
    LowNoise = 7,
    HighNoise = 8,
    Water = 9,
    Rail = 10,
    RoadSurface = 11,
    BridgeDeck = 12,
    WireGuard = 13,
    WireConductor = 14,
    TransmissionTower = 15,
}

impl Classification {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Set of classification codes retained while reading a point cloud.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ClassificationFilter(BTreeSet<u8>);

impl ClassificationFilter {
    pub fn new<I: IntoIterator<Item = u8>>(codes: I) -> Self {
        Self(codes.into_iter().collect())
    }

    /// Filter that accepts every classification.
    pub fn all() -> Self {
        Self::new(0..=u8::MAX)
    }

    pub fn contains(&self, code: u8) -> bool {
        self.0.contains(&code)
    }

    pub fn codes(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().copied()
    }
}

impl Default for ClassificationFilter {
    /// Ground and guard wires, the bare-earth defaults.
    fn default() -> Self {
        Self::new([Classification::Ground.code(), Classification::WireGuard.code()])
    }
}

/// A single point decoded from a point cloud.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LidarPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub classification: u8,
}

impl LidarPoint {
    pub fn new(x: f64, y: f64, z: f64, classification: u8) -> Self {
        Self {
            x,
            y,
            z,
            classification,
        }
    }

    pub fn position(&self) -> Point3 {
        Point3::new(self.x, self.y, self.z)
    }

    pub fn is_inside(&self, trim: &BoundingBox) -> bool {
        trim.contains_plan(self.x, self.y)
    }
}
