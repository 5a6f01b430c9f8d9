//! Core library for building and querying TIN surfaces from LIDAR data.

pub mod config;
pub mod dtm;
pub mod error;
pub mod geometry;
pub mod io;
pub mod lidar;
pub mod reporting;

pub use config::TinConfig;
pub use dtm::{PointSlopeAspect, PruneOptions, TinSurface};
pub use error::{Result, TinError};
pub use io::InputFormat;
