//! JSON configuration for building surfaces.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dtm::PruneOptions;
use crate::error::{Result, TinError};
use crate::geometry::BoundingBox;
use crate::io::las::ReadOptions;
use crate::lidar::ClassificationFilter;

/// Settings for reading, pruning and saving a surface. Missing fields take
/// their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TinConfig {
    /// Classification codes kept from the point cloud.
    pub classification_filter: ClassificationFilter,
    pub skip_stride: usize,
    /// Decimate after triangulating so every hull point survives.
    pub keep_hull: bool,
    /// Plan window applied while reading.
    pub trim: Option<BoundingBox>,
    pub prune: PruneOptions,
    /// Save models as zip archives.
    pub compress: bool,
}

impl Default for TinConfig {
    fn default() -> Self {
        Self {
            classification_filter: ClassificationFilter::default(),
            skip_stride: 0,
            keep_hull: false,
            trim: None,
            prune: PruneOptions::default(),
            compress: true,
        }
    }
}

impl TinConfig {
    pub fn from_json_str(path: &Path, json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|source| TinError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| TinError::io(path, e))?;
        Self::from_json_str(path, &json)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            classification_filter: self.classification_filter.clone(),
            skip_stride: self.skip_stride,
            trim: self.trim,
            keep_skipped: false,
        }
    }
}
