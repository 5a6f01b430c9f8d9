//! Error types for surface construction, persistence and configuration.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, TinError>;

/// Errors raised while reading point clouds, building surfaces or
/// loading and saving them.
#[derive(Debug, Error)]
pub enum TinError {
    /// The input file is not in the expected format.
    #[error("{}: invalid format: expected {expected}, found {found}", path.display())]
    Format {
        /// File being read.
        path: PathBuf,
        /// What the reader required.
        expected: String,
        /// What the file contained.
        found: String,
    },

    /// A triangle with zero or near-zero plan area.
    #[error("degenerate triangle with vertices {vertices:?}")]
    DegenerateTriangle {
        /// Point indices of the rejected triangle.
        vertices: [usize; 3],
    },

    /// An edge claimed by more than two triangles.
    #[error("edge ({a}, {b}) is shared by more than two triangles")]
    NonManifoldEdge {
        /// Lower point index of the edge.
        a: usize,
        /// Upper point index of the edge.
        b: usize,
    },

    /// Triangulation produced no triangles.
    #[error(
        "cannot build a surface from {points} point(s): \
         at least three non-collinear points are required"
    )]
    EmptySurface {
        /// Number of points offered to the triangulation.
        points: usize,
    },

    /// Filesystem failure.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being accessed.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failure reading or writing a zip archive.
    #[error("archive error on {}: {source}", path.display())]
    Archive {
        /// Archive being accessed.
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// Failure reported by the LAS codec.
    #[error("LAS error on {}: {source}", path.display())]
    Las {
        /// Point cloud being accessed.
        path: PathBuf,
        #[source]
        source: las::Error,
    },

    /// Malformed configuration file.
    #[error("invalid configuration in {}: {source}", path.display())]
    Config {
        /// Configuration file.
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl TinError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        TinError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn format(
        path: &Path,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        TinError::Format {
            path: path.to_path_buf(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Returns `true` for errors caused by a malformed input file.
    pub fn is_format_error(&self) -> bool {
        matches!(self, TinError::Format { .. })
    }

    /// Returns `true` for errors caused by invalid mesh geometry.
    pub fn is_geometry_error(&self) -> bool {
        matches!(
            self,
            TinError::DegenerateTriangle { .. }
                | TinError::NonManifoldEdge { .. }
                | TinError::EmptySurface { .. }
        )
    }
}
