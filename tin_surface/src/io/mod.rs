//! File input and output for point clouds and surface models.

pub mod landxml;
pub mod las;
pub mod obj;
pub mod tin_file;
pub mod xyz;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TinError};

/// Kind of file a surface is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// LAS 1.4 point cloud.
    #[default]
    Las,
    /// Delimited `x,y,z` text.
    Xyz,
    /// LandXML surface with its own triangles.
    LandXml,
}

impl InputFormat {
    /// Guesses the format from the file extension, falling back to LAS.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("xyz" | "txt" | "csv") => InputFormat::Xyz,
            Some("xml") => InputFormat::LandXml,
            _ => InputFormat::Las,
        }
    }
}

/// Opens `path` for buffered writing, truncating any existing file.
pub(crate) fn create_writer(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| TinError::io(path, e))
}

/// Writes `lines` to `path`, one per line.
pub fn write_lines<I, S>(path: impl AsRef<Path>, lines: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let path = path.as_ref();
    let mut writer = create_writer(path)?;
    for line in lines {
        writeln!(writer, "{}", line.as_ref()).map_err(|e| TinError::io(path, e))?;
    }
    writer.flush().map_err(|e| TinError::io(path, e))
}
