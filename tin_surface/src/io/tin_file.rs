//! Binary persistence for surfaces, optionally wrapped in a zip archive.
//!
//! A model file starts with an 8-byte signature and a little-endian `u32`
//! format version, followed by the bincode encoding of [`StoredModel`].
//! Edges, normals, angles and bounding boxes are derived again on load.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::dtm::{TinPoint, TinSurface};
use crate::error::{Result, TinError};
use crate::geometry::BoundingBox;

pub const MAGIC: &[u8; 8] = b"TINSURF\0";
pub const FORMAT_VERSION: u32 = 1;
/// Name of the single entry in a compressed model.
pub const ENTRY_NAME: &str = "surface.tin";

const ZIP_SIGNATURE: &[u8; 4] = b"PK\x03\x04";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct StoredPoint {
    x: f64,
    y: f64,
    z: f64,
    classification: u8,
}

/// Persisted form of a surface: what cannot be derived again on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StoredModel {
    bbox: BoundingBox,
    source: Option<String>,
    skip_stride: u64,
    points: Vec<StoredPoint>,
    triangles: Vec<([u32; 3], bool)>,
}

impl StoredModel {
    fn from_surface(path: &Path, surface: &TinSurface) -> Result<Self> {
        let index = |i: usize| {
            u32::try_from(i).map_err(|_| {
                TinError::format(path, "point indices below 2^32", i.to_string())
            })
        };
        let triangles = surface
            .triangles()
            .iter()
            .map(|t| {
                let [a, b, c] = t.vertices();
                Ok(([index(a)?, index(b)?, index(c)?], t.is_valid()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            bbox: *surface.bounding_box(),
            source: surface.source().map(|p| p.to_string_lossy().into_owned()),
            skip_stride: surface.skip_stride() as u64,
            points: surface
                .points()
                .iter()
                .map(|p| StoredPoint {
                    x: p.x,
                    y: p.y,
                    z: p.z,
                    classification: p.classification,
                })
                .collect(),
            triangles,
        })
    }

    fn into_surface(self, path: &Path) -> Result<TinSurface> {
        let count = self.points.len();
        let points: Vec<TinPoint> = self
            .points
            .into_iter()
            .enumerate()
            .map(|(i, p)| TinPoint::new(i, p.x, p.y, p.z, p.classification))
            .collect();
        let mut raw = Vec::with_capacity(self.triangles.len());
        for (v, valid) in self.triangles {
            let v = v.map(|i| i as usize);
            if let Some(&bad) = v.iter().find(|&&i| i >= count) {
                return Err(TinError::format(
                    path,
                    format!("point index below {count}"),
                    bad.to_string(),
                ));
            }
            raw.push((v, valid));
        }
        let skip_stride = usize::try_from(self.skip_stride).map_err(|_| {
            TinError::format(path, "addressable skip stride", self.skip_stride.to_string())
        })?;
        TinSurface::from_indexed(points, raw, self.source.map(PathBuf::from), skip_stride)
    }
}

fn encode_error(path: &Path, e: bincode::Error) -> TinError {
    match *e {
        bincode::ErrorKind::Io(source) => TinError::io(path, source),
        other => TinError::io(
            path,
            io::Error::new(io::ErrorKind::InvalidData, other.to_string()),
        ),
    }
}

fn decode_error(path: &Path, e: bincode::Error) -> TinError {
    match *e {
        bincode::ErrorKind::Io(source) if source.kind() != io::ErrorKind::UnexpectedEof => {
            TinError::io(path, source)
        }
        other => TinError::format(path, "TIN model payload", other.to_string()),
    }
}

fn write_model<W: Write>(path: &Path, w: &mut W, surface: &TinSurface) -> Result<()> {
    let model = StoredModel::from_surface(path, surface)?;
    w.write_all(MAGIC)
        .and_then(|_| w.write_all(&FORMAT_VERSION.to_le_bytes()))
        .map_err(|e| TinError::io(path, e))?;
    bincode::serialize_into(&mut *w, &model).map_err(|e| encode_error(path, e))?;
    w.flush().map_err(|e| TinError::io(path, e))
}

/// Writes `surface` to `path`. With `compress` the model is staged in a
/// temporary file next to `path` and then stored as a single deflated
/// zip entry.
pub fn save(surface: &TinSurface, path: impl AsRef<Path>, compress: bool) -> Result<()> {
    let path = path.as_ref();
    if !compress {
        let mut writer = crate::io::create_writer(path)?;
        write_model(path, &mut writer, surface)?;
        info!("saved {} to {}", surface.size_summary(), path.display());
        return Ok(());
    }

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut staged = tempfile::NamedTempFile::new_in(dir).map_err(|e| TinError::io(dir, e))?;
    let staged_path = staged.path().to_path_buf();
    let staged_file = staged.as_file_mut();
    {
        let mut writer = BufWriter::new(&mut *staged_file);
        write_model(&staged_path, &mut writer, surface)?;
    }
    staged_file
        .seek(SeekFrom::Start(0))
        .map_err(|e| TinError::io(&staged_path, e))?;

    let archive_err = |source: ZipError| TinError::Archive {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(|e| TinError::io(path, e))?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file(ENTRY_NAME, options).map_err(archive_err)?;
    io::copy(staged_file, &mut zip).map_err(|e| TinError::io(path, e))?;
    zip.finish()
        .map_err(archive_err)?
        .flush()
        .map_err(|e| TinError::io(path, e))?;
    info!(
        "saved {} to {} (compressed)",
        surface.size_summary(),
        path.display()
    );
    Ok(())
}

fn has_zip_signature(path: &Path) -> Result<bool> {
    let mut head = [0u8; 4];
    let mut file = File::open(path).map_err(|e| TinError::io(path, e))?;
    let mut read = 0;
    while read < head.len() {
        match file.read(&mut head[read..]) {
            Ok(0) => break,
            Ok(n) => read += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(TinError::io(path, e)),
        }
    }
    Ok(read == head.len() && &head == ZIP_SIGNATURE)
}

/// Reads a surface written by [`save`], compressed or not.
///
/// A file that is not a zip archive and does not begin with a zip local
/// header is read as a raw model. Archive errors on anything that looks
/// like a zip file are returned.
pub fn load(path: impl AsRef<Path>) -> Result<TinSurface> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| TinError::io(path, e))?;
    let surface = match ZipArchive::new(BufReader::new(file)) {
        Ok(mut archive) => {
            if archive.len() != 1 {
                return Err(TinError::format(
                    path,
                    "single-entry archive",
                    format!("{} entries", archive.len()),
                ));
            }
            let entry = archive.by_index(0).map_err(|source| TinError::Archive {
                path: path.to_path_buf(),
                source,
            })?;
            debug!("{}: reading compressed entry {}", path.display(), entry.name());
            read_model(path, BufReader::new(entry))?
        }
        Err(source) => {
            if has_zip_signature(path)? {
                return Err(TinError::Archive {
                    path: path.to_path_buf(),
                    source,
                });
            }
            debug!("{}: not a zip archive ({source}), reading raw model", path.display());
            let file = File::open(path).map_err(|e| TinError::io(path, e))?;
            read_model(path, BufReader::new(file))?
        }
    };
    info!("loaded {} from {}", surface.size_summary(), path.display());
    Ok(surface)
}

fn read_model<R: Read>(path: &Path, mut inner: R) -> Result<TinSurface> {
    let mut header = [0u8; 12];
    inner.read_exact(&mut header).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            TinError::format(path, "12-byte model header", "end of data")
        } else {
            TinError::io(path, e)
        }
    })?;
    if &header[..8] != MAGIC {
        return Err(TinError::format(
            path,
            "model signature \"TINSURF\"",
            format!("{:?}", String::from_utf8_lossy(&header[..8])),
        ));
    }
    let version = u32::from_le_bytes([header[8], header[9], header[10], header[11]]);
    if version != FORMAT_VERSION {
        return Err(TinError::format(
            path,
            format!("format version {FORMAT_VERSION}"),
            format!("version {version}"),
        ));
    }
    let model: StoredModel =
        bincode::deserialize_from(inner).map_err(|e| decode_error(path, e))?;
    debug!(
        "{}: decoded {} points and {} triangles",
        path.display(),
        model.points.len(),
        model.triangles.len()
    );
    model.into_surface(path)
}

impl TinSurface {
    /// See [`save`].
    pub fn save(&self, path: impl AsRef<Path>, compress: bool) -> Result<()> {
        save(self, path, compress)
    }

    /// See [`load`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        load(path)
    }
}
