//! Streaming reader for LAS 1.4 point clouds.
//!
//! The public header is decoded with the `las` crate. Point records are
//! then read one at a time in a single forward pass, classification byte
//! first, so rejected records are never fully decoded and the raw file is
//! never held in memory.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use las::point::{Classification, Format};
use las::{Builder, Transform, Vector, Version, Writer};
use log::{debug, info};

use crate::error::{Result, TinError};
use crate::geometry::{BoundingBox, Point3};
use crate::lidar::{ClassificationFilter, LidarPoint};

/// Size of the LAS 1.4 public header block.
pub const HEADER_LEN: usize = 375;
/// File signature at the start of every LAS file.
pub const SIGNATURE: &[u8; 4] = b"LASF";

const SUPPORTED_VERSION: (u8, u8) = (1, 4);
const WRITE_FORMAT: u8 = 6;

fn i32_at(buf: &[u8], at: usize) -> i32 {
    i32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

/// Fields of the public header needed to decode point records.
#[derive(Debug, Clone, PartialEq)]
pub struct LasHeader {
    pub version_major: u8,
    pub version_minor: u8,
    pub header_size: u16,
    pub point_data_offset: u32,
    pub vlr_count: u32,
    pub point_format: u8,
    pub record_length: u16,
    pub point_count: u64,
    pub scale: Point3,
    pub offset: Point3,
    /// Extents as recorded in the header.
    pub extent: BoundingBox,
}

impl LasHeader {
    /// Decodes and validates the header of `path`. `head` holds the first
    /// bytes of the file; `rest` continues the stream after them so any
    /// header padding can be consumed.
    pub fn read<R: Read>(path: &Path, head: &[u8], rest: R) -> Result<Self> {
        let signature = &head[..head.len().min(4)];
        if signature != SIGNATURE {
            return Err(TinError::format(
                path,
                "signature \"LASF\"",
                format!("{:?}", String::from_utf8_lossy(signature)),
            ));
        }
        if head.len() < HEADER_LEN {
            return Err(TinError::format(
                path,
                format!("{HEADER_LEN}-byte header"),
                format!("{} bytes", head.len()),
            ));
        }
        let raw = las::raw::Header::read_from(head.chain(rest))
            .map_err(|e| TinError::format(path, "LAS public header", e.to_string()))?;
        let version = (raw.version.major, raw.version.minor);
        if version != SUPPORTED_VERSION {
            return Err(TinError::format(
                path,
                "LAS version 1.4",
                format!("version {}.{}", version.0, version.1),
            ));
        }
        let large_count = raw
            .large_file
            .as_ref()
            .map(|l| l.number_of_point_records)
            .unwrap_or(0);

        let header = LasHeader {
            version_major: version.0,
            version_minor: version.1,
            header_size: raw.header_size,
            point_data_offset: raw.offset_to_point_data,
            vlr_count: raw.number_of_variable_length_records,
            point_format: raw.point_data_record_format,
            record_length: raw.point_data_record_length,
            point_count: large_count.max(u64::from(raw.number_of_point_records)),
            scale: Point3::new(raw.x_scale_factor, raw.y_scale_factor, raw.z_scale_factor),
            offset: Point3::new(raw.x_offset, raw.y_offset, raw.z_offset),
            extent: BoundingBox {
                min_x: raw.min_x,
                min_y: raw.min_y,
                min_z: raw.min_z,
                max_x: raw.max_x,
                max_y: raw.max_y,
                max_z: raw.max_z,
            },
        };

        if header.point_format > 10 {
            return Err(TinError::format(
                path,
                "point data format 0-10",
                format!("format {}", header.point_format),
            ));
        }
        let min_len = header.classification_offset() + 1;
        if (header.record_length as usize) < min_len {
            return Err(TinError::format(
                path,
                format!("point records of at least {min_len} bytes"),
                format!("{} bytes", header.record_length),
            ));
        }
        if (header.point_data_offset as usize) < HEADER_LEN {
            return Err(TinError::format(
                path,
                format!("point data offset of at least {HEADER_LEN}"),
                header.point_data_offset.to_string(),
            ));
        }
        Ok(header)
    }

    /// Byte offset of the classification field within a point record.
    fn classification_offset(&self) -> usize {
        if self.point_format >= 6 {
            16
        } else {
            15
        }
    }

    fn decode_classification(&self, record: &[u8]) -> u8 {
        let raw = record[self.classification_offset()];
        if self.point_format >= 6 {
            raw
        } else {
            raw & 0x1F
        }
    }

    fn decode_point(&self, record: &[u8], classification: u8) -> LidarPoint {
        let x = i32_at(record, 0) as f64 * self.scale.x + self.offset.x;
        let y = i32_at(record, 4) as f64 * self.scale.y + self.offset.y;
        let z = i32_at(record, 8) as f64 * self.scale.z + self.offset.z;
        LidarPoint::new(x, y, z, classification)
    }
}

/// Forward-only reader over the point records of a LAS file.
pub struct LasReader {
    path: PathBuf,
    header: LasHeader,
    reader: BufReader<File>,
    record: Vec<u8>,
    next_index: u64,
}

impl LasReader {
    /// Opens `path`, validates the header and positions the reader at the
    /// first point record.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| TinError::io(path, e))?;
        let mut reader = BufReader::new(file);
        let mut buf = Vec::with_capacity(HEADER_LEN);
        (&mut reader)
            .take(HEADER_LEN as u64)
            .read_to_end(&mut buf)
            .map_err(|e| TinError::io(path, e))?;
        let header = LasHeader::read(path, &buf, &mut reader)?;
        debug!(
            "{}: LAS {}.{} format {} with {} records of {} bytes",
            path.display(),
            header.version_major,
            header.version_minor,
            header.point_format,
            header.point_count,
            header.record_length
        );
        reader
            .seek(SeekFrom::Start(header.point_data_offset as u64))
            .map_err(|e| TinError::io(path, e))?;
        let record = vec![0u8; header.record_length as usize];
        Ok(Self {
            path: path.to_path_buf(),
            header,
            reader,
            record,
            next_index: 0,
        })
    }

    pub fn header(&self) -> &LasHeader {
        &self.header
    }

    /// Returns the next record whose classification passes `filter`.
    /// Rejected records are skipped before their coordinates are decoded.
    pub fn next_point(&mut self, filter: &ClassificationFilter) -> Result<Option<LidarPoint>> {
        while self.next_index < self.header.point_count {
            if let Err(e) = self.reader.read_exact(&mut self.record) {
                return Err(if e.kind() == io::ErrorKind::UnexpectedEof {
                    TinError::format(
                        &self.path,
                        format!("{} point records", self.header.point_count),
                        format!("{} complete records", self.next_index),
                    )
                } else {
                    TinError::io(&self.path, e)
                });
            }
            self.next_index += 1;
            let class = self.header.decode_classification(&self.record);
            if !filter.contains(class) {
                continue;
            }
            return Ok(Some(self.header.decode_point(&self.record, class)));
        }
        Ok(None)
    }
}

/// Keeps every `(stride + 1)`-th item, starting with the first.
#[derive(Debug, Clone, Copy)]
pub struct Decimator {
    period: usize,
    counter: usize,
}

impl Decimator {
    pub fn new(stride: usize) -> Self {
        Self {
            period: stride.saturating_add(1),
            counter: 0,
        }
    }

    /// Advances the counter and reports whether the current item is kept.
    pub fn keep(&mut self) -> bool {
        let keep = self.counter % self.period == 0;
        self.counter += 1;
        keep
    }
}

/// Options controlling which records are retained.
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    pub classification_filter: ClassificationFilter,
    /// Number of retained records dropped between kept ones.
    pub skip_stride: usize,
    /// Optional plan window; records outside it are ignored before decimation.
    pub trim: Option<BoundingBox>,
    /// Collect decimated-out points instead of discarding them.
    pub keep_skipped: bool,
}

/// Points read from a file, split by decimation.
#[derive(Debug, Clone, Default)]
pub struct DecimatedPoints {
    pub kept: Vec<LidarPoint>,
    pub skipped: Vec<LidarPoint>,
}

impl DecimatedPoints {
    /// Applies the trim window and decimation of `options` to points that
    /// already passed the classification filter, in file order.
    pub fn collect<I>(points: I, options: &ReadOptions) -> Result<Self>
    where
        I: IntoIterator<Item = Result<LidarPoint>>,
    {
        let mut decimator = Decimator::new(options.skip_stride);
        let mut out = Self::default();
        for point in points {
            let point = point?;
            if let Some(trim) = &options.trim {
                if !point.is_inside(trim) {
                    continue;
                }
            }
            if decimator.keep() {
                out.kept.push(point);
            } else if options.keep_skipped {
                out.skipped.push(point);
            }
        }
        Ok(out)
    }
}

/// Reads the points of `path` whose classification is in `filter`, keeping
/// every `(skip_stride + 1)`-th of them.
pub fn read_points(
    path: impl AsRef<Path>,
    filter: &ClassificationFilter,
    skip_stride: usize,
) -> Result<Vec<LidarPoint>> {
    let options = ReadOptions {
        classification_filter: filter.clone(),
        skip_stride,
        ..ReadOptions::default()
    };
    Ok(read_points_with(path, &options)?.kept)
}

/// Reads `path` according to `options`.
pub fn read_points_with(path: impl AsRef<Path>, options: &ReadOptions) -> Result<DecimatedPoints> {
    let path = path.as_ref();
    let mut reader = LasReader::open(path)?;
    let filter = &options.classification_filter;
    let records = std::iter::from_fn(|| reader.next_point(filter).transpose());
    let read = DecimatedPoints::collect(records, options)?;
    info!(
        "{}: kept {} points ({} decimated) of {} records",
        path.display(),
        read.kept.len(),
        read.skipped.len(),
        reader.header.point_count
    );
    Ok(read)
}

/// Writes points to a LAS 1.4 file using point data format 6 and the given
/// coordinate resolution. Coordinates that do not fit the scaled 32-bit
/// record fields are an error.
pub fn write_points_las(path: impl AsRef<Path>, points: &[LidarPoint], scale: f64) -> Result<()> {
    let path = path.as_ref();
    let las_err = |source: las::Error| TinError::Las {
        path: path.to_path_buf(),
        source,
    };
    let extent = BoundingBox::from_points(points.iter().map(|p| p.position()))
        .unwrap_or_else(|| BoundingBox::from_point(Point3::new(0.0, 0.0, 0.0)));
    let transform = |min: f64| Transform {
        scale,
        offset: min.floor(),
    };

    let mut builder = Builder::default();
    builder.version = Version::new(SUPPORTED_VERSION.0, SUPPORTED_VERSION.1);
    builder.point_format = Format::new(WRITE_FORMAT).map_err(las_err)?;
    builder.transforms = Vector {
        x: transform(extent.min_x),
        y: transform(extent.min_y),
        z: transform(extent.min_z),
    };
    let header = builder.into_header().map_err(las_err)?;
    let mut writer = Writer::from_path(path, header).map_err(las_err)?;
    for p in points {
        let point = las::Point {
            x: p.x,
            y: p.y,
            z: p.z,
            classification: Classification::new(p.classification).map_err(las_err)?,
            gps_time: Some(0.0),
            ..Default::default()
        };
        writer.write_point(point).map_err(las_err)?;
    }
    writer.close().map_err(las_err)?;
    debug!("{}: wrote {} points", path.display(), points.len());
    Ok(())
}
