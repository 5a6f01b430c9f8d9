//! Delimited text point clouds: one `x,y,z` record per line.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::debug;

use crate::error::{Result, TinError};
use crate::lidar::{Classification, LidarPoint};

use super::las::{DecimatedPoints, ReadOptions};

/// Splits a record on commas, or on whitespace when it has none.
fn fields(line: &str) -> Vec<&str> {
    if line.contains(',') {
        line.split(',').map(str::trim).collect()
    } else {
        line.split_whitespace().collect()
    }
}

/// Reads a text point cloud.
///
/// Records hold `x,y,z` with an optional fourth classification field,
/// defaulting to ground. Blank lines, `#` comments and records with any
/// other field count are skipped. A first record that does not parse is
/// treated as a column header; later ones are format errors.
pub fn read_points_xyz(
    path: impl AsRef<Path>,
    options: &ReadOptions,
) -> Result<DecimatedPoints> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| TinError::io(path, e))?;
    let mut skipped = 0usize;
    let mut seen_record = false;
    let mut records = Vec::new();
    for (n, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| TinError::io(path, e))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let f = fields(line);
        if !(3..=4).contains(&f.len()) {
            skipped += 1;
            continue;
        }
        let first = !seen_record;
        seen_record = true;
        let parsed = parse_record(&f);
        match parsed {
            Some(p) => {
                if options.classification_filter.contains(p.classification) {
                    records.push(Ok(p));
                }
            }
            None if first => debug!("{}: treating line 1 as a header", path.display()),
            None => {
                return Err(TinError::format(
                    path,
                    format!("numeric x,y,z on line {}", n + 1),
                    line.to_string(),
                ))
            }
        }
    }
    if skipped > 0 {
        debug!("{}: skipped {skipped} lines without 3 fields", path.display());
    }
    DecimatedPoints::collect(records, options)
}

fn parse_record(f: &[&str]) -> Option<LidarPoint> {
    let x = f[0].parse().ok()?;
    let y = f[1].parse().ok()?;
    let z = f[2].parse().ok()?;
    let classification = match f.get(3) {
        Some(c) => c.parse().ok()?,
        None => Classification::Ground.code(),
    };
    Some(LidarPoint::new(x, y, z, classification))
}
