//! CSV reports of surface statistics.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::dtm::{Distribution, ErrorStatistics, Histogram, SamplingGrid, TinStatistics};
use crate::error::{Result, TinError};
use crate::io::write_lines;

/// Header of the error statistics CSV.
pub const ERROR_CSV_HEADER: &str = "label,count,missed,mean,rmse,max,p95,std_dev";

/// Writes one row per histogram bin.
pub fn write_histogram_csv(path: impl AsRef<Path>, histogram: &Histogram) -> Result<()> {
    let rows = histogram
        .bins()
        .map(|(lower, upper, count)| format!("{lower},{upper},{count}"));
    write_lines(
        path,
        std::iter::once("lower,upper,count".to_string()).chain(rows),
    )
}

fn distribution_rows(name: &str, d: &Distribution) -> Vec<String> {
    vec![
        format!("{name}_count,{}", d.count),
        format!("{name}_min,{}", d.min),
        format!("{name}_max,{}", d.max),
        format!("{name}_mean,{}", d.mean),
        format!("{name}_median,{}", d.median),
    ]
}

/// `name,value` rows for every statistic.
pub fn statistics_rows(stats: &TinStatistics) -> Vec<String> {
    let mut rows = vec![
        "name,value".to_string(),
        format!("point_count,{}", stats.point_count),
    ];
    for (axis, s) in [("x", &stats.x), ("y", &stats.y), ("z", &stats.z)] {
        rows.push(format!("{axis}_min,{}", s.min));
        rows.push(format!("{axis}_max,{}", s.max));
        rows.push(format!("{axis}_mean,{}", s.mean));
        rows.push(format!("{axis}_median,{}", s.median));
        rows.push(format!("{axis}_range,{}", s.range));
        rows.push(format!("{axis}_centre,{}", s.centre));
    }
    rows.push(format!("valid_edge_count,{}", stats.valid_edge_count));
    rows.extend(distribution_rows("edge_length_2d", &stats.edge_length_2d));
    rows.extend(distribution_rows("edge_length_3d", &stats.edge_length_3d));
    rows.push(format!("valid_triangle_count,{}", stats.valid_triangle_count));
    rows.extend(distribution_rows("triangle_area_2d", &stats.triangle_area_2d));
    rows.extend(distribution_rows("triangle_area_3d", &stats.triangle_area_3d));
    rows.extend(distribution_rows("slope", &stats.slope));
    rows.push(format!("area_weighted_slope,{}", stats.area_weighted_slope));
    rows.push(format!("plan_area,{}", stats.plan_area));
    rows.push(format!("point_density,{}", stats.point_density));
    rows
}

pub fn write_statistics_csv(path: impl AsRef<Path>, stats: &TinStatistics) -> Result<()> {
    write_lines(path, statistics_rows(stats))
}

/// Appends a labelled row to an error statistics CSV, writing the header
/// first when the file is new or empty.
pub fn append_error_statistics_csv(
    path: impl AsRef<Path>,
    label: &str,
    stats: &ErrorStatistics,
) -> Result<()> {
    let path = path.as_ref();
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| TinError::io(path, e))?;
    let is_new = file
        .metadata()
        .map(|m| m.len() == 0)
        .map_err(|e| TinError::io(path, e))?;
    let mut text = String::new();
    if is_new {
        text.push_str(ERROR_CSV_HEADER);
        text.push('\n');
    }
    text.push_str(&format!(
        "{},{},{},{},{},{},{},{}\n",
        label.replace(',', ";"),
        stats.count,
        stats.missed,
        stats.mean,
        stats.rmse,
        stats.max,
        stats.p95,
        stats.std_dev
    ));
    file.write_all(text.as_bytes())
        .map_err(|e| TinError::io(path, e))
}

/// Writes `x,y,z` rows for sampled grid cells, leaving `z` empty for misses.
pub fn write_samples_csv(
    path: impl AsRef<Path>,
    grid: &SamplingGrid,
    values: &[Option<f64>],
) -> Result<()> {
    let rows = grid
        .positions()
        .into_iter()
        .zip(values)
        .map(|((x, y), z)| match z {
            Some(z) => format!("{x},{y},{z}"),
            None => format!("{x},{y},"),
        });
    write_lines(path, std::iter::once("x,y,z".to_string()).chain(rows))
}
