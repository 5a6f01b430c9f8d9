//! Read-only statistics over a surface.

use rayon::prelude::*;
use serde::Serialize;

use crate::geometry::{distance, distance3};
use crate::lidar::LidarPoint;

use super::{TinPoint, TinSurface};

fn median_of_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        0.0
    } else if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Summary of a set of values. All fields are zero for an empty set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Distribution {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
}

impl Distribution {
    pub fn from_values(mut values: Vec<f64>) -> Self {
        values.retain(|v| v.is_finite());
        if values.is_empty() {
            return Self::default();
        }
        values.sort_by(f64::total_cmp);
        let count = values.len();
        Self {
            count,
            min: values[0],
            max: values[count - 1],
            mean: values.iter().sum::<f64>() / count as f64,
            median: median_of_sorted(&values),
        }
    }
}

/// Range of one coordinate axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AxisStatistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub range: f64,
    pub centre: f64,
}

impl AxisStatistics {
    fn from_values(values: Vec<f64>) -> Self {
        let d = Distribution::from_values(values);
        Self {
            min: d.min,
            max: d.max,
            mean: d.mean,
            median: d.median,
            range: d.max - d.min,
            centre: (d.min + d.max) / 2.0,
        }
    }
}

/// Size and shape summary of a pruned surface.
#[derive(Debug, Clone, Serialize)]
pub struct TinStatistics {
    pub point_count: usize,
    pub x: AxisStatistics,
    pub y: AxisStatistics,
    pub z: AxisStatistics,
    pub valid_edge_count: usize,
    pub edge_length_2d: Distribution,
    pub edge_length_3d: Distribution,
    pub valid_triangle_count: usize,
    pub triangle_area_2d: Distribution,
    pub triangle_area_3d: Distribution,
    /// Triangle slopes in percent.
    pub slope: Distribution,
    /// Mean slope weighted by plan area, percent.
    pub area_weighted_slope: f64,
    pub plan_area: f64,
    /// Points per unit plan area.
    pub point_density: f64,
}

/// Equal-width binning of a set of values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub min: f64,
    pub bin_width: f64,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Bins `values` into `bins` equal intervals spanning their range.
    /// Returns `None` without finite values or with zero bins.
    pub fn from_values(values: &[f64], bins: usize) -> Option<Self> {
        if bins == 0 {
            return None;
        }
        let finite = || values.iter().copied().filter(|v| v.is_finite());
        let min = finite().reduce(f64::min)?;
        let max = finite().fold(min, f64::max);
        let bin_width = (max - min) / bins as f64;
        let mut counts = vec![0usize; bins];
        for v in finite() {
            let bin = if bin_width > 0.0 {
                (((v - min) / bin_width) as usize).min(bins - 1)
            } else {
                0
            };
            counts[bin] += 1;
        }
        Some(Self {
            min,
            bin_width,
            counts,
        })
    }

    /// `(lower, upper, count)` for every bin.
    pub fn bins(&self) -> impl Iterator<Item = (f64, f64, usize)> + '_ {
        self.counts.iter().enumerate().map(move |(i, &c)| {
            let lower = self.min + i as f64 * self.bin_width;
            (lower, lower + self.bin_width, c)
        })
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Vertical agreement between check points and a surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ErrorStatistics {
    /// Points that fell on the surface.
    pub count: usize,
    /// Points outside every valid triangle.
    pub missed: usize,
    pub mean: f64,
    pub rmse: f64,
    /// Largest absolute residual.
    pub max: f64,
    /// 95th percentile of absolute residuals.
    pub p95: f64,
    pub std_dev: f64,
}

impl ErrorStatistics {
    /// Compares point elevations against the surface. Residuals are
    /// `point.z - surface`. Returns `None` when no point hits the surface.
    pub fn compute(surface: &TinSurface, points: &[LidarPoint]) -> Option<Self> {
        let residuals: Vec<f64> = points
            .par_iter()
            .filter_map(|p| surface.elevation(p.x, p.y).map(|z| p.z - z))
            .collect();
        if residuals.is_empty() {
            return None;
        }
        let n = residuals.len() as f64;
        let mean = residuals.iter().sum::<f64>() / n;
        let rmse = (residuals.iter().map(|r| r * r).sum::<f64>() / n).sqrt();
        let std_dev = (residuals.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n).sqrt();
        let mut abs: Vec<f64> = residuals.iter().map(|r| r.abs()).collect();
        abs.sort_by(f64::total_cmp);
        let rank = ((0.95 * abs.len() as f64).ceil() as usize).clamp(1, abs.len());
        Some(Self {
            count: residuals.len(),
            missed: points.len() - residuals.len(),
            mean,
            rmse,
            max: abs[abs.len() - 1],
            p95: abs[rank - 1],
            std_dev,
        })
    }
}

impl TinSurface {
    /// Slopes in percent of every valid triangle.
    pub fn triangle_slopes(&self) -> Vec<f64> {
        self.valid_triangles()
            .filter_map(|t| t.slope_percent())
            .collect()
    }

    /// Plan lengths of every valid edge.
    pub fn edge_lengths_2d(&self) -> Vec<f64> {
        self.valid_edge_points()
            .map(|(a, b)| distance(a.plan(), b.plan()))
            .collect()
    }

    /// Dihedral angles in degrees across every interior valid edge.
    pub fn edge_cross_slopes(&self) -> Vec<f64> {
        self.edges()
            .iter()
            .filter_map(|e| self.edge_cross_slope(e))
            .collect()
    }

    fn valid_edge_points(&self) -> impl Iterator<Item = (&TinPoint, &TinPoint)> + '_ {
        self.edges()
            .iter()
            .filter(|e| e.is_valid(self.triangles()))
            .map(|e| {
                let (a, b) = e.points();
                (&self.points()[a], &self.points()[b])
            })
    }

    /// Aggregates counts and distributions over the valid mesh.
    pub fn statistics(&self) -> TinStatistics {
        let points = self.points();
        let axis = |f: fn(&TinPoint) -> f64| {
            AxisStatistics::from_values(points.iter().map(f).collect())
        };

        let edge_length_2d = Distribution::from_values(self.edge_lengths_2d());
        let edge_length_3d = Distribution::from_values(
            self.valid_edge_points()
                .map(|(a, b)| distance3(a.position(), b.position()))
                .collect(),
        );

        let mut area_2d = Vec::new();
        let mut area_3d = Vec::new();
        let mut weighted = 0.0;
        for t in self.valid_triangles() {
            let plan = t.plan_area(points);
            area_2d.push(plan);
            area_3d.push(t.area_3d());
            weighted += plan * t.slope_percent().unwrap_or(0.0);
        }
        let total_plan: f64 = area_2d.iter().sum();
        let plan_area = self.bounding_box().plan_area();

        TinStatistics {
            point_count: points.len(),
            x: axis(|p| p.x),
            y: axis(|p| p.y),
            z: axis(|p| p.z),
            valid_edge_count: edge_length_2d.count,
            edge_length_2d,
            edge_length_3d,
            valid_triangle_count: area_2d.len(),
            triangle_area_2d: Distribution::from_values(area_2d),
            triangle_area_3d: Distribution::from_values(area_3d),
            slope: Distribution::from_values(self.triangle_slopes()),
            area_weighted_slope: if total_plan > 0.0 {
                weighted / total_plan
            } else {
                0.0
            },
            plan_area,
            point_density: if plan_area > 0.0 {
                points.len() as f64 / plan_area
            } else {
                0.0
            },
        }
    }

    /// Error statistics of the points set aside during the build.
    pub fn unused_point_errors(&self) -> Option<ErrorStatistics> {
        ErrorStatistics::compute(self, self.unused_points())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distribution_of_values() {
        let d = Distribution::from_values(vec![4.0, 1.0, 3.0, 2.0, f64::NAN]);
        assert_eq!(d.count, 4);
        assert_eq!(d.min, 1.0);
        assert_eq!(d.max, 4.0);
        assert_eq!(d.mean, 2.5);
        assert_eq!(d.median, 2.5);
        assert_eq!(Distribution::from_values(Vec::new()), Distribution::default());
    }

    #[test]
    fn histogram_puts_max_in_last_bin() {
        let h = Histogram::from_values(&[0.0, 1.0, 2.0, 3.0, 4.0], 4).unwrap();
        assert_eq!(h.counts, vec![1, 1, 1, 2]);
        assert_eq!(h.total(), 5);
        let bins: Vec<_> = h.bins().collect();
        assert_eq!(bins[3], (3.0, 4.0, 2));
        assert!(Histogram::from_values(&[], 3).is_none());
        assert_eq!(Histogram::from_values(&[2.0, 2.0], 3).unwrap().counts, vec![2, 0, 0]);
    }

    fn tilted() -> TinSurface {
        let mut pts = Vec::new();
        for j in 0..3 {
            for i in 0..3 {
                let (x, y) = (i as f64 * 2.0, j as f64 * 2.0);
                pts.push(LidarPoint::new(x, y, 0.5 * x, 2));
            }
        }
        TinSurface::from_points(pts).unwrap()
    }

    #[test]
    fn surface_statistics() {
        let s = tilted();
        let stats = s.statistics();
        assert_eq!(stats.point_count, 9);
        assert_eq!(stats.valid_triangle_count, 8);
        assert_eq!(stats.valid_edge_count, 16);
        assert_eq!(stats.x.range, 4.0);
        assert_eq!(stats.z.max, 2.0);
        assert_eq!(stats.y.centre, 2.0);
        assert!((stats.triangle_area_2d.mean - 2.0).abs() < 1e-12);
        assert!((stats.slope.mean - 50.0).abs() < 1e-9);
        assert!((stats.area_weighted_slope - 50.0).abs() < 1e-9);
        assert_eq!(stats.plan_area, 16.0);
        assert!((stats.edge_length_2d.min - 2.0).abs() < 1e-12);
        assert!(stats.edge_length_3d.max > stats.edge_length_2d.max);
    }

    #[test]
    fn error_statistics_against_plane() {
        let s = tilted();
        let checks = vec![
            LidarPoint::new(1.0, 1.0, 0.5 + 0.1, 2),
            LidarPoint::new(3.0, 1.0, 1.5 - 0.1, 2),
            LidarPoint::new(1.0, 3.0, 0.5 + 0.3, 2),
            LidarPoint::new(9.0, 9.0, 0.0, 2),
        ];
        let e = ErrorStatistics::compute(&s, &checks).unwrap();
        assert_eq!(e.count, 3);
        assert_eq!(e.missed, 1);
        assert!((e.max - 0.3).abs() < 1e-9);
        assert!((e.p95 - 0.3).abs() < 1e-9);
        let rmse = ((0.01 + 0.01 + 0.09) / 3.0f64).sqrt();
        assert!((e.rmse - rmse).abs() < 1e-9);
        assert!(ErrorStatistics::compute(&s, &checks[3..]).is_none());
    }
}
