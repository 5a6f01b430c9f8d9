use rayon::prelude::*;
use serde::Serialize;

use super::TinSurface;

/// Surface values at a plan position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointSlopeAspect {
    pub x: f64,
    pub y: f64,
    pub elevation: Option<f64>,
    /// Percent grade.
    pub slope: Option<f64>,
    /// Downhill azimuth in degrees clockwise from north.
    pub aspect: Option<f64>,
    /// Containing triangle.
    pub triangle: Option<usize>,
}

impl TinSurface {
    /// Finds the valid triangle containing (x, y). A point on a shared edge
    /// or vertex resolves to the lowest triangle index.
    pub fn locate(&self, x: f64, y: f64) -> Option<usize> {
        self.index.candidates(x, y).iter().copied().find(|&t| {
            let tri = &self.triangles[t];
            tri.is_valid()
                && tri.bounding_box().contains_plan(x, y)
                && tri.contains(&self.points, x, y)
        })
    }

    pub fn elevation(&self, x: f64, y: f64) -> Option<f64> {
        let t = self.locate(x, y)?;
        self.triangles[t].elevation_at(&self.points, x, y)
    }

    /// Percent grade of the containing triangle.
    pub fn slope(&self, x: f64, y: f64) -> Option<f64> {
        self.triangles[self.locate(x, y)?].slope_percent()
    }

    /// Downhill azimuth of the containing triangle.
    pub fn aspect(&self, x: f64, y: f64) -> Option<f64> {
        self.triangles[self.locate(x, y)?].aspect()
    }

    /// Elevation, slope and aspect from a single lookup.
    pub fn query(&self, x: f64, y: f64) -> PointSlopeAspect {
        let triangle = self.locate(x, y);
        let tri = triangle.map(|t| &self.triangles[t]);
        PointSlopeAspect {
            x,
            y,
            elevation: tri.and_then(|t| t.elevation_at(&self.points, x, y)),
            slope: tri.and_then(|t| t.slope_percent()),
            aspect: tri.and_then(|t| t.aspect()),
            triangle,
        }
    }

    /// Elevations for many positions, evaluated on the rayon pool.
    pub fn sample_elevations(&self, positions: &[(f64, f64)]) -> Vec<Option<f64>> {
        positions
            .par_iter()
            .map(|&(x, y)| self.elevation(x, y))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::dtm::TinSurface;
    use crate::lidar::LidarPoint;

    fn plane() -> TinSurface {
        // z = 100 + 0.1x - 0.2y over a 0..40 grid.
        let mut pts = Vec::new();
        for j in 0..5 {
            for i in 0..5 {
                let (x, y) = (i as f64 * 10.0, j as f64 * 10.0);
                pts.push(LidarPoint::new(x, y, 100.0 + 0.1 * x - 0.2 * y, 2));
            }
        }
        TinSurface::from_points(pts).unwrap()
    }

    #[test]
    fn plane_values_inside() {
        let s = plane();
        let z = s.elevation(13.0, 27.0).unwrap();
        assert!((z - (100.0 + 1.3 - 5.4)).abs() < 1e-9);
        let slope = s.slope(13.0, 27.0).unwrap();
        assert!((slope - 100.0 * 0.05f64.sqrt()).abs() < 1e-9);
        // Downhill is +y and -x.
        let aspect = s.aspect(13.0, 27.0).unwrap();
        let expected = (-0.1f64).atan2(0.2).to_degrees() + 360.0;
        assert!((aspect - expected).abs() < 1e-9);
    }

    #[test]
    fn outside_queries_miss() {
        let s = plane();
        assert_eq!(s.elevation(-1.0, 5.0), None);
        assert_eq!(s.slope(50.0, 5.0), None);
        let q = s.query(41.0, 41.0);
        assert!(q.triangle.is_none() && q.elevation.is_none() && q.aspect.is_none());
    }

    #[test]
    fn shared_vertex_resolves_to_lowest_index() {
        let s = plane();
        let t = s.locate(20.0, 20.0).unwrap();
        let centre = s
            .points()
            .iter()
            .position(|p| p.x == 20.0 && p.y == 20.0)
            .unwrap();
        assert_eq!(Some(&t), s.triangles_at(centre).iter().min());
    }

    #[test]
    fn query_matches_individual_calls() {
        let s = plane();
        let q = s.query(33.3, 4.4);
        assert_eq!(q.elevation, s.elevation(33.3, 4.4));
        assert_eq!(q.slope, s.slope(33.3, 4.4));
        assert_eq!(q.aspect, s.aspect(33.3, 4.4));
    }

    #[test]
    fn bulk_sampling_matches_sequential() {
        let s = plane();
        let positions: Vec<(f64, f64)> = (0..200)
            .map(|i| ((i % 45) as f64, (i / 5) as f64))
            .collect();
        let sequential: Vec<Option<f64>> =
            positions.iter().map(|&(x, y)| s.elevation(x, y)).collect();
        assert_eq!(s.sample_elevations(&positions), sequential);
    }
}
