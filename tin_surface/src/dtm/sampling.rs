use rayon::prelude::*;

use crate::geometry::BoundingBox;

use super::TinSurface;

/// Largest number of cells a sampling grid may hold.
pub const MAX_SAMPLE_CELLS: usize = 1 << 26;

/// Regular grid of sample positions at cell centres.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingGrid {
    pub origin_x: f64,
    pub origin_y: f64,
    pub spacing: f64,
    pub cols: usize,
    pub rows: usize,
}

impl SamplingGrid {
    /// Covers the plan extent of `bbox` with square cells of `spacing`.
    /// Returns `None` for a non-positive spacing or when the grid would
    /// exceed [`MAX_SAMPLE_CELLS`].
    pub fn new(bbox: &BoundingBox, spacing: f64) -> Option<Self> {
        if !spacing.is_finite() || spacing <= 0.0 {
            return None;
        }
        let count = |extent: f64| {
            let n = (extent / spacing).ceil().max(1.0);
            (n.is_finite() && n <= MAX_SAMPLE_CELLS as f64).then_some(n as usize)
        };
        let cols = count(bbox.width())?;
        let rows = count(bbox.depth())?;
        if cols.checked_mul(rows)? > MAX_SAMPLE_CELLS {
            return None;
        }
        Some(Self {
            origin_x: bbox.min_x,
            origin_y: bbox.min_y,
            spacing,
            cols,
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.cols * self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Centre of cell (col, row).
    pub fn position(&self, col: usize, row: usize) -> (f64, f64) {
        (
            self.origin_x + (col as f64 + 0.5) * self.spacing,
            self.origin_y + (row as f64 + 0.5) * self.spacing,
        )
    }

    /// All cell centres, row by row from the south-west corner.
    pub fn positions(&self) -> Vec<(f64, f64)> {
        (0..self.rows)
            .flat_map(|r| (0..self.cols).map(move |c| (c, r)))
            .map(|(c, r)| self.position(c, r))
            .collect()
    }

    /// Surface elevation at every cell centre, in `positions` order.
    pub fn sample(&self, surface: &TinSurface) -> Vec<Option<f64>> {
        (0..self.len())
            .into_par_iter()
            .map(|i| {
                let (x, y) = self.position(i % self.cols, i / self.cols);
                surface.elevation(x, y)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::lidar::LidarPoint;

    #[test]
    fn grid_layout() {
        let bbox = BoundingBox::from_plan(Point::new(0.0, 0.0), Point::new(10.0, 5.0));
        let grid = SamplingGrid::new(&bbox, 2.0).unwrap();
        assert_eq!((grid.cols, grid.rows), (5, 3));
        assert_eq!(grid.position(0, 0), (1.0, 1.0));
        assert_eq!(grid.positions()[5], (1.0, 3.0));
        assert!(SamplingGrid::new(&bbox, 0.0).is_none());
        assert!(SamplingGrid::new(&bbox, f64::INFINITY).is_none());
    }

    #[test]
    fn tiny_spacing_is_refused() {
        let bbox = BoundingBox::from_plan(Point::new(0.0, 0.0), Point::new(10.0, 5.0));
        assert!(SamplingGrid::new(&bbox, 1e-300).is_none());
        // Each axis fits on its own, the product does not.
        assert!(SamplingGrid::new(&bbox, 1e-3).is_some());
        assert!(SamplingGrid::new(&bbox, 1e-4).is_none());
        let wide = BoundingBox::from_plan(Point::new(0.0, 0.0), Point::new(1e6, 0.0));
        let strip = SamplingGrid::new(&wide, 0.1).unwrap();
        assert_eq!((strip.cols, strip.rows), (10_000_000, 1));
    }

    #[test]
    fn samples_follow_surface() {
        let pts: Vec<LidarPoint> = [(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]
            .iter()
            .map(|&(x, y)| LidarPoint::new(x, y, 2.0 * x, 2))
            .collect();
        let surface = TinSurface::from_points(pts).unwrap();
        let grid = SamplingGrid::new(surface.bounding_box(), 1.0).unwrap();
        let values = grid.sample(&surface);
        assert_eq!(values.len(), 16);
        for ((x, _), z) in grid.positions().into_iter().zip(values) {
            assert!((z.unwrap() - 2.0 * x).abs() < 1e-9);
        }
    }
}
