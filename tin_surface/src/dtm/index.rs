//! Uniform grid over triangle bounding boxes for point location.

use log::debug;

use crate::geometry::BoundingBox;

use super::triangle::Triangle;

/// Read-only bucket grid. Each cell lists, in ascending order, the valid
/// triangles whose plan bounding box overlaps it.
#[derive(Debug, Clone, Default)]
pub struct GridIndex {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
    cell_w: f64,
    cell_h: f64,
    cols: usize,
    rows: usize,
    cells: Vec<Vec<usize>>,
}

impl GridIndex {
    /// Indexes the valid triangles in `triangles` over the plan extent `bbox`.
    pub fn build(triangles: &[Triangle], bbox: &BoundingBox) -> Self {
        let valid = triangles.iter().filter(|t| t.is_valid()).count();
        let side = ((valid as f64 / 4.0).sqrt().ceil() as usize).max(1);
        let cell = |extent: f64| {
            if extent > 0.0 {
                extent / side as f64
            } else {
                1.0
            }
        };
        let mut index = GridIndex {
            min_x: bbox.min_x,
            min_y: bbox.min_y,
            max_x: bbox.max_x,
            max_y: bbox.max_y,
            cell_w: cell(bbox.width()),
            cell_h: cell(bbox.depth()),
            cols: side,
            rows: side,
            cells: vec![Vec::new(); side * side],
        };
        for (t, tri) in triangles.iter().enumerate() {
            if !tri.is_valid() {
                continue;
            }
            let b = tri.bounding_box();
            let (c0, r0) = index.cell_of(b.min_x, b.min_y);
            let (c1, r1) = index.cell_of(b.max_x, b.max_y);
            for r in r0..=r1 {
                for c in c0..=c1 {
                    index.cells[r * index.cols + c].push(t);
                }
            }
        }
        debug!(
            "grid index: {}x{} cells over {} valid triangles",
            index.cols, index.rows, valid
        );
        index
    }

    fn cell_of(&self, x: f64, y: f64) -> (usize, usize) {
        let clamp = |v: f64, n: usize| (v.floor().max(0.0) as usize).min(n - 1);
        (
            clamp((x - self.min_x) / self.cell_w, self.cols),
            clamp((y - self.min_y) / self.cell_h, self.rows),
        )
    }

    /// Triangles that may contain (x, y), lowest index first.
    pub fn candidates(&self, x: f64, y: f64) -> &[usize] {
        if self.cells.is_empty()
            || !(x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y)
        {
            return &[];
        }
        let (c, r) = self.cell_of(x, y);
        &self.cells[r * self.cols + c]
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }
}
