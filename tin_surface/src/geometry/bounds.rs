use super::{Point, Point3};

/// Axis-aligned bounding box in three dimensions.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub min_z: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub max_z: f64,
}

impl BoundingBox {
    /// Creates a box holding a single point.
    pub fn from_point(p: Point3) -> Self {
        Self {
            min_x: p.x,
            min_y: p.y,
            min_z: p.z,
            max_x: p.x,
            max_y: p.y,
            max_z: p.z,
        }
    }

    /// Creates a plan box with zero vertical extent.
    pub fn from_plan(min: Point, max: Point) -> Self {
        Self {
            min_x: min.x.min(max.x),
            min_y: min.y.min(max.y),
            min_z: 0.0,
            max_x: min.x.max(max.x),
            max_y: min.y.max(max.y),
            max_z: 0.0,
        }
    }

    /// Returns the smallest box containing every point, or `None` when empty.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point3>,
    {
        let mut iter = points.into_iter();
        let mut bb = BoundingBox::from_point(iter.next()?);
        for p in iter {
            bb.expand(p);
        }
        Some(bb)
    }

    /// Grows the box to include `p`.
    pub fn expand(&mut self, p: Point3) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.min_z = self.min_z.min(p.z);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
        self.max_z = self.max_z.max(p.z);
    }

    /// East-west extent.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// North-south extent.
    pub fn depth(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Plan area of the box.
    pub fn plan_area(&self) -> f64 {
        self.width() * self.depth()
    }

    pub fn center(&self) -> Point3 {
        Point3::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
            (self.min_z + self.max_z) / 2.0,
        )
    }

    /// Returns `true` if (x, y) lies inside or on the plan outline of the box.
    pub fn contains_plan(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_from_points_and_extents() {
        let bb = BoundingBox::from_points([
            Point3::new(1.0, 2.0, 3.0),
            Point3::new(-1.0, 5.0, 0.0),
            Point3::new(4.0, 0.0, 1.0),
        ])
        .unwrap();
        assert_eq!(bb.min_x, -1.0);
        assert_eq!(bb.max_y, 5.0);
        assert_eq!(bb.min_z, 0.0);
        assert!((bb.plan_area() - 25.0).abs() < 1e-12);
        assert_eq!(bb.center(), Point3::new(1.5, 2.5, 1.5));
    }

    #[test]
    fn empty_point_set_has_no_box() {
        assert!(BoundingBox::from_points(Vec::new()).is_none());
    }

    #[test]
    fn plan_containment_includes_border() {
        let bb = BoundingBox::from_plan(Point::new(0.0, 0.0), Point::new(2.0, 2.0));
        assert!(bb.contains_plan(2.0, 1.0));
        assert!(bb.contains_plan(0.0, 0.0));
        assert!(!bb.contains_plan(2.1, 1.0));
    }
}
