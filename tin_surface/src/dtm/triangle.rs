use crate::geometry::{angle_between, azimuth_degrees, cross, subtract, BoundingBox, Point3};

use super::point::TinPoint;

/// Relative tolerance below which a triangle's plan area counts as zero.
const DEGENERATE_TOLERANCE: f64 = 1e-12;

/// Twice the signed plan area of the triangle `v`.
pub(crate) fn plan_cross(points: &[TinPoint], v: [usize; 3]) -> f64 {
    let (a, b, c) = (points[v[0]], points[v[1]], points[v[2]]);
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Returns `true` when the plan area of `v` is zero relative to its edge lengths.
pub(crate) fn is_degenerate(points: &[TinPoint], v: [usize; 3]) -> bool {
    if v[0] == v[1] || v[1] == v[2] || v[0] == v[2] {
        return true;
    }
    let (a, b, c) = (points[v[0]], points[v[1]], points[v[2]]);
    let ab = (b.x - a.x).hypot(b.y - a.y);
    let ac = (c.x - a.x).hypot(c.y - a.y);
    plan_cross(points, v).abs() <= DEGENERATE_TOLERANCE * ab * ac
}

fn sign(px: f64, py: f64, a: &TinPoint, b: &TinPoint) -> f64 {
    (px - b.x) * (a.y - b.y) - (a.x - b.x) * (py - b.y)
}

/// A surface facet with cached plane and plan geometry.
///
/// Vertices are ordered so that the normal points upward. The caches are
/// filled at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    vertices: [usize; 3],
    valid: bool,
    edges: [usize; 3],
    normal: Point3,
    angles: [f64; 3],
    bbox: BoundingBox,
}

impl Triangle {
    pub fn new(vertices: [usize; 3], points: &[TinPoint]) -> Self {
        let mut tri = Self {
            vertices,
            valid: true,
            edges: [usize::MAX; 3],
            normal: Point3::new(0.0, 0.0, 0.0),
            angles: [0.0; 3],
            bbox: BoundingBox::from_point(points[vertices[0]].position()),
        };
        tri.refresh(points);
        tri
    }

    /// Recomputes orientation, normal, interior angles and bounding box.
    fn refresh(&mut self, points: &[TinPoint]) {
        let [p0, p1, p2] = self.corners(points);
        let mut normal = cross(subtract(p1, p0), subtract(p2, p0));
        if normal.z < 0.0 {
            self.vertices.swap(0, 1);
            normal = Point3::new(-normal.x, -normal.y, -normal.z);
        }
        self.normal = normal;

        let plan = self.corners(points).map(|p| Point3::new(p.x, p.y, 0.0));
        for i in 0..3 {
            let here = plan[i];
            let next = plan[(i + 1) % 3];
            let prev = plan[(i + 2) % 3];
            self.angles[i] = angle_between(subtract(next, here), subtract(prev, here)).to_degrees();
        }

        let [a, b, c] = self.corners(points);
        let mut bbox = BoundingBox::from_point(a);
        bbox.expand(b);
        bbox.expand(c);
        self.bbox = bbox;
    }

    pub fn vertices(&self) -> [usize; 3] {
        self.vertices
    }

    pub fn corners(&self, points: &[TinPoint]) -> [Point3; 3] {
        self.vertices.map(|i| points[i].position())
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub(crate) fn set_valid(&mut self, valid: bool) {
        self.valid = valid;
    }

    /// Ids of the bounding edges in the owning surface's edge set.
    pub fn edges(&self) -> [usize; 3] {
        self.edges
    }

    pub(crate) fn set_edges(&mut self, edges: [usize; 3]) {
        self.edges = edges;
    }

    /// Upward plane normal, not normalised.
    pub fn normal(&self) -> Point3 {
        self.normal
    }

    /// Interior angles in plan, in degrees, matching vertex order.
    pub fn angles(&self) -> [f64; 3] {
        self.angles
    }

    pub fn max_angle(&self) -> f64 {
        self.angles.iter().copied().fold(0.0, f64::max)
    }

    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bbox
    }

    /// Half-plane sign test. Points on an edge or vertex count as inside.
    pub fn contains(&self, points: &[TinPoint], x: f64, y: f64) -> bool {
        let [a, b, c] = self.vertices.map(|i| &points[i]);
        let d1 = sign(x, y, a, b);
        let d2 = sign(x, y, b, c);
        let d3 = sign(x, y, c, a);
        let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
        let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
        !(has_neg && has_pos)
    }

    /// Height of the triangle's plane at (x, y).
    pub fn elevation_at(&self, points: &[TinPoint], x: f64, y: f64) -> Option<f64> {
        let n = self.normal;
        if n.z == 0.0 {
            return None;
        }
        let v = &points[self.vertices[0]];
        Some(v.z - (n.x * (x - v.x) + n.y * (y - v.y)) / n.z)
    }

    /// Grade of the plane in percent.
    pub fn slope_percent(&self) -> Option<f64> {
        let n = self.normal;
        if n.z == 0.0 {
            return None;
        }
        Some(100.0 * n.plan_length() / n.z.abs())
    }

    /// Inclination of the plane from horizontal, in degrees.
    pub fn slope_degrees(&self) -> f64 {
        self.normal.plan_length().atan2(self.normal.z.abs()).to_degrees()
    }

    /// Azimuth of the downhill direction, `None` for a level plane.
    pub fn aspect(&self) -> Option<f64> {
        let n = self.normal;
        if n.x == 0.0 && n.y == 0.0 {
            return None;
        }
        Some(azimuth_degrees(n.x, n.y))
    }

    pub fn plan_area(&self, points: &[TinPoint]) -> f64 {
        plan_cross(points, self.vertices).abs() / 2.0
    }

    pub fn area_3d(&self) -> f64 {
        self.normal.length() / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(f64, f64, f64)]) -> Vec<TinPoint> {
        coords
            .iter()
            .enumerate()
            .map(|(i, &(x, y, z))| TinPoint::new(i, x, y, z, 2))
            .collect()
    }

    #[test]
    fn clockwise_input_is_reoriented() {
        let p = pts(&[(0.0, 0.0, 0.0), (0.0, 1.0, 0.0), (1.0, 0.0, 0.0)]);
        let t = Triangle::new([0, 1, 2], &p);
        assert_eq!(t.vertices(), [1, 0, 2]);
        assert!(t.normal().z > 0.0);
    }

    #[test]
    fn plane_values_on_inclined_facet() {
        // z = 2x + 3y + 1
        let p = pts(&[(0.0, 0.0, 1.0), (1.0, 0.0, 3.0), (0.0, 1.0, 4.0)]);
        let t = Triangle::new([0, 1, 2], &p);
        let z = t.elevation_at(&p, 0.25, 0.25).unwrap();
        assert!((z - 2.25).abs() < 1e-12);
        let slope = t.slope_percent().unwrap();
        assert!((slope - 100.0 * 13f64.sqrt()).abs() < 1e-9);
        // Downhill points towards -x, -y.
        let aspect = t.aspect().unwrap();
        let expected = azimuth_degrees(-2.0, -3.0);
        assert!((aspect - expected).abs() < 1e-9);
        assert!(aspect > 180.0 && aspect < 270.0);
    }

    #[test]
    fn level_facet_has_zero_slope_and_no_aspect() {
        let p = pts(&[(0.0, 0.0, 5.0), (2.0, 0.0, 5.0), (0.0, 2.0, 5.0)]);
        let t = Triangle::new([0, 1, 2], &p);
        assert_eq!(t.slope_percent(), Some(0.0));
        assert_eq!(t.aspect(), None);
        assert_eq!(t.slope_degrees(), 0.0);
    }

    #[test]
    fn angles_sum_to_half_turn() {
        let p = pts(&[(0.0, 0.0, 0.0), (4.0, 0.0, 1.0), (0.0, 3.0, 2.0)]);
        let t = Triangle::new([0, 1, 2], &p);
        let sum: f64 = t.angles().iter().sum();
        assert!((sum - 180.0).abs() < 1e-9);
        assert!((t.max_angle() - 90.0).abs() < 1e-9);
        assert!((t.plan_area(&p) - 6.0).abs() < 1e-12);
    }

    #[test]
    fn containment_includes_edges() {
        let p = pts(&[(0.0, 0.0, 0.0), (2.0, 0.0, 0.0), (0.0, 2.0, 0.0)]);
        let t = Triangle::new([0, 1, 2], &p);
        assert!(t.contains(&p, 0.5, 0.5));
        assert!(t.contains(&p, 1.0, 1.0));
        assert!(t.contains(&p, 0.0, 0.0));
        assert!(!t.contains(&p, 1.5, 1.5));
    }

    #[test]
    fn collinear_triple_is_degenerate() {
        let p = pts(&[(0.0, 0.0, 0.0), (1.0, 1.0, 0.0), (2.0, 2.0, 0.0)]);
        assert!(is_degenerate(&p, [0, 1, 2]));
        assert!(is_degenerate(&p, [0, 0, 2]));
        let q = pts(&[(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (0.0, 1.0, 0.0)]);
        assert!(!is_degenerate(&q, [0, 1, 2]));
    }
}
