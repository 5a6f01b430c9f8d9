use std::collections::HashMap;

use log::debug;

use crate::error::{Result, TinError};

use super::point::{GridKey, TinPoint};
use super::triangle::is_degenerate;

/// Runs a Delaunay triangulation on the XY plane and returns index triples
/// into `points`.
///
/// Output vertices are mapped through their grid key to the first point
/// sharing it, so coincident points never produce separate vertices.
/// Triples that collapse under that mapping are dropped.
pub fn triangulate(points: &[TinPoint]) -> Result<Vec<[usize; 3]>> {
    let mut first_by_key: HashMap<GridKey, usize> = HashMap::with_capacity(points.len());
    let canonical: Vec<usize> = points
        .iter()
        .enumerate()
        .map(|(i, p)| *first_by_key.entry(p.grid_key()).or_insert(i))
        .collect();

    let coords: Vec<delaunator::Point> = points
        .iter()
        .map(|p| delaunator::Point { x: p.x, y: p.y })
        .collect();
    let triangulation = delaunator::triangulate(&coords);

    let mut triples = Vec::with_capacity(triangulation.triangles.len() / 3);
    let mut collapsed = 0usize;
    for c in triangulation.triangles.chunks_exact(3) {
        let t = [canonical[c[0]], canonical[c[1]], canonical[c[2]]];
        if t[0] == t[1] || t[1] == t[2] || t[0] == t[2] {
            collapsed += 1;
            continue;
        }
        if is_degenerate(points, t) {
            return Err(TinError::DegenerateTriangle { vertices: t });
        }
        triples.push(t);
    }
    if collapsed > 0 {
        debug!("dropped {collapsed} triangles with coincident vertices");
    }
    if triples.is_empty() {
        return Err(TinError::EmptySurface {
            points: points.len(),
        });
    }
    Ok(triples)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(f64, f64)]) -> Vec<TinPoint> {
        coords
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| TinPoint::new(i, x, y, x + y, 2))
            .collect()
    }

    #[test]
    fn square_gives_two_triangles() {
        let p = pts(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        let tris = triangulate(&p).unwrap();
        assert_eq!(tris.len(), 2);
        for t in &tris {
            assert!(t.iter().all(|&i| i < p.len()));
        }
    }

    #[test]
    fn too_few_points_is_empty_surface() {
        let p = pts(&[(0.0, 0.0), (1.0, 0.0)]);
        assert!(matches!(
            triangulate(&p),
            Err(TinError::EmptySurface { points: 2 })
        ));
        let line = pts(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]);
        assert!(triangulate(&line).unwrap_err().is_geometry_error());
    }

    #[test]
    fn coincident_points_map_to_first() {
        let p = pts(&[
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 10.0),
            (0.0, 10.0),
            (10.02, 10.01),
        ]);
        let tris = triangulate(&p).unwrap();
        assert!(tris.iter().all(|t| !t.contains(&4)));
        assert!(tris.iter().any(|t| t.contains(&2)));
    }

    #[test]
    fn collinear_after_mapping_is_degenerate() {
        // The last point folds onto the third, which is in line with the
        // first two to within far less than a part in 10^12.
        let p = pts(&[(0.0, 0.0), (500.0, -1e-10), (1000.0, 0.0), (1000.0, 0.04)]);
        match triangulate(&p) {
            Err(TinError::DegenerateTriangle { vertices }) => {
                let mut v = vertices;
                v.sort_unstable();
                assert_eq!(v, [0, 1, 2]);
            }
            other => panic!("expected a degenerate triangle, got {other:?}"),
        }
    }
}
