//! Removal of implausible triangles along the hull of a surface.
//!
//! Delaunay triangulation of a point cloud fills the convex hull, which
//! leaves long slivers and near-vertical facets wherever the data boundary
//! is concave. Pruning starts at hull triangles and walks inwards through
//! edge adjacency, invalidating every triangle that fails the shape test.

use log::info;
use serde::{Deserialize, Serialize};

use super::edge::EdgeSet;
use super::triangle::Triangle;
use super::TinSurface;

/// How far the invalidation walk travels from the hull.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HullWalk {
    /// Visit every triangle connected to a removed hull triangle.
    #[default]
    Flood,
    /// Only continue through triangles that were themselves removed.
    Peel,
}

/// Shape thresholds for hull pruning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PruneOptions {
    /// Largest allowed interior angle in plan, degrees.
    pub max_interior_angle_deg: f64,
    /// Largest allowed inclination from horizontal, degrees.
    pub max_slope_deg: f64,
    pub walk: HullWalk,
}

impl Default for PruneOptions {
    fn default() -> Self {
        Self {
            max_interior_angle_deg: 157.0,
            max_slope_deg: 79.5,
            walk: HullWalk::Flood,
        }
    }
}

/// Returns `true` if `triangle` is too obtuse or too steep to keep.
pub fn should_remove(triangle: &Triangle, options: &PruneOptions) -> bool {
    triangle.max_angle() > options.max_interior_angle_deg
        || triangle.slope_degrees() > options.max_slope_deg
}

/// Invalidates hull triangles per `options` and returns how many valid
/// triangles were newly invalidated.
pub(crate) fn invalidate_hull(
    triangles: &mut [Triangle],
    edges: &EdgeSet,
    options: &PruneOptions,
) -> usize {
    let mut visited = vec![false; triangles.len()];
    let mut stack = Vec::new();
    let mut removed = 0usize;

    let mut reject = |tri: &mut Triangle| -> bool {
        if !should_remove(tri, options) {
            return false;
        }
        if tri.is_valid() {
            tri.set_valid(false);
            removed += 1;
        }
        true
    };

    // Hull triangles that pass stay unvisited so a flood can cross them.
    for edge in edges.iter().filter(|e| e.is_boundary()) {
        for t in edge.owners() {
            if !visited[t] && reject(&mut triangles[t]) {
                visited[t] = true;
                stack.push(t);
            }
        }
    }

    while let Some(t) = stack.pop() {
        for id in triangles[t].edges() {
            let Some(next) = edges.get(id).and_then(|e| e.other_owner(t)) else {
                continue;
            };
            if visited[next] {
                continue;
            }
            visited[next] = true;
            let removed_next = reject(&mut triangles[next]);
            if removed_next || options.walk == HullWalk::Flood {
                stack.push(next);
            }
        }
    }
    removed
}

impl TinSurface {
    /// Invalidates implausible hull triangles and rebuilds the query index.
    /// Returns the number of triangles newly invalidated; a second call with
    /// the same options returns zero.
    pub fn prune_hull(&mut self, options: &PruneOptions) -> usize {
        let removed = invalidate_hull(&mut self.triangles, &self.edges, options);
        info!(
            "pruned {} hull triangles ({:?} walk), {} of {} remain valid",
            removed,
            options.walk,
            self.valid_triangle_count(),
            self.triangles.len()
        );
        self.rebuild_index();
        removed
    }
}
