//! Triangulated irregular network surfaces built from point clouds.

mod edge;
mod index;
mod point;
mod prune;
mod query;
mod sampling;
mod stats;
mod triangle;
mod triangulate;

pub use edge::{build_edges, Edge, EdgeSet};
pub use index::GridIndex;
pub use point::{GridKey, TinPoint};
pub use prune::{should_remove, HullWalk, PruneOptions};
pub use query::PointSlopeAspect;
pub use sampling::{SamplingGrid, MAX_SAMPLE_CELLS};
pub use stats::{AxisStatistics, Distribution, ErrorStatistics, Histogram, TinStatistics};
pub use triangle::Triangle;
pub use triangulate::triangulate;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use log::info;
use rayon::prelude::*;

use crate::config::TinConfig;
use crate::error::{Result, TinError};
use crate::geometry::{angle_between, BoundingBox};
use crate::io::las::{self, Decimator, ReadOptions};
use crate::io::{xyz, InputFormat};
use crate::lidar::LidarPoint;

/// A TIN surface: points, triangles, edge adjacency and a point-location
/// index.
///
/// Construction is single-threaded. Once built and pruned the surface is
/// only read, and every query takes `&self`.
#[derive(Debug)]
pub struct TinSurface {
    points: Vec<TinPoint>,
    triangles: Vec<Triangle>,
    edges: EdgeSet,
    bbox: BoundingBox,
    index: GridIndex,
    source: Option<PathBuf>,
    skip_stride: usize,
    unused_points: Vec<LidarPoint>,
    point_triangles: OnceLock<Vec<Vec<usize>>>,
}

impl TinSurface {
    /// Triangulates `points`. Points falling in an occupied decimetre grid
    /// cell are set aside as unused; the first one read wins.
    pub fn from_points(points: Vec<LidarPoint>) -> Result<Self> {
        let offered = points.len();
        let mut seen: HashMap<GridKey, usize> = HashMap::with_capacity(points.len());
        let mut kept = Vec::with_capacity(points.len());
        let mut unused = Vec::new();
        for p in points {
            let key = GridKey::of(p.x, p.y);
            if seen.contains_key(&key) {
                unused.push(p);
                continue;
            }
            seen.insert(key, kept.len());
            kept.push(TinPoint::from_lidar(kept.len(), &p));
        }

        let triples = triangulate(&kept).map_err(|e| match e {
            TinError::EmptySurface { .. } => TinError::EmptySurface { points: offered },
            other => other,
        })?;
        let triangles: Vec<Triangle> = triples.iter().map(|&v| Triangle::new(v, &kept)).collect();
        let mut surface = Self::assemble(kept, triangles, None, 0)?;
        surface.unused_points = unused;
        info!(
            "built surface: {} points ({} duplicates set aside), {} triangles, {} edges",
            surface.points.len(),
            surface.unused_points.len(),
            surface.triangles.len(),
            surface.edges.len()
        );
        Ok(surface)
    }

    /// Reads a LAS file and triangulates the retained points. Decimated-out
    /// points are kept as unused points for error statistics.
    pub fn from_las(path: impl AsRef<Path>, options: &ReadOptions) -> Result<Self> {
        let path = path.as_ref();
        let options = ReadOptions {
            keep_skipped: true,
            ..options.clone()
        };
        let read = las::read_points_with(path, &options)?;
        let mut surface = Self::from_points(read.kept)?;
        surface.unused_points.extend(read.skipped);
        surface.source = Some(path.to_path_buf());
        surface.skip_stride = options.skip_stride;
        Ok(surface)
    }

    /// Reads a text point cloud and triangulates the retained points, as
    /// [`TinSurface::from_las`] does for LAS files.
    pub fn from_xyz(path: impl AsRef<Path>, options: &ReadOptions) -> Result<Self> {
        let path = path.as_ref();
        let options = ReadOptions {
            keep_skipped: true,
            ..options.clone()
        };
        let read = xyz::read_points_xyz(path, &options)?;
        let mut surface = Self::from_points(read.kept)?;
        surface.unused_points.extend(read.skipped);
        surface.source = Some(path.to_path_buf());
        surface.skip_stride = options.skip_stride;
        Ok(surface)
    }

    /// Triangulates every point, then keeps the hull points and one in
    /// `skip_stride + 1` of the interior points, in read order.
    pub fn from_points_keeping_hull(points: Vec<LidarPoint>, skip_stride: usize) -> Result<Self> {
        Self::from_points(points)?.decimate_keeping_hull(skip_stride)
    }

    /// Retriangulates with the points on the valid hull and one in
    /// `skip_stride + 1` of the others. Dropped points join the unused
    /// points.
    pub fn decimate_keeping_hull(self, skip_stride: usize) -> Result<Self> {
        if skip_stride == 0 {
            return Ok(self);
        }
        let mut on_hull = vec![false; self.points.len()];
        for i in self.hull_point_indices() {
            on_hull[i] = true;
        }
        let mut decimator = Decimator::new(skip_stride);
        let mut kept = Vec::with_capacity(self.points.len() / (skip_stride + 1));
        let mut dropped = Vec::new();
        for (p, &hull) in self.points.iter().zip(&on_hull) {
            if hull || decimator.keep() {
                kept.push(p.to_lidar());
            } else {
                dropped.push(p.to_lidar());
            }
        }
        let hull_count = on_hull.iter().filter(|&&h| h).count();
        let mut surface = Self::from_points(kept)?;
        surface.unused_points.extend(self.unused_points);
        surface.unused_points.extend(dropped);
        surface.source = self.source;
        surface.skip_stride = skip_stride;
        info!(
            "kept {} hull and {} interior points",
            hull_count,
            surface.points.len() - hull_count
        );
        Ok(surface)
    }

    /// Reads a point cloud, or a surface for LandXML, without pruning.
    /// With `keep_hull` the cloud is read in full and decimated after
    /// triangulation.
    pub fn import(
        path: impl AsRef<Path>,
        format: InputFormat,
        config: &TinConfig,
    ) -> Result<Self> {
        let path = path.as_ref();
        let mut options = config.read_options();
        let stride = options.skip_stride;
        if config.keep_hull {
            options.skip_stride = 0;
        }
        let surface = match format {
            InputFormat::Las => Self::from_las(path, &options)?,
            InputFormat::Xyz => Self::from_xyz(path, &options)?,
            InputFormat::LandXml => return Self::from_landxml(path),
        };
        if config.keep_hull {
            surface.decimate_keeping_hull(stride)
        } else {
            Ok(surface)
        }
    }

    /// Reads, triangulates and prunes a point cloud according to `config`,
    /// taking the format from the file extension.
    pub fn build(path: impl AsRef<Path>, config: &TinConfig) -> Result<Self> {
        let path = path.as_ref();
        Self::build_as(path, InputFormat::from_path(path), config)
    }

    /// As [`TinSurface::build`] with an explicit format. LandXML surfaces
    /// bring their own triangles and are not pruned.
    pub fn build_as(
        path: impl AsRef<Path>,
        format: InputFormat,
        config: &TinConfig,
    ) -> Result<Self> {
        let path = path.as_ref();
        if format == InputFormat::LandXml {
            return Self::from_landxml(path);
        }
        if !config.keep_hull {
            let mut surface = Self::import(path, format, config)?;
            surface.prune_hull(&config.prune);
            return Ok(surface);
        }
        let full = TinConfig {
            keep_hull: false,
            skip_stride: 0,
            ..config.clone()
        };
        let mut surface = Self::import(path, format, &full)?;
        surface.prune_hull(&config.prune);
        let mut surface = surface.decimate_keeping_hull(config.skip_stride)?;
        surface.prune_hull(&config.prune);
        Ok(surface)
    }

    /// Builds adjacency, bounds and the query index around existing
    /// triangles.
    pub(crate) fn assemble(
        points: Vec<TinPoint>,
        mut triangles: Vec<Triangle>,
        source: Option<PathBuf>,
        skip_stride: usize,
    ) -> Result<Self> {
        let edges = build_edges(&mut triangles)?;
        let bbox = BoundingBox::from_points(points.iter().map(|p| p.position())).ok_or(
            TinError::EmptySurface {
                points: points.len(),
            },
        )?;
        let mut surface = Self {
            points,
            triangles,
            edges,
            bbox,
            index: GridIndex::default(),
            source,
            skip_stride,
            unused_points: Vec::new(),
            point_triangles: OnceLock::new(),
        };
        surface.rebuild_index();
        Ok(surface)
    }

    /// Rebuilds a surface from persisted points and triangle indices,
    /// recomputing every triangle cache on the rayon pool.
    pub(crate) fn from_indexed(
        points: Vec<TinPoint>,
        raw: Vec<([usize; 3], bool)>,
        source: Option<PathBuf>,
        skip_stride: usize,
    ) -> Result<Self> {
        if let Some(&(v, _)) = raw
            .par_iter()
            .find_first(|(v, _)| triangle::is_degenerate(&points, *v))
        {
            return Err(TinError::DegenerateTriangle { vertices: v });
        }
        let triangles: Vec<Triangle> = raw
            .par_iter()
            .map(|&(v, valid)| {
                let mut t = Triangle::new(v, &points);
                t.set_valid(valid);
                t
            })
            .collect();
        Self::assemble(points, triangles, source, skip_stride)
    }

    pub(crate) fn rebuild_index(&mut self) {
        self.index = GridIndex::build(&self.triangles, &self.bbox);
    }

    pub fn points(&self) -> &[TinPoint] {
        &self.points
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn edges(&self) -> &EdgeSet {
        &self.edges
    }

    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bbox
    }

    /// Point cloud the surface was read from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn skip_stride(&self) -> usize {
        self.skip_stride
    }

    /// Points read but left out of the triangulation.
    pub fn unused_points(&self) -> &[LidarPoint] {
        &self.unused_points
    }

    pub fn valid_triangles(&self) -> impl Iterator<Item = &Triangle> {
        self.triangles.iter().filter(|t| t.is_valid())
    }

    pub fn valid_triangle_count(&self) -> usize {
        self.valid_triangles().count()
    }

    /// Triangles using `point` as a vertex, valid or not.
    pub fn triangles_at(&self, point: usize) -> &[usize] {
        let table = self.point_triangles.get_or_init(|| {
            let mut table = vec![Vec::new(); self.points.len()];
            for (t, tri) in self.triangles.iter().enumerate() {
                for v in tri.vertices() {
                    table[v].push(t);
                }
            }
            table
        });
        table.get(point).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Edges with exactly one valid owning triangle.
    pub fn hull_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges
            .iter()
            .filter(|e| e.valid_owner_count(&self.triangles) == 1)
    }

    /// Sorted indices of the points on the hull of the valid mesh.
    pub fn hull_point_indices(&self) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .hull_edges()
            .flat_map(|e| {
                let (a, b) = e.points();
                [a, b]
            })
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Angle in degrees between the normals of the two valid triangles
    /// sharing an edge. `None` for hull edges.
    pub fn edge_cross_slope(&self, edge: &Edge) -> Option<f64> {
        let mut owners = edge.owners().filter(|&t| self.triangles[t].is_valid());
        let first = owners.next()?;
        let second = owners.next()?;
        Some(
            angle_between(self.triangles[first].normal(), self.triangles[second].normal())
                .to_degrees(),
        )
    }

    /// One-line description of the surface size.
    pub fn size_summary(&self) -> String {
        format!(
            "{} points, {} triangles ({} valid), {} edges",
            self.points.len(),
            self.triangles.len(),
            self.valid_triangle_count(),
            self.edges.len()
        )
    }
}
