use std::io::Write;
use std::path::Path;

use log::info;

use crate::dtm::TinSurface;
use crate::error::{Result, TinError};

/// Writes the valid triangles of `surface` as a Wavefront OBJ mesh.
///
/// Every surface point is written as a vertex so face indices match point
/// indices plus one. With `translate_to_origin` the bounding-box centre is
/// moved to the origin.
pub fn write_obj(
    path: impl AsRef<Path>,
    surface: &TinSurface,
    translate_to_origin: bool,
) -> Result<()> {
    let path = path.as_ref();
    let centre = surface.bounding_box().center();
    let (dx, dy, dz) = if translate_to_origin {
        (centre.x, centre.y, centre.z)
    } else {
        (0.0, 0.0, 0.0)
    };
    let mut w = crate::io::create_writer(path)?;
    let mut faces = 0usize;
    let mut write = || -> std::io::Result<()> {
        if let Some(source) = surface.source() {
            writeln!(w, "# source {}", source.display())?;
        }
        for p in surface.points() {
            writeln!(w, "v {} {} {}", p.x - dx, p.y - dy, p.z - dz)?;
        }
        for t in surface.valid_triangles() {
            let [a, b, c] = t.vertices();
            writeln!(w, "f {} {} {}", a + 1, b + 1, c + 1)?;
            faces += 1;
        }
        w.flush()
    };
    write().map_err(|e| TinError::io(path, e))?;
    info!("wrote {faces} faces to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lidar::LidarPoint;

    #[test]
    fn faces_are_one_based_and_centred() {
        let corners = [
            (0.0, 0.0, 0.0),
            (2.0, 0.0, 0.0),
            (2.0, 2.0, 2.0),
            (0.0, 2.0, 2.0),
        ];
        let pts: Vec<LidarPoint> = corners
            .iter()
            .map(|&(x, y, z)| LidarPoint::new(x, y, z, 2))
            .collect();
        let surface = TinSurface::from_points(pts).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.obj");
        write_obj(&path, &surface, true).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let verts: Vec<&str> = text.lines().filter(|l| l.starts_with("v ")).collect();
        let faces: Vec<&str> = text.lines().filter(|l| l.starts_with("f ")).collect();
        assert_eq!(verts.len(), 4);
        assert_eq!(verts[0], "v -1 -1 -1");
        assert_eq!(faces.len(), 2);
        for f in faces {
            let idx: Vec<usize> = f[2..].split(' ').map(|s| s.parse().unwrap()).collect();
            assert!(idx.iter().all(|&i| (1..=4).contains(&i)));
        }
    }
}
