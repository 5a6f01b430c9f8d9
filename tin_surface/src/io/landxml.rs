//! LandXML TIN surfaces: `<Pnts>` and `<Faces>` of the first `<Surface>`.

use std::collections::HashMap;
use std::path::Path;

use log::debug;
use roxmltree::Document;

use crate::dtm::{TinPoint, TinSurface};
use crate::error::{Result, TinError};
use crate::lidar::Classification;

use super::write_lines;

fn numbers<T: std::str::FromStr>(text: &str) -> Option<Vec<T>> {
    text.split_whitespace().map(|s| s.parse().ok()).collect()
}

/// Reads the points and faces of a LandXML surface.
///
/// Point text is read as `x y z`. Faces refer to points by their `id`
/// attribute, or by 1-based position when a point has none. Faces marked
/// `i="1"` are loaded as invalid triangles.
pub fn read_landxml(path: impl AsRef<Path>) -> Result<TinSurface> {
    let path = path.as_ref();
    let xml = std::fs::read_to_string(path).map_err(|e| TinError::io(path, e))?;
    let doc = Document::parse(&xml)
        .map_err(|e| TinError::format(path, "well-formed LandXML", e.to_string()))?;
    let surface = doc
        .descendants()
        .find(|n| n.has_tag_name("Surface"))
        .ok_or_else(|| TinError::format(path, "a <Surface> element", "none"))?;

    let mut points = Vec::new();
    let mut by_id: HashMap<u64, usize> = HashMap::new();
    if let Some(pnts) = surface.descendants().find(|n| n.has_tag_name("Pnts")) {
        for p in pnts.children().filter(|c| c.has_tag_name("P")) {
            let text = p.text().unwrap_or_default();
            let xyz: Vec<f64> = numbers(text)
                .filter(|v: &Vec<f64>| v.len() >= 3)
                .ok_or_else(|| TinError::format(path, "<P> with x y z", text.trim()))?;
            let index = points.len();
            let id = p
                .attribute("id")
                .and_then(|id| id.parse().ok())
                .unwrap_or(index as u64 + 1);
            by_id.insert(id, index);
            points.push(TinPoint::new(
                index,
                xyz[0],
                xyz[1],
                xyz[2],
                Classification::Ground.code(),
            ));
        }
    }

    let mut raw = Vec::new();
    if let Some(faces) = surface.descendants().find(|n| n.has_tag_name("Faces")) {
        for f in faces.children().filter(|c| c.has_tag_name("F")) {
            let text = f.text().unwrap_or_default();
            let ids: Vec<u64> = numbers(text)
                .filter(|v: &Vec<u64>| v.len() == 3)
                .ok_or_else(|| TinError::format(path, "<F> with three point ids", text.trim()))?;
            let mut v = [0usize; 3];
            for (slot, id) in v.iter_mut().zip(&ids) {
                *slot = *by_id.get(id).ok_or_else(|| {
                    TinError::format(path, "face referring to a listed point", format!("id {id}"))
                })?;
            }
            raw.push((v, f.attribute("i") != Some("1")));
        }
    }
    debug!(
        "{}: {} points and {} faces",
        path.display(),
        points.len(),
        raw.len()
    );
    if raw.is_empty() {
        return Err(TinError::EmptySurface {
            points: points.len(),
        });
    }
    TinSurface::from_indexed(points, raw, Some(path.to_path_buf()), 0)
}

/// Writes `surface` as a LandXML TIN. Invalid triangles are written with
/// `i="1"`.
pub fn write_landxml(path: impl AsRef<Path>, surface: &TinSurface) -> Result<()> {
    let mut lines = vec![
        "<?xml version=\"1.0\"?>".to_string(),
        "<LandXML>".to_string(),
        "  <Surfaces>".to_string(),
        "    <Surface name=\"TIN\">".to_string(),
        "      <Definition surfType=\"TIN\">".to_string(),
        "        <Pnts>".to_string(),
    ];
    for (i, p) in surface.points().iter().enumerate() {
        lines.push(format!("          <P id=\"{}\">{} {} {}</P>", i + 1, p.x, p.y, p.z));
    }
    lines.push("        </Pnts>".to_string());
    lines.push("        <Faces>".to_string());
    for t in surface.triangles() {
        let [a, b, c] = t.vertices();
        let hidden = if t.is_valid() { "" } else { " i=\"1\"" };
        lines.push(format!("          <F{hidden}>{} {} {}</F>", a + 1, b + 1, c + 1));
    }
    lines.push("        </Faces>".to_string());
    lines.extend(
        ["      </Definition>", "    </Surface>", "  </Surfaces>", "</LandXML>"]
            .map(String::from),
    );
    write_lines(path, lines)
}

impl TinSurface {
    /// See [`read_landxml`].
    pub fn from_landxml(path: impl AsRef<Path>) -> Result<Self> {
        read_landxml(path)
    }
}
