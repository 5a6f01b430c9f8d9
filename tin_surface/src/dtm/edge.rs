//! Edge adjacency for a triangle list.

use std::collections::HashMap;

use crate::error::{Result, TinError};

use super::triangle::Triangle;

/// An undirected mesh edge and the one or two triangles sharing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    a: usize,
    b: usize,
    first: usize,
    second: Option<usize>,
}

impl Edge {
    /// Point indices, lower first.
    pub fn points(&self) -> (usize, usize) {
        (self.a, self.b)
    }

    pub fn owners(&self) -> impl Iterator<Item = usize> {
        std::iter::once(self.first).chain(self.second)
    }

    pub fn owner_count(&self) -> usize {
        1 + usize::from(self.second.is_some())
    }

    /// A hull edge has a single owning triangle.
    pub fn is_boundary(&self) -> bool {
        self.second.is_none()
    }

    /// The triangle on the other side of this edge from `triangle`.
    pub fn other_owner(&self, triangle: usize) -> Option<usize> {
        if self.first == triangle {
            self.second
        } else if self.second == Some(triangle) {
            Some(self.first)
        } else {
            None
        }
    }

    pub fn valid_owner_count(&self, triangles: &[Triangle]) -> usize {
        self.owners().filter(|&t| triangles[t].is_valid()).count()
    }

    /// An edge stays valid while any owner is valid.
    pub fn is_valid(&self, triangles: &[Triangle]) -> bool {
        self.valid_owner_count(triangles) > 0
    }
}

/// All edges of a mesh, addressable by id or by point pair.
#[derive(Debug, Clone, Default)]
pub struct EdgeSet {
    edges: Vec<Edge>,
    lookup: HashMap<(usize, usize), usize>,
}

impl EdgeSet {
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&Edge> {
        self.edges.get(id)
    }

    /// Looks up the edge between two points in either order.
    pub fn find(&self, a: usize, b: usize) -> Option<&Edge> {
        self.lookup
            .get(&(a.min(b), a.max(b)))
            .map(|&id| &self.edges[id])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }
}

/// Builds one edge per undirected triangle side and records each
/// triangle's edge ids.
pub fn build_edges(triangles: &mut [Triangle]) -> Result<EdgeSet> {
    let mut set = EdgeSet {
        edges: Vec::with_capacity(triangles.len() * 3 / 2 + 3),
        lookup: HashMap::with_capacity(triangles.len() * 3 / 2 + 3),
    };
    for (t, tri) in triangles.iter_mut().enumerate() {
        let v = tri.vertices();
        let mut ids = [0usize; 3];
        for (slot, (p, q)) in [(v[0], v[1]), (v[1], v[2]), (v[2], v[0])]
            .into_iter()
            .enumerate()
        {
            let key = (p.min(q), p.max(q));
            let id = match set.lookup.get(&key) {
                Some(&id) => {
                    let edge = &mut set.edges[id];
                    if edge.second.is_some() {
                        return Err(TinError::NonManifoldEdge { a: key.0, b: key.1 });
                    }
                    edge.second = Some(t);
                    id
                }
                None => {
                    let id = set.edges.len();
                    set.edges.push(Edge {
                        a: key.0,
                        b: key.1,
                        first: t,
                        second: None,
                    });
                    set.lookup.insert(key, id);
                    id
                }
            };
            ids[slot] = id;
        }
        tri.set_edges(ids);
    }
    Ok(set)
}
