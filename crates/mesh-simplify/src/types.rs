//! Core exchange types for indexed triangle meshes.

use nalgebra::{Matrix4, Point2, Point3, Vector3};

/// An indexed triangle mesh, the exchange type consumed and produced by the
/// simplifier.
///
/// Faces are triples of indices into `positions` with counter-clockwise
/// winding when viewed from outside the mesh. `normals` and `texture_coords`
/// are parallel to `positions` when present and may be empty.
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Vertex positions.
    pub positions: Vec<Point3<f64>>,

    /// Per-vertex unit normals. Recomputed by simplification; may be empty
    /// on input.
    pub normals: Vec<Vector3<f64>>,

    /// Per-vertex texture coordinates. Discarded by simplification.
    pub texture_coords: Vec<Point2<f64>>,

    /// Triangle indices, three per face.
    pub indices: Vec<u32>,

    /// Model-space transform, carried through untouched.
    pub model_transform: Matrix4<f64>,
}

impl Mesh {
    /// Create a new empty mesh with an identity transform.
    pub fn new() -> Self {
        Self {
            positions: Vec::new(),
            normals: Vec::new(),
            texture_coords: Vec::new(),
            indices: Vec::new(),
            model_transform: Matrix4::identity(),
        }
    }

    /// Create a mesh with pre-allocated capacity.
    pub fn with_capacity(vertex_count: usize, face_count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertex_count),
            normals: Vec::new(),
            texture_coords: Vec::new(),
            indices: Vec::with_capacity(face_count * 3),
            model_transform: Matrix4::identity(),
        }
    }

    /// Number of vertices in the mesh.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles in the mesh.
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check if the mesh is empty (no vertices or triangles).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.indices.is_empty()
    }

    /// Iterate over the triangles as index triples.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Number of distinct undirected edges referenced by the triangles.
    pub fn edge_count(&self) -> usize {
        let mut edges = hashbrown::HashSet::new();
        for [a, b, c] in self.triangles() {
            for (t, h) in [(a, b), (b, c), (c, a)] {
                edges.insert(if t < h { (t, h) } else { (h, t) });
            }
        }
        edges.len()
    }

    /// Compute the axis-aligned bounding box.
    /// Returns (min_corner, max_corner) or None if the mesh has no vertices.
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = *self.positions.first()?;
        let mut min = first;
        let mut max = first;

        for p in &self.positions[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }

        Some((min, max))
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}
