//! Half-edge connectivity for closed oriented triangle meshes.
//!
//! A half-edge mesh represents every undirected edge as a pair of directional
//! half-edges pointing in opposite directions. Each half-edge knows the vertex
//! at its head, the next half-edge of its triangle in counter-clockwise order,
//! and the face it belongs to. Its flip is addressed by reversing the
//! `(tail, head)` key, so the two half-edges of an undirected edge always
//! agree on their endpoints by construction.
//!
//! The mesh owns all entities: vertices keyed by id, half-edges keyed by the
//! directed `(tail, head)` pair, and faces keyed by their canonical vertex
//! triple. Handles are plain keys that stay valid until the entity is removed.

use std::collections::BTreeMap;

use hashbrown::HashMap;
use nalgebra::{Matrix4, Point3, Vector3};

use crate::error::{SimplifyError, SimplifyResult};
use crate::types::Mesh;
use crate::validate::validate_mesh_data;

/// Stable vertex identifier, unique within one mesh session and never reused.
pub type VertexId = u64;

/// Directed half-edge handle: `(tail vertex id, head vertex id)`.
pub type EdgeKey = (VertexId, VertexId);

/// Face handle: the canonical rotation of the face's vertex triple.
pub type FaceKey = (VertexId, VertexId, VertexId);

/// The oppositely directed half-edge sharing the same two endpoints.
#[inline]
pub fn flip(edge: EdgeKey) -> EdgeKey {
    (edge.1, edge.0)
}

#[inline]
fn missing(edge: EdgeKey) -> SimplifyError {
    SimplifyError::MissingEdge {
        tail: edge.0,
        head: edge.1,
    }
}

/// A positioned mesh vertex with a stable id and an incident-edge handle.
#[derive(Debug, Clone)]
pub struct Vertex {
    id: VertexId,
    position: Point3<f64>,
    edge: Option<EdgeKey>,
}

impl Vertex {
    /// Create a new vertex. The incident edge is assigned when the vertex is
    /// first linked into a triangle.
    pub fn new(id: VertexId, position: Point3<f64>) -> Self {
        Self {
            id,
            position,
            edge: None,
        }
    }

    /// The vertex id.
    #[inline]
    pub fn id(&self) -> VertexId {
        self.id
    }

    /// The vertex position.
    #[inline]
    pub fn position(&self) -> &Point3<f64> {
        &self.position
    }

    /// Some half-edge with this vertex at its head.
    #[inline]
    pub fn edge(&self) -> Option<EdgeKey> {
        self.edge
    }
}

/// A directional edge in a half-edge mesh.
#[derive(Debug, Clone)]
pub struct HalfEdge {
    vertex: VertexId,
    next: Option<EdgeKey>,
    face: Option<FaceKey>,
}

impl HalfEdge {
    fn new(vertex: VertexId) -> Self {
        Self {
            vertex,
            next: None,
            face: None,
        }
    }

    /// The vertex at the head of this half-edge.
    #[inline]
    pub fn vertex(&self) -> VertexId {
        self.vertex
    }

    /// The next half-edge of the triangle in counter-clockwise order.
    #[inline]
    pub fn next(&self) -> Option<EdgeKey> {
        self.next
    }

    /// The face this half-edge belongs to.
    #[inline]
    pub fn face(&self) -> Option<FaceKey> {
        self.face
    }
}

/// An oriented triangle with a cached unit normal and surface area.
#[derive(Debug, Clone)]
pub struct Face {
    vertices: [VertexId; 3],
    normal: Vector3<f64>,
    area: f64,
}

impl Face {
    /// Create a face from three vertices in counter-clockwise order.
    ///
    /// The vertices are stored in canonical rotation: rotated so the lowest
    /// id comes first, preserving winding. Fails with `DegenerateTriangle`
    /// when the triangle has zero area.
    pub fn new(v0: &Vertex, v1: &Vertex, v2: &Vertex) -> SimplifyResult<Self> {
        let (v0, v1, v2) = min_vertex_order(v0, v1, v2);

        let edge01 = v1.position() - v0.position();
        let edge02 = v2.position() - v0.position();
        let normal = edge01.cross(&edge02);
        let magnitude = normal.norm();

        if magnitude == 0.0 {
            return Err(SimplifyError::DegenerateTriangle {
                v0: v0.id(),
                v1: v1.id(),
                v2: v2.id(),
            });
        }

        Ok(Self {
            vertices: [v0.id(), v1.id(), v2.id()],
            normal: normal / magnitude,
            area: 0.5 * magnitude,
        })
    }

    /// The vertex ids in canonical rotation.
    #[inline]
    pub fn vertices(&self) -> [VertexId; 3] {
        self.vertices
    }

    /// The face key, recomputed from the canonical vertex triple.
    #[inline]
    pub fn key(&self) -> FaceKey {
        (self.vertices[0], self.vertices[1], self.vertices[2])
    }

    /// The unit face normal.
    #[inline]
    pub fn normal(&self) -> &Vector3<f64> {
        &self.normal
    }

    /// The triangle surface area.
    #[inline]
    pub fn area(&self) -> f64 {
        self.area
    }
}

/// Rotate three vertices so the one with the lowest id comes first,
/// preserving winding order.
fn min_vertex_order<'a>(
    v0: &'a Vertex,
    v1: &'a Vertex,
    v2: &'a Vertex,
) -> (&'a Vertex, &'a Vertex, &'a Vertex) {
    let min_id = v0.id().min(v1.id()).min(v2.id());
    if min_id == v0.id() {
        (v0, v1, v2)
    } else if min_id == v1.id() {
        (v1, v2, v0)
    } else {
        (v2, v0, v1)
    }
}

/// One rebuilt triangle of a collapse fan: the replacement face, the face it
/// replaces, and the spoke half-edge pair to remove.
struct FanStep {
    face: Face,
    old_face: FaceKey,
    spoke: EdgeKey,
}

/// The precomputed rebuild plan for one endpoint's fan.
struct FanPlan {
    steps: Vec<FanStep>,
    end_spoke: EdgeKey,
}

/// An edge-centric triangle mesh supporting traversal and edge collapse.
#[derive(Debug, Clone)]
pub struct HalfEdgeMesh {
    vertices: BTreeMap<VertexId, Vertex>,
    edges: HashMap<EdgeKey, HalfEdge>,
    faces: HashMap<FaceKey, Face>,
    model_transform: Matrix4<f64>,
    next_vertex_id: VertexId,
}

impl HalfEdgeMesh {
    /// Build a half-edge mesh from an indexed triangle mesh.
    ///
    /// Vertex ids are the input indices. Fails with `NonManifoldInput` if a
    /// directed half-edge would be created twice (inconsistent winding or a
    /// doubled face) or if any half-edge is left without a face (boundary).
    pub fn from_mesh(mesh: &Mesh) -> SimplifyResult<Self> {
        validate_mesh_data(mesh)?;

        let mut hem = Self {
            vertices: BTreeMap::new(),
            edges: HashMap::with_capacity(mesh.indices.len() * 2),
            faces: HashMap::with_capacity(mesh.triangle_count()),
            model_transform: mesh.model_transform,
            next_vertex_id: mesh.vertex_count() as VertexId,
        };

        for (i, position) in mesh.positions.iter().enumerate() {
            let id = i as VertexId;
            hem.vertices.insert(id, Vertex::new(id, *position));
        }

        for [a, b, c] in mesh.triangles() {
            let (a, b, c) = (a as VertexId, b as VertexId, c as VertexId);
            for edge in [(a, b), (b, c), (c, a)] {
                if hem.edges.get(&edge).is_some_and(|e| e.face.is_some()) {
                    return Err(SimplifyError::NonManifoldInput {
                        details: format!("duplicate directed edge ({},{})", edge.0, edge.1),
                    });
                }
            }
            hem.create_triangle(a, b, c)?;
        }

        for (edge, half_edge) in &hem.edges {
            if half_edge.next.is_none() || half_edge.face.is_none() {
                return Err(SimplifyError::NonManifoldInput {
                    details: format!("boundary edge ({},{})", edge.0, edge.1),
                });
            }
        }

        Ok(hem)
    }

    /// Convert back to an indexed triangle mesh.
    ///
    /// Vertices are exported in id order and indices renumbered accordingly.
    /// Vertex normals are recomputed as area-weighted averages of incident
    /// face normals. Texture coordinates are not tracked across
    /// simplification and are left empty.
    pub fn to_mesh(&self) -> Mesh {
        let mut mesh = Mesh::with_capacity(self.vertices.len(), self.faces.len());
        mesh.model_transform = self.model_transform;

        let mut normals: HashMap<VertexId, Vector3<f64>> =
            HashMap::with_capacity(self.vertices.len());
        for face in self.faces.values() {
            let weighted = face.normal() * face.area();
            for id in face.vertices() {
                *normals.entry(id).or_insert_with(Vector3::zeros) += weighted;
            }
        }

        let mut index_map: HashMap<VertexId, u32> = HashMap::with_capacity(self.vertices.len());
        for (i, (id, vertex)) in self.vertices.iter().enumerate() {
            mesh.positions.push(*vertex.position());
            let summed = normals.get(id).copied().unwrap_or_else(Vector3::zeros);
            let norm = summed.norm();
            mesh.normals.push(if norm > f64::EPSILON {
                summed / norm
            } else {
                Vector3::zeros()
            });
            index_map.insert(*id, i as u32);
        }

        for face in self.faces.values() {
            for id in face.vertices() {
                mesh.indices.push(index_map[&id]);
            }
        }

        mesh
    }

    /// The mesh vertices, ordered by id.
    #[inline]
    pub fn vertices(&self) -> &BTreeMap<VertexId, Vertex> {
        &self.vertices
    }

    /// The mesh half-edges, keyed by directed `(tail, head)` pair.
    #[inline]
    pub fn edges(&self) -> &HashMap<EdgeKey, HalfEdge> {
        &self.edges
    }

    /// The mesh faces, keyed by canonical vertex triple.
    #[inline]
    pub fn faces(&self) -> &HashMap<FaceKey, Face> {
        &self.faces
    }

    /// Number of faces currently in the mesh.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// The model-space transform carried through from the source mesh.
    #[inline]
    pub fn model_transform(&self) -> &Matrix4<f64> {
        &self.model_transform
    }

    /// Mint a unique vertex id for a new vertex. Ids of removed vertices are
    /// never reused.
    pub fn allocate_vertex_id(&mut self) -> VertexId {
        let id = self.next_vertex_id;
        self.next_vertex_id += 1;
        id
    }

    /// Look up a vertex by id.
    pub fn vertex(&self, id: VertexId) -> SimplifyResult<&Vertex> {
        self.vertices.get(&id).ok_or(missing((id, id)))
    }

    /// Look up a half-edge by its directed key.
    pub fn half_edge(&self, edge: EdgeKey) -> SimplifyResult<&HalfEdge> {
        self.edges.get(&edge).ok_or(missing(edge))
    }

    /// The key of the counter-clockwise successor of `edge` within its face.
    pub fn next_key(&self, edge: EdgeKey) -> SimplifyResult<EdgeKey> {
        self.half_edge(edge)?.next.ok_or(missing(edge))
    }

    /// All half-edges pointing at `vertex`, one per incident triangle,
    /// starting from the vertex's incident-edge handle.
    pub fn ring_edges(&self, vertex: VertexId) -> SimplifyResult<Vec<EdgeKey>> {
        let start = self
            .vertex(vertex)?
            .edge
            .ok_or(missing((vertex, vertex)))?;

        let mut ring = Vec::new();
        let mut current = start;
        let mut remaining = self.edges.len() + 1;
        loop {
            ring.push(current);
            current = flip(self.next_key(current)?);
            if current == start {
                return Ok(ring);
            }
            remaining -= 1;
            if remaining == 0 {
                return Err(missing(current));
            }
        }
    }

    /// Collapse the directed edge `edge01` into the caller-provided vertex.
    ///
    /// `v_new` must carry a freshly allocated id (`allocate_vertex_id`) and
    /// must not yet be resident. Every triangle incident to exactly one
    /// endpoint is rebuilt against `v_new`; the two triangles incident to the
    /// edge itself are destroyed; both endpoints are removed.
    ///
    /// The operation is two-phase: both fans are walked and all replacement
    /// faces constructed before any mutation, so `MissingEdge` and
    /// `DegenerateTriangle` failures leave the mesh untouched.
    pub fn collapse_edge(&mut self, edge01: EdgeKey, v_new: Vertex) -> SimplifyResult<()> {
        let edge10 = flip(edge01);

        let e01 = self.half_edge(edge01)?;
        let v1 = e01.vertex;
        let face01 = e01.face.ok_or(missing(edge01))?;
        let e10 = self.half_edge(edge10)?;
        let v0 = e10.vertex;
        let face10 = e10.face.ok_or(missing(edge10))?;

        let v1_next = self.half_edge(self.next_key(edge01)?)?.vertex;
        let v0_next = self.half_edge(self.next_key(edge10)?)?.vertex;

        for face in [face01, face10] {
            if !self.faces.contains_key(&face) {
                return Err(missing((face.0, face.1)));
            }
        }

        let fan0 = self.plan_fan(v0, v1_next, v0_next, &v_new)?;
        let fan1 = self.plan_fan(v1, v0_next, v1_next, &v_new)?;

        self.vertices.insert(v_new.id, v_new);
        self.apply_fan(fan0)?;
        self.apply_fan(fan1)?;

        self.delete_face(face01)?;
        self.delete_face(face10)?;
        self.delete_edge_pair(edge01)?;

        self.vertices.remove(&v0);
        self.vertices.remove(&v1);

        Ok(())
    }

    /// Walk the fan of `v_target` from the half-edge toward `v_start` up to
    /// (exclusive) the half-edge toward `v_end`, recording each incident
    /// triangle's replacement. Read-only; fails before any mutation happens.
    fn plan_fan(
        &self,
        v_target: VertexId,
        v_start: VertexId,
        v_end: VertexId,
        v_new: &Vertex,
    ) -> SimplifyResult<FanPlan> {
        let end_spoke = (v_target, v_end);
        self.half_edge(end_spoke)?;

        let mut steps = Vec::new();
        let mut edge0i = (v_target, v_start);
        let mut remaining = self.edges.len() + 1;

        while edge0i != end_spoke {
            let e = self.half_edge(edge0i)?;
            let vi = e.vertex;
            let old_face = e.face.ok_or(missing(edge0i))?;
            if !self.faces.contains_key(&old_face) {
                return Err(missing(edge0i));
            }

            let edgeij = self.next_key(edge0i)?;
            let vj = self.half_edge(edgeij)?.vertex;

            let face = Face::new(v_new, self.vertex(vi)?, self.vertex(vj)?)?;
            steps.push(FanStep {
                face,
                old_face,
                spoke: edge0i,
            });

            let edgej0 = self.next_key(edgeij)?;
            edge0i = flip(edgej0);

            remaining -= 1;
            if remaining == 0 {
                return Err(missing(edge0i));
            }
        }

        Ok(FanPlan { steps, end_spoke })
    }

    fn apply_fan(&mut self, plan: FanPlan) -> SimplifyResult<()> {
        for step in plan.steps {
            self.insert_triangle(step.face)?;
            self.delete_face(step.old_face)?;
            self.delete_edge_pair(step.spoke)?;
        }
        self.delete_edge_pair(plan.end_spoke)
    }

    /// Create a triangle between three resident vertices in counter-clockwise
    /// order, allocating half-edge pairs on first sight.
    fn create_triangle(
        &mut self,
        v0: VertexId,
        v1: VertexId,
        v2: VertexId,
    ) -> SimplifyResult<FaceKey> {
        let face = Face::new(self.vertex(v0)?, self.vertex(v1)?, self.vertex(v2)?)?;
        self.insert_triangle(face)
    }

    /// Link a constructed face into the connectivity tables.
    fn insert_triangle(&mut self, face: Face) -> SimplifyResult<FaceKey> {
        let [v0, v1, v2] = face.vertices();
        let key = face.key();

        self.ensure_edge_pair(v0, v1);
        self.ensure_edge_pair(v1, v2);
        self.ensure_edge_pair(v2, v0);

        for (edge, next) in [
            ((v0, v1), (v1, v2)),
            ((v1, v2), (v2, v0)),
            ((v2, v0), (v0, v1)),
        ] {
            let half_edge = self.edges.get_mut(&edge).ok_or(missing(edge))?;
            half_edge.next = Some(next);
            half_edge.face = Some(key);
        }

        for (vertex, incident) in [(v0, (v2, v0)), (v1, (v0, v1)), (v2, (v1, v2))] {
            self.vertices
                .get_mut(&vertex)
                .ok_or(missing((vertex, vertex)))?
                .edge = Some(incident);
        }

        self.faces.insert(key, face);
        Ok(key)
    }

    /// Allocate the two half-edges of an undirected edge if not yet present.
    fn ensure_edge_pair(&mut self, tail: VertexId, head: VertexId) {
        if !self.edges.contains_key(&(tail, head)) {
            self.edges.insert((tail, head), HalfEdge::new(head));
            self.edges.insert((head, tail), HalfEdge::new(tail));
        }
    }

    /// Remove both half-edges of an undirected edge.
    fn delete_edge_pair(&mut self, edge: EdgeKey) -> SimplifyResult<()> {
        self.edges.remove(&edge).ok_or(missing(edge))?;
        self.edges.remove(&flip(edge)).ok_or(missing(flip(edge)))?;
        Ok(())
    }

    fn delete_face(&mut self, face: FaceKey) -> SimplifyResult<()> {
        self.faces
            .remove(&face)
            .map(|_| ())
            .ok_or(missing((face.0, face.1)))
    }
}
