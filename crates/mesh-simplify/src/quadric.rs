//! Per-vertex quadric error matrices.
//!
//! Each vertex carries the 4x4 symmetric sum of plane outer products over its
//! incident faces, where a face contributes the plane through the vertex with
//! the face's unit normal. The error of moving the vertex to a candidate
//! point `x` is `[x;1]^T Q [x;1]`, the sum of squared distances to those
//! planes.

use hashbrown::HashMap;
use nalgebra::{Matrix4, Point3, Vector3, Vector4};

use crate::error::SimplifyResult;
use crate::halfedge::{HalfEdgeMesh, VertexId};

/// The quadric of a single plane through `point` with unit `normal`.
pub fn plane_quadric(normal: &Vector3<f64>, point: &Point3<f64>) -> Matrix4<f64> {
    let plane = Vector4::new(normal.x, normal.y, normal.z, -normal.dot(&point.coords));
    plane * plane.transpose()
}

/// Evaluate a quadric at a point: `[x;1]^T Q [x;1]`.
pub fn evaluate(quadric: &Matrix4<f64>, point: &Point3<f64>) -> f64 {
    let h = Vector4::new(point.x, point.y, point.z, 1.0);
    h.dot(&(quadric * h))
}

/// The optimal contraction target for an edge with summed quadric `quadric`
/// and endpoint positions `p0`, `p1`.
///
/// Solves `x* = -A^-1 b` from the upper-left 3x3 block `A` and the fourth
/// column `b` of the quadric, returning `x*` with its error as the cost. When
/// the block is not invertible (or the constant term vanishes) the midpoint
/// is used with cost 0, tie-breaking toward contractions the solver cannot
/// place analytically.
pub fn optimal_contraction(
    quadric: &Matrix4<f64>,
    p0: &Point3<f64>,
    p1: &Point3<f64>,
) -> (Point3<f64>, f64) {
    let a = quadric.fixed_view::<3, 3>(0, 0).into_owned();
    let b = Vector3::new(quadric[(0, 3)], quadric[(1, 3)], quadric[(2, 3)]);
    let d = quadric[(3, 3)];

    if a.determinant().abs() >= f64::EPSILON && d.abs() >= f64::EPSILON {
        if let Some(a_inverse) = a.try_inverse() {
            let position = Point3::from(-(a_inverse * b));
            let cost = evaluate(quadric, &position);
            return (position, cost);
        }
    }

    (Point3::from((p0.coords + p1.coords) / 2.0), 0.0)
}

/// Per-vertex error quadrics, keyed by vertex id.
#[derive(Debug, Clone)]
pub struct QuadricTable {
    quadrics: HashMap<VertexId, Matrix4<f64>>,
}

impl QuadricTable {
    /// Compute the quadric of every vertex in the mesh by accumulating each
    /// face's plane into its three corners.
    pub fn from_mesh(mesh: &HalfEdgeMesh) -> SimplifyResult<Self> {
        let mut quadrics: HashMap<VertexId, Matrix4<f64>> =
            HashMap::with_capacity(mesh.vertices().len());

        for (&id, _) in mesh.vertices() {
            quadrics.insert(id, Matrix4::zeros());
        }

        for face in mesh.faces().values() {
            for id in face.vertices() {
                let position = *mesh.vertex(id)?.position();
                let contribution = plane_quadric(face.normal(), &position);
                if let Some(quadric) = quadrics.get_mut(&id) {
                    *quadric += contribution;
                }
            }
        }

        Ok(Self { quadrics })
    }

    /// Number of vertices with a quadric.
    #[inline]
    pub fn len(&self) -> usize {
        self.quadrics.len()
    }

    /// Check if the table is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.quadrics.is_empty()
    }

    /// Look up the quadric of a vertex.
    pub fn get(&self, vertex: VertexId) -> Option<&Matrix4<f64>> {
        self.quadrics.get(&vertex)
    }

    /// The summed quadric of an edge's endpoints.
    ///
    /// Panics if either vertex has no quadric; the table always covers every
    /// live vertex of the mesh it was built for.
    pub fn edge_quadric(&self, v0: VertexId, v1: VertexId) -> Matrix4<f64> {
        self.quadrics[&v0] + self.quadrics[&v1]
    }

    /// Record the quadric of a collapse's new vertex as the sum of the
    /// replaced endpoints' quadrics.
    pub fn merge(&mut self, v0: VertexId, v1: VertexId, v_new: VertexId) {
        let merged = self.edge_quadric(v0, v1);
        self.quadrics.insert(v_new, merged);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Mesh;

    fn tetrahedron() -> Mesh {
        let mut mesh = Mesh::new();
        mesh.positions.push(Point3::new(0.0, 0.0, 0.0));
        mesh.positions.push(Point3::new(1.0, 0.0, 0.0));
        mesh.positions.push(Point3::new(0.0, 1.0, 0.0));
        mesh.positions.push(Point3::new(0.0, 0.0, 1.0));
        mesh.indices.extend([0, 2, 1, 0, 1, 3, 1, 2, 3, 2, 0, 3]);
        mesh
    }

    #[test]
    fn test_plane_quadric_zero_on_plane() {
        let q = plane_quadric(&Vector3::new(0.0, 0.0, 1.0), &Point3::new(0.0, 0.0, 0.0));

        assert!(evaluate(&q, &Point3::new(0.0, 0.0, 0.0)).abs() < 1e-12);
        assert!(evaluate(&q, &Point3::new(3.0, -2.0, 0.0)).abs() < 1e-12);

        // Off the plane the error is the squared distance.
        assert!((evaluate(&q, &Point3::new(0.0, 0.0, 1.0)) - 1.0).abs() < 1e-12);
        assert!((evaluate(&q, &Point3::new(5.0, 1.0, -2.0)) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_plane_quadric_is_symmetric() {
        let q = plane_quadric(
            &Vector3::new(0.6, 0.8, 0.0),
            &Point3::new(1.0, 2.0, 3.0),
        );
        assert_eq!(q, q.transpose());
    }

    #[test]
    fn test_optimal_contraction_three_planes() {
        // Three orthogonal planes meeting at (1, 2, 3).
        let corner = Point3::new(1.0, 2.0, 3.0);
        let q = plane_quadric(&Vector3::new(1.0, 0.0, 0.0), &corner)
            + plane_quadric(&Vector3::new(0.0, 1.0, 0.0), &corner)
            + plane_quadric(&Vector3::new(0.0, 0.0, 1.0), &corner);

        let (position, cost) = optimal_contraction(
            &q,
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(2.0, 4.0, 6.0),
        );
        assert!((position - corner).norm() < 1e-9, "got {position}");
        assert!(cost.abs() < 1e-9);
    }

    #[test]
    fn test_optimal_contraction_singular_falls_back_to_midpoint() {
        // Two parallel planes: the 3x3 block is rank one.
        let q = plane_quadric(&Vector3::new(0.0, 0.0, 1.0), &Point3::new(0.0, 0.0, 0.0))
            + plane_quadric(&Vector3::new(0.0, 0.0, 1.0), &Point3::new(0.0, 0.0, 2.0));

        let p0 = Point3::new(0.0, 0.0, 0.0);
        let p1 = Point3::new(0.0, 0.0, 2.0);
        let (position, cost) = optimal_contraction(&q, &p0, &p1);
        assert!((position - Point3::new(0.0, 0.0, 1.0)).norm() < 1e-12);
        assert_eq!(cost, 0.0);
    }

    #[test]
    fn test_table_covers_all_vertices() {
        let hem = HalfEdgeMesh::from_mesh(&tetrahedron()).expect("closed manifold");
        let table = QuadricTable::from_mesh(&hem).expect("quadrics");
        assert_eq!(table.len(), 4);
        for &id in hem.vertices().keys() {
            assert!(table.get(id).is_some());
        }
    }

    #[test]
    fn test_table_quadrics_are_symmetric() {
        let hem = HalfEdgeMesh::from_mesh(&tetrahedron()).expect("closed manifold");
        let table = QuadricTable::from_mesh(&hem).expect("quadrics");
        for &id in hem.vertices().keys() {
            let q = table.get(id).expect("quadric present");
            assert!((q - q.transpose()).norm() < 1e-12, "vertex {id}");
        }
    }

    #[test]
    fn test_vertex_quadric_vanishes_at_vertex() {
        // Each vertex sits on all of its incident face planes, so its own
        // quadric evaluates to zero there.
        let mesh = tetrahedron();
        let hem = HalfEdgeMesh::from_mesh(&mesh).expect("closed manifold");
        let table = QuadricTable::from_mesh(&hem).expect("quadrics");
        for (&id, vertex) in hem.vertices() {
            let q = table.get(id).expect("quadric present");
            assert!(evaluate(q, vertex.position()).abs() < 1e-12, "vertex {id}");
        }
    }

    #[test]
    fn test_merge_sums_endpoint_quadrics() {
        let hem = HalfEdgeMesh::from_mesh(&tetrahedron()).expect("closed manifold");
        let mut table = QuadricTable::from_mesh(&hem).expect("quadrics");

        let expected = table.edge_quadric(0, 1);
        table.merge(0, 1, 4);
        assert_eq!(table.get(4), Some(&expected));
        assert_eq!(table.len(), 5);
    }
}
