//! Validation for exchange mesh data and half-edge topology.

use crate::error::{SimplifyError, SimplifyResult};
use crate::halfedge::{HalfEdgeMesh, flip};
use crate::types::Mesh;

/// Consistency report for a half-edge mesh.
///
/// Collects every invariant violation found rather than stopping at the
/// first, so tests and debugging sessions see the full picture.
#[derive(Debug, Clone)]
pub struct TopologyReport {
    /// Total vertex count.
    pub vertex_count: usize,

    /// Directed half-edge count (twice the undirected edge count).
    pub half_edge_count: usize,

    /// Total face count.
    pub face_count: usize,

    /// `V - E + F` over undirected edges. 2 for a closed genus-0 mesh.
    pub euler_characteristic: i64,

    /// Human-readable descriptions of every violation found.
    pub issues: Vec<String>,
}

impl TopologyReport {
    /// Check whether every half-edge invariant holds.
    pub fn is_consistent(&self) -> bool {
        self.issues.is_empty()
    }
}

impl std::fmt::Display for TopologyReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Topology Report:")?;
        writeln!(f, "  Vertices: {}", self.vertex_count)?;
        writeln!(f, "  Half-edges: {}", self.half_edge_count)?;
        writeln!(f, "  Faces: {}", self.face_count)?;
        writeln!(f, "  Euler characteristic: {}", self.euler_characteristic)?;
        if self.issues.is_empty() {
            writeln!(f, "  Consistent: yes")?;
        } else {
            writeln!(f, "  Consistent: NO ({} issues)", self.issues.len())?;
            for issue in &self.issues {
                writeln!(f, "    - {}", issue)?;
            }
        }
        Ok(())
    }
}

/// Check every structural invariant of a half-edge mesh.
///
/// Verified per half-edge: the flip exists, the stored head matches the key,
/// the `next` cycle closes after three steps, and all three cycle edges share
/// the same live face. Per face: the key matches the canonical triple and all
/// three boundary edges point back at it. Per vertex: the incident edge heads
/// at the vertex and its one-ring walk closes.
pub fn validate_topology(mesh: &HalfEdgeMesh) -> TopologyReport {
    let mut issues = Vec::new();

    for (&key, half_edge) in mesh.edges() {
        let (tail, head) = key;

        if half_edge.vertex() != head {
            issues.push(format!(
                "half-edge ({tail},{head}) stores head {}",
                half_edge.vertex()
            ));
        }

        if !mesh.edges().contains_key(&flip(key)) {
            issues.push(format!("half-edge ({tail},{head}) has no flip"));
            continue;
        }

        let face = half_edge.face();
        if face.is_none() {
            issues.push(format!("half-edge ({tail},{head}) has no face"));
        }

        // Triangle closure: three next steps return to the start, all within
        // the same face.
        let mut current = key;
        let mut closed = true;
        for _ in 0..3 {
            match mesh.edges().get(&current).and_then(|e| e.next()) {
                Some(next) => {
                    if mesh.edges().get(&next).map(|e| e.face()) != Some(face) {
                        issues.push(format!(
                            "half-edge ({},{}) leaves face {:?} of ({tail},{head})",
                            next.0, next.1, face
                        ));
                        closed = false;
                        break;
                    }
                    current = next;
                }
                None => {
                    issues.push(format!("half-edge ({},{}) has no next", current.0, current.1));
                    closed = false;
                    break;
                }
            }
        }
        if closed && current != key {
            issues.push(format!(
                "half-edge ({tail},{head}) next cycle does not close"
            ));
        }
    }

    for (&key, face) in mesh.faces() {
        if face.key() != key {
            issues.push(format!("face {:?} keyed as {:?}", face.key(), key));
        }

        let [v0, v1, v2] = face.vertices();
        if v0 > v1.min(v2) {
            issues.push(format!("face {:?} is not in canonical rotation", key));
        }

        for vertex in [v0, v1, v2] {
            if !mesh.vertices().contains_key(&vertex) {
                issues.push(format!("face {:?} references dead vertex {vertex}", key));
            }
        }

        for edge in [(v0, v1), (v1, v2), (v2, v0)] {
            match mesh.edges().get(&edge) {
                Some(half_edge) if half_edge.face() == Some(key) => {}
                Some(_) => issues.push(format!(
                    "half-edge ({},{}) does not reference face {:?}",
                    edge.0, edge.1, key
                )),
                None => issues.push(format!(
                    "face {:?} boundary edge ({},{}) is missing",
                    key, edge.0, edge.1
                )),
            }
        }
    }

    for (&id, vertex) in mesh.vertices() {
        let Some(start) = vertex.edge() else {
            issues.push(format!("vertex {id} has no incident edge"));
            continue;
        };

        if start.1 != id {
            issues.push(format!(
                "vertex {id} incident edge ({},{}) does not head at it",
                start.0, start.1
            ));
            continue;
        }

        // One-ring closure: walking flip(next(..)) from the incident edge
        // must return to it without leaving the mesh.
        let mut current = start;
        let mut remaining = mesh.edges().len() + 1;
        loop {
            let Some(next) = mesh.edges().get(&current).and_then(|e| e.next()) else {
                issues.push(format!(
                    "vertex {id} one-ring breaks at ({},{})",
                    current.0, current.1
                ));
                break;
            };
            current = flip(next);
            if current == start {
                break;
            }
            remaining -= 1;
            if remaining == 0 {
                issues.push(format!("vertex {id} one-ring does not close"));
                break;
            }
        }
    }

    let vertex_count = mesh.vertices().len();
    let half_edge_count = mesh.edges().len();
    let face_count = mesh.face_count();

    TopologyReport {
        vertex_count,
        half_edge_count,
        face_count,
        euler_characteristic: vertex_count as i64 - (half_edge_count / 2) as i64
            + face_count as i64,
        issues,
    }
}

/// Validate exchange mesh data before building connectivity: index counts,
/// index bounds, and finite coordinates.
pub fn validate_mesh_data(mesh: &Mesh) -> SimplifyResult<()> {
    if mesh.indices.len() % 3 != 0 {
        return Err(SimplifyError::NonManifoldInput {
            details: format!("index count {} is not divisible by 3", mesh.indices.len()),
        });
    }

    let vertex_count = mesh.vertex_count();
    for (face_index, triangle) in mesh.triangles().enumerate() {
        for vertex_index in triangle {
            if vertex_index as usize >= vertex_count {
                return Err(SimplifyError::InvalidVertexIndex {
                    face_index,
                    vertex_index,
                    vertex_count,
                });
            }
        }
    }

    for (vertex_index, position) in mesh.positions.iter().enumerate() {
        for (coordinate, value) in [("x", position.x), ("y", position.y), ("z", position.z)] {
            if !value.is_finite() {
                return Err(SimplifyError::InvalidCoordinate {
                    vertex_index,
                    coordinate,
                    value,
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

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
    fn test_tetrahedron_is_consistent() {
        let hem = HalfEdgeMesh::from_mesh(&tetrahedron()).expect("closed manifold");
        let report = validate_topology(&hem);
        assert!(report.is_consistent(), "{}", report);
        assert_eq!(report.vertex_count, 4);
        assert_eq!(report.half_edge_count, 12);
        assert_eq!(report.face_count, 4);
        assert_eq!(report.euler_characteristic, 2);
    }

    #[test]
    fn test_report_display_mentions_issues() {
        let report = TopologyReport {
            vertex_count: 1,
            half_edge_count: 0,
            face_count: 0,
            euler_characteristic: 1,
            issues: vec!["vertex 0 has no incident edge".to_string()],
        };
        let text = report.to_string();
        assert!(text.contains("Consistent: NO"));
        assert!(text.contains("vertex 0 has no incident edge"));
    }

    #[test]
    fn test_mesh_data_rejects_ragged_indices() {
        let mut mesh = tetrahedron();
        mesh.indices.pop();
        let err = validate_mesh_data(&mesh).unwrap_err();
        assert!(matches!(err, SimplifyError::NonManifoldInput { .. }), "{err}");
    }

    #[test]
    fn test_mesh_data_rejects_out_of_range_index() {
        let mut mesh = tetrahedron();
        mesh.indices[0] = 9;
        let err = validate_mesh_data(&mesh).unwrap_err();
        assert!(
            matches!(
                err,
                SimplifyError::InvalidVertexIndex {
                    face_index: 0,
                    vertex_index: 9,
                    vertex_count: 4,
                }
            ),
            "{err}"
        );
    }

    #[test]
    fn test_mesh_data_rejects_nan_coordinate() {
        let mut mesh = tetrahedron();
        mesh.positions[1].y = f64::NAN;
        let err = validate_mesh_data(&mesh).unwrap_err();
        assert!(
            matches!(
                err,
                SimplifyError::InvalidCoordinate {
                    vertex_index: 1,
                    coordinate: "y",
                    ..
                }
            ),
            "{err}"
        );
    }
}
