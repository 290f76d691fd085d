//! End-to-end simplification tests over closed manifold meshes.

use mesh_simplify::{HalfEdgeMesh, Mesh, SimplifyError, simplify, validate_topology};
use nalgebra::{Point3, Vector3};

// =============================================================================
// Test mesh generation
// =============================================================================

/// Unit tetrahedron over the corner points of the first octant.
fn tetrahedron() -> Mesh {
    let mut mesh = Mesh::new();
    mesh.positions.push(Point3::new(0.0, 0.0, 0.0));
    mesh.positions.push(Point3::new(1.0, 0.0, 0.0));
    mesh.positions.push(Point3::new(0.0, 1.0, 0.0));
    mesh.positions.push(Point3::new(0.0, 0.0, 1.0));
    mesh.indices.extend([0, 2, 1, 0, 1, 3, 1, 2, 3, 2, 0, 3]);
    mesh
}

/// Regular octahedron: 6 vertices, 8 faces.
fn octahedron() -> Mesh {
    let mut mesh = Mesh::new();
    mesh.positions.push(Point3::new(1.0, 0.0, 0.0));
    mesh.positions.push(Point3::new(-1.0, 0.0, 0.0));
    mesh.positions.push(Point3::new(0.0, 1.0, 0.0));
    mesh.positions.push(Point3::new(0.0, -1.0, 0.0));
    mesh.positions.push(Point3::new(0.0, 0.0, 1.0));
    mesh.positions.push(Point3::new(0.0, 0.0, -1.0));
    mesh.indices.extend([
        0, 2, 4, 2, 1, 4, 1, 3, 4, 3, 0, 4, //
        2, 0, 5, 1, 2, 5, 3, 1, 5, 0, 3, 5,
    ]);
    mesh
}

/// Icosphere at the given subdivision level: 20 * 4^level faces.
fn icosphere(subdivisions: u32) -> Mesh {
    let mut mesh = Mesh::new();

    let phi = (1.0 + 5.0_f64.sqrt()) / 2.0;
    let a = 1.0;
    let b = 1.0 / phi;

    let ico_verts = [
        [0.0, b, -a],
        [b, a, 0.0],
        [-b, a, 0.0],
        [0.0, b, a],
        [0.0, -b, a],
        [-a, 0.0, b],
        [0.0, -b, -a],
        [a, 0.0, -b],
        [a, 0.0, b],
        [-a, 0.0, -b],
        [b, -a, 0.0],
        [-b, -a, 0.0],
    ];

    for v in &ico_verts {
        let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
        mesh.positions
            .push(Point3::new(v[0] / len, v[1] / len, v[2] / len));
    }

    let ico_faces: [[u32; 3]; 20] = [
        [0, 2, 1],
        [3, 1, 2],
        [3, 5, 4],
        [3, 4, 8],
        [0, 7, 6],
        [0, 6, 9],
        [4, 11, 10],
        [6, 10, 11],
        [2, 9, 5],
        [11, 5, 9],
        [1, 8, 7],
        [10, 7, 8],
        [3, 2, 5],
        [3, 8, 1],
        [0, 9, 2],
        [0, 1, 7],
        [6, 11, 9],
        [6, 7, 10],
        [4, 5, 11],
        [4, 10, 8],
    ];

    for f in &ico_faces {
        mesh.indices.extend(*f);
    }

    for _ in 0..subdivisions {
        mesh = subdivide_sphere(&mesh);
    }

    mesh
}

/// Split every triangle into four, projecting new vertices onto the sphere.
fn subdivide_sphere(mesh: &Mesh) -> Mesh {
    let mut out = Mesh::new();
    out.positions = mesh.positions.clone();

    let mut midpoints: std::collections::HashMap<(u32, u32), u32> = std::collections::HashMap::new();

    let mut midpoint = |a: u32, b: u32, positions: &mut Vec<Point3<f64>>| -> u32 {
        let key = if a < b { (a, b) } else { (b, a) };
        if let Some(&index) = midpoints.get(&key) {
            return index;
        }
        let mid = (positions[a as usize].coords + positions[b as usize].coords) / 2.0;
        let unit = mid / mid.norm();
        let index = positions.len() as u32;
        positions.push(Point3::from(unit));
        midpoints.insert(key, index);
        index
    };

    for [i0, i1, i2] in mesh.triangles() {
        let m01 = midpoint(i0, i1, &mut out.positions);
        let m12 = midpoint(i1, i2, &mut out.positions);
        let m20 = midpoint(i2, i0, &mut out.positions);

        out.indices.extend([i0, m01, m20]);
        out.indices.extend([i1, m12, m01]);
        out.indices.extend([i2, m20, m12]);
        out.indices.extend([m01, m12, m20]);
    }

    out
}

/// Assert the mesh is a closed oriented manifold with Euler characteristic 2.
fn assert_closed_genus_zero(mesh: &Mesh) {
    let hem = HalfEdgeMesh::from_mesh(mesh).expect("result should be a closed manifold");
    let report = validate_topology(&hem);
    assert!(report.is_consistent(), "{}", report);

    let euler =
        mesh.vertex_count() as i64 - mesh.edge_count() as i64 + mesh.triangle_count() as i64;
    assert_eq!(euler, 2, "V - E + F should be 2");
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_tetrahedron_rate_zero_is_identity() {
    let mesh = tetrahedron();
    let result = simplify(&mesh, 0.0).expect("valid input");

    assert_eq!(result.positions, mesh.positions);
    assert_eq!(result.triangle_count(), 4);
    assert!(result.texture_coords.is_empty());
    assert_closed_genus_zero(&result);
}

#[test]
fn test_tetrahedron_rate_zero_normals_are_area_weighted() {
    let result = simplify(&tetrahedron(), 0.0).expect("valid input");

    // Corner 0 is incident to three axis-aligned faces of equal area, so its
    // normal is the normalized sum of their normals.
    let expected = Vector3::new(-1.0, -1.0, -1.0).normalize();
    assert!(
        (result.normals[0] - expected).norm() < 1e-10,
        "got {}",
        result.normals[0]
    );

    for normal in &result.normals {
        assert!((normal.norm() - 1.0).abs() < 1e-10);
    }
}

#[test]
fn test_tetrahedron_rate_one_halts() {
    let result = simplify(&tetrahedron(), 1.0).expect("valid input");
    assert!(
        result.triangle_count() == 0 || result.triangle_count() == 2,
        "got {} triangles",
        result.triangle_count()
    );
}

#[test]
fn test_octahedron_rate_half_gives_four_faces() {
    let result = simplify(&octahedron(), 0.5).expect("valid input");
    assert_eq!(result.triangle_count(), 4);
    assert_closed_genus_zero(&result);
}

#[test]
fn test_icosphere_rate_09() {
    let mesh = icosphere(2);
    assert_eq!(mesh.triangle_count(), 320);

    let result = simplify(&mesh, 0.9).expect("valid input");

    // Each collapse removes two faces, so the run stops within one
    // contraction of the 32-face target.
    assert!(
        result.triangle_count() < 32,
        "got {} triangles",
        result.triangle_count()
    );
    assert!(result.triangle_count() as f64 > 320.0 * (1.0 - 0.9) - 2.0);
    assert_closed_genus_zero(&result);
}

#[test]
fn test_large_sphere_repeated_halving() {
    let mesh = icosphere(3);
    assert_eq!(mesh.triangle_count(), 1280);

    let half = simplify(&mesh, 0.5).expect("valid input");
    assert!(half.triangle_count() <= 640);
    assert!(half.triangle_count() as f64 >= 640.0 - 1.0);
    assert_closed_genus_zero(&half);

    let quarter = simplify(&half, 0.5).expect("half is still a valid manifold");
    assert!(quarter.triangle_count() <= half.triangle_count() / 2);
    assert_closed_genus_zero(&quarter);
}

#[test]
fn test_invalid_rate_fails_and_preserves_input() {
    let mesh = octahedron();
    let snapshot = mesh.clone();

    for rate in [-0.1, 1.01] {
        let err = simplify(&mesh, rate).unwrap_err();
        assert!(matches!(err, SimplifyError::InvalidRate { .. }), "{err}");
    }

    assert_eq!(mesh.positions, snapshot.positions);
    assert_eq!(mesh.indices, snapshot.indices);
}

#[test]
fn test_boundary_mesh_rejected() {
    let mut mesh = Mesh::new();
    mesh.positions.push(Point3::new(0.0, 0.0, 0.0));
    mesh.positions.push(Point3::new(1.0, 0.0, 0.0));
    mesh.positions.push(Point3::new(0.5, 1.0, 0.0));
    mesh.positions.push(Point3::new(1.5, 1.0, 0.0));
    mesh.indices.extend([0, 1, 2, 1, 3, 2]);

    let err = simplify(&mesh, 0.5).unwrap_err();
    assert!(matches!(err, SimplifyError::NonManifoldInput { .. }), "{err}");
}

#[test]
fn test_model_transform_carried_through() {
    let mut mesh = icosphere(1);
    mesh.model_transform[(0, 3)] = 4.0;
    mesh.model_transform[(1, 3)] = -2.0;

    let result = simplify(&mesh, 0.5).expect("valid input");
    assert_eq!(result.model_transform, mesh.model_transform);
}

#[test]
fn test_face_count_monotone_over_rates() {
    let mesh = icosphere(1);
    let mut previous = mesh.triangle_count();

    for rate in [0.0, 0.25, 0.5, 0.75, 1.0] {
        let result = simplify(&mesh, rate).expect("valid input");
        assert!(
            result.triangle_count() <= previous,
            "rate {rate} produced {} faces after {previous}",
            result.triangle_count()
        );
        previous = result.triangle_count();
    }
}

#[test]
fn test_simplified_sphere_stays_near_unit_sphere() {
    let mesh = icosphere(2);
    let result = simplify(&mesh, 0.8).expect("valid input");

    // Quadric-optimal placement keeps vertices close to the original
    // surface; for a unit sphere nothing should wander far.
    for p in &result.positions {
        let r = p.coords.norm();
        assert!(
            (0.5..=1.5).contains(&r),
            "vertex {p} drifted to radius {r}"
        );
    }
}
