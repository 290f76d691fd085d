//! Triangle mesh simplification over a half-edge connectivity structure.
//!
//! This crate reduces the triangle count of closed oriented 2-manifold
//! meshes using quadric error metrics (the Garland-Heckbert algorithm):
//! every vertex carries a 4x4 error quadric summed over its incident face
//! planes, candidate edge contractions are ordered by the error of their
//! optimal replacement vertex, and a link-condition guard rejects
//! contractions that would break the manifold.
//!
//! # Quick Start
//!
//! ```no_run
//! use mesh_simplify::Mesh;
//!
//! let mesh = Mesh::load("model.obj").unwrap();
//!
//! // Remove 90% of the triangles.
//! let simplified = mesh.simplify(0.9).unwrap();
//!
//! simplified.save("simplified.obj").unwrap();
//! ```
//!
//! # Input Requirements
//!
//! The simplifier requires a closed oriented 2-manifold: every edge shared
//! by exactly two faces with consistent counter-clockwise winding, and every
//! vertex with a single closed fan of triangles. Meshes with boundary edges,
//! inconsistent winding, or doubled faces fail with
//! [`SimplifyError::NonManifoldInput`].
//!
//! # Output Guarantees
//!
//! - The face count is reduced to at most `(1 - rate)` of the input, with
//!   the caveat that each contraction removes two faces so the result may
//!   undershoot the target by one.
//! - The result is itself a closed oriented manifold.
//! - Vertex normals are recomputed as area-weighted averages of incident
//!   face normals; texture coordinates are not tracked across contraction
//!   and come back empty.
//! - The model transform is carried through untouched.
//!
//! # Progress Reporting
//!
//! Long runs can report progress and be cancelled through
//! [`simplify_with_progress`]:
//!
//! ```no_run
//! use mesh_simplify::{Mesh, progress::ProgressCallback, simplify_with_progress};
//!
//! let mesh = Mesh::load("model.obj").unwrap();
//! let callback: ProgressCallback = Box::new(|progress| {
//!     println!("{}% - {}", progress.percent(), progress.message);
//!     true // continue; return false to cancel
//! });
//! let simplified = simplify_with_progress(&mesh, 0.9, Some(&callback)).unwrap();
//! ```
//!
//! # Logging
//!
//! Operations emit structured `tracing` events. Set
//! `RUST_LOG=mesh_simplify=debug` with a `tracing-subscriber` installed to
//! see timing and per-run statistics.

mod error;
mod types;

pub mod halfedge;
pub mod io;
pub mod progress;
pub mod quadric;
pub mod simplify;
pub mod tracing_ext;
pub mod validate;

// Re-export core types at crate root
pub use error::{SimplifyError, SimplifyResult};
pub use types::Mesh;

// Re-export commonly used items
pub use halfedge::HalfEdgeMesh;
pub use io::{MeshFormat, load_mesh, save_mesh, save_obj};
pub use simplify::{simplify, simplify_with_progress};
pub use validate::{TopologyReport, validate_mesh_data, validate_topology};

// Convenience methods on Mesh
impl Mesh {
    /// Load a mesh from a file, auto-detecting format from extension.
    pub fn load(path: impl AsRef<std::path::Path>) -> SimplifyResult<Self> {
        io::load_mesh(path.as_ref())
    }

    /// Save the mesh to a file, auto-detecting format from extension.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> SimplifyResult<()> {
        io::save_mesh(self, path.as_ref())
    }

    /// Reduce the triangle count by `rate` (the fraction of triangles to
    /// remove, in `[0, 1]`).
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_simplify::Mesh;
    /// use nalgebra::Point3;
    ///
    /// let mut mesh = Mesh::new();
    /// mesh.positions.push(Point3::new(0.0, 0.0, 0.0));
    /// mesh.positions.push(Point3::new(1.0, 0.0, 0.0));
    /// mesh.positions.push(Point3::new(0.0, 1.0, 0.0));
    /// mesh.positions.push(Point3::new(0.0, 0.0, 1.0));
    /// mesh.indices.extend([0, 2, 1, 0, 1, 3, 1, 2, 3, 2, 0, 3]);
    ///
    /// let simplified = mesh.simplify(0.0).unwrap();
    /// assert_eq!(simplified.triangle_count(), 4);
    /// ```
    pub fn simplify(&self, rate: f64) -> SimplifyResult<Mesh> {
        simplify::simplify(self, rate)
    }

    /// Like [`Mesh::simplify`], reporting progress through a callback.
    pub fn simplify_with_progress(
        &self,
        rate: f64,
        callback: Option<&progress::ProgressCallback>,
    ) -> SimplifyResult<Mesh> {
        simplify::simplify_with_progress(self, rate, callback)
    }
}
