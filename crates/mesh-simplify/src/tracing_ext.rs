//! Tracing helpers for simplification runs.
//!
//! Enable output by initializing a subscriber in the application:
//!
//! ```rust,ignore
//! use tracing_subscriber::{fmt, prelude::*, EnvFilter};
//!
//! tracing_subscriber::registry()
//!     .with(fmt::layer())
//!     .with(EnvFilter::from_default_env())
//!     .init();
//!
//! // RUST_LOG=mesh_simplify=debug for detailed output
//! ```

use std::time::Instant;
use tracing::{debug, info, warn};

/// Captures the shape of a mesh entering an operation and logs the reduction
/// achieved once the operation finishes.
///
/// Call [`finish`](Self::finish) with the result to emit the summary event.
/// Dropping the timer without finishing logs the run as aborted, so error
/// paths still leave a trace.
pub struct ReductionTimer {
    operation: &'static str,
    start: Instant,
    initial_triangles: usize,
    initial_vertices: usize,
    finished: bool,
}

impl ReductionTimer {
    /// Start timing an operation over `mesh`.
    pub fn start(operation: &'static str, mesh: &crate::Mesh) -> Self {
        debug!(
            target: "mesh_simplify::timing",
            operation,
            triangles = mesh.triangle_count(),
            vertices = mesh.vertex_count(),
            "Starting operation"
        );
        Self {
            operation,
            start: Instant::now(),
            initial_triangles: mesh.triangle_count(),
            initial_vertices: mesh.vertex_count(),
            finished: false,
        }
    }

    /// Elapsed milliseconds since the timer started.
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Log the outcome of the operation against the recorded starting shape.
    pub fn finish(mut self, result: &crate::Mesh, collapses: u64) {
        self.finished = true;
        info!(
            target: "mesh_simplify::timing",
            operation = self.operation,
            initial_triangles = self.initial_triangles,
            final_triangles = result.triangle_count(),
            triangles_removed = self.initial_triangles.saturating_sub(result.triangle_count()),
            vertices_removed = self.initial_vertices.saturating_sub(result.vertex_count()),
            collapses,
            elapsed_ms = format!("{:.2}", self.elapsed_ms()),
            "Operation finished"
        );
    }
}

impl Drop for ReductionTimer {
    fn drop(&mut self) {
        if !self.finished {
            warn!(
                target: "mesh_simplify::timing",
                operation = self.operation,
                initial_triangles = self.initial_triangles,
                elapsed_ms = format!("{:.2}", self.elapsed_ms()),
                "Operation aborted before finishing"
            );
        }
    }
}

/// Log mesh statistics at debug level.
pub fn log_mesh_stats(mesh: &crate::Mesh, context: &str) {
    let dims = mesh
        .bounds()
        .map(|(min, max)| max - min)
        .unwrap_or_else(nalgebra::Vector3::zeros);

    debug!(
        target: "mesh_simplify::mesh_state",
        context = context,
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        dimensions = format!("{:.2} x {:.2} x {:.2}", dims.x, dims.y, dims.z),
        "Mesh state"
    );
}
