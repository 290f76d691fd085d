//! Error types for mesh simplification.

use std::path::PathBuf;
use thiserror::Error;

use crate::halfedge::VertexId;

/// Result type alias for simplification operations.
pub type SimplifyResult<T> = Result<T, SimplifyError>;

/// Errors that can occur while building, simplifying, or exchanging meshes.
#[derive(Debug, Error)]
pub enum SimplifyError {
    /// Simplification rate outside the closed interval `[0, 1]`.
    #[error("invalid mesh simplification rate {rate}: expected a value in [0, 1]")]
    InvalidRate { rate: f64 },

    /// Input mesh is not a closed oriented 2-manifold.
    #[error("mesh is not a closed oriented manifold: {details}")]
    NonManifoldInput { details: String },

    /// Triangle construction encountered a zero-area face.
    #[error("({v0},{v1},{v2}) is not a triangle")]
    DegenerateTriangle { v0: VertexId, v1: VertexId, v2: VertexId },

    /// Internal consistency failure: an expected half-edge was absent.
    #[error("attempted to retrieve a nonexistent edge: ({tail},{head})")]
    MissingEdge { tail: VertexId, head: VertexId },

    /// Invalid vertex index in face data.
    #[error("invalid vertex index: face {face_index} references vertex {vertex_index}, but mesh only has {vertex_count} vertices")]
    InvalidVertexIndex {
        face_index: usize,
        vertex_index: u32,
        vertex_count: usize,
    },

    /// Invalid coordinate value (NaN or Infinity).
    #[error("invalid coordinate at vertex {vertex_index}: {coordinate} is {value}")]
    InvalidCoordinate {
        vertex_index: usize,
        coordinate: &'static str,
        value: f64,
    },

    /// Empty mesh (no vertices or faces).
    #[error("mesh is empty: {details}")]
    EmptyMesh { details: String },

    /// Error reading from a file.
    #[error("failed to read mesh from {path}: {source}")]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error writing to a file.
    #[error("failed to write mesh to {path}: {source}")]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error parsing mesh file format.
    #[error("failed to parse mesh from {path}: {details}")]
    ParseError { path: PathBuf, details: String },

    /// Unsupported file format.
    #[error("unsupported mesh format: {extension:?}")]
    UnsupportedFormat { extension: Option<String> },
}
