//! Mesh file I/O for the OBJ format.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use nalgebra::{Point2, Point3};
use tracing::{debug, info};

use crate::error::{SimplifyError, SimplifyResult};
use crate::types::Mesh;
use crate::validate::validate_mesh_data;

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    Obj,
}

impl MeshFormat {
    /// Detect format from file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .and_then(|ext| match ext.as_str() {
                "obj" => Some(MeshFormat::Obj),
                _ => None,
            })
    }
}

/// Load a mesh from file, auto-detecting format from extension.
pub fn load_mesh(path: &Path) -> SimplifyResult<Mesh> {
    let format = MeshFormat::from_path(path).ok_or_else(|| SimplifyError::UnsupportedFormat {
        extension: path.extension().and_then(|e| e.to_str()).map(String::from),
    })?;

    info!("Loading mesh from {:?} (format: {:?})", path, format);

    let mesh = match format {
        MeshFormat::Obj => load_obj(path)?,
    };

    if mesh.is_empty() {
        return Err(SimplifyError::EmptyMesh {
            details: "mesh has no vertices or faces".to_string(),
        });
    }

    validate_mesh_data(&mesh)?;

    info!(
        "Loaded mesh: {} vertices, {} triangles",
        mesh.vertex_count(),
        mesh.triangle_count()
    );

    Ok(mesh)
}

/// Load a mesh from an OBJ file.
fn load_obj(path: &Path) -> SimplifyResult<Mesh> {
    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|e| SimplifyError::ParseError {
        path: path.to_path_buf(),
        details: e.to_string(),
    })?;

    if models.is_empty() {
        return Err(SimplifyError::EmptyMesh {
            details: "OBJ file contains no models".to_string(),
        });
    }

    // Merge all models into a single mesh.
    let mut mesh = Mesh::new();
    let mut vertex_offset = 0u32;

    for model in &models {
        debug!("OBJ model '{}': loading", model.name);

        let obj_mesh = &model.mesh;

        for chunk in obj_mesh.positions.chunks(3) {
            if chunk.len() == 3 {
                mesh.positions.push(Point3::new(
                    chunk[0] as f64,
                    chunk[1] as f64,
                    chunk[2] as f64,
                ));
            }
        }

        for chunk in obj_mesh.texcoords.chunks(2) {
            if chunk.len() == 2 {
                mesh.texture_coords
                    .push(Point2::new(chunk[0] as f64, chunk[1] as f64));
            }
        }

        // Indices are per-model and need the running offset.
        for chunk in obj_mesh.indices.chunks(3) {
            if chunk.len() == 3 {
                mesh.indices.extend([
                    chunk[0] + vertex_offset,
                    chunk[1] + vertex_offset,
                    chunk[2] + vertex_offset,
                ]);
            }
        }

        vertex_offset = mesh.positions.len() as u32;
    }

    debug!(
        "OBJ loaded: {} vertices, {} triangles from {} models",
        mesh.vertex_count(),
        mesh.triangle_count(),
        models.len()
    );

    Ok(mesh)
}

/// Save a mesh to file, auto-detecting format from extension.
pub fn save_mesh(mesh: &Mesh, path: &Path) -> SimplifyResult<()> {
    match MeshFormat::from_path(path) {
        Some(MeshFormat::Obj) => save_obj(mesh, path),
        None => Err(SimplifyError::UnsupportedFormat {
            extension: path.extension().and_then(|e| e.to_str()).map(String::from),
        }),
    }
}

/// Save a mesh to an OBJ file (ASCII format).
///
/// OBJ preserves vertex indices exactly. The output includes positions
/// (`v x y z`), unit normals when present (`vn`), texture coordinates when
/// present (`vt`), and face lines referencing all emitted attributes.
pub fn save_obj(mesh: &Mesh, path: &Path) -> SimplifyResult<()> {
    info!("Saving mesh to {:?} (OBJ format)", path);

    let file = File::create(path).map_err(|e| SimplifyError::IoWrite {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut writer = BufWriter::new(file);

    write_obj(mesh, &mut writer).map_err(|e| SimplifyError::IoWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

fn write_obj(mesh: &Mesh, writer: &mut impl Write) -> std::io::Result<()> {
    writeln!(writer, "# OBJ file exported by mesh-simplify")?;
    writeln!(writer, "# Vertices: {}", mesh.vertex_count())?;
    writeln!(writer, "# Triangles: {}", mesh.triangle_count())?;
    writeln!(writer)?;

    for p in &mesh.positions {
        writeln!(writer, "v {:.6} {:.6} {:.6}", p.x, p.y, p.z)?;
    }

    let has_normals = !mesh.normals.is_empty();
    if has_normals {
        writeln!(writer)?;
        for n in &mesh.normals {
            writeln!(writer, "vn {:.6} {:.6} {:.6}", n.x, n.y, n.z)?;
        }
    }

    let has_texcoords = !mesh.texture_coords.is_empty();
    if has_texcoords {
        writeln!(writer)?;
        for t in &mesh.texture_coords {
            writeln!(writer, "vt {:.6} {:.6}", t.x, t.y)?;
        }
    }

    writeln!(writer)?;
    for [a, b, c] in mesh.triangles() {
        // OBJ indices are 1-based; position, texture and normal indices
        // coincide because the mesh is single-indexed.
        let (a, b, c) = (a + 1, b + 1, c + 1);
        match (has_texcoords, has_normals) {
            (true, true) => writeln!(writer, "f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c}")?,
            (true, false) => writeln!(writer, "f {a}/{a} {b}/{b} {c}/{c}")?,
            (false, true) => writeln!(writer, "f {a}//{a} {b}//{b} {c}//{c}")?,
            (false, false) => writeln!(writer, "f {a} {b} {c}")?,
        }
    }

    Ok(())
}
