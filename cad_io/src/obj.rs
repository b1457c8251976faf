//! Wavefront OBJ import and export.
//!
//! Export writes positions and triangular faces only. Import accepts polygon
//! faces (fan-triangulated) with `v`, `v/vt`, `v//vn` and `v/vt/vn` references,
//! including negative (relative) indices; other records are ignored.

use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

use cad_core::Point3;

use crate::error::{CadIoError, Result};
use crate::mesh::TriangleMesh;

/// Counts reported by [`export_obj`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshStats {
    /// Number of vertices written.
    pub vertex_count: usize,
    /// Number of triangles written.
    pub triangle_count: usize,
}

/// Write a mesh as OBJ.
pub fn export_obj<W: Write>(mesh: &TriangleMesh, writer: &mut W) -> Result<MeshStats> {
    writeln!(writer, "# cad_io OBJ export")?;
    writeln!(writer, "# {} vertices", mesh.num_vertices())?;
    for v in &mesh.vertices {
        writeln!(writer, "v {} {} {}", v.x, v.y, v.z)?;
    }

    writeln!(writer)?;
    writeln!(writer, "# {} faces", mesh.num_triangles())?;
    for &[a, b, c] in &mesh.triangles {
        // OBJ indices are 1-based.
        writeln!(writer, "f {} {} {}", a + 1, b + 1, c + 1)?;
    }

    Ok(MeshStats {
        vertex_count: mesh.num_vertices(),
        triangle_count: mesh.num_triangles(),
    })
}

/// Write a mesh as OBJ to a file.
pub fn export_obj_to_file<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<MeshStats> {
    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    let stats = export_obj(mesh, &mut writer)?;
    writer.flush()?;
    Ok(stats)
}

/// Parse an OBJ mesh.
pub fn parse_obj<R: Read>(reader: R) -> Result<TriangleMesh> {
    let mut vertices = Vec::new();
    let mut triangles = Vec::new();

    for (line_idx, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        let line_no = line_idx + 1;
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("v") => {
                let mut coords = [0.0f32; 3];
                for c in &mut coords {
                    *c = parts
                        .next()
                        .and_then(|t| t.parse().ok())
                        .ok_or(CadIoError::Parse {
                            line: line_no,
                            message: "vertex needs three numeric coordinates",
                        })?;
                }
                vertices.push(Point3::from(coords));
            }
            Some("f") => {
                let mut face = Vec::with_capacity(4);
                for part in parts {
                    let raw = part.split('/').next().unwrap_or(part);
                    let idx: i64 = raw.parse().map_err(|_| CadIoError::Parse {
                        line: line_no,
                        message: "invalid face index",
                    })?;
                    let resolved = if idx > 0 {
                        idx - 1
                    } else {
                        vertices.len() as i64 + idx
                    };
                    if idx == 0 || resolved < 0 || resolved >= vertices.len() as i64 {
                        return Err(CadIoError::Parse {
                            line: line_no,
                            message: "face index out of range",
                        });
                    }
                    face.push(resolved as usize);
                }
                if face.len() < 3 {
                    return Err(CadIoError::Parse {
                        line: line_no,
                        message: "face needs at least three vertices",
                    });
                }
                for i in 1..face.len() - 1 {
                    triangles.push([face[0], face[i], face[i + 1]]);
                }
            }
            _ => {}
        }
    }

    if triangles.is_empty() {
        return Err(CadIoError::EmptyMesh);
    }
    Ok(TriangleMesh::new(vertices, triangles))
}

/// Parse an OBJ file.
pub fn parse_obj_file<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
    let file = std::fs::File::open(path)?;
    parse_obj(file)
}
