//! STL import and export.
//!
//! Reading goes through `stl_io`, which accepts both the binary and the ASCII
//! flavour. Binary files are read record by record up to the announced triangle
//! count, so bytes trailing the last record are ignored. Loaded soups are welded
//! into an indexed [`TriangleMesh`].

use std::io::{Cursor, Write};
use std::path::Path;

use cad_core::{Point3, Triangle};

use crate::error::{CadIoError, Result};
use crate::mesh::{TriangleMesh, DEFAULT_WELD_TOLERANCE};

/// Parse STL bytes (binary or ASCII) into a welded mesh.
pub fn parse_stl(bytes: &[u8]) -> Result<TriangleMesh> {
    let soup = parse_stl_soup(bytes)?;
    if soup.is_empty() {
        return Err(CadIoError::EmptyMesh);
    }
    Ok(TriangleMesh::from_triangles(&soup, DEFAULT_WELD_TOLERANCE))
}

/// Parse an STL file into a welded mesh.
pub fn parse_stl_file<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
    let bytes = std::fs::read(path.as_ref())?;
    let mesh = parse_stl(&bytes)?;
    log::info!(
        "Loaded {:?}: {} vertices, {} triangles",
        path.as_ref(),
        mesh.num_vertices(),
        mesh.num_triangles()
    );
    Ok(mesh)
}

/// Parse STL bytes into an unwelded triangle soup.
pub fn parse_stl_soup(bytes: &[u8]) -> Result<Vec<Triangle>> {
    let mut cursor = Cursor::new(bytes);
    let reader = stl_io::create_stl_reader(&mut cursor).map_err(malformed)?;

    let mut triangles = Vec::new();
    for tri in reader {
        let tri = tri.map_err(malformed)?;
        let corner = |k: usize| {
            let v = tri.vertices[k];
            Point3::new(v[0], v[1], v[2])
        };
        triangles.push(Triangle::new(corner(0), corner(1), corner(2)));
    }
    Ok(triangles)
}

// In-memory reads cannot fail on I/O, only on content.
fn malformed(err: std::io::Error) -> CadIoError {
    CadIoError::MalformedStl(err.to_string())
}

fn to_stl_triangle(tri: &Triangle) -> stl_io::Triangle {
    let vertex = |p: Point3| stl_io::Vertex::new(p.as_array());
    stl_io::Triangle {
        normal: stl_io::Normal::new(tri.normal().as_array()),
        vertices: [vertex(tri.a()), vertex(tri.b()), vertex(tri.c())],
    }
}

/// Write a mesh as binary STL.
pub fn write_stl_binary<W: Write>(mesh: &TriangleMesh, writer: &mut W) -> Result<()> {
    let triangles: Vec<stl_io::Triangle> = mesh
        .iter_triangles()
        .map(|t| to_stl_triangle(&t))
        .collect();
    stl_io::write_stl(writer, triangles.iter())?;
    Ok(())
}

/// Write a mesh as ASCII STL.
///
/// `stl_io` only writes the binary flavour; the text form is emitted directly.
pub fn write_stl_ascii<W: Write>(mesh: &TriangleMesh, writer: &mut W, name: &str) -> Result<()> {
    writeln!(writer, "solid {}", name)?;
    for tri in mesh.iter_triangles() {
        let n = tri.normal();
        writeln!(writer, "  facet normal {:e} {:e} {:e}", n.x, n.y, n.z)?;
        writeln!(writer, "    outer loop")?;
        for p in tri.0 {
            writeln!(writer, "      vertex {:e} {:e} {:e}", p.x, p.y, p.z)?;
        }
        writeln!(writer, "    endloop")?;
        writeln!(writer, "  endfacet")?;
    }
    writeln!(writer, "endsolid {}", name)?;
    Ok(())
}

/// Write a mesh as binary STL to a file.
pub fn write_stl_file<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()> {
    let file = std::fs::File::create(path.as_ref())?;
    let mut writer = std::io::BufWriter::new(file);
    write_stl_binary(mesh, &mut writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::box_mesh;

    const ASCII_TRIANGLE: &str = "solid tri
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 0 1 0
    endloop
  endfacet
endsolid tri
";

    fn unit_box_bytes() -> Vec<u8> {
        let mesh = box_mesh(Point3::splat(0.0), Point3::splat(1.0));
        let mut bytes = Vec::new();
        write_stl_binary(&mesh, &mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_parse_ascii_single_facet() {
        let mesh = parse_stl(ASCII_TRIANGLE.as_bytes()).unwrap();
        assert_eq!(mesh.num_triangles(), 1);
        assert_eq!(mesh.vertices[1], Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_parse_ascii_bad_vertex() {
        let text = ASCII_TRIANGLE.replace("vertex 1 0 0", "vertex 1 zero 0");
        assert!(matches!(
            parse_stl(text.as_bytes()),
            Err(CadIoError::MalformedStl(_))
        ));
    }

    #[test]
    fn test_parse_ascii_short_facet() {
        let text = ASCII_TRIANGLE.replace("      vertex 0 1 0\n", "");
        assert!(matches!(
            parse_stl(text.as_bytes()),
            Err(CadIoError::MalformedStl(_))
        ));
    }

    #[test]
    fn test_binary_roundtrip_in_memory() {
        let mesh = box_mesh(Point3::splat(-1.0), Point3::splat(1.0));
        let mut bytes = Vec::new();
        write_stl_binary(&mesh, &mut bytes).unwrap();
        assert_eq!(bytes.len(), 84 + 12 * 50);

        let loaded = parse_stl(&bytes).unwrap();
        assert_eq!(loaded.num_triangles(), 12);
        assert_eq!(loaded.num_vertices(), 8);
        assert!((loaded.volume() - 8.0).abs() < 1e-4);
    }

    #[test]
    fn test_binary_with_trailing_bytes() {
        let mut bytes = unit_box_bytes();
        bytes.push(0x7f);
        let loaded = parse_stl(&bytes).unwrap();
        assert_eq!(loaded.num_triangles(), 12);
        assert!((loaded.volume() - 1.0).abs() < 1e-5);

        bytes.extend_from_slice(&[0u8; 37]);
        assert_eq!(parse_stl(&bytes).unwrap().num_triangles(), 12);
    }

    #[test]
    fn test_truncated_binary() {
        let mut bytes = unit_box_bytes();
        bytes.truncate(300);
        assert!(matches!(parse_stl(&bytes), Err(CadIoError::MalformedStl(_))));
    }

    #[test]
    fn test_garbage_and_empty() {
        assert!(matches!(parse_stl(b"garbage"), Err(CadIoError::MalformedStl(_))));

        let mut empty = vec![0u8; 80];
        empty.extend_from_slice(&0u32.to_le_bytes());
        assert_eq!(parse_stl(&empty), Err(CadIoError::EmptyMesh));
    }

    #[test]
    fn test_ascii_writer_parses_back() {
        let mesh = box_mesh(Point3::splat(0.0), Point3::new(1.0, 2.0, 3.0));
        let mut text = Vec::new();
        write_stl_ascii(&mesh, &mut text, "box").unwrap();
        let loaded = parse_stl(&text).unwrap();
        assert_eq!(loaded.num_triangles(), 12);
        assert!((loaded.volume() - 6.0).abs() < 1e-4);
    }
}
