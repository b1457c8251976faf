//! Plain-text point clouds: one `x y z` triple per line.
//!
//! Blank lines and lines starting with `#` are skipped on read. Extra columns
//! (normals, colours) after the first three are ignored.

use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

use cad_core::Point3;

use crate::error::{CadIoError, Result};

/// Write points, one per line.
pub fn write_xyz<W: Write>(points: &[Point3], writer: &mut W) -> Result<()> {
    for p in points {
        writeln!(writer, "{} {} {}", p.x, p.y, p.z)?;
    }
    Ok(())
}

/// Write points to a file.
pub fn write_xyz_file<P: AsRef<Path>>(points: &[Point3], path: P) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    write_xyz(points, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Read points.
pub fn read_xyz<R: Read>(reader: R) -> Result<Vec<Point3>> {
    let mut points = Vec::new();
    for (line_idx, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut coords = [0.0f32; 3];
        let mut fields = trimmed.split_whitespace();
        for c in &mut coords {
            *c = fields
                .next()
                .and_then(|t| t.parse().ok())
                .ok_or(CadIoError::Parse {
                    line: line_idx + 1,
                    message: "expected three coordinates",
                })?;
        }
        points.push(Point3::from(coords));
    }
    Ok(points)
}

/// Read points from a file.
pub fn read_xyz_file<P: AsRef<Path>>(path: P) -> Result<Vec<Point3>> {
    let file = std::fs::File::open(path)?;
    read_xyz(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read() {
        let points = vec![Point3::new(0.25, -1.0, 0.5), Point3::new(1e-3, 2.5, -0.125)];
        let mut buf = Vec::new();
        write_xyz(&points, &mut buf).unwrap();
        assert_eq!(read_xyz(buf.as_slice()).unwrap(), points);
    }

    #[test]
    fn test_comments_and_extra_columns() {
        let src = "# header\n\n1 2 3 0 0 1\n  4 5 6\n";
        let points = read_xyz(src.as_bytes()).unwrap();
        assert_eq!(points, vec![Point3::new(1.0, 2.0, 3.0), Point3::new(4.0, 5.0, 6.0)]);
    }

    #[test]
    fn test_short_line_is_an_error() {
        let src = "1 2 3\n4 5\n";
        assert_eq!(
            read_xyz(src.as_bytes()),
            Err(CadIoError::Parse {
                line: 2,
                message: "expected three coordinates"
            })
        );
    }
}
