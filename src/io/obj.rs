//! Wavefront OBJ format support.
//!
//! Only the geometry records are read: `v x y z` positions and `f` polygon
//! records. Face tokens may carry texture and normal references
//! (`7/3/2`, `7//2`); only the position index is used. Negative indices are
//! relative to the most recent vertex, as the format allows.
//!
//! Unfolded pieces are written as flat OBJ objects with `z = 0`.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::Point3;

use crate::algo::unfold::Piece;
use crate::error::{MeshError, Result};
use crate::mesh::PolygonMesh;

/// Load a polygon mesh from an OBJ file.
///
/// # Example
///
/// ```no_run
/// use unfolder::io::obj;
///
/// let polygons = obj::load("model.obj").unwrap();
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<PolygonMesh> {
    let path = path.as_ref();
    let file = File::open(path)?;
    parse(BufReader::new(file), path)
}

/// Parse OBJ records from a reader. `path` is only used in error messages.
pub fn parse<R: BufRead>(reader: R, path: &Path) -> Result<PolygonMesh> {
    let mut vertices: Vec<Point3<f64>> = Vec::new();
    let mut faces: Vec<Vec<usize>> = Vec::new();

    let error = |line: usize, message: String| MeshError::LoadError {
        path: path.to_path_buf(),
        message: format!("line {}: {}", line, message),
    };

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = i + 1;
        let mut tokens = line.split_whitespace();

        match tokens.next() {
            Some("v") => {
                let coords: Vec<f64> = tokens
                    .take(3)
                    .map(|t| t.parse::<f64>())
                    .collect::<std::result::Result<_, _>>()
                    .map_err(|e| error(line_no, format!("bad vertex coordinate: {}", e)))?;
                if coords.len() != 3 {
                    return Err(error(line_no, "vertex needs three coordinates".to_string()));
                }
                vertices.push(Point3::new(coords[0], coords[1], coords[2]));
            }
            Some("f") => {
                let face = tokens
                    .map(|t| resolve_index(t, vertices.len()))
                    .collect::<Option<Vec<usize>>>()
                    .ok_or_else(|| error(line_no, format!("bad face record '{}'", line.trim())))?;
                if face.len() < 3 {
                    return Err(error(line_no, "face needs at least three corners".to_string()));
                }
                faces.push(face);
            }
            // Comments, normals, texture coordinates, groups, materials
            _ => {}
        }
    }

    if faces.is_empty() {
        return Err(error(0, "file contains no faces".to_string()));
    }

    Ok(PolygonMesh::new(vertices, faces))
}

/// Turn a face token into a zero-based vertex index.
fn resolve_index(token: &str, num_vertices: usize) -> Option<usize> {
    let position = token.split('/').next()?;
    let index: i64 = position.parse().ok()?;
    let resolved = match index {
        0 => return None,
        i if i > 0 => i - 1,
        i => num_vertices as i64 + i,
    };
    (0..num_vertices as i64)
        .contains(&resolved)
        .then_some(resolved as usize)
}

/// Save unfolded pieces as a flat OBJ file, one object per piece.
///
/// Pieces are written side by side along the x axis so they do not overlap.
pub fn save_pieces<P: AsRef<Path>>(pieces: &[Piece], path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write_pieces(&mut writer, pieces)?;
    writer.flush()?;
    Ok(())
}

/// Write unfolded pieces as OBJ records.
pub fn write_pieces<W: Write>(writer: &mut W, pieces: &[Piece]) -> Result<()> {
    const GAP: f64 = 0.1;

    let mut base = 1;
    let mut offset = 0.0;

    for piece in pieces {
        let Some((lo, hi)) = piece.bounds() else {
            continue;
        };
        let shift = offset - lo.x;

        writeln!(writer, "o {}", piece.name.replace(' ', "_"))?;
        for v in &piece.vertices {
            writeln!(writer, "v {} {} 0", v.position.x + shift, v.position.y)?;
        }
        for f in &piece.faces {
            let [a, b, c] = f.vertices;
            writeln!(writer, "f {} {} {}", a + base, b + base, c + base)?;
        }

        base += piece.num_vertices();
        offset += hi.x - lo.x + GAP * (hi.x - lo.x).max(hi.y - lo.y);
    }
    Ok(())
}
