//! STL (stereolithography) format support.
//!
//! STL stores a triangle soup. Loading welds corners with identical
//! coordinates into shared vertices so the unfolding engine sees the surface
//! connectivity. Both binary and ASCII files are supported.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use nalgebra::Point3;

use crate::error::{MeshError, Result};
use crate::mesh::PolygonMesh;

/// Load a polygon mesh from an STL file.
///
/// Automatically detects binary vs ASCII format. Triangles that collapse
/// after welding are dropped.
///
/// # Example
///
/// ```no_run
/// use unfolder::io::stl;
///
/// let polygons = stl::load("model.stl").unwrap();
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<PolygonMesh> {
    let path = path.as_ref();
    let mut file = File::open(path)?;
    read(&mut file, path)
}

/// Read STL data from a seekable reader. `path` is only used in error
/// messages.
pub fn read<R: Read + Seek>(reader: &mut R, path: &Path) -> Result<PolygonMesh> {
    let stl = stl_io::read_stl(reader).map_err(|e| MeshError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut vertices: Vec<Point3<f64>> = Vec::new();
    let mut faces: Vec<Vec<usize>> = Vec::new();
    let mut welded: HashMap<[u32; 3], usize> = HashMap::new();

    let mut find_or_add_vertex = |vtx: &stl_io::Vertex| -> usize {
        // Bit patterns of the f32 coordinates, with -0.0 folded onto 0.0
        let key = [0, 1, 2].map(|k| (vtx[k] + 0.0).to_bits());
        *welded.entry(key).or_insert_with(|| {
            vertices.push(Point3::new(vtx[0] as f64, vtx[1] as f64, vtx[2] as f64));
            vertices.len() - 1
        })
    };

    for tri in &stl.faces {
        let i0 = find_or_add_vertex(&stl.vertices[tri.vertices[0]]);
        let i1 = find_or_add_vertex(&stl.vertices[tri.vertices[1]]);
        let i2 = find_or_add_vertex(&stl.vertices[tri.vertices[2]]);

        // Skip degenerate triangles
        if i0 != i1 && i1 != i2 && i0 != i2 {
            faces.push(vec![i0, i1, i2]);
        }
    }

    if faces.is_empty() {
        return Err(MeshError::LoadError {
            path: path.to_path_buf(),
            message: "STL file contains no valid triangles".to_string(),
        });
    }

    Ok(PolygonMesh::new(vertices, faces))
}
