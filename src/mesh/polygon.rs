//! Polygon meshes and triangulation.
//!
//! The unfolding engine works on triangles only. Host meshes with arbitrary
//! polygons are exposed through the [`FacetedMesh`] trait and converted with
//! [`triangulate`], which records where every triangle and vertex came from so
//! that unfolded pieces can refer back to the original elements.

use nalgebra::Point3;

use super::builder::build_from_triangles;
use super::index::{FaceId, VertexId};
use super::trimesh::TriangleMesh;
use crate::error::{MeshError, Result};

/// Read-only access to a mesh made of polygonal faces.
pub trait FacetedMesh {
    /// Number of vertices.
    fn vertex_count(&self) -> usize;

    /// Position of vertex `i`.
    fn position(&self, i: usize) -> Point3<f64>;

    /// Number of faces.
    fn face_count(&self) -> usize;

    /// Number of corners of face `i`.
    fn face_vertex_count(&self, i: usize) -> usize;

    /// Vertex index of corner `j` of face `i`.
    fn face_vertex_index(&self, i: usize, j: usize) -> usize;
}

/// A plain polygon mesh: positions plus faces given as vertex index loops.
#[derive(Debug, Clone, Default)]
pub struct PolygonMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3<f64>>,
    /// Faces as vertex index loops (at least three corners each).
    pub faces: Vec<Vec<usize>>,
}

impl PolygonMesh {
    /// Create a polygon mesh from positions and faces.
    pub fn new(vertices: Vec<Point3<f64>>, faces: Vec<Vec<usize>>) -> Self {
        Self { vertices, faces }
    }
}

impl FacetedMesh for PolygonMesh {
    fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    fn position(&self, i: usize) -> Point3<f64> {
        self.vertices[i]
    }

    fn face_count(&self) -> usize {
        self.faces.len()
    }

    fn face_vertex_count(&self, i: usize) -> usize {
        self.faces[i].len()
    }

    fn face_vertex_index(&self, i: usize, j: usize) -> usize {
        self.faces[i][j]
    }
}

impl FacetedMesh for TriangleMesh {
    fn vertex_count(&self) -> usize {
        self.num_vertices()
    }

    fn position(&self, i: usize) -> Point3<f64> {
        *TriangleMesh::position(self, VertexId::new(i))
    }

    fn face_count(&self) -> usize {
        self.num_faces()
    }

    fn face_vertex_count(&self, _i: usize) -> usize {
        3
    }

    fn face_vertex_index(&self, i: usize, j: usize) -> usize {
        self.face(FaceId::new(i)).vertices[j].index()
    }
}

/// Fan-triangulate a polygon mesh.
///
/// Each polygon `[v0, v1, ..., vn]` becomes triangles `[v0, vi, vi+1]`. The
/// returned mesh carries a face table mapping every triangle to its source
/// polygon, and a vertex table mapping every vertex to itself (fan
/// triangulation does not synthesize vertices). Edges between two triangles
/// of the same polygon are reported as diagonals.
///
/// # Example
/// ```
/// use unfolder::mesh::{triangulate, PolygonMesh};
/// use nalgebra::Point3;
///
/// let quad = PolygonMesh::new(
///     vec![
///         Point3::new(0.0, 0.0, 0.0),
///         Point3::new(1.0, 0.0, 0.0),
///         Point3::new(1.0, 1.0, 0.0),
///         Point3::new(0.0, 1.0, 0.0),
///     ],
///     vec![vec![0, 1, 2, 3]],
/// );
/// let mesh = triangulate(&quad).unwrap();
/// assert_eq!(mesh.num_faces(), 2);
/// ```
pub fn triangulate<M: FacetedMesh>(mesh: &M) -> Result<TriangleMesh> {
    let vertices: Vec<Point3<f64>> = (0..mesh.vertex_count()).map(|i| mesh.position(i)).collect();

    let mut triangles = Vec::new();
    let mut face_table = Vec::new();

    for fi in 0..mesh.face_count() {
        let n = mesh.face_vertex_count(fi);
        if n < 3 {
            return Err(MeshError::DegenerateFace { face: fi });
        }
        let v0 = mesh.face_vertex_index(fi, 0);
        for j in 1..n - 1 {
            triangles.push([
                v0,
                mesh.face_vertex_index(fi, j),
                mesh.face_vertex_index(fi, j + 1),
            ]);
            face_table.push(fi);
        }
    }

    let vertex_table = (0..vertices.len()).map(Some).collect();
    let tri_mesh = build_from_triangles(&vertices, &triangles)?;
    Ok(tri_mesh.with_tables(Some(vertex_table), Some(face_table)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_strip() -> PolygonMesh {
        PolygonMesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(2.0, 1.0, 0.0),
            ],
            vec![vec![0, 1, 4, 3], vec![1, 2, 5, 4]],
        )
    }

    #[test]
    fn test_triangulate_quads() {
        let mesh = triangulate(&quad_strip()).unwrap();
        assert_eq!(mesh.num_faces(), 4);
        assert_eq!(mesh.original_face(FaceId::new(0)), 0);
        assert_eq!(mesh.original_face(FaceId::new(1)), 0);
        assert_eq!(mesh.original_face(FaceId::new(2)), 1);
        assert_eq!(mesh.original_face(FaceId::new(3)), 1);
        assert_eq!(mesh.original_vertex(VertexId::new(4)), Some(4));
    }

    #[test]
    fn test_triangulate_marks_diagonals() {
        let mesh = triangulate(&quad_strip()).unwrap();
        let diagonals = mesh.edge_ids().filter(|&e| mesh.is_diagonal(e)).count();
        assert_eq!(diagonals, 2);
        // 7 polygon edges + 2 diagonals
        assert_eq!(mesh.num_edges(), 9);
    }

    #[test]
    fn test_triangulate_rejects_short_faces() {
        let mesh = PolygonMesh::new(
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)],
            vec![vec![0, 1]],
        );
        assert!(matches!(
            triangulate(&mesh),
            Err(MeshError::DegenerateFace { face: 0 })
        ));
    }

    #[test]
    fn test_triangle_mesh_is_faceted() {
        let mesh = triangulate(&quad_strip()).unwrap();
        assert_eq!(FacetedMesh::face_count(&mesh), 4);
        assert_eq!(mesh.face_vertex_count(2), 3);
        assert_eq!(mesh.face_vertex_index(0, 0), 0);
        assert_eq!(FacetedMesh::position(&mesh, 5), Point3::new(2.0, 1.0, 0.0));
    }
}
