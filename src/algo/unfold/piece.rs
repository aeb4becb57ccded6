//! Unfolded output entities.

use nalgebra::{Point2, Vector2};

use crate::mesh::TriangleMesh;

use super::segment::PieceLayout;

/// A vertex of an unfolded piece.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnfoldedVertex {
    /// Position in the plane.
    pub position: Point2<f64>,
    /// Original mesh vertex, `None` if it was synthesized.
    pub id: Option<usize>,
    /// Whether the vertex was held fixed while solving.
    pub pinned: bool,
}

/// An edge of an unfolded piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnfoldedEdge {
    /// Local endpoints.
    pub vertices: [usize; 2],
    /// Local face that owns the edge.
    pub face: usize,
    /// Local face on the other side, `None` on the piece boundary.
    pub twin_face: Option<usize>,
    /// Triangulation diagonal, not an edge of the original polygon mesh.
    pub hidden: bool,
    /// Index of the edge in the triangulated [`TriangleMesh`], `None` for
    /// hidden edges.
    ///
    /// Polygon meshes have no edge records, so this is not an index into the
    /// source polygon mesh. Map the endpoints through [`UnfoldedVertex::id`]
    /// to identify the polygon edge.
    pub id: Option<usize>,
}

/// A triangle of an unfolded piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnfoldedFace {
    /// Local corner vertices.
    pub vertices: [usize; 3],
    /// Local edge `k` joins corner `k` and corner `k + 1`.
    pub edges: [usize; 3],
    /// Original polygon.
    pub id: Option<usize>,
}

/// A connected, independently flattened part of the mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Piece {
    /// Display name (`"Piece #N"`).
    pub name: String,
    /// Vertices.
    pub vertices: Vec<UnfoldedVertex>,
    /// Edges.
    pub edges: Vec<UnfoldedEdge>,
    /// Faces.
    pub faces: Vec<UnfoldedFace>,
}

impl Piece {
    /// Assemble a piece from its layout and solved positions.
    ///
    /// `number` is 1-based. `positions` is indexed by local vertex.
    pub fn from_layout(
        mesh: &TriangleMesh,
        layout: &PieceLayout,
        positions: &[Point2<f64>],
        number: usize,
    ) -> Self {
        let vertices = layout
            .vertices
            .iter()
            .zip(positions)
            .enumerate()
            .map(|(i, (&v, &position))| UnfoldedVertex {
                position,
                id: mesh.original_vertex(v),
                pinned: i < 2,
            })
            .collect();

        let edges = layout
            .edges
            .iter()
            .map(|edge| {
                let hidden = mesh.is_diagonal(edge.edge);
                UnfoldedEdge {
                    vertices: edge.vertices,
                    face: edge.face,
                    twin_face: edge.twin,
                    hidden,
                    id: (!hidden).then(|| edge.edge.index()),
                }
            })
            .collect();

        let faces = layout
            .faces
            .iter()
            .map(|face| UnfoldedFace {
                vertices: face.vertices,
                edges: face.edges,
                id: Some(mesh.original_face(face.face)),
            })
            .collect();

        Self {
            name: format!("Piece #{}", number),
            vertices,
            edges,
            faces,
        }
    }

    /// Get the number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Get the number of faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Get the positions of the three corners of a face.
    pub fn face_positions(&self, f: usize) -> [Point2<f64>; 3] {
        self.faces[f].vertices.map(|v| self.vertices[v].position)
    }

    /// Signed area of a face; negative for clockwise winding.
    pub fn signed_area(&self, f: usize) -> f64 {
        signed_area(&self.face_positions(f))
    }

    /// Length of an edge in the plane.
    pub fn edge_length(&self, e: usize) -> f64 {
        let [a, b] = self.edges[e].vertices;
        (self.vertices[b].position - self.vertices[a].position).norm()
    }

    /// Centroid of the vertices (origin for an empty piece).
    pub fn centroid(&self) -> Point2<f64> {
        centroid(self.vertices.iter().map(|v| v.position))
    }

    /// Axis-aligned bounding box as `(min, max)`.
    pub fn bounds(&self) -> Option<(Point2<f64>, Point2<f64>)> {
        let mut iter = self.vertices.iter().map(|v| v.position);
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), p| {
            (
                Point2::new(lo.x.min(p.x), lo.y.min(p.y)),
                Point2::new(hi.x.max(p.x), hi.y.max(p.y)),
            )
        }))
    }

    /// Iterate over the edges that are drawn, skipping diagonals.
    pub fn visible_edges(&self) -> impl Iterator<Item = &UnfoldedEdge> + '_ {
        self.edges.iter().filter(|e| !e.hidden)
    }
}

/// Signed area of a 2D triangle.
#[inline]
pub(crate) fn signed_area(p: &[Point2<f64>; 3]) -> f64 {
    let a = p[1] - p[0];
    let b = p[2] - p[0];
    0.5 * (a.x * b.y - a.y * b.x)
}

pub(crate) fn centroid(points: impl Iterator<Item = Point2<f64>>) -> Point2<f64> {
    let (sum, count) = points.fold((Vector2::zeros(), 0usize), |(s, n), p| (s + p.coords, n + 1));
    if count == 0 {
        Point2::origin()
    } else {
        Point2::from(sum / count as f64)
    }
}
