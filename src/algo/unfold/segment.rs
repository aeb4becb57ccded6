//! Split a triangle mesh into connected pieces.
//!
//! Pieces are grown by a depth-first walk over edges: popping an edge
//! visits the faces on both of its sides. Boundary and seam edges have only
//! one face, so the walk never crosses them.

use std::collections::HashMap;

use tracing::debug;

use crate::mesh::{EdgeId, FaceId, TriangleMesh, VertexId};

/// Walk state of a face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FaceState {
    /// Not reached yet; may seed a new piece.
    Unprocessed,
    /// Reached through exactly one edge on the stack.
    Queued,
    /// Added to a piece.
    Finalized,
}

/// A face of a piece, in piece-local indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalFace {
    /// The mesh face.
    pub face: FaceId,
    /// Local vertex of each corner.
    pub vertices: [usize; 3],
    /// Local edge `k` joins corner `k` and corner `k + 1`.
    pub edges: [usize; 3],
}

/// An edge of a piece, in piece-local indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalEdge {
    /// The mesh edge.
    pub edge: EdgeId,
    /// Local endpoints.
    pub vertices: [usize; 2],
    /// Local face that first added the edge.
    pub face: usize,
    /// Local face on the other side, if any.
    pub twin: Option<usize>,
}

/// The connectivity of one piece.
///
/// Local vertices 0 and 1 are the seed edge and local face 0 is the seed
/// face.
#[derive(Debug, Clone, Default)]
pub struct PieceLayout {
    /// Local vertex to mesh vertex.
    pub vertices: Vec<VertexId>,
    /// Local edges in discovery order.
    pub edges: Vec<LocalEdge>,
    /// Local faces in discovery order.
    pub faces: Vec<LocalFace>,
    vertex_lookup: HashMap<VertexId, usize>,
    edge_lookup: HashMap<EdgeId, usize>,
}

impl PieceLayout {
    /// Local index of a mesh vertex, if it belongs to the piece.
    pub fn local_vertex(&self, v: VertexId) -> Option<usize> {
        self.vertex_lookup.get(&v).copied()
    }

    /// Local index of a mesh edge, if it belongs to the piece.
    pub fn local_edge(&self, e: EdgeId) -> Option<usize> {
        self.edge_lookup.get(&e).copied()
    }

    /// The two seed vertices.
    pub fn seeds(&self) -> [VertexId; 2] {
        [self.vertices[0], self.vertices[1]]
    }

    fn add_vertex(&mut self, v: VertexId) -> usize {
        *self.vertex_lookup.entry(v).or_insert_with(|| {
            self.vertices.push(v);
            self.vertices.len() - 1
        })
    }

    fn add_face(&mut self, mesh: &TriangleMesh, f: FaceId) {
        let face = mesh.face(f);
        let local_face = self.faces.len();

        let vertices = face.vertices.map(|v| self.add_vertex(v));

        let mut edges = [0; 3];
        for (k, &e) in face.edges.iter().enumerate() {
            edges[k] = match self.edge_lookup.get(&e) {
                Some(&local) => {
                    self.edges[local].twin = Some(local_face);
                    local
                }
                None => {
                    let edge = mesh.edge(e);
                    let endpoints = [self.add_vertex(edge.v1), self.add_vertex(edge.v2)];
                    let local = self.edges.len();
                    self.edges.push(LocalEdge {
                        edge: e,
                        vertices: endpoints,
                        face: local_face,
                        twin: None,
                    });
                    self.edge_lookup.insert(e, local);
                    local
                }
            };
        }

        self.faces.push(LocalFace {
            face: f,
            vertices,
            edges,
        });
    }
}

/// Partition the faces of `mesh` into connected pieces.
///
/// Each outer step seeds a piece with the highest-index face that has not
/// been reached yet. The seed face's first two corners become local vertices
/// 0 and 1 and its third corner local vertex 2. Every face ends up in
/// exactly one piece.
pub fn segment(mesh: &TriangleMesh) -> Vec<PieceLayout> {
    let mut state = vec![FaceState::Unprocessed; mesh.num_faces()];
    let mut pieces = Vec::new();
    let mut stack: Vec<EdgeId> = Vec::new();

    for seed in (0..mesh.num_faces()).rev() {
        if state[seed] != FaceState::Unprocessed {
            continue;
        }

        let mut layout = PieceLayout::default();
        finalize(mesh, FaceId::new(seed), None, &mut layout, &mut state, &mut stack);

        while let Some(e) = stack.pop() {
            for f in mesh.edge(e).faces() {
                if state[f.index()] == FaceState::Queued {
                    finalize(mesh, f, Some(e), &mut layout, &mut state, &mut stack);
                }
            }
        }

        debug!(
            piece = pieces.len() + 1,
            faces = layout.faces.len(),
            vertices = layout.vertices.len(),
            "segmented piece"
        );
        pieces.push(layout);
    }

    pieces
}

/// Add `f` to the piece and push each of its other edges that reaches a
/// face not queued yet. A queued face is finalized through the edge that
/// queued it.
fn finalize(
    mesh: &TriangleMesh,
    f: FaceId,
    via: Option<EdgeId>,
    layout: &mut PieceLayout,
    state: &mut [FaceState],
    stack: &mut Vec<EdgeId>,
) {
    layout.add_face(mesh, f);
    state[f.index()] = FaceState::Finalized;

    for &e in &mesh.face(f).edges {
        if Some(e) == via {
            continue;
        }
        let mut reaches_new = false;
        for g in mesh.edge(e).faces() {
            if state[g.index()] == FaceState::Unprocessed {
                state[g.index()] = FaceState::Queued;
                reaches_new = true;
            }
        }
        if reaches_new {
            stack.push(e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_from_triangles;
    use nalgebra::Point3;

    fn create_disk() -> TriangleMesh {
        let mut vertices = vec![Point3::new(0.0, 0.0, 0.0)];
        for i in 0..6 {
            let t = i as f64 * std::f64::consts::PI / 3.0;
            vertices.push(Point3::new(t.cos(), t.sin(), 0.0));
        }
        let faces: Vec<[usize; 3]> = (0..6).map(|i| [0, 1 + i, 1 + (i + 1) % 6]).collect();
        build_from_triangles(&vertices, &faces).unwrap()
    }

    /// 2x2 quad grid whose middle column of vertices is duplicated, so the
    /// left and right halves share no edge.
    fn create_cut_grid() -> TriangleMesh {
        let mut vertices = Vec::new();
        // Left half: columns x = 0 and x = 1
        for y in 0..3 {
            vertices.push(Point3::new(0.0, y as f64, 0.0));
            vertices.push(Point3::new(1.0, y as f64, 0.0));
        }
        // Right half: columns x = 1 (duplicated) and x = 2
        for y in 0..3 {
            vertices.push(Point3::new(1.0, y as f64, 0.0));
            vertices.push(Point3::new(2.0, y as f64, 0.0));
        }

        let mut faces = Vec::new();
        for half in 0..2 {
            let base = 6 * half;
            for y in 0..2 {
                let v00 = base + 2 * y;
                let v10 = v00 + 1;
                let v01 = v00 + 2;
                let v11 = v00 + 3;
                faces.push([v00, v10, v11]);
                faces.push([v00, v11, v01]);
            }
        }
        build_from_triangles(&vertices, &faces).unwrap()
    }

    fn create_quad_grid(n: usize) -> TriangleMesh {
        let mut vertices = Vec::new();
        for j in 0..=n {
            for i in 0..=n {
                vertices.push(Point3::new(i as f64, j as f64, 0.0));
            }
        }
        let mut faces = Vec::new();
        for j in 0..n {
            for i in 0..n {
                let v00 = j * (n + 1) + i;
                let v10 = v00 + 1;
                let v01 = v00 + n + 1;
                let v11 = v01 + 1;
                faces.push([v00, v10, v11]);
                faces.push([v00, v11, v01]);
            }
        }
        build_from_triangles(&vertices, &faces).unwrap()
    }

    #[test]
    fn test_disk_is_one_piece() {
        let mesh = create_disk();
        let pieces = segment(&mesh);

        assert_eq!(pieces.len(), 1);
        let piece = &pieces[0];
        assert_eq!(piece.faces.len(), 6);
        assert_eq!(piece.vertices.len(), 7);
        assert_eq!(piece.edges.len(), 12);

        // Interior edges see both faces
        let shared = piece.edges.iter().filter(|e| e.twin.is_some()).count();
        assert_eq!(shared, 6);
    }

    #[test]
    fn test_seed_is_highest_face() {
        let mesh = create_disk();
        let piece = &segment(&mesh)[0];

        let seed = mesh.face(FaceId::new(5));
        assert_eq!(piece.faces[0].face, FaceId::new(5));
        assert_eq!(piece.seeds(), [seed.vertices[0], seed.vertices[1]]);
        assert_eq!(piece.vertices[2], seed.vertices[2]);
        assert_eq!(piece.faces[0].vertices, [0, 1, 2]);
    }

    #[test]
    fn test_cut_grid_splits_in_two() {
        let mesh = create_cut_grid();
        let pieces = segment(&mesh);

        assert_eq!(pieces.len(), 2);
        for piece in &pieces {
            assert_eq!(piece.faces.len(), 4);
            assert_eq!(piece.vertices.len(), 6);
        }
        // Seeded from the last face, which lies in the right half
        assert_eq!(pieces[0].faces[0].face, FaceId::new(7));
    }

    #[test]
    fn test_faces_partitioned() {
        let mesh = create_cut_grid();
        let mut seen = vec![0usize; mesh.num_faces()];
        for piece in segment(&mesh) {
            for face in &piece.faces {
                seen[face.face.index()] += 1;
            }
        }
        assert!(seen.iter().all(|&n| n == 1));
    }

    #[test]
    fn test_local_tables_consistent() {
        let mesh = create_disk();
        let piece = &segment(&mesh)[0];

        for face in &piece.faces {
            let mesh_face = mesh.face(face.face);
            for k in 0..3 {
                assert_eq!(piece.vertices[face.vertices[k]], mesh_face.vertices[k]);
                assert_eq!(piece.local_edge(mesh_face.edges[k]), Some(face.edges[k]));

                let edge = &piece.edges[face.edges[k]];
                let a = face.vertices[k];
                let b = face.vertices[(k + 1) % 3];
                assert!(edge.vertices.contains(&a) && edge.vertices.contains(&b));
            }
        }
        assert_eq!(piece.local_vertex(mesh.face(FaceId::new(5)).vertices[0]), Some(0));
    }

    #[test]
    fn test_face_finalized_through_queueing_edge() {
        // The seed queues face 6. Face 3 shares an edge with it but does not
        // push that edge, so face 6 comes off the stack last.
        let mesh = create_quad_grid(2);
        let piece = &segment(&mesh)[0];

        let order: Vec<usize> = piece.faces.iter().map(|f| f.face.index()).collect();
        assert_eq!(order, vec![7, 4, 5, 1, 0, 3, 2, 6]);
    }

    #[test]
    fn test_empty_mesh_has_no_pieces() {
        assert!(segment(&TriangleMesh::new()).is_empty());
    }
}
