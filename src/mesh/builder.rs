//! Mesh construction utilities.
//!
//! This module builds [`TriangleMesh`] values from face-vertex lists as
//! commonly found in mesh file formats. Edges are welded by their (unordered)
//! vertex pair, so a seam is expressed by giving the two sides of the cut
//! distinct vertex indices.

use std::collections::HashMap;

use nalgebra::Point3;

use super::index::{EdgeId, FaceId, VertexId};
use super::trimesh::{Edge, Face, TriangleMesh, Vertex};
use crate::error::{MeshError, Result};

/// Build a triangle mesh from vertices and triangle faces.
///
/// # Arguments
/// * `vertices` - List of vertex positions
/// * `faces` - List of triangle faces, each as [v0, v1, v2] indices
///
/// # Returns
/// A triangle mesh, or an error if the input is invalid.
///
/// # Example
/// ```
/// use unfolder::mesh::build_from_triangles;
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let faces = vec![[0, 1, 2]];
///
/// let mesh = build_from_triangles(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_vertices(), 3);
/// assert_eq!(mesh.num_edges(), 3);
/// assert_eq!(mesh.num_faces(), 1);
/// ```
pub fn build_from_triangles(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> Result<TriangleMesh> {
    if faces.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    // Validate vertex indices
    for (fi, face) in faces.iter().enumerate() {
        for &vi in face {
            if vi >= vertices.len() {
                return Err(MeshError::InvalidVertexIndex { face: fi, vertex: vi });
            }
        }
        if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
            return Err(MeshError::DegenerateFace { face: fi });
        }
    }

    let mut mesh = TriangleMesh {
        vertices: vertices.iter().map(|&p| Vertex::new(p)).collect(),
        edges: Vec::with_capacity(faces.len() * 3 / 2 + 2),
        faces: Vec::with_capacity(faces.len()),
        vertex_table: None,
        face_table: None,
    };

    // Undirected vertex pair to edge
    let mut edge_map: HashMap<(usize, usize), EdgeId> = HashMap::new();

    for (fi, face) in faces.iter().enumerate() {
        let face_id = FaceId::new(fi);
        let mut edge_ids = [EdgeId::new(0); 3];

        for k in 0..3 {
            let a = face[k];
            let b = face[(k + 1) % 3];
            let key = if a < b { (a, b) } else { (b, a) };

            edge_ids[k] = match edge_map.get(&key) {
                Some(&e) => {
                    let edge = &mut mesh.edges[e.index()];
                    if edge.f2.is_some() {
                        return Err(MeshError::NonManifoldEdge { v0: key.0, v1: key.1 });
                    }
                    edge.f2 = Some(face_id);
                    e
                }
                None => {
                    let e = EdgeId::new(mesh.edges.len());
                    mesh.edges.push(Edge {
                        v1: VertexId::new(a),
                        v2: VertexId::new(b),
                        f1: face_id,
                        f2: None,
                    });
                    mesh.vertices[a].edges.push(e);
                    mesh.vertices[b].edges.push(e);
                    edge_map.insert(key, e);
                    e
                }
            };
        }

        mesh.faces.push(Face {
            vertices: [VertexId::new(face[0]), VertexId::new(face[1]), VertexId::new(face[2])],
            edges: edge_ids,
        });
    }

    order_vertex_fans(&mut mesh);
    debug_assert!(mesh.is_valid(), "inconsistent connectivity after build");

    Ok(mesh)
}

/// Reorder each vertex's edge list so that it follows the fan around the
/// vertex, starting from a boundary edge when there is one.
fn order_vertex_fans(mesh: &mut TriangleMesh) {
    for vi in 0..mesh.vertices.len() {
        let ordered = fan_order(mesh, VertexId::new(vi));
        mesh.vertices[vi].edges = ordered;
    }
}

/// Walk the fan(s) around `v`. Vertices sitting on a seam may have several
/// fans; each one is walked from one of its boundary edges.
fn fan_order(mesh: &TriangleMesh, v: VertexId) -> Vec<EdgeId> {
    let edges = mesh.vertex_edges(v);
    let mut used = vec![false; edges.len()];
    let mut ordered = Vec::with_capacity(edges.len());

    loop {
        let start = (0..edges.len())
            .find(|&i| !used[i] && mesh.is_boundary_edge(edges[i]))
            .or_else(|| (0..edges.len()).find(|&i| !used[i]));
        let Some(mut current) = start else {
            break;
        };

        let mut came_from: Option<FaceId> = None;
        loop {
            used[current] = true;
            ordered.push(edges[current]);

            let edge = mesh.edge(edges[current]);
            let Some(face) = edge.faces().find(|&f| Some(f) != came_from) else {
                break;
            };
            let next_edge = mesh
                .face(face)
                .edges
                .iter()
                .copied()
                .find(|&fe| fe != edges[current] && mesh.edge(fe).has_vertex(v));
            let Some(next_idx) = next_edge.and_then(|ne| edges.iter().position(|&x| x == ne))
            else {
                break;
            };
            if used[next_idx] {
                break;
            }
            current = next_idx;
            came_from = Some(face);
        }
    }

    ordered
}
