//! Interior-vertex and angle-incidence tables.

use tracing::error;

use crate::error::{MeshError, Result};
use crate::mesh::{FaceId, TriangleMesh, VertexId};

/// Interior vertices of a mesh and the angles incident to each of them.
///
/// Built once per unfold; immutable afterwards.
#[derive(Debug, Clone)]
pub struct Topology {
    /// Mesh vertex to dense interior index.
    interior: Vec<Option<usize>>,
    /// Per interior vertex, angle indices (`3 * face + corner`) in fan order.
    incidence: Vec<Vec<usize>>,
}

impl Topology {
    /// Build the tables for `mesh`.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::InvariantViolation`] if a face found around a
    /// vertex does not have that vertex as one of its corners.
    pub fn build(mesh: &TriangleMesh) -> Result<Self> {
        let mut interior = vec![None; mesh.num_vertices()];
        let mut vertices = Vec::new();

        for v in mesh.vertex_ids() {
            if mesh.is_interior_vertex(v) {
                interior[v.index()] = Some(vertices.len());
                vertices.push(v);
            }
        }

        let incidence = vertices
            .iter()
            .map(|&v| incident_angles(mesh, v))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            interior,
            incidence,
        })
    }

    /// Number of interior vertices.
    #[inline]
    pub fn num_interior(&self) -> usize {
        self.incidence.len()
    }

    /// Dense interior index of a mesh vertex, `None` on the boundary.
    #[inline]
    pub fn interior_index(&self, v: VertexId) -> Option<usize> {
        self.interior[v.index()]
    }

    /// Angle indices around every interior vertex.
    #[inline]
    pub fn incidence(&self) -> &[Vec<usize>] {
        &self.incidence
    }
}

/// Collect the angle indices touching `v` by walking its edges in fan order
/// and visiting each adjacent face once.
fn incident_angles(mesh: &TriangleMesh, v: VertexId) -> Result<Vec<usize>> {
    let mut seen: Vec<FaceId> = Vec::new();
    let mut angles = Vec::new();

    for &e in mesh.vertex_edges(v) {
        for f in mesh.edge(e).faces() {
            if seen.contains(&f) {
                continue;
            }
            seen.push(f);

            match mesh.face(f).corner_of(v) {
                Some(corner) => angles.push(3 * f.index() + corner),
                None => {
                    error!(?v, ?f, ?e, "face adjacent to vertex does not contain it");
                    return Err(MeshError::invariant(format!(
                        "face {} does not contain vertex {}",
                        f.index(),
                        v.index()
                    )));
                }
            }
        }
    }

    Ok(angles)
}
