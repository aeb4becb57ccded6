//! Edge-based triangle mesh.
//!
//! [`TriangleMesh`] stores every undirected edge once, together with its two
//! endpoints and the (one or two) faces it borders. Faces store their three
//! corners and three edges, and every vertex keeps the list of its incident
//! edges ordered around its fan.
//!
//! # Boundaries and seams
//!
//! An edge with a single adjacent face (`f2 == None`) lies on the mesh
//! boundary or on a cut seam. Traversals that walk across edges stop there,
//! which is what separates the mesh into independently flattened pieces.
//!
//! # Back-references
//!
//! A mesh produced by triangulating a polygon mesh carries a vertex table and
//! a face table mapping its elements back to the original mesh. Meshes built
//! directly from triangles map every element to itself.

use nalgebra::Point3;

use super::index::{EdgeId, FaceId, VertexId};

/// A vertex of the triangle mesh.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// The 3D position of this vertex.
    pub position: Point3<f64>,

    /// Incident edges in fan order. For a vertex on the boundary the first
    /// edge is a boundary edge.
    pub(crate) edges: Vec<EdgeId>,
}

impl Vertex {
    /// Create a new vertex at the given position.
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            edges: Vec::new(),
        }
    }
}

/// An undirected edge with its adjacent faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// First endpoint.
    pub v1: VertexId,
    /// Second endpoint.
    pub v2: VertexId,
    /// The face that created this edge.
    pub f1: FaceId,
    /// The face across the edge, absent on boundaries and seams.
    pub f2: Option<FaceId>,
}

impl Edge {
    /// Check if this edge has only one adjacent face.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        self.f2.is_none()
    }

    /// Check if `v` is one of the endpoints.
    #[inline]
    pub fn has_vertex(&self, v: VertexId) -> bool {
        self.v1 == v || self.v2 == v
    }

    /// Iterate over the adjacent faces (one or two).
    pub fn faces(&self) -> impl Iterator<Item = FaceId> {
        std::iter::once(self.f1).chain(self.f2)
    }
}

/// A triangular face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    /// Corner vertices in winding order.
    pub vertices: [VertexId; 3],
    /// Edge `k` joins corner `k` and corner `k + 1`.
    pub edges: [EdgeId; 3],
}

impl Face {
    /// Index (0..3) of the corner located at `v`, if any.
    #[inline]
    pub fn corner_of(&self, v: VertexId) -> Option<usize> {
        self.vertices.iter().position(|&c| c == v)
    }
}

/// A triangle mesh with explicit edge records.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    pub(crate) vertices: Vec<Vertex>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) faces: Vec<Face>,

    /// Triangulated vertex to original vertex (`None` for synthesized vertices).
    pub(crate) vertex_table: Option<Vec<Option<usize>>>,

    /// Triangulated face to original polygon.
    pub(crate) face_table: Option<Vec<usize>>,
}

impl TriangleMesh {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Accessors ====================

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

    /// Get a vertex by ID.
    #[inline]
    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.index()]
    }

    /// Get an edge by ID.
    #[inline]
    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.index()]
    }

    /// Get a face by ID.
    #[inline]
    pub fn face(&self, id: FaceId) -> &Face {
        &self.faces[id.index()]
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId) -> &Point3<f64> {
        &self.vertex(v).position
    }

    /// Incident edges of a vertex, in fan order.
    #[inline]
    pub fn vertex_edges(&self, v: VertexId) -> &[EdgeId] {
        &self.vertex(v).edges
    }

    /// Original vertex index of a (possibly synthesized) vertex.
    pub fn original_vertex(&self, v: VertexId) -> Option<usize> {
        match &self.vertex_table {
            Some(table) => table.get(v.index()).copied().flatten(),
            None => Some(v.index()),
        }
    }

    /// Original polygon index of a triangle.
    pub fn original_face(&self, f: FaceId) -> usize {
        match &self.face_table {
            Some(table) => table.get(f.index()).copied().unwrap_or(f.index()),
            None => f.index(),
        }
    }

    /// Attach triangulation back-reference tables.
    ///
    /// Tables of the wrong length are ignored and elements map to themselves.
    pub fn with_tables(
        mut self,
        vertex_table: Option<Vec<Option<usize>>>,
        face_table: Option<Vec<usize>>,
    ) -> Self {
        self.vertex_table = vertex_table.filter(|t| t.len() == self.vertices.len());
        self.face_table = face_table.filter(|t| t.len() == self.faces.len());
        self
    }

    // ==================== Topology Queries ====================

    /// Check if an edge lies on the boundary (or on a seam).
    #[inline]
    pub fn is_boundary_edge(&self, e: EdgeId) -> bool {
        self.edge(e).is_boundary()
    }

    /// Check if every incident edge of `v` has two faces.
    ///
    /// Isolated vertices are not interior.
    pub fn is_interior_vertex(&self, v: VertexId) -> bool {
        let edges = self.vertex_edges(v);
        !edges.is_empty() && edges.iter().all(|&e| !self.is_boundary_edge(e))
    }

    /// Check if an edge only exists because a polygon was triangulated.
    ///
    /// That is the case when both adjacent triangles come from the same
    /// original polygon.
    pub fn is_diagonal(&self, e: EdgeId) -> bool {
        let edge = self.edge(e);
        match (&self.face_table, edge.f2) {
            (Some(_), Some(f2)) => self.original_face(edge.f1) == self.original_face(f2),
            _ => false,
        }
    }

    // ==================== Iteration ====================

    /// Iterate over all vertex IDs.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        (0..self.vertices.len()).map(VertexId::new)
    }

    /// Iterate over all edge IDs.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        (0..self.edges.len()).map(EdgeId::new)
    }

    /// Iterate over all face IDs.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> + '_ {
        (0..self.faces.len()).map(FaceId::new)
    }

    // ==================== Geometry ====================

    /// Get the positions of the three corners of a face.
    pub fn face_positions(&self, f: FaceId) -> [Point3<f64>; 3] {
        let [v0, v1, v2] = self.face(f).vertices;
        [*self.position(v0), *self.position(v1), *self.position(v2)]
    }

    /// Compute the area of a face.
    pub fn face_area(&self, f: FaceId) -> f64 {
        let [p0, p1, p2] = self.face_positions(f);
        0.5 * (p1 - p0).cross(&(p2 - p0)).norm()
    }

    /// Compute the length of an edge.
    pub fn edge_length(&self, e: EdgeId) -> f64 {
        let edge = self.edge(e);
        (self.position(edge.v2) - self.position(edge.v1)).norm()
    }

    /// Check whether a face is (nearly) degenerate.
    ///
    /// A face is degenerate when its area is below
    /// `tolerance * longest_edge²`, which covers both zero-length edges and
    /// colinear corners.
    pub fn is_degenerate_face(&self, f: FaceId, tolerance: f64) -> bool {
        let [p0, p1, p2] = self.face_positions(f);
        let longest = (p1 - p0)
            .norm_squared()
            .max((p2 - p1).norm_squared())
            .max((p0 - p2).norm_squared());
        let area = 0.5 * (p1 - p0).cross(&(p2 - p0)).norm();
        longest == 0.0 || area <= tolerance * longest
    }

    /// Compute the total surface area of the mesh.
    pub fn surface_area(&self) -> f64 {
        self.face_ids().map(|f| self.face_area(f)).sum()
    }

    /// Count boundary (or seam) edges.
    pub fn num_boundary_edges(&self) -> usize {
        self.edges.iter().filter(|e| e.is_boundary()).count()
    }

    // ==================== Validation ====================

    /// Check if the mesh is valid (all connectivity is consistent).
    pub fn is_valid(&self) -> bool {
        for (fi, face) in self.faces.iter().enumerate() {
            for k in 0..3 {
                let edge = self.edge(face.edges[k]);
                let (a, b) = (face.vertices[k], face.vertices[(k + 1) % 3]);
                if !(edge.has_vertex(a) && edge.has_vertex(b)) {
                    return false;
                }
                if !edge.faces().any(|f| f.index() == fi) {
                    return false;
                }
            }
        }

        for (vi, vertex) in self.vertices.iter().enumerate() {
            let v = VertexId::new(vi);
            if vertex.edges.iter().any(|&e| !self.edge(e).has_vertex(v)) {
                return false;
            }
        }

        true
    }
}
