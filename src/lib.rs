//! # Unfolder
//!
//! Angle-based flattening of 3D triangle meshes into 2D pieces.
//!
//! Unfolder takes a triangulated surface, optionally cut along seams so every
//! connected part is a disk, and lays each part out in the plane so that its
//! triangle angles stay as close as possible to the 3D angles. The result is
//! suitable for texture mapping or for printing papercraft patterns.
//!
//! ## Features
//!
//! - **Edge-based triangle mesh**: explicit edge records with one or two faces, fan-ordered vertices
//! - **Polygon input**: fan triangulation with back-references to the original polygons
//! - **ABF++ solver**: constrained angle correction and per-piece position reconstruction
//! - **File formats**: OBJ and STL input, a binary record format for unfolded pieces
//!
//! ## Quick Start
//!
//! ```no_run
//! use unfolder::prelude::*;
//!
//! // Load and triangulate a polygon mesh
//! let polygons = unfolder::io::load_polygons("model.obj").unwrap();
//! let mesh = triangulate(&polygons).unwrap();
//!
//! // Unfold it
//! let pieces = unfold(&mesh, &UnfoldOptions::default()).unwrap();
//! for piece in &pieces {
//!     println!("{}: {} faces", piece.name, piece.num_faces());
//! }
//!
//! // Save the pieces
//! unfolder::io::pieces::save(&pieces, "model.pieces").unwrap();
//! ```
//!
//! ## Building Meshes Programmatically
//!
//! ```
//! use unfolder::prelude::*;
//! use nalgebra::Point3;
//!
//! // A square folded along its diagonal
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.5),
//! ];
//! let faces = vec![[0, 1, 2], [0, 2, 3]];
//!
//! let mesh = build_from_triangles(&vertices, &faces).unwrap();
//! assert_eq!(mesh.num_edges(), 5);
//!
//! let result = unfold(&mesh, &UnfoldOptions::default());
//! assert!(UnfoldStatus::from_result(&result).is_success());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod io;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use unfolder::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::unfold::{unfold, Piece, UnfoldOptions};
    pub use crate::algo::{CancelToken, StatusSink};
    pub use crate::error::{MeshError, Result, UnfoldStatus};
    pub use crate::mesh::{
        build_from_triangles, triangulate, EdgeId, FaceId, FacetedMesh, PolygonMesh,
        TriangleMesh, VertexId,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;
