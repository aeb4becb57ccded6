//! Core mesh data structures.
//!
//! This module provides the edge-based triangle mesh consumed by the
//! unfolding engine, and the polygon-mesh collaborators that feed it.
//!
//! # Overview
//!
//! The primary type is [`TriangleMesh`]. Every undirected edge is stored once
//! with its two endpoints and its one or two adjacent faces, and every vertex
//! knows its incident edges in fan order.
//!
//! # Index Types
//!
//! Mesh elements are identified by type-safe index wrappers:
//! - [`VertexId`] - Identifies a vertex
//! - [`EdgeId`] - Identifies an edge
//! - [`FaceId`] - Identifies a face
//!
//! # Construction
//!
//! ```
//! use unfolder::mesh::build_from_triangles;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2]];
//!
//! let mesh = build_from_triangles(&vertices, &faces).unwrap();
//! ```
//!
//! Polygon meshes go through [`triangulate`], which keeps back-references to
//! the original polygons.

mod builder;
mod index;
mod polygon;
mod trimesh;

pub use builder::build_from_triangles;
pub use index::{EdgeId, FaceId, VertexId};
pub use polygon::{triangulate, FacetedMesh, PolygonMesh};
pub use trimesh::{Edge, Face, TriangleMesh, Vertex};
