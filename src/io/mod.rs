//! Mesh and piece file I/O.
//!
//! # Supported Formats
//!
//! | Format | Extension | Load | Save | Notes |
//! |--------|-----------|------|------|-------|
//! | Wavefront OBJ | `.obj` | ✓ | ✓ | Polygons in, flattened pieces out |
//! | STL | `.stl` | ✓ | ✗ | Binary and ASCII, vertices welded |
//! | Pieces | `.pieces` | ✓ | ✓ | Versioned binary records |
//!
//! # Usage
//!
//! ```no_run
//! use unfolder::io::load_polygons;
//! use unfolder::mesh::triangulate;
//!
//! let polygons = load_polygons("model.obj").unwrap();
//! let mesh = triangulate(&polygons).unwrap();
//! ```

pub mod obj;
pub mod pieces;
pub mod stl;

use std::path::Path;

use crate::error::{MeshError, Result};
use crate::mesh::PolygonMesh;

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Wavefront OBJ format.
    Obj,
    /// STL (stereolithography) format.
    Stl,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "obj" => Some(Format::Obj),
            "stl" => Some(Format::Stl),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }
}

/// Load a polygon mesh from a file with automatic format detection.
///
/// The format is determined by the file extension.
pub fn load_polygons<P: AsRef<Path>>(path: P) -> Result<PolygonMesh> {
    let path = path.as_ref();
    let format = Format::from_path(path).ok_or_else(|| MeshError::UnsupportedFormat {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)")
            .to_string(),
    })?;

    match format {
        Format::Obj => obj::load(path),
        Format::Stl => stl::load(path),
    }
}
