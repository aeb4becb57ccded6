//! Error types for unfolder.
//!
//! This module defines all error types used throughout the library, and the
//! coarse [`UnfoldStatus`] classification reported to callers of the unfold
//! operation.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur during mesh construction and unfolding.
#[derive(Error, Debug)]
pub enum MeshError {
    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A face is degenerate: duplicate corners, or (near) zero area.
    #[error("face {face} is degenerate")]
    DegenerateFace {
        /// The face index.
        face: usize,
    },

    /// An edge has more than two incident faces.
    #[error("edge ({v0}, {v1}) has more than two incident faces")]
    NonManifoldEdge {
        /// First vertex of the edge.
        v0: usize,
        /// Second vertex of the edge.
        v1: usize,
    },

    /// The mesh connectivity contradicts itself (e.g. a face adjacent to a
    /// vertex does not contain that vertex).
    #[error("mesh invariant violated: {details}")]
    InvariantViolation {
        /// Description of the violated invariant.
        details: String,
    },

    /// The conjugate gradient solver failed to converge.
    #[error("solver failed to converge after {iterations} iterations")]
    ConvergenceFailed {
        /// Number of iterations attempted.
        iterations: usize,
    },

    /// The operation was cancelled through its [`CancelToken`](crate::algo::CancelToken).
    #[error("operation cancelled")]
    Cancelled,

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading data from file.
    #[error("failed to load {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl MeshError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        MeshError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Create an invariant violation error.
    pub fn invariant(details: impl Into<String>) -> Self {
        MeshError::InvariantViolation {
            details: details.into(),
        }
    }

    /// Classify this error into the status reported for a failed unfold.
    pub fn status(&self) -> UnfoldStatus {
        match self {
            MeshError::ConvergenceFailed { .. } => UnfoldStatus::SolverDidNotConverge,
            MeshError::Cancelled => UnfoldStatus::Cancelled,
            _ => UnfoldStatus::InvalidTopology,
        }
    }
}

/// Outcome of an unfold operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnfoldStatus {
    /// Every solve converged and pieces were produced.
    Converged,
    /// A conjugate gradient solve exhausted its iteration budget.
    SolverDidNotConverge,
    /// The input mesh was rejected or its connectivity is inconsistent.
    InvalidTopology,
    /// The caller cancelled the operation.
    Cancelled,
}

impl UnfoldStatus {
    /// Derive the status of a finished operation.
    pub fn from_result<T>(result: &Result<T>) -> Self {
        match result {
            Ok(_) => UnfoldStatus::Converged,
            Err(e) => e.status(),
        }
    }

    /// Whether the operation produced usable output.
    #[inline]
    pub fn is_success(self) -> bool {
        self == UnfoldStatus::Converged
    }
}
