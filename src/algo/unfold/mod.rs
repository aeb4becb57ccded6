//! Angle-based flattening (ABF++) of triangle meshes.
//!
//! Unfolding runs in two stages:
//!
//! 1. **Angles**: the corner angles of the 3D surface are rescaled so every
//!    interior vertex sums to `2π`, then corrected by a constrained least
//!    squares solve so that triangles sum to `π`, vertices sum to `2π` and
//!    the law of sines closes around every vertex wheel.
//! 2. **Positions**: the mesh is split into connected pieces, and each piece
//!    is laid out in the plane by integrating the corrected angles.
//!
//! Seams are expressed in the input mesh itself: an edge with a single
//! adjacent face is never crossed, so cutting a surface into disks is done
//! by duplicating the vertices along the cut.
//!
//! # Example
//!
//! ```
//! use unfolder::prelude::*;
//! use unfolder::algo::unfold::{unfold, UnfoldOptions};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.2),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2], [0, 2, 3]];
//! let mesh = build_from_triangles(&vertices, &faces).unwrap();
//!
//! let pieces = unfold(&mesh, &UnfoldOptions::default()).unwrap();
//! assert_eq!(pieces.len(), 1);
//! assert_eq!(pieces[0].name, "Piece #1");
//! ```
//!
//! # References
//!
//! - Sheffer, A., Lévy, B., Mogilnitsky, M., & Bogomyakov, A. (2005).
//!   "ABF++: Fast and robust angle based flattening." ACM Transactions on
//!   Graphics.

mod angles;
mod constraints;
mod piece;
mod reconstruct;
mod segment;
mod sparse;
mod topology;

pub use angles::{face_angles, initial_angles, target_angles};
pub use constraints::AngleSystem;
pub use piece::{Piece, UnfoldedEdge, UnfoldedFace, UnfoldedVertex};
pub use reconstruct::reconstruct;
pub use segment::{segment, LocalEdge, LocalFace, PieceLayout};
pub use sparse::{conjugate_gradient, CsrMatrix};
pub use topology::Topology;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::{MeshError, Result};
use crate::mesh::TriangleMesh;

use super::{CancelToken, StatusSink};

/// Options for unfolding.
#[derive(Debug, Clone)]
pub struct UnfoldOptions {
    /// Maximum iterations for each conjugate gradient solve (default: 100000).
    ///
    /// The solver is unpreconditioned, so the count it needs grows with the
    /// mesh.
    pub max_iterations: usize,

    /// Relative residual at which a conjugate gradient solve has converged.
    pub tolerance: f64,

    /// Faces with area below `degenerate_tolerance * longest_edge²` are
    /// rejected.
    pub degenerate_tolerance: f64,

    /// Whether to lay out pieces in parallel (default: true).
    pub parallel: bool,

    /// Receives human-readable status lines.
    pub status: StatusSink,

    /// Polled between pieces and inside every solver iteration.
    pub cancel: CancelToken,
}

impl Default for UnfoldOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100_000,
            tolerance: 1e-10,
            degenerate_tolerance: 1e-12,
            parallel: true,
            status: StatusSink::none(),
            cancel: CancelToken::new(),
        }
    }
}

impl UnfoldOptions {
    /// Set the maximum CG iterations.
    pub fn with_max_iterations(mut self, max_iter: usize) -> Self {
        self.max_iterations = max_iter;
        self
    }

    /// Set the convergence tolerance.
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Set the degenerate face tolerance.
    pub fn with_degenerate_tolerance(mut self, tol: f64) -> Self {
        self.degenerate_tolerance = tol;
        self
    }

    /// Enable or disable parallel piece layout.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set the status sink.
    pub fn with_status(mut self, status: StatusSink) -> Self {
        self.status = status;
        self
    }

    /// Set the cancellation token.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(MeshError::invalid_param(
                "max_iterations",
                self.max_iterations,
                "must be positive",
            ));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(MeshError::invalid_param(
                "tolerance",
                self.tolerance,
                "must be positive and finite",
            ));
        }
        if !(self.degenerate_tolerance.is_finite() && self.degenerate_tolerance >= 0.0) {
            return Err(MeshError::invalid_param(
                "degenerate_tolerance",
                self.degenerate_tolerance,
                "must be non-negative and finite",
            ));
        }
        Ok(())
    }
}

/// Unfold a triangle mesh into flat pieces.
///
/// # Arguments
///
/// * `mesh` - The input mesh; seams are edges with a single face
/// * `options` - Solver settings, status sink and cancellation token
///
/// # Returns
///
/// One [`Piece`] per connected component, in segmentation order.
///
/// # Errors
///
/// Returns an error if:
/// - The mesh is empty or has a degenerate face
/// - The mesh connectivity is inconsistent
/// - A solve does not converge (e.g. for closed surfaces)
/// - The operation is cancelled
///
/// Use [`UnfoldStatus::from_result`](crate::error::UnfoldStatus::from_result)
/// to classify the outcome.
pub fn unfold(mesh: &TriangleMesh, options: &UnfoldOptions) -> Result<Vec<Piece>> {
    options.status.line("Unfolding mesh...");
    info!(
        vertices = mesh.num_vertices(),
        faces = mesh.num_faces(),
        "unfolding mesh"
    );

    let result = unfold_pieces(mesh, options);
    match &result {
        Ok(pieces) => info!(pieces = pieces.len(), "unfolding finished"),
        Err(MeshError::ConvergenceFailed { .. }) => {
            options.status.line("Failure: unfolding did not converge");
        }
        Err(e) => info!(error = %e, "unfolding aborted"),
    }
    result
}

/// Compute the corrected angle array of `mesh` (`3 * face + corner`).
pub fn corrected_angles(mesh: &TriangleMesh, options: &UnfoldOptions) -> Result<Vec<f64>> {
    let topology = Topology::build(mesh)?;
    let raw = initial_angles(mesh);
    let target = target_angles(&raw, &topology);

    let system = AngleSystem::assemble(mesh, &topology, &target);
    debug!(
        interior = topology.num_interior(),
        constraints = system.num_constraints(),
        "solving angle system"
    );
    system.solve(options.max_iterations, options.tolerance, &options.cancel)
}

fn unfold_pieces(mesh: &TriangleMesh, options: &UnfoldOptions) -> Result<Vec<Piece>> {
    options.validate()?;
    if mesh.num_faces() == 0 {
        return Err(MeshError::EmptyMesh);
    }
    if let Some(f) = mesh
        .face_ids()
        .find(|&f| mesh.is_degenerate_face(f, options.degenerate_tolerance))
    {
        return Err(MeshError::DegenerateFace { face: f.index() });
    }
    options.cancel.check()?;

    let angles = corrected_angles(mesh, options)?;
    let layouts = segment(mesh);
    debug!(pieces = layouts.len(), "segmented mesh");

    let build = |(i, layout): (usize, &PieceLayout)| -> Result<Piece> {
        options.cancel.check()?;
        let number = i + 1;
        options.status.line(&format!("Building piece #{}...", number));
        let positions = reconstruct(
            mesh,
            layout,
            &angles,
            options.max_iterations,
            options.tolerance,
            &options.cancel,
        )?;
        Ok(Piece::from_layout(mesh, layout, &positions, number))
    };

    if options.parallel {
        layouts.par_iter().enumerate().map(build).collect()
    } else {
        layouts.iter().enumerate().map(build).collect()
    }
}
