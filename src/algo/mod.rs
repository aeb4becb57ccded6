//! Mesh unfolding algorithms.
//!
//! - **Unfolding**: angle-based flattening of a triangle mesh into 2D pieces
//! - **Status**: status lines and cooperative cancellation shared by
//!   long-running operations

pub mod status;
pub mod unfold;

pub use status::{CancelToken, StatusSink};
