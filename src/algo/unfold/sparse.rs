//! Sparse matrix and conjugate gradient solver.
//!
//! A compressed sparse row (CSR) matrix assembled from accumulated triplets,
//! the handful of products the unfolding systems need (`A x`, `Aᵀ x`, `A Aᵀ`),
//! and a conjugate gradient solver for symmetric positive (semi-)definite
//! systems.

use nalgebra::DVector;
use tracing::{debug, warn};

use crate::algo::CancelToken;
use crate::error::{MeshError, Result};

/// Compressed Sparse Row (CSR) matrix.
#[derive(Debug, Clone)]
pub struct CsrMatrix {
    rows: usize,
    cols: usize,
    /// `row_ptr[i]..row_ptr[i + 1]` is the span of row `i` in `col_idx`/`values`.
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<f64>,
}

impl CsrMatrix {
    /// Create a CSR matrix from triplets (row, col, value).
    ///
    /// Duplicate entries at the same (row, col) are summed.
    pub fn from_triplets(rows: usize, cols: usize, mut triplets: Vec<(usize, usize, f64)>) -> Self {
        triplets.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut row_ptr = vec![0usize; rows + 1];
        let mut col_idx: Vec<usize> = Vec::with_capacity(triplets.len());
        let mut values: Vec<f64> = Vec::with_capacity(triplets.len());
        let mut last: Option<(usize, usize)> = None;

        for (row, col, val) in triplets {
            debug_assert!(row < rows && col < cols, "triplet ({}, {}) out of bounds", row, col);
            if last == Some((row, col)) {
                if let Some(v) = values.last_mut() {
                    *v += val;
                }
                continue;
            }
            col_idx.push(col);
            values.push(val);
            row_ptr[row + 1] += 1;
            last = Some((row, col));
        }

        // Counts to offsets
        for r in 0..rows {
            row_ptr[r + 1] += row_ptr[r];
        }

        Self {
            rows,
            cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Get the number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.rows
    }

    /// Get the number of columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.cols
    }

    /// Get the number of stored entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Iterate over the stored `(col, value)` entries of row `i`.
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let span = self.row_ptr[i]..self.row_ptr[i + 1];
        self.col_idx[span.clone()]
            .iter()
            .copied()
            .zip(self.values[span].iter().copied())
    }

    /// Look up a single entry (zero when not stored).
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.row(i).find(|&(c, _)| c == j).map_or(0.0, |(_, v)| v)
    }

    /// Multiply matrix by vector: y = A * x.
    pub fn mul_vec(&self, x: &DVector<f64>) -> DVector<f64> {
        assert_eq!(x.len(), self.cols, "Vector dimension mismatch");

        DVector::from_fn(self.rows, |i, _| self.row(i).map(|(c, v)| v * x[c]).sum())
    }

    /// Multiply the transpose by a vector: y = Aᵀ * x.
    ///
    /// Each stored entry scatters `x[row] * value` into `y[col]`.
    pub fn tr_mul_vec(&self, x: &DVector<f64>) -> DVector<f64> {
        assert_eq!(x.len(), self.rows, "Vector dimension mismatch");

        let mut y = DVector::zeros(self.cols);
        for i in 0..self.rows {
            for (c, v) in self.row(i) {
                y[c] += x[i] * v;
            }
        }
        y
    }

    /// Compute the Gram matrix `A * Aᵀ` (rows × rows).
    ///
    /// Accumulated column by column: every pair of entries sharing a column
    /// contributes the product of their values.
    pub fn mul_transpose_self(&self) -> CsrMatrix {
        let mut columns: Vec<Vec<(usize, f64)>> = vec![Vec::new(); self.cols];
        for i in 0..self.rows {
            for (c, v) in self.row(i) {
                columns[c].push((i, v));
            }
        }

        let mut triplets = Vec::new();
        for entries in &columns {
            for &(r1, v1) in entries {
                for &(r2, v2) in entries {
                    triplets.push((r1, r2, v1 * v2));
                }
            }
        }

        CsrMatrix::from_triplets(self.rows, self.rows, triplets)
    }
}

/// Solve A*x = b using the Conjugate Gradient method.
///
/// Requires A to be symmetric positive definite.
///
/// # Arguments
///
/// * `a` - The system matrix (must be symmetric positive definite)
/// * `b` - The right-hand side vector
/// * `max_iter` - Maximum number of iterations
/// * `tolerance` - Convergence tolerance (relative residual norm)
/// * `cancel` - Polled once per iteration
///
/// # Returns
///
/// The solution vector x, or an error if convergence fails or the solve is
/// cancelled.
pub fn conjugate_gradient(
    a: &CsrMatrix,
    b: &DVector<f64>,
    max_iter: usize,
    tolerance: f64,
    cancel: &CancelToken,
) -> Result<DVector<f64>> {
    let n = b.len();
    assert_eq!(a.nrows(), n, "Matrix-vector dimension mismatch");
    assert_eq!(a.ncols(), n, "Matrix must be square");

    let mut x = DVector::zeros(n);

    let b_norm = b.norm();
    if b_norm < 1e-15 {
        return Ok(x);
    }

    let mut r = b.clone();
    let mut p = r.clone();
    let mut r_norm_sq = r.dot(&r);

    for iter in 0..max_iter {
        cancel.check()?;

        let ap = a.mul_vec(&p);

        let p_ap = p.dot(&ap);
        if !p_ap.is_finite() || p_ap.abs() < 1e-300 {
            // Singular direction, no further progress possible
            break;
        }
        let alpha = r_norm_sq / p_ap;

        x += alpha * &p;
        r -= alpha * &ap;

        let new_r_norm_sq = r.dot(&r);
        if new_r_norm_sq.sqrt() / b_norm < tolerance {
            debug!(iterations = iter + 1, unknowns = n, "conjugate gradient converged");
            return Ok(x);
        }

        let beta = new_r_norm_sq / r_norm_sq;
        p = &r + beta * &p;
        r_norm_sq = new_r_norm_sq;
    }

    warn!(
        max_iter,
        unknowns = n,
        residual = r_norm_sq.sqrt() / b_norm,
        "conjugate gradient did not converge"
    );
    Err(MeshError::ConvergenceFailed {
        iterations: max_iter,
    })
}
