//! Angle-correction system.
//!
//! The unknowns are relative corrections `e`, one per corner angle, with the
//! corrected angle being `(1 + e) * β` for target angle `β`. Minimizing `Σ e²`
//! subject to the linearized validity constraints `M e = c` gives the
//! minimum-norm solution `e = Mᵀ λ` where `(M Mᵀ) λ = c`.
//!
//! # Constraint rows
//!
//! | Row            | Meaning                                  |
//! |----------------|------------------------------------------|
//! | `f`            | angles of face `f` sum to `π`            |
//! | `F + 2i`       | angles around interior vertex `i` sum to `2π` |
//! | `F + 2i + 1`   | sum of log-sines around vertex `i` vanishes |
//!
//! The log-sine row encodes the law of sines around a vertex wheel: for
//! every face around `v`, the angle at the corner following `v` contributes
//! `+log sin`, the angle at the corner preceding `v` contributes `-log sin`.

use std::f64::consts::{PI, TAU};

use nalgebra::DVector;
use tracing::debug;

use crate::algo::CancelToken;
use crate::error::Result;
use crate::mesh::TriangleMesh;

use super::angles::clamp_angle;
use super::sparse::{conjugate_gradient, CsrMatrix};
use super::topology::Topology;

/// The assembled constraint system.
#[derive(Debug, Clone)]
pub struct AngleSystem {
    /// Constraint matrix `M`, one row per constraint, one column per angle.
    pub matrix: CsrMatrix,
    /// Constraint right-hand side `c`.
    pub rhs: DVector<f64>,
    /// Clamped target angles `β`.
    pub target: Vec<f64>,
}

impl AngleSystem {
    /// Assemble the constraints for `mesh` around the given target angles.
    pub fn assemble(mesh: &TriangleMesh, topology: &Topology, target: &[f64]) -> Self {
        let n_faces = mesh.num_faces();
        let n_rows = n_faces + 2 * topology.num_interior();
        let beta: Vec<f64> = target.iter().map(|&a| clamp_angle(a)).collect();

        let mut triplets = Vec::with_capacity(n_faces * 3 * 4);
        let mut rhs = DVector::zeros(n_rows);

        for i in 0..topology.num_interior() {
            rhs[n_faces + 2 * i] = TAU;
        }

        for f in mesh.face_ids() {
            let face = mesh.face(f);
            let row = f.index();
            rhs[row] = PI;

            // Rotate the primary corner through all three positions
            for k in 0..3 {
                let primary = 3 * row + k;
                let second = 3 * row + (k + 1) % 3;
                let third = 3 * row + (k + 2) % 3;

                triplets.push((row, primary, beta[primary]));
                rhs[row] -= beta[primary];

                let Some(iv) = topology.interior_index(face.vertices[k]) else {
                    continue;
                };

                let sum_row = n_faces + 2 * iv;
                triplets.push((sum_row, primary, beta[primary]));
                rhs[sum_row] -= beta[primary];

                let log_row = sum_row + 1;
                triplets.push((log_row, second, beta[second] / beta[second].tan()));
                triplets.push((log_row, third, -beta[third] / beta[third].tan()));
                rhs[log_row] -= beta[second].sin().ln() - beta[third].sin().ln();
            }
        }

        let matrix = CsrMatrix::from_triplets(n_rows, 3 * n_faces, triplets);
        debug!(
            rows = n_rows,
            cols = 3 * n_faces,
            nnz = matrix.nnz(),
            "assembled angle constraints"
        );

        Self {
            matrix,
            rhs,
            target: beta,
        }
    }

    /// Number of constraint rows.
    #[inline]
    pub fn num_constraints(&self) -> usize {
        self.matrix.nrows()
    }

    /// Solve for the corrected angles.
    ///
    /// The normal equations `(M Mᵀ) λ = c` are solved with conjugate
    /// gradient; the relative corrections `e = Mᵀ λ` are then applied to the
    /// target angles.
    pub fn solve(&self, max_iter: usize, tolerance: f64, cancel: &CancelToken) -> Result<Vec<f64>> {
        let normal = self.matrix.mul_transpose_self();
        let lambda = conjugate_gradient(&normal, &self.rhs, max_iter, tolerance, cancel)?;
        let correction = self.matrix.tr_mul_vec(&lambda);

        Ok(self
            .target
            .iter()
            .zip(correction.iter())
            .map(|(&beta, &e)| (e + 1.0) * beta)
            .collect())
    }

    /// Residual `c - M e` of the constraint rows for a candidate angle array,
    /// i.e. how far `angles` is from satisfying the linear constraints.
    pub fn linear_residual(&self, angles: &[f64]) -> DVector<f64> {
        let e = DVector::from_iterator(
            angles.len(),
            angles
                .iter()
                .zip(self.target.iter())
                .map(|(&a, &beta)| a / beta - 1.0),
        );
        &self.rhs - self.matrix.mul_vec(&e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::unfold::angles::{initial_angles, target_angles};
    use crate::mesh::{build_from_triangles, VertexId};
    use nalgebra::Point3;

    fn create_raised_disk(height: f64) -> TriangleMesh {
        let mut vertices = vec![Point3::new(0.0, 0.0, height)];
        for i in 0..6 {
            let t = i as f64 * PI / 3.0;
            vertices.push(Point3::new(t.cos(), t.sin(), 0.0));
        }
        let faces: Vec<[usize; 3]> = (0..6).map(|i| [0, 1 + i, 1 + (i + 1) % 6]).collect();
        build_from_triangles(&vertices, &faces).unwrap()
    }

    fn system_for(mesh: &TriangleMesh) -> (AngleSystem, Topology) {
        let topology = Topology::build(mesh).unwrap();
        let raw = initial_angles(mesh);
        let target = target_angles(&raw, &topology);
        (AngleSystem::assemble(mesh, &topology, &target), topology)
    }

    #[test]
    fn test_system_dimensions() {
        let mesh = create_raised_disk(0.5);
        let (system, _) = system_for(&mesh);

        assert_eq!(system.num_constraints(), 6 + 2);
        assert_eq!(system.matrix.ncols(), 18);
        // 3 per face triangle rows, 6 sum entries, 12 log-sine entries
        assert_eq!(system.matrix.nnz(), 18 + 6 + 12);
    }

    #[test]
    fn test_flat_disk_needs_no_correction() {
        // Planar mesh: raw angles are already valid
        let mesh = create_raised_disk(0.0);
        let (system, _) = system_for(&mesh);
        assert!(system.rhs.norm() < 1e-9);
    }

    #[test]
    fn test_log_sine_signs() {
        let mesh = create_raised_disk(0.5);
        let (system, topology) = system_for(&mesh);
        let center = topology.interior_index(VertexId::new(0)).unwrap();
        let log_row = 6 + 2 * center + 1;

        // Face 0 = [0, 1, 2]; center is corner 0, so corner 1 is "second"
        // and corner 2 is "third".
        let beta1 = system.target[1];
        let beta2 = system.target[2];
        assert!((system.matrix.get(log_row, 1) - beta1 / beta1.tan()).abs() < 1e-12);
        assert!((system.matrix.get(log_row, 2) + beta2 / beta2.tan()).abs() < 1e-12);
        assert_eq!(system.matrix.get(log_row, 0), 0.0);
    }

    #[test]
    fn test_corrected_angles_satisfy_sums() {
        let mesh = create_raised_disk(0.5);
        let (system, _) = system_for(&mesh);
        let angles = system.solve(1000, 1e-10, &CancelToken::new()).unwrap();

        for f in 0..6 {
            let sum: f64 = angles[3 * f..3 * f + 3].iter().sum();
            assert!((sum - PI).abs() < 1e-6, "face {} sums to {}", f, sum);
        }

        let center: f64 = (0..6).map(|f| angles[3 * f]).sum();
        assert!((center - TAU).abs() < 1e-6);
        assert!(system.linear_residual(&angles).norm() < 1e-6);
    }

    #[test]
    fn test_symmetric_disk_stays_symmetric() {
        let mesh = create_raised_disk(0.5);
        let (system, _) = system_for(&mesh);
        let angles = system.solve(1000, 1e-10, &CancelToken::new()).unwrap();

        // Regular hexagonal fan flattens to six equilateral triangles
        for &a in &angles {
            assert!((a - PI / 3.0).abs() < 1e-6);
        }
    }
}
