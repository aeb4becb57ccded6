//! Integrate corrected angles into 2D positions.
//!
//! Within a triangle `(A, B, C)` with angles `(α, β, γ)` the law of sines
//! fixes `C` relative to `A` and `B`:
//!
//! ```text
//! C - A = (sin β / sin γ) · R(α) · (B - A)
//! ```
//!
//! where `R(α)` is a rotation by `α`. Each face contributes this residual
//! once per corner rotation, and the positions minimizing the sum of squared
//! residuals are found by solving the normal equations with local vertices
//! 0 and 1 pinned at `(0, 0)` and `(d, 0)`, `d` being the 3D length of the
//! seed edge.

use nalgebra::{DVector, Matrix2, Point2, Vector2};
use tracing::debug;

use crate::algo::CancelToken;
use crate::error::{MeshError, Result};
use crate::mesh::TriangleMesh;

use super::angles::clamp_angle;
use super::piece::{centroid, signed_area};
use super::segment::PieceLayout;
use super::sparse::{conjugate_gradient, CsrMatrix};

/// Number of pinned vertices per piece.
const NUM_SEEDS: usize = 2;

/// Solve the positions of one piece.
///
/// `angles` is the corrected angle array of the whole mesh. The returned
/// positions are indexed by local vertex, oriented so the first face has
/// negative signed area, and centered on the origin.
pub fn reconstruct(
    mesh: &TriangleMesh,
    layout: &PieceLayout,
    angles: &[f64],
    max_iter: usize,
    tolerance: f64,
    cancel: &CancelToken,
) -> Result<Vec<Point2<f64>>> {
    let n = layout.vertices.len();
    if n < 3 || layout.faces.is_empty() {
        return Err(MeshError::invariant(format!(
            "piece has {} vertices and {} faces",
            n,
            layout.faces.len()
        )));
    }

    let [s0, s1] = layout.seeds();
    let seed_length = (mesh.position(s1) - mesh.position(s0)).norm();

    let mut positions = vec![Point2::origin(); n];
    positions[1] = Point2::new(seed_length, 0.0);

    let n_free = n - NUM_SEEDS;
    let mut triplets = Vec::with_capacity(layout.faces.len() * 3 * 9 * 4);
    let mut rhs = DVector::zeros(2 * n_free);

    for face in &layout.faces {
        let base = 3 * face.face.index();
        let a = [
            clamp_angle(angles[base]),
            clamp_angle(angles[base + 1]),
            clamp_angle(angles[base + 2]),
        ];

        for k in 0..3 {
            let ratio = a[(k + 1) % 3].sin() / a[(k + 2) % 3].sin();
            let t = Matrix2::new(a[k].cos(), -a[k].sin(), a[k].sin(), a[k].cos()) * ratio;

            let corners = [
                face.vertices[k],
                face.vertices[(k + 1) % 3],
                face.vertices[(k + 2) % 3],
            ];
            let blocks = [t - Matrix2::identity(), -t, Matrix2::identity()];

            for (&p, gp) in corners.iter().zip(&blocks) {
                let Some(row) = free_index(p) else {
                    continue;
                };
                for (&q, gq) in corners.iter().zip(&blocks) {
                    let block = gp.transpose() * gq;
                    match free_index(q) {
                        Some(col) => push_block(&mut triplets, row, col, &block),
                        None => {
                            let fixed = block * positions[q].coords;
                            rhs[2 * row] -= fixed.x;
                            rhs[2 * row + 1] -= fixed.y;
                        }
                    }
                }
            }
        }
    }

    let system = CsrMatrix::from_triplets(2 * n_free, 2 * n_free, triplets);
    debug!(
        vertices = n,
        faces = layout.faces.len(),
        nnz = system.nnz(),
        "assembled position system"
    );

    let solution = conjugate_gradient(&system, &rhs, max_iter, tolerance, cancel)?;
    for i in 0..n_free {
        positions[i + NUM_SEEDS] = Point2::new(solution[2 * i], solution[2 * i + 1]);
    }

    canonicalize(&mut positions, layout);
    Ok(positions)
}

/// Unknown block of a local vertex, `None` for the seeds.
#[inline]
fn free_index(local: usize) -> Option<usize> {
    local.checked_sub(NUM_SEEDS)
}

fn push_block(triplets: &mut Vec<(usize, usize, f64)>, row: usize, col: usize, block: &Matrix2<f64>) {
    for i in 0..2 {
        for j in 0..2 {
            triplets.push((2 * row + i, 2 * col + j, block[(i, j)]));
        }
    }
}

/// Flip to clockwise orientation of the first face, then recenter.
fn canonicalize(positions: &mut [Point2<f64>], layout: &PieceLayout) {
    let first = layout.faces[0].vertices.map(|v| positions[v]);
    if signed_area(&first) > 0.0 {
        for p in positions.iter_mut() {
            p.y = -p.y;
        }
    }

    let center: Vector2<f64> = centroid(positions.iter().copied()).coords;
    for p in positions.iter_mut() {
        *p -= center;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::unfold::angles::initial_angles;
    use crate::algo::unfold::segment::segment;
    use crate::mesh::build_from_triangles;
    use nalgebra::Point3;

    fn solve(mesh: &TriangleMesh) -> Vec<Vec<Point2<f64>>> {
        // Exact angles of a developable mesh reproduce it up to a rigid motion
        let angles = initial_angles(mesh);
        segment(mesh)
            .iter()
            .map(|layout| reconstruct(mesh, layout, &angles, 1000, 1e-11, &CancelToken::new()).unwrap())
            .collect()
    }

    fn dist(a: Point2<f64>, b: Point2<f64>) -> f64 {
        (b - a).norm()
    }

    #[test]
    fn test_single_triangle_preserves_lengths() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 1.0),
            Point3::new(1.0, 2.0, 0.5),
        ];
        let mesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
        let layout = &segment(&mesh)[0];
        let p = &solve(&mesh)[0];

        for (i, j) in [(0, 1), (1, 2), (2, 0)] {
            let expected = (mesh.position(layout.vertices[j]) - mesh.position(layout.vertices[i])).norm();
            assert!((dist(p[i], p[j]) - expected).abs() < 1e-8);
        }
    }

    #[test]
    fn test_first_face_is_clockwise() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mesh = build_from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3]]).unwrap();
        let layout = &segment(&mesh)[0];
        let p = &solve(&mesh)[0];

        let first = layout.faces[0].vertices.map(|v| p[v]);
        assert!(signed_area(&first) < 0.0);

        // Consistently oriented neighbours share the winding
        let second = layout.faces[1].vertices.map(|v| p[v]);
        assert!(signed_area(&second) < 0.0);
    }

    #[test]
    fn test_piece_is_centered() {
        let mut vertices = vec![Point3::new(0.0, 0.0, 0.0)];
        for i in 0..6 {
            let t = i as f64 * std::f64::consts::PI / 3.0;
            vertices.push(Point3::new(2.0 * t.cos(), 2.0 * t.sin(), 0.0));
        }
        let faces: Vec<[usize; 3]> = (0..6).map(|i| [0, 1 + i, 1 + (i + 1) % 6]).collect();
        let mesh = build_from_triangles(&vertices, &faces).unwrap();
        let p = &solve(&mesh)[0];

        let c = centroid(p.iter().copied());
        assert!(c.coords.norm() < 1e-9);

        // Flat input: every spoke keeps its length
        let layout = &segment(&mesh)[0];
        let hub = layout.local_vertex(crate::mesh::VertexId::new(0)).unwrap();
        for (i, &q) in p.iter().enumerate() {
            if i != hub {
                assert!((dist(p[hub], q) - 2.0).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_cancelled() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
        let layout = &segment(&mesh)[0];
        let cancel = CancelToken::new();
        cancel.cancel();

        let result = reconstruct(&mesh, layout, &initial_angles(&mesh), 100, 1e-10, &cancel);
        assert!(matches!(result, Err(MeshError::Cancelled)));
    }
}
