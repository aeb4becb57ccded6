//! Initial corner angles.
//!
//! Angles are stored face-major in a flat array: the angle at corner `k` of
//! face `f` lives at index `3 * f + k`.

use std::f64::consts::{PI, TAU};

use nalgebra::Vector3;

use crate::mesh::{FaceId, TriangleMesh};

use super::topology::Topology;

/// Angles are kept this far away from `0` and `π` before any sine, tangent
/// or logarithm is taken.
pub(crate) const ANGLE_EPSILON: f64 = 1e-7;

/// Clamp an angle into `[ANGLE_EPSILON, π - ANGLE_EPSILON]`.
#[inline]
pub(crate) fn clamp_angle(angle: f64) -> f64 {
    angle.clamp(ANGLE_EPSILON, PI - ANGLE_EPSILON)
}

/// Compute the three interior angles of a face.
///
/// Each angle is measured between the edge leaving the corner and the
/// reversed edge arriving at it. The results lie in `[0, π]`; a zero-length
/// edge yields `π/2` at its endpoints rather than NaN.
pub fn face_angles(mesh: &TriangleMesh, f: FaceId) -> [f64; 3] {
    let p = mesh.face_positions(f);
    let dir = |a: usize, b: usize| -> Vector3<f64> {
        (p[b] - p[a])
            .try_normalize(0.0)
            .unwrap_or_else(Vector3::zeros)
    };

    // e[k] runs from corner k to corner k + 1
    let e = [dir(0, 1), dir(1, 2), dir(2, 0)];

    let mut angles = [0.0; 3];
    for k in 0..3 {
        let to_prev = -e[(k + 2) % 3];
        angles[k] = to_prev.dot(&e[k]).clamp(-1.0, 1.0).acos();
    }
    angles
}

/// Compute the raw angle array of the whole mesh.
pub fn initial_angles(mesh: &TriangleMesh) -> Vec<f64> {
    let mut angles = Vec::with_capacity(mesh.num_faces() * 3);
    for f in mesh.face_ids() {
        angles.extend_from_slice(&face_angles(mesh, f));
    }
    angles
}

/// Derive the target angles from the raw ones.
///
/// Around every interior vertex the incident angles are scaled so they sum
/// to exactly `2π`; vertices whose raw sum is zero are left alone. Angles at
/// boundary vertices are copied unchanged.
pub fn target_angles(raw: &[f64], topology: &Topology) -> Vec<f64> {
    let mut target = raw.to_vec();

    for incident in topology.incidence() {
        let sum: f64 = incident.iter().map(|&a| raw[a]).sum();
        if sum == 0.0 {
            continue;
        }
        let scale = TAU / sum;
        for &a in incident {
            target[a] = raw[a] * scale;
        }
    }

    target
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_from_triangles;
    use nalgebra::Point3;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_equilateral_angles() {
        let h = 3.0_f64.sqrt() / 2.0;
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, h, 0.0),
        ];
        let mesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
        for a in face_angles(&mesh, FaceId::new(0)) {
            assert!((a - PI / 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_right_triangle_angles() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ];
        let mesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
        let [a0, a1, a2] = face_angles(&mesh, FaceId::new(0));
        assert!((a0 - FRAC_PI_2).abs() < 1e-12);
        assert!((a1 - PI / 4.0).abs() < 1e-12);
        assert!((a2 - PI / 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_colinear_angles_stay_finite() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let mesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
        let angles = face_angles(&mesh, FaceId::new(0));
        assert!(angles.iter().all(|a| a.is_finite() && *a >= 0.0 && *a <= PI));
        assert!((angles[1] - PI).abs() < 1e-12);
    }

    #[test]
    fn test_coincident_corners_stay_finite() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
        ];
        let mesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
        assert!(face_angles(&mesh, FaceId::new(0)).iter().all(|a| a.is_finite()));
    }

    #[test]
    fn test_clamp_angle() {
        assert_eq!(clamp_angle(0.0), ANGLE_EPSILON);
        assert_eq!(clamp_angle(PI), PI - ANGLE_EPSILON);
        assert_eq!(clamp_angle(1.0), 1.0);
    }

    #[test]
    fn test_target_angles_sum_to_two_pi() {
        // Pyramid without base: apex is the only interior vertex
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.5),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(0.0, -1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2], [0, 2, 3], [0, 3, 4], [0, 4, 1]];
        let mesh = build_from_triangles(&vertices, &faces).unwrap();
        let topology = Topology::build(&mesh).unwrap();

        let raw = initial_angles(&mesh);
        let raw_apex: f64 = (0..4).map(|f| raw[3 * f]).sum();
        assert!(raw_apex < TAU - 0.1);

        let target = target_angles(&raw, &topology);
        let apex: f64 = (0..4).map(|f| target[3 * f]).sum();
        assert!((apex - TAU).abs() < 1e-12);

        // Boundary corners are untouched
        assert_eq!(target[1], raw[1]);
        assert_eq!(target[2], raw[2]);
    }
}
