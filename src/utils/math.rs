//! Additional math helpers layered on top of `glam`.

use glam::{Mat3, Quat, Vec3};

use crate::config::QUAT_DRIFT_TOLERANCE;

/// Solves `m · x = rhs` with Cramer's rule. Returns `None` for a singular matrix.
pub fn solve_cramer(m: Mat3, rhs: Vec3) -> Option<Vec3> {
    let det = m.determinant();
    if det.abs() < f32::EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;
    let x = Mat3::from_cols(rhs, m.y_axis, m.z_axis).determinant() * inv_det;
    let y = Mat3::from_cols(m.x_axis, rhs, m.z_axis).determinant() * inv_det;
    let z = Mat3::from_cols(m.x_axis, m.y_axis, rhs).determinant() * inv_det;
    Some(Vec3::new(x, y, z))
}

/// Inverse of `m`, or `None` when it is singular.
pub fn try_inverse(m: Mat3) -> Option<Mat3> {
    if m.determinant().abs() < f32::EPSILON {
        None
    } else {
        Some(m.inverse())
    }
}

/// Renormalizes `q` only when `|q|²` has drifted away from one.
pub fn renormalize_if_drifted(q: Quat) -> Quat {
    if (q.length_squared() - 1.0).abs() > QUAT_DRIFT_TOLERANCE {
        q.normalize()
    } else {
        q
    }
}

/// Rotates a body-frame inertia inverse into world space.
pub fn world_inverse_inertia(orientation: Quat, local_inverse: Mat3) -> Mat3 {
    let rotation = Mat3::from_quat(orientation);
    rotation * local_inverse * rotation.transpose()
}

/// Unit direction of `v`, or `None` when `v` is too short to define one.
pub fn try_direction(v: Vec3) -> Option<Vec3> {
    let len_sq = v.length_squared();
    if len_sq < 1e-12 {
        None
    } else {
        Some(v / len_sq.sqrt())
    }
}

/// Closest point to `p` on segment `ab` with the segment parameter `t` in `[0, 1]`.
pub fn closest_on_segment(a: Vec3, b: Vec3, p: Vec3) -> (Vec3, f32) {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < f32::EPSILON {
        return (a, 0.0);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (a + ab * t, t)
}

/// Closest point to `p` on triangle `abc` and its barycentric weights.
pub fn closest_on_triangle(a: Vec3, b: Vec3, c: Vec3, p: Vec3) -> (Vec3, [f32; 3]) {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;

    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return (a, [1.0, 0.0, 0.0]);
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return (b, [0.0, 1.0, 0.0]);
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return (a + ab * v, [1.0 - v, v, 0.0]);
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return (c, [0.0, 0.0, 1.0]);
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return (a + ac * w, [1.0 - w, 0.0, w]);
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return (b + (c - b) * w, [0.0, 1.0 - w, w]);
    }

    let denom = va + vb + vc;
    if denom.abs() < f32::EPSILON {
        // Collinear triangle: fall back to the best edge.
        let candidates = [
            closest_on_segment(a, b, p),
            closest_on_segment(a, c, p),
            closest_on_segment(b, c, p),
        ];
        let weights = [
            [1.0 - candidates[0].1, candidates[0].1, 0.0],
            [1.0 - candidates[1].1, 0.0, candidates[1].1],
            [0.0, 1.0 - candidates[2].1, candidates[2].1],
        ];
        let mut best = 0;
        for i in 1..3 {
            if (candidates[i].0 - p).length_squared() < (candidates[best].0 - p).length_squared() {
                best = i;
            }
        }
        return (candidates[best].0, weights[best]);
    }
    let v = vb / denom;
    let w = vc / denom;
    (a + ab * v + ac * w, [1.0 - v - w, v, w])
}

/// Distance from `p` to a point, segment, or triangle given by up to three vertices.
pub fn distance_to_feature(feature: &[Vec3], p: Vec3) -> f32 {
    match feature {
        [] => f32::INFINITY,
        [a] => (p - *a).length(),
        [a, b] => (closest_on_segment(*a, *b, p).0 - p).length(),
        [a, b, c, ..] => (closest_on_triangle(*a, *b, *c, p).0 - p).length(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cramer_matches_matrix_inverse() {
        let m = Mat3::from_cols(
            Vec3::new(2.0, 0.0, 1.0),
            Vec3::new(1.0, 3.0, 0.0),
            Vec3::new(0.0, 1.0, 4.0),
        );
        let rhs = Vec3::new(1.0, 2.0, 3.0);
        let x = solve_cramer(m, rhs).expect("matrix is invertible");
        let expected = m.inverse() * rhs;
        assert_relative_eq!(x.x, expected.x, epsilon = 1e-5);
        assert_relative_eq!(x.y, expected.y, epsilon = 1e-5);
        assert_relative_eq!(x.z, expected.z, epsilon = 1e-5);
    }

    #[test]
    fn cramer_rejects_singular_matrix() {
        let m = Mat3::from_cols(Vec3::X, Vec3::X, Vec3::Z);
        assert!(solve_cramer(m, Vec3::ONE).is_none());
        assert!(try_inverse(m).is_none());
    }

    #[test]
    fn drifted_quaternion_is_renormalized() {
        let q = Quat::from_xyzw(0.0, 0.0, 0.0, 1.1);
        assert_relative_eq!(renormalize_if_drifted(q).length(), 1.0, epsilon = 1e-6);

        let unit = Quat::from_rotation_y(0.3);
        assert_eq!(renormalize_if_drifted(unit), unit);
    }

    #[test]
    fn triangle_interior_projection_has_matching_weights() {
        let (a, b, c) = (Vec3::ZERO, Vec3::X * 2.0, Vec3::Z * 2.0);
        let p = Vec3::new(0.5, 3.0, 0.5);
        let (closest, w) = closest_on_triangle(a, b, c, p);
        assert_relative_eq!(closest.x, 0.5, epsilon = 1e-6);
        assert_relative_eq!(closest.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(closest.z, 0.5, epsilon = 1e-6);
        let rebuilt = a * w[0] + b * w[1] + c * w[2];
        assert_relative_eq!(rebuilt.x, closest.x, epsilon = 1e-6);
        assert_relative_eq!(rebuilt.z, closest.z, epsilon = 1e-6);
    }

    #[test]
    fn feature_distance_covers_vertex_edge_and_face() {
        let p = Vec3::new(0.0, 1.0, 0.0);
        assert_relative_eq!(distance_to_feature(&[Vec3::ZERO], p), 1.0);
        assert_relative_eq!(distance_to_feature(&[-Vec3::X, Vec3::X], p), 1.0);
        let triangle = [
            Vec3::new(-1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, -1.0),
            Vec3::new(0.0, 0.0, 1.0),
        ];
        assert_relative_eq!(distance_to_feature(&triangle, p), 1.0, epsilon = 1e-6);
    }
}
