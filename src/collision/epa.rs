//! Expanding Polytope Algorithm: penetration vector of two overlapping shapes.

use glam::Vec3;

use super::{
    gjk,
    simplex::{Simplex, SupportPoint},
};
use crate::{
    config::{EPA_MAX_ITERATIONS, EPA_TOLERANCE},
    core::collider::Collider,
};

/// Penetration vector of `first` into `second`: subtracting it from
/// `first`'s position separates the shapes.
///
/// `seed` may carry the tetrahedron GJK finished with; anything else makes
/// EPA run GJK again. Returns `None` when the shapes do not overlap, the
/// polytope degenerates, or the iteration cap is reached.
pub fn penetration(first: &Collider, second: &Collider, seed: Option<Simplex>) -> Option<Vec3> {
    penetration_within(first, second, seed, EPA_MAX_ITERATIONS)
}

fn penetration_within(
    first: &Collider,
    second: &Collider,
    seed: Option<Simplex>,
    max_iterations: usize,
) -> Option<Vec3> {
    let mut polytope = match seed {
        Some(simplex) if simplex.is_tetrahedron() => simplex,
        _ => gjk::intersect(first, second)?,
    };

    if !polytope.build_faces() {
        return None;
    }

    for _ in 0..max_iterations {
        let closest = polytope.closest_face()?;
        let support = SupportPoint::of(first, second, closest.normal);
        let advance = support.point.dot(closest.normal) - closest.distance;

        if advance < EPA_TOLERANCE || polytope.contains_point(support.point, EPA_TOLERANCE) {
            return Some(closest.normal * closest.distance.max(0.0));
        }

        polytope.expand(support);
    }

    log::trace!("EPA reached its iteration cap without converging");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::collider::ConvexSet;
    use approx::assert_abs_diff_eq;
    use glam::Quat;

    fn cube(half: f32, position: Vec3) -> Collider {
        let mut collider = Collider::ConvexSet(ConvexSet::cuboid(Vec3::splat(half)));
        collider.offset(position, Quat::IDENTITY);
        collider
    }

    #[test]
    fn shallow_overlap_resolves_along_shortest_axis() {
        let a = cube(0.5, Vec3::ZERO);
        let b = cube(0.5, Vec3::new(0.8, 0.0, 0.0));
        let pen = a.penetration(&b).expect("cubes overlap");
        assert_abs_diff_eq!(pen.x, 0.2, epsilon = 1e-3);
        assert_abs_diff_eq!(pen.y, 0.0, epsilon = 1e-3);
        assert_abs_diff_eq!(pen.z, 0.0, epsilon = 1e-3);
    }

    #[test]
    fn penetration_points_from_first_toward_second() {
        let a = cube(0.5, Vec3::new(0.0, 0.7, 0.0));
        let b = cube(0.5, Vec3::ZERO);
        let pen = a.penetration(&b).expect("cubes overlap");
        assert!(pen.y < 0.0, "penetration {pen:?}");
        assert_abs_diff_eq!(pen.length(), 0.3, epsilon = 1e-3);
    }

    #[test]
    fn removing_penetration_separates_shapes() {
        let mut a = cube(0.5, Vec3::ZERO);
        let b = cube(0.5, Vec3::new(0.3, 0.75, 0.1));
        let pen = a.penetration(&b).expect("cubes overlap");
        assert_abs_diff_eq!(pen.y, 0.25, epsilon = 1e-3);
        a.offset(-pen * 1.01, Quat::IDENTITY);
        assert!(!a.overlap(&b));
    }

    #[test]
    fn separated_shapes_have_no_penetration() {
        let a = cube(0.5, Vec3::ZERO);
        let b = cube(0.5, Vec3::new(2.0, 0.0, 0.0));
        assert!(a.penetration(&b).is_none());
    }

    #[test]
    fn reuses_gjk_tetrahedron_as_seed() {
        let a = cube(0.5, Vec3::ZERO);
        let b = cube(0.5, Vec3::new(0.0, 0.0, 0.9));
        let seed = gjk::intersect(&a, &b).expect("cubes overlap");
        assert!(seed.is_tetrahedron());
        let pen = penetration(&a, &b, Some(seed)).expect("seeded EPA converges");
        assert_abs_diff_eq!(pen.z, 0.1, epsilon = 1e-3);
    }

    #[test]
    fn iteration_cap_reports_no_penetration() {
        let a = cube(0.5, Vec3::ZERO);
        let b = cube(0.5, Vec3::new(0.3, 0.2, 0.1));
        assert!(penetration_within(&a, &b, None, 0).is_none());
        assert!(penetration_within(&a, &b, None, EPA_MAX_ITERATIONS).is_some());
    }

    #[test]
    fn dense_round_hulls_can_exhaust_the_cap() {
        let sphere = |position: Vec3| {
            let mut collider = Collider::convex_set(fibonacci_sphere(4000, 1.0));
            collider.offset(position, Quat::IDENTITY);
            collider
        };
        let a = sphere(Vec3::ZERO);
        let mut unresolved = 0;
        for i in 0..50 {
            let offset = fibonacci_direction(i, 50) * (0.2 + 1.5 * i as f32 / 50.0);
            let b = sphere(offset);
            assert!(gjk::overlap(&a, &b), "offset {offset:?}");
            if penetration(&a, &b, None).is_none() {
                unresolved += 1;
            }
        }
        assert!(unresolved > 0);
    }

    fn fibonacci_direction(i: usize, count: usize) -> Vec3 {
        let golden = std::f32::consts::PI * (3.0 - 5f32.sqrt());
        let y = 1.0 - 2.0 * (i as f32 + 0.5) / count as f32;
        let ring = (1.0 - y * y).max(0.0).sqrt();
        let theta = golden * i as f32;
        Vec3::new(theta.cos() * ring, y, theta.sin() * ring)
    }

    fn fibonacci_sphere(count: usize, radius: f32) -> Vec<Vec3> {
        (0..count)
            .map(|i| fibonacci_direction(i, count) * radius)
            .collect()
    }
}
