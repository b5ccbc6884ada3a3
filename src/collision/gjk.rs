//! Gilbert–Johnson–Keerthi overlap test and the closest-feature walk used to
//! recover contact points.

use glam::Vec3;

use super::simplex::{Simplex, SupportPoint};
use crate::{
    config::{EPA_TOLERANCE, GJK_EPSILON, GJK_MAX_ITERATIONS},
    core::collider::Collider,
};

/// Starting search direction: from `second`'s center toward `first`'s,
/// falling back to `+X` when the centers coincide.
pub fn initial_direction(first: &Collider, second: &Collider) -> Vec3 {
    let direction = first.center() - second.center();
    if direction.length_squared() < GJK_EPSILON {
        Vec3::X
    } else {
        direction
    }
}

/// Outcome of a narrow-phase test.
#[derive(Debug, Clone, Default)]
pub struct Intersection {
    pub touching: bool,
    /// Tetrahedron GJK finished with, handed to EPA so it does not rerun GJK.
    pub seed: Option<Simplex>,
}

/// Runs GJK and returns the enclosing tetrahedron when the shapes overlap.
///
/// Shapes that merely touch, and runs that hit the iteration cap, report no
/// overlap.
pub fn intersect(first: &Collider, second: &Collider) -> Option<Simplex> {
    intersect_within(first, second, GJK_MAX_ITERATIONS)
}

fn intersect_within(first: &Collider, second: &Collider, max_iterations: usize) -> Option<Simplex> {
    let mut simplex = Simplex::new();
    let mut direction = initial_direction(first, second);

    for _ in 0..max_iterations {
        let support = SupportPoint::of(first, second, direction);
        if support.point.dot(direction) <= 0.0 {
            return None;
        }

        if !simplex.push(support) {
            break;
        }
        if simplex.contains_origin(&mut direction) {
            return Some(simplex);
        }
    }

    log::trace!("GJK reached its iteration cap; reporting no overlap");
    None
}

pub fn overlap(first: &Collider, second: &Collider) -> bool {
    intersect(first, second).is_some()
}

/// Walks a segment/triangle simplex toward the origin of `first − second`.
///
/// When the walk converges on a separated pair the midpoint between the two
/// hulls' closest points is returned. When the simplex ends up bracketing the
/// origin (the shapes overlap) the source point closest to both hulls' source
/// features is returned instead.
pub fn contact_point(first: &Collider, second: &Collider) -> Option<Vec3> {
    let mut simplex = Simplex::new();
    let toward_origin = -initial_direction(first, second);
    simplex.push(SupportPoint::of(first, second, toward_origin));

    for _ in 0..GJK_MAX_ITERATIONS {
        let (closest, weights) = simplex.reduce_toward_origin();
        if closest.length_squared() < GJK_EPSILON {
            return simplex.bracketed_contact();
        }

        let direction = -closest;
        let support = SupportPoint::of(first, second, direction);
        let progress = support.point.dot(direction) - closest.dot(direction);
        if progress <= GJK_EPSILON || simplex.contains_point(support.point, EPA_TOLERANCE) {
            let (on_first, on_second) = simplex.witness_points(&weights);
            return Some((on_first + on_second) * 0.5);
        }

        if !simplex.push(support) {
            break;
        }
    }

    log::trace!("contact walk reached its iteration cap");
    None
}
