use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::mesh::{Aabb, PointCloudBuilder};
use crate::{
    collision::{
        epa,
        gjk::{self, Intersection},
        simplex::Simplex,
    },
    config::DEFAULT_POINT_CULL_DISTANCE,
};

/// Axis-aligned box used as a broad-phase pre-filter. Rotation is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    half_extents: Vec3,
    local_center: Vec3,
    center: Vec3,
}

impl BoundingBox {
    pub fn new(half_extents: Vec3) -> Self {
        Self {
            half_extents: half_extents.abs(),
            local_center: Vec3::ZERO,
            center: Vec3::ZERO,
        }
    }

    /// Tightest box around `points`, keeping their centroid of bounds as the local center.
    pub fn from_points(points: &[Vec3]) -> Self {
        let bounds = Aabb::from_points(points);
        let mut aabb = Self::new(bounds.extent());
        if !bounds.is_empty() {
            aabb.local_center = bounds.center();
            aabb.center = aabb.local_center;
        }
        aabb
    }

    pub fn half_extents(&self) -> Vec3 {
        self.half_extents
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Moves the box to `position`; translation only.
    pub fn offset(&mut self, position: Vec3) {
        self.center = position + self.local_center;
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.center - self.half_extents, self.center + self.half_extents)
    }

    /// Separating-axis test on the three world axes. Touching boxes do not overlap.
    pub fn overlap(&self, other: &BoundingBox) -> bool {
        let delta = (other.center - self.center).abs();
        let reach = self.half_extents + other.half_extents;
        for axis in 0..3 {
            if delta[axis] >= reach[axis] {
                return false;
            }
        }
        true
    }

    pub fn support(&self, direction: Vec3) -> Vec3 {
        self.center
            + Vec3::new(
                self.half_extents.x.copysign(direction.x),
                self.half_extents.y.copysign(direction.y),
                self.half_extents.z.copysign(direction.z),
            )
    }
}

/// Convex point set used by the narrow phase (GJK/EPA).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvexSet {
    vertices: Vec<Vec3>,
    offset: Vec3,
    orientation: Quat,
    #[serde(skip)]
    world: Vec<Vec3>,
}

impl PartialEq for ConvexSet {
    fn eq(&self, other: &Self) -> bool {
        self.vertices == other.vertices
            && self.offset == other.offset
            && self.orientation == other.orientation
    }
}

impl ConvexSet {
    pub fn new(vertices: Vec<Vec3>) -> Self {
        let world = vertices.clone();
        Self {
            vertices,
            offset: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            world,
        }
    }

    /// Builds a convex set from triangle-mesh geometry, merging vertices
    /// closer than `cull_distance`.
    pub fn from_mesh(vertices: &[Vec3], indices: &[[u32; 3]], cull_distance: f32) -> Self {
        Self::new(
            PointCloudBuilder::from_triangles(vertices, indices)
                .cull(cull_distance)
                .build(),
        )
    }

    /// [`ConvexSet::from_mesh`] with [`DEFAULT_POINT_CULL_DISTANCE`].
    pub fn from_triangles(vertices: &[Vec3], indices: &[[u32; 3]]) -> Self {
        Self::from_mesh(vertices, indices, DEFAULT_POINT_CULL_DISTANCE)
    }

    /// Axis-aligned box corners with the given half extents.
    pub fn cuboid(half_extents: Vec3) -> Self {
        let h = half_extents;
        let mut vertices = Vec::with_capacity(8);
        for &x in &[-h.x, h.x] {
            for &y in &[-h.y, h.y] {
                for &z in &[-h.z, h.z] {
                    vertices.push(Vec3::new(x, y, z));
                }
            }
        }
        Self::new(vertices)
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn world_vertices(&self) -> &[Vec3] {
        &self.world
    }

    pub fn position(&self) -> Vec3 {
        self.offset
    }

    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    /// Places the set at the given pose and refreshes the world-space cache.
    pub fn offset(&mut self, position: Vec3, orientation: Quat) {
        self.offset = position;
        self.orientation = orientation;
        self.world.clear();
        self.world
            .extend(self.vertices.iter().map(|v| position + orientation * *v));
    }

    pub fn support(&self, direction: Vec3) -> Vec3 {
        let mut best_point = self.offset;
        let mut best_dot = f32::NEG_INFINITY;
        for &v in &self.world {
            let dot = v.dot(direction);
            if dot > best_dot {
                best_dot = dot;
                best_point = v;
            }
        }
        best_point
    }

    pub fn aabb(&self) -> Aabb {
        if self.world.is_empty() {
            return Aabb::new(self.offset, self.offset);
        }
        Aabb::from_points(&self.world)
    }
}

/// Collision shape variants. Pairs are dispatched by pattern matching:
/// two bounding boxes use the AABB test, anything involving a convex set
/// goes through GJK/EPA (a bounding box then acts as its own convex hull).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Collider {
    BoundingBox(BoundingBox),
    ConvexSet(ConvexSet),
}

impl From<BoundingBox> for Collider {
    fn from(value: BoundingBox) -> Self {
        Collider::BoundingBox(value)
    }
}

impl From<ConvexSet> for Collider {
    fn from(value: ConvexSet) -> Self {
        Collider::ConvexSet(value)
    }
}

impl Collider {
    pub fn bounding_box(half_extents: Vec3) -> Self {
        Collider::BoundingBox(BoundingBox::new(half_extents))
    }

    pub fn convex_set(vertices: Vec<Vec3>) -> Self {
        Collider::ConvexSet(ConvexSet::new(vertices))
    }

    /// Refreshes the collider pose. Spatial queries are only meaningful
    /// after this has been called with the owner's current pose.
    pub fn offset(&mut self, position: Vec3, orientation: Quat) {
        match self {
            Collider::BoundingBox(aabb) => aabb.offset(position),
            Collider::ConvexSet(set) => set.offset(position, orientation),
        }
    }

    pub fn center(&self) -> Vec3 {
        match self {
            Collider::BoundingBox(aabb) => aabb.center(),
            Collider::ConvexSet(set) => set.position(),
        }
    }

    pub fn support(&self, direction: Vec3) -> Vec3 {
        match self {
            Collider::BoundingBox(aabb) => aabb.support(direction),
            Collider::ConvexSet(set) => set.support(direction),
        }
    }

    pub fn aabb(&self) -> Aabb {
        match self {
            Collider::BoundingBox(aabb) => aabb.aabb(),
            Collider::ConvexSet(set) => set.aabb(),
        }
    }

    pub fn overlap(&self, other: &Collider) -> bool {
        match (self, other) {
            (Collider::BoundingBox(a), Collider::BoundingBox(b)) => a.overlap(b),
            _ => gjk::overlap(self, other),
        }
    }

    /// Overlap test that keeps the GJK tetrahedron for a later EPA run.
    /// Two bounding boxes are tested on their axes first.
    pub fn intersect(&self, other: &Collider) -> Intersection {
        if let (Collider::BoundingBox(a), Collider::BoundingBox(b)) = (self, other) {
            if !a.overlap(b) {
                return Intersection::default();
            }
            return Intersection {
                touching: true,
                seed: gjk::intersect(self, other),
            };
        }
        let seed = gjk::intersect(self, other);
        Intersection {
            touching: seed.is_some(),
            seed,
        }
    }

    /// Minimum translation that separates `self` from `other` when subtracted
    /// from `self`'s position. `None` when the shapes do not overlap or EPA
    /// fails to converge.
    pub fn penetration(&self, other: &Collider) -> Option<Vec3> {
        epa::penetration(self, other, None)
    }

    /// [`Collider::penetration`] starting from a tetrahedron from
    /// [`Collider::intersect`].
    pub fn penetration_seeded(&self, other: &Collider, seed: Option<Simplex>) -> Option<Vec3> {
        epa::penetration(self, other, seed)
    }

    /// World-space point where the two shapes touch (or come closest).
    pub fn contact_point(&self, other: &Collider) -> Option<Vec3> {
        gjk::contact_point(self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_box_offset_ignores_rotation() {
        let mut collider = Collider::bounding_box(Vec3::ONE);
        collider.offset(Vec3::new(2.0, 0.0, 0.0), Quat::from_rotation_z(0.7));
        let aabb = collider.aabb();
        assert_eq!(aabb.min, Vec3::new(1.0, -1.0, -1.0));
        assert_eq!(aabb.max, Vec3::new(3.0, 1.0, 1.0));
    }

    #[test]
    fn touching_boxes_do_not_overlap() {
        let a = BoundingBox::new(Vec3::ONE);
        let mut b = BoundingBox::new(Vec3::ONE);
        b.offset(Vec3::new(2.0, 0.0, 0.0));
        assert!(!a.overlap(&b));
        b.offset(Vec3::new(1.99, 1.5, -1.5));
        assert!(a.overlap(&b));
    }

    #[test]
    fn convex_set_support_follows_orientation() {
        let mut set = ConvexSet::new(vec![Vec3::X, -Vec3::X]);
        set.offset(Vec3::new(0.0, 5.0, 0.0), Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));
        let support = set.support(Vec3::Y);
        assert!((support - Vec3::new(0.0, 6.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn from_points_keeps_off_center_bounds() {
        let mut aabb = BoundingBox::from_points(&[Vec3::ZERO, Vec3::new(2.0, 2.0, 2.0)]);
        assert_eq!(aabb.half_extents(), Vec3::ONE);
        aabb.offset(Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(aabb.center(), Vec3::new(11.0, 1.0, 1.0));
    }

    #[test]
    fn triangles_weld_with_default_cull_distance() {
        let vertices = [Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::new(1e-4, 0.0, 0.0), Vec3::Z];
        let set = ConvexSet::from_triangles(&vertices, &[[0, 1, 2], [3, 1, 4]]);
        assert_eq!(set.vertices().len(), 4);
    }

    #[test]
    fn intersect_keeps_a_seed_for_overlapping_hulls() {
        let mut a: Collider = ConvexSet::cuboid(Vec3::splat(0.5)).into();
        let mut b = a.clone();
        a.offset(Vec3::ZERO, Quat::IDENTITY);
        b.offset(Vec3::new(0.7, 0.1, 0.0), Quat::IDENTITY);
        let hit = a.intersect(&b);
        assert!(hit.touching);
        assert!(hit.seed.as_ref().is_some_and(Simplex::is_tetrahedron));

        b.offset(Vec3::new(3.0, 0.0, 0.0), Quat::IDENTITY);
        let miss = a.intersect(&b);
        assert!(!miss.touching);
        assert!(miss.seed.is_none());
    }

    #[test]
    fn touching_bounding_boxes_do_not_intersect() {
        let a = Collider::bounding_box(Vec3::ONE);
        let mut b = Collider::bounding_box(Vec3::ONE);
        b.offset(Vec3::new(2.0, 0.0, 0.0), Quat::IDENTITY);
        assert!(!a.intersect(&b).touching);
        b.offset(Vec3::new(1.5, 0.0, 0.0), Quat::IDENTITY);
        assert!(a.intersect(&b).touching);
    }
}
