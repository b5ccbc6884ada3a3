use std::fmt;

use glam::{Mat3, Quat, Vec3};

use super::{
    collider::Collider,
    mesh::Aabb,
    types::{AngularVelocity, InertiaTensorExt, VelocityDelta},
};
use crate::{
    collision::{gjk::Intersection, simplex::Simplex},
    config::{DEFAULT_MASS, DEFAULT_RADIUS, DEFAULT_RESTITUTION, STATIC_MASS},
    dynamics::forces::ForceStore,
    utils::math::{renormalize_if_drifted, try_inverse, world_inverse_inertia},
};

/// A rigid body living in a [`PhysicsSpace`](crate::space::PhysicsSpace).
///
/// State is read through accessors and changed through setters; setters
/// that move the object keep its colliders posed.
pub struct PhysicsObject {
    pub(crate) position: Vec3,
    pub(crate) velocity: Vec3,
    pub(crate) orientation: Quat,
    pub(crate) angular_velocity: AngularVelocity,
    pub(crate) force: Vec3,
    pub(crate) torque: Vec3,
    mass: f32,
    radius: f32,
    restitution: f32,
    pub(crate) active: bool,
    is_static: bool,
    linear_damping: f32,
    angular_damping: f32,
    forces: ForceStore,
    broad_phase: Option<Collider>,
    narrow_phase: Option<Collider>,
    pub(crate) quiet_frames: u32,
}

impl Default for PhysicsObject {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            angular_velocity: AngularVelocity::ZERO,
            force: Vec3::ZERO,
            torque: Vec3::ZERO,
            mass: DEFAULT_MASS,
            radius: DEFAULT_RADIUS,
            restitution: DEFAULT_RESTITUTION,
            active: true,
            is_static: false,
            linear_damping: 0.0,
            angular_damping: 0.0,
            forces: ForceStore::new(),
            broad_phase: None,
            narrow_phase: None,
            quiet_frames: 0,
        }
    }
}

impl fmt::Debug for PhysicsObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhysicsObject")
            .field("position", &self.position)
            .field("velocity", &self.velocity)
            .field("orientation", &self.orientation)
            .field("angular_velocity", &self.angular_velocity)
            .field("mass", &self.mass)
            .field("active", &self.active)
            .field("is_static", &self.is_static)
            .field("forces", &self.forces)
            .finish_non_exhaustive()
    }
}

impl PhysicsObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn angular_velocity(&self) -> AngularVelocity {
        self.angular_velocity
    }

    /// Force accumulated since the last step.
    pub fn force(&self) -> Vec3 {
        self.force
    }

    pub fn torque(&self) -> Vec3 {
        self.torque
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn restitution(&self) -> f32 {
        self.restitution
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Active and not static: the object moves under forces and contacts.
    pub fn is_dynamic(&self) -> bool {
        self.active && !self.is_static
    }

    pub fn linear_damping(&self) -> f32 {
        self.linear_damping
    }

    pub fn angular_damping(&self) -> f32 {
        self.angular_damping
    }

    pub fn forces(&self) -> &ForceStore {
        &self.forces
    }

    pub fn forces_mut(&mut self) -> &mut ForceStore {
        &mut self.forces
    }

    pub fn broad_phase(&self) -> Option<&Collider> {
        self.broad_phase.as_ref()
    }

    pub fn narrow_phase(&self) -> Option<&Collider> {
        self.narrow_phase.as_ref()
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.refresh_colliders();
    }

    pub fn set_orientation(&mut self, orientation: Quat) {
        self.orientation = orientation.normalize();
        self.refresh_colliders();
    }

    pub fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    pub fn set_angular_velocity(&mut self, angular_velocity: AngularVelocity) {
        self.angular_velocity = angular_velocity;
    }

    /// Non-positive or non-finite masses are ignored.
    pub fn set_mass(&mut self, mass: f32) {
        if mass.is_finite() && mass > 0.0 {
            self.mass = mass;
        } else {
            log::debug!("ignoring invalid mass {mass}");
        }
    }

    pub fn set_radius(&mut self, radius: f32) {
        if radius.is_finite() && radius > 0.0 {
            self.radius = radius;
        } else {
            log::debug!("ignoring invalid radius {radius}");
        }
    }

    pub fn set_restitution(&mut self, restitution: f32) {
        self.restitution = restitution.max(0.0);
    }

    pub fn set_static(&mut self, is_static: bool) {
        self.is_static = is_static;
        if is_static {
            self.velocity = Vec3::ZERO;
            self.angular_velocity = AngularVelocity::ZERO;
        }
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        if active {
            self.quiet_frames = 0;
        }
    }

    pub fn set_damping(&mut self, linear: f32, angular: f32) {
        self.linear_damping = linear.max(0.0);
        self.angular_damping = angular.max(0.0);
    }

    /// Adds to the force accumulator; consumed by the next step.
    pub fn apply_force(&mut self, force: Vec3) {
        self.force += force;
    }

    pub fn apply_torque(&mut self, torque: Vec3) {
        self.torque += torque;
    }

    /// Instantaneous impulse at world-space `point`. Ignored by static objects.
    pub fn apply_impulse(&mut self, impulse: Vec3, point: Vec3) {
        if self.is_static {
            return;
        }
        let arm = point - self.position;
        self.apply_velocity_delta(VelocityDelta {
            linear: impulse / self.mass,
            angular: self.world_inverse_inertia() * arm.cross(impulse),
        });
        self.set_active(true);
    }

    pub fn apply_velocity_delta(&mut self, delta: VelocityDelta) {
        self.velocity += delta.linear;
        if delta.angular != Vec3::ZERO {
            self.angular_velocity =
                AngularVelocity::from_vector(self.angular_velocity.to_vector() + delta.angular);
        }
    }

    pub fn set_broad_phase(&mut self, collider: Option<Collider>) {
        self.broad_phase = collider;
        self.refresh_colliders();
    }

    pub fn set_narrow_phase(&mut self, collider: Option<Collider>) {
        self.narrow_phase = collider;
        self.refresh_colliders();
    }

    /// Poses both colliders at the object's current position and orientation.
    pub fn refresh_colliders(&mut self) {
        let (position, orientation) = (self.position, self.orientation);
        for collider in [&mut self.broad_phase, &mut self.narrow_phase]
            .into_iter()
            .flatten()
        {
            collider.offset(position, orientation);
        }
    }

    pub(crate) fn integrate_pose(&mut self, dt: f32) {
        self.position += self.velocity * dt;
        let rotation = self.angular_velocity.rotation_over(dt);
        self.orientation = renormalize_if_drifted(rotation * self.orientation);
    }

    pub(crate) fn clear_accumulators(&mut self) {
        self.force = Vec3::ZERO;
        self.torque = Vec3::ZERO;
    }

    /// World bounds of the broad-phase collider.
    pub fn bounds(&self) -> Option<Aabb> {
        self.broad_phase.as_ref().map(Collider::aabb)
    }

    /// Broad-phase test; an object without a broad-phase collider passes.
    pub fn broad_phase_overlap(&self, other: &PhysicsObject) -> bool {
        match (&self.broad_phase, &other.broad_phase) {
            (Some(a), Some(b)) => a.overlap(b),
            _ => true,
        }
    }

    /// Narrow-phase test; a missing collider means no contact.
    pub fn narrow_phase_overlap(&self, other: &PhysicsObject) -> bool {
        match (&self.narrow_phase, &other.narrow_phase) {
            (Some(a), Some(b)) => a.overlap(b),
            _ => false,
        }
    }

    /// Narrow-phase test that also keeps the GJK tetrahedron for
    /// [`PhysicsObject::penetration_seeded`].
    pub fn narrow_phase_intersect(&self, other: &PhysicsObject) -> Intersection {
        match (&self.narrow_phase, &other.narrow_phase) {
            (Some(a), Some(b)) => a.intersect(b),
            _ => Intersection::default(),
        }
    }

    pub fn penetration(&self, other: &PhysicsObject) -> Option<Vec3> {
        self.penetration_seeded(other, None)
    }

    pub fn penetration_seeded(
        &self,
        other: &PhysicsObject,
        seed: Option<Simplex>,
    ) -> Option<Vec3> {
        let (a, b) = (self.narrow_phase.as_ref()?, other.narrow_phase.as_ref()?);
        a.penetration_seeded(b, seed)
    }

    pub fn contact_point(&self, other: &PhysicsObject) -> Option<Vec3> {
        let (a, b) = (self.narrow_phase.as_ref()?, other.narrow_phase.as_ref()?);
        a.contact_point(b)
    }

    /// Body-frame inertia of a solid sphere of the object's radius.
    pub fn inertia(&self) -> Mat3 {
        Mat3::for_solid_sphere(self.radius, self.mass)
    }

    pub fn world_inverse_inertia(&self) -> Mat3 {
        let local = try_inverse(self.inertia()).unwrap_or(Mat3::ZERO);
        world_inverse_inertia(self.orientation, local)
    }

    /// Inverse mass seen by the solver; static objects weigh [`STATIC_MASS`].
    pub fn solver_inverse_mass(&self) -> f32 {
        if self.is_static {
            1.0 / STATIC_MASS
        } else {
            1.0 / self.mass
        }
    }

    pub fn solver_inverse_inertia(&self) -> Mat3 {
        if self.is_static {
            let local = try_inverse(Mat3::for_solid_sphere(self.radius, STATIC_MASS))
                .unwrap_or(Mat3::ZERO);
            world_inverse_inertia(self.orientation, local)
        } else {
            self.world_inverse_inertia()
        }
    }

    /// Inverse mass used to split position corrections; zero for static objects.
    pub fn correction_weight(&self) -> f32 {
        if self.is_static {
            0.0
        } else {
            1.0 / self.mass
        }
    }

    pub fn linear_momentum(&self) -> Vec3 {
        self.velocity * self.mass
    }
}
