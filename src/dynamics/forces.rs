use std::{collections::BTreeMap, fmt};

use glam::Vec3;

use crate::core::{object::PhysicsObject, types::VelocityDelta};

/// Something that changes an object's velocity over a timestep.
pub trait Force: Send + Sync {
    fn velocity_delta(&self, object: &PhysicsObject, dt: f32) -> VelocityDelta;
}

/// Uniform acceleration, independent of mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravityForce {
    pub acceleration: Vec3,
}

impl GravityForce {
    pub fn new(acceleration: Vec3) -> Self {
        Self { acceleration }
    }
}

impl Force for GravityForce {
    fn velocity_delta(&self, _object: &PhysicsObject, dt: f32) -> VelocityDelta {
        VelocityDelta {
            linear: self.acceleration * dt,
            angular: Vec3::ZERO,
        }
    }
}

/// Constant force through the center of mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearForce {
    pub force: Vec3,
}

impl LinearForce {
    pub fn new(force: Vec3) -> Self {
        Self { force }
    }
}

impl Force for LinearForce {
    fn velocity_delta(&self, object: &PhysicsObject, dt: f32) -> VelocityDelta {
        VelocityDelta {
            linear: self.force / object.mass() * dt,
            angular: Vec3::ZERO,
        }
    }
}

/// Exponential velocity decay: after `dt` seconds both linear and angular
/// velocity are scaled by `(1 − coefficient)^dt`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrictionForce {
    pub coefficient: f32,
}

impl FrictionForce {
    pub fn new(coefficient: f32) -> Self {
        Self {
            coefficient: coefficient.clamp(0.0, 1.0),
        }
    }
}

impl Force for FrictionForce {
    fn velocity_delta(&self, object: &PhysicsObject, dt: f32) -> VelocityDelta {
        let keep = (1.0 - self.coefficient).powf(dt) - 1.0;
        VelocityDelta {
            linear: object.velocity() * keep,
            angular: object.angular_velocity().to_vector() * keep,
        }
    }
}

/// Constant world-space torque.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TorqueForce {
    pub torque: Vec3,
}

impl TorqueForce {
    pub fn new(torque: Vec3) -> Self {
        Self { torque }
    }
}

impl Force for TorqueForce {
    fn velocity_delta(&self, object: &PhysicsObject, dt: f32) -> VelocityDelta {
        VelocityDelta {
            linear: Vec3::ZERO,
            angular: object.world_inverse_inertia() * self.torque * dt,
        }
    }
}

/// Force applied at a body-frame offset from the center of mass; it both
/// pushes and spins the object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointForce {
    pub force: Vec3,
    pub local_point: Vec3,
}

impl PointForce {
    pub fn new(force: Vec3, local_point: Vec3) -> Self {
        Self { force, local_point }
    }
}

impl Force for PointForce {
    fn velocity_delta(&self, object: &PhysicsObject, dt: f32) -> VelocityDelta {
        let arm = object.orientation() * self.local_point;
        VelocityDelta {
            linear: self.force / object.mass() * dt,
            angular: object.world_inverse_inertia() * arm.cross(self.force) * dt,
        }
    }
}

/// Named forces attached to one object, applied in name order.
#[derive(Default)]
pub struct ForceStore {
    forces: BTreeMap<String, Box<dyn Force>>,
}

impl fmt::Debug for ForceStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.forces.keys()).finish()
    }
}

impl ForceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `force` under `name`, returning the force it replaced.
    pub fn add<F: Force + 'static>(
        &mut self,
        name: impl Into<String>,
        force: F,
    ) -> Option<Box<dyn Force>> {
        self.forces.insert(name.into(), Box::new(force))
    }

    pub fn remove(&mut self, name: &str) -> Option<Box<dyn Force>> {
        self.forces.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&dyn Force> {
        self.forces.get(name).map(|force| force.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.forces.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.forces.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.forces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forces.is_empty()
    }

    pub fn clear(&mut self) {
        self.forces.clear();
    }

    /// Sum of every stored force's velocity change for `object` over `dt`.
    pub fn total_delta(&self, object: &PhysicsObject, dt: f32) -> VelocityDelta {
        self.forces
            .values()
            .fold(VelocityDelta::default(), |total, force| {
                total + force.velocity_delta(object, dt)
            })
    }
}

/// Applies `object`'s stored forces and accumulated force/torque over `dt`.
pub fn apply_all(object: &mut PhysicsObject, dt: f32) {
    let mut delta = object.forces().total_delta(object, dt);
    delta.linear += object.force() / object.mass() * dt;
    delta.angular += object.world_inverse_inertia() * object.torque() * dt;
    object.apply_velocity_delta(delta);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn friction_decays_exponentially() {
        let mut object = PhysicsObject::new();
        object.set_velocity(Vec3::new(8.0, 0.0, 0.0));
        let friction = FrictionForce::new(0.75);
        let delta = friction.velocity_delta(&object, 0.5);
        assert_relative_eq!(object.velocity().x + delta.linear.x, 4.0, epsilon = 1e-5);
    }

    #[test]
    fn linear_force_scales_with_inverse_mass() {
        let mut object = PhysicsObject::new();
        object.set_mass(4.0);
        let delta = LinearForce::new(Vec3::new(0.0, 8.0, 0.0)).velocity_delta(&object, 0.5);
        assert_relative_eq!(delta.linear.y, 1.0);
    }

    #[test]
    fn point_force_off_center_adds_spin() {
        let object = PhysicsObject::new();
        let delta = PointForce::new(Vec3::Y, Vec3::X).velocity_delta(&object, 1.0);
        assert_relative_eq!(delta.linear.y, 1.0);
        assert!(delta.angular.z > 0.0);
        let centered = PointForce::new(Vec3::Y, Vec3::ZERO).velocity_delta(&object, 1.0);
        assert_eq!(centered.angular, Vec3::ZERO);
    }

    #[test]
    fn store_is_keyed_by_name() {
        let mut store = ForceStore::new();
        assert!(store.add("wind", LinearForce::new(Vec3::X)).is_none());
        assert!(store.add("wind", LinearForce::new(Vec3::Z)).is_some());
        store.add("gravity", GravityForce::new(Vec3::new(0.0, -10.0, 0.0)));
        assert_eq!(store.names().collect::<Vec<_>>(), vec!["gravity", "wind"]);

        let object = PhysicsObject::new();
        let total = store.total_delta(&object, 0.1);
        assert_relative_eq!(total.linear.y, -1.0, epsilon = 1e-6);
        assert_relative_eq!(total.linear.z, 0.1, epsilon = 1e-6);

        assert!(store.remove("wind").is_some());
        assert!(store.get("wind").is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn accumulated_force_becomes_velocity() {
        let mut object = PhysicsObject::new();
        object.set_mass(2.0);
        object.apply_force(Vec3::new(4.0, 0.0, 0.0));
        object.forces_mut().add("push", LinearForce::new(Vec3::new(2.0, 0.0, 0.0)));
        apply_all(&mut object, 0.5);
        assert_relative_eq!(object.velocity().x, 1.5);
    }
}
