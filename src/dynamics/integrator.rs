use glam::Vec3;

use crate::core::{object::PhysicsObject, types::AngularVelocity};

/// Explicit pose integrator run once per sub-step.
#[derive(Debug, Clone, Copy)]
pub struct Integrator {
    pub dt: f32,
    pub substeps: u32,
}

impl Integrator {
    /// Splits `step_time` into `substeps` equal sub-steps (at least one).
    pub fn new(step_time: f32, substeps: u32) -> Self {
        let substeps = substeps.max(1);
        Self {
            dt: step_time / substeps as f32,
            substeps,
        }
    }

    /// Adds `gravity · step_time` to a dynamic object's velocity.
    pub fn apply_gravity(object: &mut PhysicsObject, gravity: Vec3, step_time: f32) {
        if !object.is_dynamic() {
            return;
        }
        object.velocity += gravity * step_time;
    }

    /// Moves and rotates a dynamic object, then applies damping.
    pub fn integrate_position(&self, object: &mut PhysicsObject) {
        if !object.is_dynamic() {
            return;
        }
        object.integrate_pose(self.dt);
        self.apply_damping(object);
    }

    pub fn apply_damping(&self, object: &mut PhysicsObject) {
        let linear = (1.0 - object.linear_damping() * self.dt).max(0.0);
        let angular = (1.0 - object.angular_damping() * self.dt).max(0.0);
        object.velocity *= linear;
        if angular != 1.0 {
            let spin = object.angular_velocity;
            object.angular_velocity = match spin.axis() {
                Some(axis) => AngularVelocity::from_axis_speed(axis, spin.speed() * angular),
                None => AngularVelocity::ZERO,
            };
        }
    }
}
