use glam::{Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::AXIS_EPSILON;

/// Angular velocity packed into a quaternion: `xyz` is the rotation axis
/// (not necessarily unit length) and `w` is the angular speed in rad/s.
///
/// A zero rotation is represented by a degenerate axis; [`axis`](Self::axis)
/// reports it as `None` so callers can tell it apart from a real axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngularVelocity(Quat);

impl Default for AngularVelocity {
    fn default() -> Self {
        Self::ZERO
    }
}

impl AngularVelocity {
    pub const ZERO: Self = Self(Quat::from_xyzw(0.0, 0.0, 0.0, 0.0));

    pub fn from_axis_speed(axis: Vec3, speed: f32) -> Self {
        Self(Quat::from_xyzw(axis.x, axis.y, axis.z, speed))
    }

    /// Packs a rotation vector (`axis · speed`).
    pub fn from_vector(omega: Vec3) -> Self {
        let speed = omega.length();
        if speed < AXIS_EPSILON {
            return Self::ZERO;
        }
        Self::from_axis_speed(omega / speed, speed)
    }

    pub fn from_quat(packed: Quat) -> Self {
        Self(packed)
    }

    pub fn as_quat(&self) -> Quat {
        self.0
    }

    pub fn speed(&self) -> f32 {
        self.0.w
    }

    /// Unit rotation axis, or `None` when the stored axis is degenerate.
    pub fn axis(&self) -> Option<Vec3> {
        let axis = Vec3::new(self.0.x, self.0.y, self.0.z);
        let len = axis.length();
        if len < AXIS_EPSILON {
            None
        } else {
            Some(axis / len)
        }
    }

    pub fn axis_or_default(&self) -> Vec3 {
        self.axis().unwrap_or(Vec3::X)
    }

    /// Rotation vector `axis · speed`; zero when the axis is degenerate.
    pub fn to_vector(&self) -> Vec3 {
        self.axis().map(|axis| axis * self.speed()).unwrap_or(Vec3::ZERO)
    }

    pub fn is_zero(&self) -> bool {
        self.speed().abs() < AXIS_EPSILON || self.axis().is_none()
    }

    /// Orientation change produced by spinning for `dt` seconds.
    pub fn rotation_over(&self, dt: f32) -> Quat {
        if self.is_zero() {
            return Quat::IDENTITY;
        }
        Quat::from_axis_angle(self.axis_or_default(), self.speed() * dt)
    }
}

/// Linear and angular velocity change produced by a force over one timestep.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VelocityDelta {
    pub linear: Vec3,
    pub angular: Vec3,
}

impl std::ops::Add for VelocityDelta {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            linear: self.linear + rhs.linear,
            angular: self.angular + rhs.angular,
        }
    }
}

impl std::ops::AddAssign for VelocityDelta {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Helper methods for inertia calculations.
pub trait InertiaTensorExt {
    fn for_solid_sphere(radius: f32, mass: f32) -> Mat3;
}

impl InertiaTensorExt for Mat3 {
    fn for_solid_sphere(radius: f32, mass: f32) -> Mat3 {
        let value = 0.4 * mass * radius * radius;
        Mat3::from_diagonal(Vec3::splat(value))
    }
}
