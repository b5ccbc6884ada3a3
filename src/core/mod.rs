//! Core types describing physics objects, their colliders, and shared data.

pub mod collider;
pub mod mesh;
pub mod object;
pub mod types;

pub use collider::{BoundingBox, Collider, ConvexSet};
pub use mesh::{reduce_point_cloud, Aabb, PointCloudBuilder};
pub use object::PhysicsObject;
pub use types::{AngularVelocity, InertiaTensorExt, VelocityDelta};
