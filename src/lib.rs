//! Impulse Space – a discrete-step rigid-body physics core.
//!
//! Objects live in a [`PhysicsSpace`] and are addressed through generational
//! [`ObjectHandle`]s. Each step prunes pairs with a sort-and-sweep broad
//! phase, confirms overlaps with GJK, recovers penetration with EPA and
//! resolves contacts with a sequential-impulse solver.

pub mod collision;
pub mod config;
pub mod core;
pub mod dynamics;
pub mod events;
pub mod space;
pub mod utils;

pub use glam::{Mat3, Quat, Vec3};

pub use crate::collision::{ContactCache, NarrowPhaseWorkerPool, WorkerError};
pub use crate::config::{NarrowPhaseMode, PositionCorrection, SleepPolicy, SpaceConfig};
pub use crate::core::{
    collider::{BoundingBox, Collider, ConvexSet},
    object::PhysicsObject,
    types::{AngularVelocity, VelocityDelta},
};
pub use crate::dynamics::{
    forces::{Force, ForceStore, FrictionForce, GravityForce, LinearForce, PointForce, TorqueForce},
    solver::{Constraint, ConstraintSolver, ContactConstraint, SequentialImpulseSolver},
};
pub use crate::events::{CollisionEvent, Event, EventHandler};
pub use crate::space::PhysicsSpace;
pub use crate::utils::{
    allocator::{Arena, ObjectHandle},
    profiling::StepStats,
};
