//! Collision detection: broad-phase sweep, GJK/EPA narrow phase, the contact
//! cache and the optional narrow-phase worker pool.

pub mod broadphase;
pub mod contact_cache;
pub mod epa;
pub mod gjk;
pub mod simplex;
pub mod workers;

pub use broadphase::{BroadPhase, BroadPhaseEntry};
pub use contact_cache::{pair_hash, ContactCache};
pub use gjk::Intersection;
pub use simplex::{Simplex, SupportPoint};
pub use workers::{NarrowPhaseJob, NarrowPhaseResult, NarrowPhaseWorkerPool, WorkerError};
