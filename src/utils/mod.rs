//! Utility helpers: math extensions, the generational arena, logging and profiling.

pub mod allocator;
pub mod logging;
pub mod math;
pub mod profiling;

pub use allocator::{Arena, ObjectHandle};
pub use math::*;
pub use profiling::StepStats;
