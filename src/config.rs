//! Global configuration constants and per-space settings.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Default gravity vector applied in a physics space (Y-up).
pub const DEFAULT_GRAVITY: [f32; 3] = [0.0, -9.81, 0.0];

/// Iteration cap for the GJK overlap and contact-point walks.
pub const GJK_MAX_ITERATIONS: usize = 20;

/// Iteration cap for the expanding polytope algorithm.
pub const EPA_MAX_ITERATIONS: usize = 40;

/// Squared-length threshold below which a search direction is degenerate.
pub const GJK_EPSILON: f32 = 1e-6;

/// Distance under which an EPA support point counts as already present.
pub const EPA_TOLERANCE: f32 = 1e-4;

/// Allowed drift of `|q|²` from 1 before an orientation is renormalized.
pub const QUAT_DRIFT_TOLERANCE: f32 = 1e-5;

/// Axis length below which an angular velocity axis is considered degenerate.
pub const AXIS_EPSILON: f32 = 1e-6;

/// Baumgarte bias factor used by the contact solver.
pub const BIAS_FACTOR: f32 = 1.0;

/// Mass substituted for static objects inside the solver.
pub const STATIC_MASS: f32 = 1.0e9;

/// Default object mass.
pub const DEFAULT_MASS: f32 = 1.0;

/// Default object radius, used for the sphere inertia approximation.
pub const DEFAULT_RADIUS: f32 = 1.0;

/// Default contact restitution (fully elastic).
pub const DEFAULT_RESTITUTION: f32 = 1.0;

/// Default distance under which two mesh vertices are merged into one.
pub const DEFAULT_POINT_CULL_DISTANCE: f32 = 1e-3;

/// How penetration is removed once two objects are found overlapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PositionCorrection {
    /// Subtract the whole penetration vector from the first object of the pair.
    FirstObject,
    /// Split the correction between both objects by inverse mass.
    #[default]
    MassWeighted,
}

/// Strategy used to run narrow-phase overlap tests on candidate pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum NarrowPhaseMode {
    /// Test every candidate pair on the calling thread.
    #[default]
    Inline,
    /// Test candidate pairs with rayon (requires the `parallel` feature).
    Parallel,
    /// Dispatch candidate pairs to a fixed pool of worker threads.
    WorkerPool {
        /// Number of worker threads.
        workers: usize,
    },
}

/// Thresholds that put a resting object to sleep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SleepPolicy {
    pub linear_threshold: f32,
    pub angular_threshold: f32,
    /// Consecutive quiet steps required before deactivation.
    pub frames: u32,
}

impl Default for SleepPolicy {
    fn default() -> Self {
        Self {
            linear_threshold: 0.05,
            angular_threshold: 0.05,
            frames: 60,
        }
    }
}

/// Settings owned by a [`PhysicsSpace`](crate::space::PhysicsSpace).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpaceConfig {
    pub gravity: Vec3,
    pub position_correction: PositionCorrection,
    pub narrow_phase: NarrowPhaseMode,
    pub sleep: Option<SleepPolicy>,
    /// Steps slower than this many milliseconds are logged as warnings.
    pub step_budget_ms: Option<f32>,
}

impl Default for SpaceConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::from_array(DEFAULT_GRAVITY),
            position_correction: PositionCorrection::default(),
            narrow_phase: NarrowPhaseMode::default(),
            sleep: None,
            step_budget_ms: None,
        }
    }
}

impl SpaceConfig {
    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_position_correction(mut self, mode: PositionCorrection) -> Self {
        self.position_correction = mode;
        self
    }

    pub fn with_narrow_phase(mut self, mode: NarrowPhaseMode) -> Self {
        self.narrow_phase = mode;
        self
    }

    pub fn with_sleep(mut self, policy: SleepPolicy) -> Self {
        self.sleep = Some(policy);
        self
    }

    pub fn with_step_budget(mut self, budget_ms: f32) -> Self {
        self.step_budget_ms = Some(budget_ms);
        self
    }
}
