//! Simulation dynamics: forces, pose integration and the contact solver.

pub mod forces;
pub mod integrator;
pub mod solver;

pub use forces::{
    Force, ForceStore, FrictionForce, GravityForce, LinearForce, PointForce, TorqueForce,
};
pub use integrator::Integrator;
pub use solver::{
    ConstraintSolver, Constraint, ContactConstraint, SequentialImpulseSolver, SolverStepMetrics,
};
