use glam::{Mat3, Vec3};

use crate::{
    config::BIAS_FACTOR,
    core::{object::PhysicsObject, types::AngularVelocity},
    utils::allocator::{Arena, ObjectHandle},
};

/// Non-penetration constraint between two objects along `normal`.
///
/// Contact points are stored in each body's frame so the constraint keeps
/// tracking the bodies while the solver iterates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactConstraint {
    pub body1: ObjectHandle,
    pub body2: ObjectHandle,
    pub local_contact1: Vec3,
    pub local_contact2: Vec3,
    /// Unit normal pointing from `body1` toward `body2`.
    pub normal: Vec3,
    pub restitution: f32,
}

impl ContactConstraint {
    /// Builds a constraint from world-space contact points on each body.
    pub fn new(
        body1: (ObjectHandle, &PhysicsObject),
        body2: (ObjectHandle, &PhysicsObject),
        world_contact1: Vec3,
        world_contact2: Vec3,
        normal: Vec3,
    ) -> Self {
        let (h1, o1) = body1;
        let (h2, o2) = body2;
        Self {
            body1: h1,
            body2: h2,
            local_contact1: o1.orientation().inverse() * (world_contact1 - o1.position()),
            local_contact2: o2.orientation().inverse() * (world_contact2 - o2.position()),
            normal,
            restitution: o1.restitution().min(o2.restitution()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[non_exhaustive]
pub enum Constraint {
    Contact(ContactConstraint),
}

impl From<ContactConstraint> for Constraint {
    fn from(value: ContactConstraint) -> Self {
        Constraint::Contact(value)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SolverStepMetrics {
    pub constraints_solved: usize,
    pub impulses_applied: usize,
    pub normal_impulse_sum: f32,
}

pub trait ConstraintSolver {
    fn solve(
        &mut self,
        objects: &mut Arena<PhysicsObject>,
        constraints: &[Constraint],
        dt: f32,
    ) -> SolverStepMetrics;
}

/// Projected sequential impulses with a Baumgarte position bias.
#[derive(Debug, Clone)]
pub struct SequentialImpulseSolver {
    pub iterations: u32,
    pub bias_factor: f32,
}

impl Default for SequentialImpulseSolver {
    fn default() -> Self {
        Self::new(4)
    }
}

impl SequentialImpulseSolver {
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
            bias_factor: BIAS_FACTOR,
        }
    }

    /// Solves one contact and returns the applied normal impulse (zero when
    /// the contact is already separating).
    fn solve_contact(
        &self,
        a: &mut PhysicsObject,
        b: &mut PhysicsObject,
        c: &ContactConstraint,
        dt: f32,
    ) -> f32 {
        let n = c.normal;
        let r1 = a.orientation() * c.local_contact1;
        let r2 = b.orientation() * c.local_contact2;

        let inv_m1 = a.solver_inverse_mass();
        let inv_m2 = b.solver_inverse_mass();
        let inv_i1 = a.solver_inverse_inertia();
        let inv_i2 = b.solver_inverse_inertia();

        let w1 = a.angular_velocity().to_vector();
        let w2 = b.angular_velocity().to_vector();

        let k = inv_m1
            + inv_m2
            + angular_effective_mass(inv_i1, r1, n)
            + angular_effective_mass(inv_i2, r2, n);
        if k <= f32::EPSILON {
            return 0.0;
        }

        let jv = (b.velocity() + w2.cross(r2) - a.velocity() - w1.cross(r1)).dot(n);
        let separation = (b.position() + r2 - a.position() - r1).dot(n);
        let bias = separation * (self.bias_factor / dt);

        let lambda = -(bias + (1.0 + c.restitution) * jv) / k;
        if lambda <= 0.0 {
            return 0.0;
        }

        let impulse = n * lambda;
        if !a.is_static() {
            apply(a, -impulse, inv_m1, inv_i1 * r1.cross(-impulse), w1);
        }
        if !b.is_static() {
            apply(b, impulse, inv_m2, inv_i2 * r2.cross(impulse), w2);
        }
        lambda
    }
}

fn apply(object: &mut PhysicsObject, impulse: Vec3, inv_mass: f32, delta_w: Vec3, w: Vec3) {
    object.velocity += impulse * inv_mass;
    if delta_w != Vec3::ZERO {
        object.angular_velocity = AngularVelocity::from_vector(w + delta_w);
    }
}

impl ConstraintSolver for SequentialImpulseSolver {
    fn solve(
        &mut self,
        objects: &mut Arena<PhysicsObject>,
        constraints: &[Constraint],
        dt: f32,
    ) -> SolverStepMetrics {
        let mut metrics = SolverStepMetrics::default();
        if constraints.is_empty() || dt <= 0.0 {
            return metrics;
        }

        for _ in 0..self.iterations {
            for constraint in constraints {
                match constraint {
                    Constraint::Contact(contact) => {
                        let Some((a, b)) = objects.get2_mut(contact.body1, contact.body2) else {
                            log::trace!("skipping contact with a stale handle");
                            continue;
                        };
                        let lambda = self.solve_contact(a, b, contact, dt);
                        if lambda > 0.0 {
                            metrics.impulses_applied += 1;
                            metrics.normal_impulse_sum += lambda;
                        }
                    }
                }
            }
        }

        metrics.constraints_solved = constraints.len();
        metrics
    }
}

/// Effective inverse inertia along `axis` at arm `r`.
pub fn angular_effective_mass(inv_inertia: Mat3, r: Vec3, axis: Vec3) -> f32 {
    let rn = r.cross(axis);
    rn.dot(inv_inertia * rn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pair(v1: Vec3, v2: Vec3) -> (Arena<PhysicsObject>, ObjectHandle, ObjectHandle) {
        let mut arena = Arena::new();
        let mut a = PhysicsObject::new();
        a.set_position(Vec3::new(-1.0, 0.0, 0.0));
        a.set_velocity(v1);
        let mut b = PhysicsObject::new();
        b.set_position(Vec3::new(1.0, 0.0, 0.0));
        b.set_velocity(v2);
        let h1 = arena.insert(a);
        let h2 = arena.insert(b);
        (arena, h1, h2)
    }

    fn touching_contact(
        arena: &Arena<PhysicsObject>,
        h1: ObjectHandle,
        h2: ObjectHandle,
    ) -> Constraint {
        let (Some(a), Some(b)) = (arena.get(h1), arena.get(h2)) else {
            panic!("handles are live");
        };
        ContactConstraint::new((h1, a), (h2, b), Vec3::ZERO, Vec3::ZERO, Vec3::X).into()
    }

    #[test]
    fn equal_masses_swap_velocities_head_on() {
        let (mut arena, h1, h2) = pair(Vec3::X, -Vec3::X);
        let contact = touching_contact(&arena, h1, h2);
        let mut solver = SequentialImpulseSolver::default();
        let metrics = solver.solve(&mut arena, &[contact], 1.0 / 60.0);

        let a = arena.get(h1).map(|o| o.velocity()).unwrap_or_default();
        let b = arena.get(h2).map(|o| o.velocity()).unwrap_or_default();
        assert_relative_eq!(a.x, -1.0, epsilon = 1e-5);
        assert_relative_eq!(b.x, 1.0, epsilon = 1e-5);
        assert_eq!(metrics.impulses_applied, 1);
    }

    #[test]
    fn separating_contact_is_left_alone() {
        let (mut arena, h1, h2) = pair(-Vec3::X, Vec3::X);
        let contact = touching_contact(&arena, h1, h2);
        let metrics = SequentialImpulseSolver::default().solve(&mut arena, &[contact], 1.0 / 60.0);
        assert_eq!(metrics.impulses_applied, 0);
        assert_eq!(arena.get(h1).map(|o| o.velocity()), Some(-Vec3::X));
    }

    #[test]
    fn static_body_keeps_its_velocity_and_reflects_the_other() {
        let (mut arena, h1, h2) = pair(Vec3::new(2.0, 0.0, 0.0), Vec3::ZERO);
        if let Some(b) = arena.get_mut(h2) {
            b.set_static(true);
        }
        let contact = touching_contact(&arena, h1, h2);
        SequentialImpulseSolver::default().solve(&mut arena, &[contact], 1.0 / 60.0);
        let a = arena.get(h1).map(|o| o.velocity()).unwrap_or_default();
        assert_relative_eq!(a.x, -2.0, epsilon = 1e-3);
        assert_eq!(arena.get(h2).map(|o| o.velocity()), Some(Vec3::ZERO));
    }

    #[test]
    fn inelastic_contact_stops_approach() {
        let (mut arena, h1, h2) = pair(Vec3::X, -Vec3::X);
        for handle in [h1, h2] {
            if let Some(object) = arena.get_mut(handle) {
                object.set_restitution(0.0);
            }
        }
        let contact = touching_contact(&arena, h1, h2);
        SequentialImpulseSolver::default().solve(&mut arena, &[contact], 1.0 / 60.0);
        let a = arena.get(h1).map(|o| o.velocity()).unwrap_or_default();
        assert_relative_eq!(a.x, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn removed_body_is_skipped() {
        let (mut arena, h1, h2) = pair(Vec3::X, -Vec3::X);
        let contact = touching_contact(&arena, h1, h2);
        arena.remove(h2);
        let metrics = SequentialImpulseSolver::default().solve(&mut arena, &[contact], 1.0 / 60.0);
        assert_eq!(metrics.impulses_applied, 0);
    }

    #[test]
    fn effective_mass_is_zero_along_the_arm() {
        assert_eq!(angular_effective_mass(Mat3::IDENTITY, Vec3::X, Vec3::X), 0.0);
        assert_relative_eq!(angular_effective_mass(Mat3::IDENTITY, Vec3::X, Vec3::Y), 1.0);
    }
}
