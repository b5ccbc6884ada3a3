use glam::Vec3;

use crate::utils::allocator::ObjectHandle;

/// Two objects started touching during a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    pub first: ObjectHandle,
    pub second: ObjectHandle,
    /// World-space contact point, or the midpoint of both positions when the
    /// contact walk did not converge.
    pub global_contact: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[non_exhaustive]
pub enum Event {
    Collision(CollisionEvent),
}

impl Event {
    pub fn as_collision(&self) -> Option<&CollisionEvent> {
        match self {
            Event::Collision(event) => Some(event),
        }
    }
}

/// Callback receiving every event of a step, after the solver has run.
pub type EventHandler = Box<dyn FnMut(&Event) + Send>;
