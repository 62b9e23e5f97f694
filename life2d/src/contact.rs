//! Contact callbacks delivered by rapier from inside a physics step.
//!
//! Begin-contact only enqueues; nothing that can run user code or touch
//! bodies happens while the solver is still on the stack. End-contact
//! updates the touching sets inline since that is plain bookkeeping, then
//! enqueues as well so the finish hooks run after the step.

use crossbeam_channel::Sender;
use rapier2d::prelude::*;

use crate::physics::collider_body;
use crate::registry::SharedRegistry;
use crate::shape::ShapeId;

/// A contact transition recorded during a step, drained right after it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum CollisionRecord {
    Begin(ShapeId, ShapeId),
    End(ShapeId, ShapeId),
}

pub(crate) struct ContactListener<'w> {
    registry: &'w SharedRegistry,
    queue: &'w Sender<CollisionRecord>,
}

impl<'w> ContactListener<'w> {
    pub fn new(registry: &'w SharedRegistry, queue: &'w Sender<CollisionRecord>) -> Self {
        Self { registry, queue }
    }

    fn resolve(
        &self,
        colliders: &ColliderSet,
        c1: ColliderHandle,
        c2: ColliderHandle,
    ) -> Option<(ShapeId, ShapeId)> {
        let body_a = collider_body(colliders, c1)?;
        let body_b = collider_body(colliders, c2)?;
        let registry = self.registry.read();
        let a = registry.find_by_body(body_a)?.clone();
        let b = registry.find_by_body(body_b)?.clone();
        Some((a, b))
    }

    fn begin_contact(&self, a: ShapeId, b: ShapeId) {
        log::trace!("begin contact {a} <-> {b}");
        self.enqueue(CollisionRecord::Begin(a, b));
    }

    fn end_contact(&self, a: ShapeId, b: ShapeId) {
        log::trace!("end contact {a} <-> {b}");
        {
            let mut registry = self.registry.write();
            if let Some(shape) = registry.get_mut(&a) {
                shape.finish_collide_with(&b);
            }
            if let Some(shape) = registry.get_mut(&b) {
                shape.finish_collide_with(&a);
            }
        }
        self.enqueue(CollisionRecord::End(a, b));
    }

    fn enqueue(&self, record: CollisionRecord) {
        // The receiver lives in the same World as the sender.
        if self.queue.send(record).is_err() {
            log::warn!("collision queue disconnected; contact dropped");
        }
    }
}

impl EventHandler for ContactListener<'_> {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        let Some((a, b)) = self.resolve(colliders, event.collider1(), event.collider2()) else {
            return;
        };
        if event.started() {
            self.begin_contact(a, b);
        } else {
            self.end_contact(a, b);
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}
