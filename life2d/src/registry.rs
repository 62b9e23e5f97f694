//! Insertion-ordered shape storage shared between the frame update and the
//! contact listener.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::physics::BodyHandle;
use crate::shape::{Shape, ShapeId};

#[derive(Default)]
pub(crate) struct Registry {
    shapes: Vec<Shape>,
}

impl Registry {
    pub fn push(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    pub fn remove(&mut self, id: &ShapeId) -> Option<Shape> {
        let index = self.shapes.iter().position(|s| s.id() == id)?;
        Some(self.shapes.remove(index))
    }

    pub fn get(&self, id: &ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id() == id)
    }

    pub fn get_mut(&mut self, id: &ShapeId) -> Option<&mut Shape> {
        self.shapes.iter_mut().find(|s| s.id() == id)
    }

    pub fn contains(&self, id: &ShapeId) -> bool {
        self.get(id).is_some()
    }

    /// Linear scan for the shape owning `body`.
    pub fn find_by_body(&self, body: BodyHandle) -> Option<&ShapeId> {
        self.shapes
            .iter()
            .find(|s| s.body() == Some(body))
            .map(Shape::id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Shape> {
        self.shapes.iter_mut()
    }

    pub fn ids(&self) -> Vec<ShapeId> {
        self.shapes.iter().map(|s| s.id().clone()).collect()
    }

    pub fn drain(&mut self) -> Vec<Shape> {
        std::mem::take(&mut self.shapes)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }
}

/// Registry behind a reader/writer lock.
///
/// Poisoning is ignored: a panicking user callback must not wedge the world.
#[derive(Default)]
pub(crate) struct SharedRegistry(RwLock<Registry>);

impl SharedRegistry {
    pub fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Exclusive access without locking, for callers holding `&mut World`.
    pub fn get_mut(&mut self) -> &mut Registry {
        self.0.get_mut().unwrap_or_else(PoisonError::into_inner)
    }
}
