//! Named-event pub/sub used by both shapes and the world.
//!
//! Listeners are invoked synchronously, in subscription order, for a single
//! event kind. Nothing is promised about ordering across kinds.

use std::collections::HashMap;
use std::sync::Arc;

use crate::math::Vector2;
use crate::shape::ShapeId;

/// Horizontal movement classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AxisX {
    Left,
    Right,
}

/// Vertical movement classification (screen Y grows downward).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AxisY {
    Up,
    Down,
}

/// Discriminant used to key listeners.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    DirectionChange,
    Collision,
    FinishCollision,
    MouseDown,
    MouseUp,
    Click,
    Custom(String),
}

/// Event payload.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    DirectionChange { x: AxisX, y: AxisY },
    Collision { a: ShapeId, b: ShapeId },
    FinishCollision { a: ShapeId, b: ShapeId },
    MouseDown { position: Vector2 },
    MouseUp { position: Vector2 },
    Click { position: Vector2 },
    Custom { name: String, payload: serde_json::Value },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::DirectionChange { .. } => EventKind::DirectionChange,
            Event::Collision { .. } => EventKind::Collision,
            Event::FinishCollision { .. } => EventKind::FinishCollision,
            Event::MouseDown { .. } => EventKind::MouseDown,
            Event::MouseUp { .. } => EventKind::MouseUp,
            Event::Click { .. } => EventKind::Click,
            Event::Custom { name, .. } => EventKind::Custom(name.clone()),
        }
    }
}

/// Subscriber callback.
pub type Listener = Arc<dyn Fn(&Event) + Send + Sync>;

/// Handle returned by [`EventEmitter::on`], used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Subscription {
    id: ListenerId,
    listener: Listener,
    once: bool,
}

#[derive(Default)]
pub struct EventEmitter {
    next_id: u64,
    listeners: HashMap<EventKind, Vec<Subscription>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to every future event of `kind`.
    pub fn on<F>(&mut self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.subscribe(kind, Arc::new(listener), false)
    }

    /// Subscribe to the next event of `kind` only.
    pub fn once<F>(&mut self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.subscribe(kind, Arc::new(listener), true)
    }

    /// Remove a listener. Returns whether it was subscribed.
    pub fn off(&mut self, kind: &EventKind, id: ListenerId) -> bool {
        let Some(subs) = self.listeners.get_mut(kind) else {
            return false;
        };
        let before = subs.len();
        subs.retain(|s| s.id != id);
        before != subs.len()
    }

    pub fn listener_count(&self, kind: &EventKind) -> usize {
        self.listeners.get(kind).map_or(0, Vec::len)
    }

    /// Snapshot the listeners for `kind`, dropping one-shot subscriptions.
    ///
    /// Callers that hold a lock on the emitter's owner take the snapshot,
    /// release the lock, then invoke.
    pub fn take_listeners(&mut self, kind: &EventKind) -> Vec<Listener> {
        let Some(subs) = self.listeners.get_mut(kind) else {
            return Vec::new();
        };
        let snapshot = subs.iter().map(|s| Arc::clone(&s.listener)).collect();
        subs.retain(|s| !s.once);
        snapshot
    }

    /// Dispatch `event` to its listeners synchronously.
    pub fn emit(&mut self, event: &Event) {
        dispatch(&self.take_listeners(&event.kind()), event);
    }

    fn subscribe(&mut self, kind: EventKind, listener: Listener, once: bool) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.entry(kind).or_default().push(Subscription {
            id,
            listener,
            once,
        });
        id
    }
}

/// Invoke a listener snapshot in order.
pub fn dispatch(listeners: &[Listener], event: &Event) {
    for listener in listeners {
        listener(event);
    }
}
