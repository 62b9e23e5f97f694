//! Life2D - a 2D platformer world over rapier physics.
//!
//! Shapes live in pixel space; their bodies live in meters. A [`World`] owns
//! both, steps the physics, replays contact notifications after the step and
//! runs the current [`Level`].

pub mod audio;
pub mod config;
mod contact;
pub mod events;
pub mod game;
pub mod input;
pub mod level;
pub mod math;
pub mod physics;
mod registry;
pub mod render;
pub mod shape;
pub mod units;
pub mod world;

pub use crate::audio::{AudioError, AudioManager, AudioProps};
pub use crate::config::WorldConfig;
pub use crate::events::{AxisX, AxisY, Event, EventEmitter, EventKind, ListenerId};
pub use crate::game::Game;
pub use crate::input::{InputSource, InputState};
pub use crate::level::{Level, LoopData};
pub use crate::math::Vector2;
pub use crate::render::{Canvas, Color, DrawOptions, Surface};
pub use crate::shape::{Direction, Pattern, Shape, ShapeId, ShapeMut, ShapeProps, ShapeType};
pub use crate::world::{World, WorldId};
pub use winit::{event::MouseButton, keyboard::KeyCode};
