//! Levels: an optional ASCII map plus lifecycle hooks. Pure data; the world
//! runs them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::math::Vector2;
use crate::render::Surface;
use crate::world::World;

/// Per-frame timing handed to tick hooks.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LoopData {
    /// Seconds since the previous update.
    pub delta: f64,
    /// Seconds accumulated since the world was created.
    pub elapsed: f64,
    /// Updates run so far, this one included.
    pub frame: u64,
}

/// Tile placement: `(world, top-left pixel position, tile width, tile height)`.
pub type TileFn = Arc<dyn Fn(&mut World, Vector2, f64, f64) + Send + Sync>;
pub type LevelFn = Arc<dyn Fn(&mut World) + Send + Sync>;
pub type TickFn = Arc<dyn Fn(&mut World, &LoopData) + Send + Sync>;
pub type RenderFn = Arc<dyn Fn(&World, &mut dyn Surface) + Send + Sync>;

#[derive(Clone, Default)]
pub struct Level {
    pub name: String,
    /// Rows of tile characters, top to bottom.
    pub map: Option<Vec<String>>,
    pub tiles: HashMap<char, TileFn>,
    pub init: Option<LevelFn>,
    pub tick: Option<TickFn>,
    pub render: Option<RenderFn>,
    /// Runs on the outgoing level when another one is selected.
    pub on_destroy: Option<LevelFn>,
}

impl Level {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_map<S: AsRef<str>>(mut self, rows: &[S]) -> Self {
        self.map = Some(rows.iter().map(|r| r.as_ref().to_string()).collect());
        self
    }

    /// Handler for every occurrence of `ch` in the map.
    #[must_use]
    pub fn with_tile<F>(mut self, ch: char, handler: F) -> Self
    where
        F: Fn(&mut World, Vector2, f64, f64) + Send + Sync + 'static,
    {
        self.tiles.insert(ch, Arc::new(handler));
        self
    }

    #[must_use]
    pub fn on_init<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut World) + Send + Sync + 'static,
    {
        self.init = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_tick<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut World, &LoopData) + Send + Sync + 'static,
    {
        self.tick = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_render<F>(mut self, f: F) -> Self
    where
        F: Fn(&World, &mut dyn Surface) + Send + Sync + 'static,
    {
        self.render = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_destroy<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut World) + Send + Sync + 'static,
    {
        self.on_destroy = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tiles: Vec<_> = self.tiles.keys().copied().collect();
        tiles.sort_unstable();
        f.debug_struct("Level")
            .field("name", &self.name)
            .field("map", &self.map)
            .field("tiles", &tiles)
            .field("init", &self.init.is_some())
            .field("tick", &self.tick.is_some())
            .field("render", &self.render.is_some())
            .field("on_destroy", &self.on_destroy.is_some())
            .finish()
    }
}
