//! Game objects: pixel-space state plus the physics body that backs it.
//!
//! A [`Shape`] is built detached, handed to [`World::register`] which creates
//! its body, and afterwards mutated through [`ShapeMut`] (or the
//! physics-taking methods directly). Calling a physics-dependent mutator on a
//! shape that has no body is a programming error and panics.
//!
//! [`World::register`]: crate::world::World::register

use std::collections::HashSet;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use glam::{DAffine2, DVec2};
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::events::{AxisX, AxisY, Event, EventEmitter, EventKind, ListenerId};
use crate::math::Vector2;
use crate::physics::{BodyDesc, BodyHandle, ColliderShape, PhysicsWorld, RigidBodyType};
use crate::render::{Color, DrawOptions, Surface, BLACK};
use crate::units::{meters_to_pixels, pixels_to_meters, DEG};
use crate::world::{World, WorldId};

/// Tag that marks world borders: always fixed, always drawn first.
pub const BORDER_TAG: &str = "border";

/// Speeds below this (px/s) leave an axis' direction unchanged.
pub const DIRECTION_EPSILON: f64 = 1.0;

const NOT_REGISTERED: &str = "Required: World::register(shape) pre-op";

const NAMES: [&str; 12] = [
    "James", "Robert", "John", "Michael", "David", "William", "Richard", "Thomas", "Charles",
    "Islam", "Mohammed", "Ramy",
];

static NEXT_SHAPE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique shape identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ShapeId(String);

impl ShapeId {
    fn generate() -> Self {
        let n = NEXT_SHAPE_ID.fetch_add(1, Ordering::Relaxed);
        ShapeId(format!("s{n:06x}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeType {
    Circle,
    Square,
    #[default]
    Rectangle,
    Line,
    Dot,
}

/// How a shape is filled.
#[derive(Clone, Debug, Default)]
pub enum Pattern {
    /// Solid `background` color.
    #[default]
    Color,
    /// Image stretched to the shape's size.
    Image(Arc<RgbaImage>),
}

/// Outline drawn behind the shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Border {
    pub width: f64,
    pub color: Color,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Flip {
    pub x: bool,
    pub y: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Collision hook: `(world, this shape, the other shape)`.
pub type CollisionHook = Arc<dyn Fn(&mut World, &ShapeId, &ShapeId) + Send + Sync>;

/// Construction options. Every `None` field takes the documented default.
#[derive(Clone, Default)]
pub struct ShapeProps {
    /// Default: rectangle.
    pub shape_type: Option<ShapeType>,
    /// Default: random given name.
    pub name: Option<String>,
    /// Default: `"unknown"`.
    pub tag: Option<String>,
    /// Top-left corner. Default: origin.
    pub position: Option<Vector2>,
    /// Default: 10.
    pub width: Option<f64>,
    /// Default: 10.
    pub height: Option<f64>,
    /// Circles only. Default: half of width, else half of height, else 20.
    pub radius: Option<f64>,
    /// Degrees. Default: 0.
    pub rotation: Option<f64>,
    pub rotation_lock: bool,
    /// Default: 1.
    pub mass: Option<f64>,
    pub z_index: i32,
    /// Default: 1.
    pub scale: Option<f64>,
    /// Default: 1.
    pub opacity: Option<f64>,
    pub pattern: Pattern,
    /// Default: opaque black.
    pub background: Option<Color>,
    pub border: Option<Border>,
    pub flip: Flip,
    pub is_body: bool,
    pub physics: bool,
    /// Default: 3.
    pub speed: Option<f64>,
    pub rebound: f64,
    pub friction: f64,
    pub ghost: bool,
    pub on_collision: Option<CollisionHook>,
    pub on_finish_collision: Option<CollisionHook>,
}

impl ShapeProps {
    pub fn rectangle(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            shape_type: Some(ShapeType::Rectangle),
            position: Some(Vector2::new(x, y)),
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    pub fn circle(radius: f64) -> Self {
        Self {
            shape_type: Some(ShapeType::Circle),
            radius: Some(radius),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_type(mut self, shape_type: ShapeType) -> Self {
        self.shape_type = Some(shape_type);
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    #[must_use]
    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Vector2::new(x, y));
        self
    }

    #[must_use]
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    #[must_use]
    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    #[must_use]
    pub fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    #[must_use]
    pub fn with_image(mut self, image: Arc<RgbaImage>) -> Self {
        self.pattern = Pattern::Image(image);
        self
    }

    /// Dynamic body affected by gravity.
    #[must_use]
    pub fn dynamic(mut self) -> Self {
        self.is_body = true;
        self.physics = true;
        self
    }

    #[must_use]
    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = Some(mass);
        self
    }

    #[must_use]
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    #[must_use]
    pub fn with_material(mut self, friction: f64, rebound: f64) -> Self {
        self.friction = friction;
        self.rebound = rebound;
        self
    }

    #[must_use]
    pub fn ghost(mut self) -> Self {
        self.ghost = true;
        self
    }

    #[must_use]
    pub fn locked_rotation(mut self) -> Self {
        self.rotation_lock = true;
        self
    }

    #[must_use]
    pub fn on_collision<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut World, &ShapeId, &ShapeId) + Send + Sync + 'static,
    {
        self.on_collision = Some(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn on_finish_collision<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut World, &ShapeId, &ShapeId) + Send + Sync + 'static,
    {
        self.on_finish_collision = Some(Arc::new(hook));
        self
    }
}

/// Cached solid fill, rebuilt when color or size changes.
struct FillCache {
    color: Color,
    width: u32,
    height: u32,
    round: bool,
    image: RgbaImage,
}

pub struct Shape {
    id: ShapeId,
    pub name: String,
    pub tag: String,
    shape_type: ShapeType,

    x: f64,
    y: f64,
    width: f64,
    height: f64,
    radius: f64,
    /// Radians.
    rotation: f64,
    angular_velocity: f64,
    rotation_lock: bool,
    mass: f64,
    pub z_index: i32,
    scale: f64,
    pub opacity: f64,

    pub pattern: Pattern,
    background: Color,
    pub border: Option<Border>,
    pub flip: Flip,

    is_body: bool,
    physics: bool,
    velocity: Vector2,
    pub speed: f64,
    rebound: f64,
    friction: f64,
    ghost: bool,
    body: Option<BodyHandle>,
    world: Option<WorldId>,

    collision_objects: Vec<ShapeId>,
    no_collide: HashSet<ShapeId>,
    on_collision: Option<CollisionHook>,
    on_finish_collision: Option<CollisionHook>,

    events: EventEmitter,
    pub(crate) clicked: bool,
    direction_x: Option<AxisX>,
    direction_y: Option<AxisY>,
    fill_cache: Option<FillCache>,
}

impl Shape {
    pub fn new(props: ShapeProps) -> Self {
        let shape_type = props.shape_type.unwrap_or_default();
        let mut width = props.width.unwrap_or(10.0);
        let mut height = props.height.unwrap_or(10.0);

        let radius = match shape_type {
            ShapeType::Circle => props
                .radius
                .or(props.width.map(|w| w / 2.0))
                .or(props.height.map(|h| h / 2.0))
                .unwrap_or(20.0),
            _ => 0.0,
        };
        if shape_type == ShapeType::Circle {
            width = radius * 2.0;
            height = radius * 2.0;
        }

        let position = props.position.unwrap_or_default();

        Self {
            id: ShapeId::generate(),
            name: props.name.unwrap_or_else(random_name),
            tag: props.tag.unwrap_or_else(|| "unknown".to_string()),
            shape_type,
            x: position.x,
            y: position.y,
            width,
            height,
            radius,
            rotation: props.rotation.unwrap_or(0.0) * DEG,
            angular_velocity: 0.0,
            rotation_lock: props.rotation_lock,
            mass: props.mass.unwrap_or(1.0),
            z_index: props.z_index,
            scale: props.scale.unwrap_or(1.0),
            opacity: props.opacity.unwrap_or(1.0),
            pattern: props.pattern,
            background: props.background.unwrap_or(BLACK),
            border: props.border,
            flip: props.flip,
            is_body: props.is_body,
            physics: props.physics,
            velocity: Vector2::ZERO,
            speed: props.speed.unwrap_or(3.0),
            rebound: props.rebound,
            friction: props.friction,
            ghost: props.ghost,
            body: None,
            world: None,
            collision_objects: Vec::new(),
            no_collide: HashSet::new(),
            on_collision: props.on_collision,
            on_finish_collision: props.on_finish_collision,
            events: EventEmitter::new(),
            clicked: false,
            direction_x: None,
            direction_y: None,
            fill_cache: None,
        }
    }

    // ------------------------------
    // Accessors
    // ------------------------------

    pub fn id(&self) -> &ShapeId {
        &self.id
    }

    pub fn shape_type(&self) -> ShapeType {
        self.shape_type
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    /// Top-left corner in pixels.
    pub fn position(&self) -> Vector2 {
        Vector2::new(self.x, self.y)
    }

    pub fn center(&self) -> Vector2 {
        Vector2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Radians.
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn angular_velocity(&self) -> f64 {
        self.angular_velocity
    }

    /// Pixels per second, as of the last sync with the body.
    pub fn velocity(&self) -> Vector2 {
        self.velocity
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn is_body(&self) -> bool {
        self.is_body
    }

    pub fn has_physics(&self) -> bool {
        self.physics
    }

    pub fn is_ghost(&self) -> bool {
        self.ghost
    }

    pub fn is_rotation_locked(&self) -> bool {
        self.rotation_lock
    }

    pub fn friction(&self) -> f64 {
        self.friction
    }

    pub fn rebound(&self) -> f64 {
        self.rebound
    }

    pub fn body(&self) -> Option<BodyHandle> {
        self.body
    }

    pub fn world_id(&self) -> Option<WorldId> {
        self.world
    }

    pub fn is_registered(&self) -> bool {
        self.body.is_some()
    }

    pub fn is_border(&self) -> bool {
        self.tag == BORDER_TAG
    }

    pub fn is_clicked(&self) -> bool {
        self.clicked
    }

    pub fn directions(&self) -> (Option<AxisX>, Option<AxisY>) {
        (self.direction_x, self.direction_y)
    }

    /// Whether `point` is inside the axis-aligned bounding box (edges included).
    pub fn contains_point(&self, point: Vector2) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    // ------------------------------
    // Events and hooks
    // ------------------------------

    pub fn on<F>(&mut self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.events.on(kind, listener)
    }

    pub fn events_mut(&mut self) -> &mut EventEmitter {
        &mut self.events
    }

    pub fn set_on_collision<F>(&mut self, hook: F)
    where
        F: Fn(&mut World, &ShapeId, &ShapeId) + Send + Sync + 'static,
    {
        self.on_collision = Some(Arc::new(hook));
    }

    pub fn set_on_finish_collision<F>(&mut self, hook: F)
    where
        F: Fn(&mut World, &ShapeId, &ShapeId) + Send + Sync + 'static,
    {
        self.on_finish_collision = Some(Arc::new(hook));
    }

    pub(crate) fn collision_hook(&self) -> Option<CollisionHook> {
        self.on_collision.clone()
    }

    pub(crate) fn finish_collision_hook(&self) -> Option<CollisionHook> {
        self.on_finish_collision.clone()
    }

    // ------------------------------
    // Collision bookkeeping
    // ------------------------------

    pub fn collision_objects(&self) -> &[ShapeId] {
        &self.collision_objects
    }

    pub fn collide_with(&mut self, other: &ShapeId) {
        if !self.collision_objects.contains(other) {
            self.collision_objects.push(other.clone());
        }
    }

    pub fn finish_collide_with(&mut self, other: &ShapeId) {
        self.collision_objects.retain(|id| id != other);
    }

    pub fn is_colliding_with(&self, other: &ShapeId) -> bool {
        self.collision_objects.contains(other)
    }

    pub fn should_collide_with(&self, other: &ShapeId) -> bool {
        !self.no_collide.contains(other)
    }

    /// Ids this shape refuses collision notifications from.
    pub fn no_collide_set(&self) -> &HashSet<ShapeId> {
        &self.no_collide
    }

    /// One side of a symmetric opt-out; the world sets the mirror entry.
    pub(crate) fn suppress_collision_with(&mut self, other: &ShapeId) {
        self.no_collide.insert(other.clone());
    }

    pub(crate) fn allow_collision_with(&mut self, other: &ShapeId) {
        self.no_collide.remove(other);
    }

    // ------------------------------
    // Registration
    // ------------------------------

    /// Physics description of this shape, converted to meters.
    ///
    /// Panics if a box-shaped body would have a non-positive side.
    pub fn body_desc(&self) -> BodyDesc {
        let body_type = if !self.is_body || self.is_border() {
            RigidBodyType::Fixed
        } else {
            RigidBodyType::Dynamic
        };

        let shape = match self.shape_type {
            ShapeType::Circle => ColliderShape::Circle {
                radius: pixels_to_meters(self.radius),
            },
            _ => {
                if self.width <= 0.0 || self.height <= 0.0 {
                    panic!("Width and Height must be greater than 0 for rectangle shapes");
                }
                ColliderShape::Box {
                    hx: pixels_to_meters(self.width / 2.0),
                    hy: pixels_to_meters(self.height / 2.0),
                }
            }
        };

        let center = self.center();
        BodyDesc {
            body_type,
            position: Vector2::new(pixels_to_meters(center.x), pixels_to_meters(center.y)),
            rotation: self.rotation,
            gravity_scale: if self.physics { 1.0 } else { 0.0 },
            fixed_rotation: self.rotation_lock,
            additional_mass: if self.mass > 0.0 { self.mass } else { 1.0 },
            shape,
            density: if self.physics { 0.0 } else { 1.0 },
            friction: self.friction,
            restitution: self.rebound,
            sensor: self.ghost,
        }
    }

    /// Bind this shape to a world and its freshly created body. Once only.
    pub(crate) fn attach(&mut self, world: WorldId, body: BodyHandle) {
        if self.world.is_some() {
            panic!("shape {} is already registered with a world", self.id);
        }
        self.world = Some(world);
        self.body = Some(body);
    }

    /// Forget the body; the world destroys it.
    pub(crate) fn detach(&mut self) -> Option<BodyHandle> {
        self.collision_objects.clear();
        self.body.take()
    }

    fn require_body(&self) -> BodyHandle {
        match self.body {
            Some(body) => body,
            None => panic!("{NOT_REGISTERED}"),
        }
    }

    // ------------------------------
    // Physics-backed mutators
    // ------------------------------

    fn write_transform(&mut self, physics: &mut PhysicsWorld) {
        let body = self.require_body();
        let center = self.center();
        physics.set_body_transform(
            body,
            Vector2::new(pixels_to_meters(center.x), pixels_to_meters(center.y)),
            self.rotation,
        );
    }

    pub fn set_x(&mut self, physics: &mut PhysicsWorld, x: f64) {
        self.require_body();
        self.x = x;
        self.write_transform(physics);
    }

    pub fn set_y(&mut self, physics: &mut PhysicsWorld, y: f64) {
        self.require_body();
        self.y = y;
        self.write_transform(physics);
    }

    pub fn set_position(&mut self, physics: &mut PhysicsWorld, x: f64, y: f64) {
        self.require_body();
        self.x = x;
        self.y = y;
        self.write_transform(physics);
    }

    /// Absolute rotation, in degrees.
    pub fn set_rotation(&mut self, physics: &mut PhysicsWorld, degrees: f64) {
        let body = self.require_body();
        self.rotation = degrees * DEG;
        physics.set_body_rotation(body, self.rotation);
    }

    /// Rotate by `degrees` relative to the body's current angle.
    pub fn rotate(&mut self, physics: &mut PhysicsWorld, degrees: f64) {
        let body = self.require_body();
        let current = physics.body_rotation(body).unwrap_or(self.rotation);
        self.rotation = current + degrees * DEG;
        physics.set_body_rotation(body, self.rotation);
    }

    pub fn lock_rotation(&mut self, physics: &mut PhysicsWorld, lock: bool) {
        let body = self.require_body();
        self.rotation_lock = lock;
        physics.lock_rotations(body, lock);
    }

    /// Velocity in pixels per second.
    pub fn set_velocity(&mut self, physics: &mut PhysicsWorld, x: f64, y: f64) {
        let body = self.require_body();
        physics.set_linear_velocity(body, Vector2::new(pixels_to_meters(x), pixels_to_meters(y)));
        self.velocity = Vector2::new(x, y);
    }

    pub fn set_x_velocity(&mut self, physics: &mut PhysicsWorld, x: f64) {
        let body = self.require_body();
        let current = physics.linear_velocity(body).unwrap_or_default();
        physics.set_linear_velocity(body, Vector2::new(pixels_to_meters(x), current.y));
        self.velocity.x = x;
    }

    pub fn set_y_velocity(&mut self, physics: &mut PhysicsWorld, y: f64) {
        let body = self.require_body();
        let current = physics.linear_velocity(body).unwrap_or_default();
        physics.set_linear_velocity(body, Vector2::new(current.x, pixels_to_meters(y)));
        self.velocity.y = y;
    }

    /// Upward velocity kick (screen Y grows downward).
    pub fn jump(&mut self, physics: &mut PhysicsWorld, height: f64) {
        self.set_y_velocity(physics, -height);
    }

    /// Push along `degrees` (0 = +X) with `speed`, defaulting to the shape's own.
    ///
    /// The cached pixel position is nudged immediately so the move shows up
    /// this frame rather than after the next step.
    pub fn move_theta(&mut self, physics: &mut PhysicsWorld, degrees: f64, speed: Option<f64>) {
        let body = self.require_body();
        let speed = speed.unwrap_or(self.speed);
        let dir = Vector2::from_angle(degrees * DEG);
        physics.apply_impulse(body, dir * pixels_to_meters(speed));
        self.x += dir.x * speed;
        self.y += dir.y * speed;
    }

    /// Head toward `target` (top-left corner) at this shape's speed.
    pub fn follow(&mut self, physics: &mut PhysicsWorld, target: Vector2) {
        let angle = (target.y - self.y).atan2(target.x - self.x);
        self.set_velocity(physics, angle.cos() * self.speed, angle.sin() * self.speed);
    }

    pub fn move_in(&mut self, physics: &mut PhysicsWorld, direction: Direction) {
        match direction {
            Direction::Up => self.set_y_velocity(physics, -self.speed),
            Direction::Down => self.set_y_velocity(physics, self.speed),
            Direction::Left => self.set_x_velocity(physics, -self.speed),
            Direction::Right => self.set_x_velocity(physics, self.speed),
        }
    }

    // ------------------------------
    // Cosmetic state
    // ------------------------------

    /// Changing the color drops the cached fill.
    pub fn set_background(&mut self, color: Color) {
        self.background = color;
        self.fill_cache = None;
    }

    /// Visual scale only; the collider keeps its registered size.
    pub fn set_scale(&mut self, scale: f64) {
        self.scale = scale;
    }

    // ------------------------------
    // Frame sync
    // ------------------------------

    /// Per-frame sync, called by the world after collision dispatch.
    ///
    /// Classifies movement direction from the cached velocity, then pulls
    /// position, rotation, velocities and mass back from the body. Returns the
    /// direction-change event to emit, if an axis flipped while both axes
    /// have a known direction.
    pub fn update(&mut self, physics: &PhysicsWorld) -> Option<Event> {
        let event = self.update_direction();
        self.pull_from_body(physics);
        event
    }

    fn update_direction(&mut self) -> Option<Event> {
        let mut flipped = false;

        if self.velocity.x.abs() >= DIRECTION_EPSILON {
            let next = if self.velocity.x < 0.0 { AxisX::Left } else { AxisX::Right };
            flipped |= self.direction_x != Some(next);
            self.direction_x = Some(next);
        }

        if self.velocity.y.abs() >= DIRECTION_EPSILON {
            let next = if self.velocity.y < 0.0 { AxisY::Up } else { AxisY::Down };
            flipped |= self.direction_y != Some(next);
            self.direction_y = Some(next);
        }

        match (flipped, self.direction_x, self.direction_y) {
            (true, Some(x), Some(y)) => Some(Event::DirectionChange { x, y }),
            _ => None,
        }
    }

    fn pull_from_body(&mut self, physics: &PhysicsWorld) {
        let body = self.require_body();
        if let Some(center) = physics.body_position(body) {
            self.x = meters_to_pixels(center.x) - self.width / 2.0;
            self.y = meters_to_pixels(center.y) - self.height / 2.0;
        }
        if let Some(angle) = physics.body_rotation(body) {
            self.rotation = angle;
        }
        if let Some(w) = physics.angular_velocity(body) {
            self.angular_velocity = w;
        }
        if let Some(v) = physics.linear_velocity(body) {
            self.velocity = Vector2::new(meters_to_pixels(v.x), meters_to_pixels(v.y));
        }
        self.mass = match physics.mass(body) {
            Some(m) if m > 0.0 => m,
            _ => 1.0,
        };
    }

    // ------------------------------
    // Drawing
    // ------------------------------

    pub fn draw(&mut self, surface: &mut dyn Surface) {
        if self.opacity <= 0.0 {
            return;
        }

        if let Some(border) = self.border.filter(|b| b.width > 0.0) {
            let outline = RgbaImage::from_pixel(
                (self.width + border.width * 2.0).round() as u32,
                (self.height + border.width * 2.0).round() as u32,
                border.color,
            );
            surface.draw_image(
                &outline,
                &DrawOptions::translated(self.x - border.width, self.y - border.width),
            );
        }

        let (fill_w, fill_h, round) = match self.shape_type {
            ShapeType::Rectangle | ShapeType::Line => (self.width, self.height, false),
            ShapeType::Square => {
                let size = self.width.max(self.height);
                (size, size, false)
            }
            ShapeType::Circle => (self.radius * 2.0, self.radius * 2.0, true),
            ShapeType::Dot => (self.width, self.height, true),
        };

        let image = match &self.pattern {
            Pattern::Image(image) => Some(Arc::clone(image)),
            Pattern::Color => None,
        };
        match image {
            Some(image) => {
                let options = self.draw_options(image.width() as f64, image.height() as f64);
                surface.draw_image(&image, &options);
            }
            None => {
                let options = self.draw_options(fill_w, fill_h);
                let fill = self.fill_image(fill_w.round() as u32, fill_h.round() as u32, round);
                surface.draw_image(fill, &options);
            }
        }
    }

    /// Center-origin shift, flip, image-to-shape scale, user scale, rotation,
    /// translate to the shape's center, opacity.
    fn draw_options(&self, source_w: f64, source_h: f64) -> DrawOptions {
        let mut sx = if self.flip.x { -1.0 } else { 1.0 };
        let mut sy = if self.flip.y { -1.0 } else { 1.0 };

        if matches!(self.pattern, Pattern::Image(_)) && source_w > 0.0 && source_h > 0.0 {
            sx *= self.width / source_w;
            sy *= self.height / source_h;
        }

        sx *= self.scale;
        sy *= self.scale;

        let center = self.center();
        let transform = DAffine2::from_translation(DVec2::new(center.x, center.y))
            * DAffine2::from_angle(self.rotation)
            * DAffine2::from_scale(DVec2::new(sx, sy))
            * DAffine2::from_translation(DVec2::new(-source_w / 2.0, -source_h / 2.0));

        DrawOptions {
            transform,
            opacity: self.opacity.min(1.0),
        }
    }

    fn fill_image(&mut self, width: u32, height: u32, round: bool) -> &RgbaImage {
        let stale = match &self.fill_cache {
            Some(c) => {
                c.color != self.background || c.width != width || c.height != height || c.round != round
            }
            None => true,
        };
        if stale {
            self.fill_cache = None;
        }
        let color = self.background;
        let cache = self.fill_cache.get_or_insert_with(|| FillCache {
            color,
            width,
            height,
            round,
            image: if round {
                circle_image(width, height, color)
            } else {
                RgbaImage::from_pixel(width, height, color)
            },
        });
        &cache.image
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shape")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("tag", &self.tag)
            .field("type", &self.shape_type)
            .field("x", &self.x)
            .field("y", &self.y)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

fn circle_image(width: u32, height: u32, color: Color) -> RgbaImage {
    let rx = width as f64 / 2.0;
    let ry = height as f64 / 2.0;
    RgbaImage::from_fn(width, height, |x, y| {
        let dx = (x as f64 + 0.5 - rx) / rx.max(f64::EPSILON);
        let dy = (y as f64 + 0.5 - ry) / ry.max(f64::EPSILON);
        if dx * dx + dy * dy <= 1.0 {
            color
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

fn random_name() -> String {
    NAMES[fastrand::usize(..NAMES.len())].to_string()
}

/// A registered shape together with the physics world that owns its body.
pub struct ShapeMut<'w> {
    shape: &'w mut Shape,
    physics: &'w mut PhysicsWorld,
}

impl<'w> ShapeMut<'w> {
    pub(crate) fn new(shape: &'w mut Shape, physics: &'w mut PhysicsWorld) -> Self {
        Self { shape, physics }
    }

    pub fn set_x(&mut self, x: f64) {
        self.shape.set_x(self.physics, x);
    }

    pub fn set_y(&mut self, y: f64) {
        self.shape.set_y(self.physics, y);
    }

    pub fn set_position(&mut self, x: f64, y: f64) {
        self.shape.set_position(self.physics, x, y);
    }

    pub fn set_rotation(&mut self, degrees: f64) {
        self.shape.set_rotation(self.physics, degrees);
    }

    pub fn rotate(&mut self, degrees: f64) {
        self.shape.rotate(self.physics, degrees);
    }

    pub fn lock_rotation(&mut self, lock: bool) {
        self.shape.lock_rotation(self.physics, lock);
    }

    pub fn set_velocity(&mut self, x: f64, y: f64) {
        self.shape.set_velocity(self.physics, x, y);
    }

    pub fn set_x_velocity(&mut self, x: f64) {
        self.shape.set_x_velocity(self.physics, x);
    }

    pub fn set_y_velocity(&mut self, y: f64) {
        self.shape.set_y_velocity(self.physics, y);
    }

    pub fn jump(&mut self, height: f64) {
        self.shape.jump(self.physics, height);
    }

    pub fn move_theta(&mut self, degrees: f64, speed: Option<f64>) {
        self.shape.move_theta(self.physics, degrees, speed);
    }

    pub fn move_in(&mut self, direction: Direction) {
        self.shape.move_in(self.physics, direction);
    }

    pub fn follow(&mut self, target: Vector2) {
        self.shape.follow(self.physics, target);
    }

    /// Dispatch a custom event to this shape's listeners.
    pub fn emit(&mut self, name: impl Into<String>, payload: serde_json::Value) {
        self.shape.events.emit(&Event::Custom {
            name: name.into(),
            payload,
        });
    }
}

impl Deref for ShapeMut<'_> {
    type Target = Shape;

    fn deref(&self) -> &Shape {
        self.shape
    }
}

impl DerefMut for ShapeMut<'_> {
    fn deref_mut(&mut self) -> &mut Shape {
        self.shape
    }
}
