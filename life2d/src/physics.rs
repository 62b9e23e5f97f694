// life2d/src/physics.rs
//! Thin wrapper over rapier. Every value here is in physics units (meters,
//! radians); pixel conversion happens in `shape` and `world`.

use serde::{Deserialize, Serialize};

use crate::math::Vector2;

// Rapier is private implementation detail: do NOT re-export it.
use rapier2d::prelude::*;

/// Solver velocity iterations per step.
pub const VELOCITY_ITERATIONS: usize = 6;
/// Solver position (stabilization) iterations per step.
pub const POSITION_ITERATIONS: usize = 3;

/// Engine-facing rigid body type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RigidBodyType {
    Dynamic,
    Fixed,
}

/// Engine-facing collider shape, in meters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ColliderShape {
    Box { hx: f64, hy: f64 },
    Circle { radius: f64 },
}

/// Opaque handle to a body owned by a [`PhysicsWorld`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub(crate) RigidBodyHandle);

/// Everything needed to create one body with a single collider.
#[derive(Clone, Copy, Debug)]
pub struct BodyDesc {
    pub body_type: RigidBodyType,
    /// Center of mass position in meters.
    pub position: Vector2,
    pub rotation: f64,
    pub gravity_scale: f64,
    pub fixed_rotation: bool,
    /// Mass added on top of the collider's density-derived mass.
    pub additional_mass: f64,
    pub shape: ColliderShape,
    pub density: f64,
    pub friction: f64,
    pub restitution: f64,
    pub sensor: bool,
}

pub struct PhysicsWorld {
    // --- rapier internals ---
    pipeline: PhysicsPipeline,
    integration_parameters: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    rigid_bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,

    gravity: Vector2,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(Vector2::ZERO)
    }
}

impl PhysicsWorld {
    /// Create a world with `gravity` in m/s².
    pub fn new(gravity: Vector2) -> Self {
        let integration_parameters = IntegrationParameters {
            max_velocity_iterations: VELOCITY_ITERATIONS,
            max_stabilization_iterations: POSITION_ITERATIONS,
            ..IntegrationParameters::default()
        };

        Self {
            pipeline: PhysicsPipeline::new(),
            integration_parameters,
            island_manager: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            gravity,
        }
    }

    pub fn set_gravity(&mut self, gravity: Vector2) {
        self.gravity = gravity;
    }

    pub fn gravity(&self) -> Vector2 {
        self.gravity
    }

    /// Create a body and its single collider.
    pub fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        let rb_type = match desc.body_type {
            RigidBodyType::Dynamic => rapier2d::prelude::RigidBodyType::Dynamic,
            RigidBodyType::Fixed => rapier2d::prelude::RigidBodyType::Fixed,
        };

        let mut builder = RigidBodyBuilder::new(rb_type)
            .translation(vector![desc.position.x as Real, desc.position.y as Real])
            .rotation(desc.rotation as Real)
            .gravity_scale(desc.gravity_scale as Real);

        if desc.fixed_rotation {
            builder = builder.lock_rotations();
        }

        // Enable CCD for dynamic bodies to prevent tunneling through thin colliders
        if matches!(desc.body_type, RigidBodyType::Dynamic) {
            builder = builder
                .ccd_enabled(true)
                .additional_mass(desc.additional_mass as Real);
        }

        let handle = self.rigid_bodies.insert(builder.build());

        let collider = ColliderBuilder::new(to_rapier_shape(desc.shape))
            .density(desc.density as Real)
            .friction(desc.friction as Real)
            .restitution(desc.restitution as Real)
            .sensor(desc.sensor)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();

        self.colliders
            .insert_with_parent(collider, handle, &mut self.rigid_bodies);

        log::debug!("created {:?} body {:?}", desc.body_type, handle);
        BodyHandle(handle)
    }

    /// Remove a body and its colliders. Returns whether it existed.
    pub fn remove_body(&mut self, body: BodyHandle) -> bool {
        self.rigid_bodies
            .remove(
                body.0,
                &mut self.island_manager,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .is_some()
    }

    /// Step the simulation by `dt` seconds.
    ///
    /// Contact begin/end notifications are delivered to `events`
    /// synchronously, before this call returns.
    pub(crate) fn step(&mut self, dt: f64, events: &dyn EventHandler) {
        self.integration_parameters.dt = dt as Real;

        let gravity = vector![self.gravity.x as Real, self.gravity.y as Real];
        let hooks = &();

        self.pipeline.step(
            &gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            hooks,
            events,
        );
    }

    /// Step without observing contacts.
    pub fn step_unobserved(&mut self, dt: f64) {
        self.step(dt, &());
    }

    pub fn body_count(&self) -> usize {
        self.rigid_bodies.len()
    }

    pub fn has_body(&self, body: BodyHandle) -> bool {
        self.rigid_bodies.contains(body.0)
    }

    // ------------------------------
    // Per-body queries/actions
    // ------------------------------

    pub fn body_position(&self, body: BodyHandle) -> Option<Vector2> {
        let b = self.rigid_bodies.get(body.0)?;
        let t = b.translation();
        Some(Vector2::new(t.x as f64, t.y as f64))
    }

    pub fn body_rotation(&self, body: BodyHandle) -> Option<f64> {
        let b = self.rigid_bodies.get(body.0)?;
        Some(b.rotation().angle() as f64)
    }

    pub fn set_body_transform(&mut self, body: BodyHandle, position: Vector2, rotation: f64) {
        if let Some(b) = self.rigid_bodies.get_mut(body.0) {
            b.set_translation(vector![position.x as Real, position.y as Real], true);
            b.set_rotation(rotation as Real, true);
        }
    }

    pub fn set_body_rotation(&mut self, body: BodyHandle, rotation: f64) {
        if let Some(b) = self.rigid_bodies.get_mut(body.0) {
            b.set_rotation(rotation as Real, true);
        }
    }

    pub fn linear_velocity(&self, body: BodyHandle) -> Option<Vector2> {
        let b = self.rigid_bodies.get(body.0)?;
        let v = b.linvel();
        Some(Vector2::new(v.x as f64, v.y as f64))
    }

    pub fn set_linear_velocity(&mut self, body: BodyHandle, vel: Vector2) {
        if let Some(b) = self.rigid_bodies.get_mut(body.0) {
            b.set_linvel(vector![vel.x as Real, vel.y as Real], true);
        }
    }

    pub fn angular_velocity(&self, body: BodyHandle) -> Option<f64> {
        let b = self.rigid_bodies.get(body.0)?;
        Some(b.angvel() as f64)
    }

    pub fn mass(&self, body: BodyHandle) -> Option<f64> {
        let b = self.rigid_bodies.get(body.0)?;
        Some(b.mass() as f64)
    }

    /// Apply a linear impulse at the center of mass.
    pub fn apply_impulse(&mut self, body: BodyHandle, impulse: Vector2) {
        if let Some(b) = self.rigid_bodies.get_mut(body.0) {
            b.apply_impulse(vector![impulse.x as Real, impulse.y as Real], true);
        }
    }

    /// Lock rotations for a body (useful for platformer characters).
    pub fn lock_rotations(&mut self, body: BodyHandle, locked: bool) {
        if let Some(b) = self.rigid_bodies.get_mut(body.0) {
            b.lock_rotations(locked, true);
        }
    }

    pub fn body_type(&self, body: BodyHandle) -> Option<RigidBodyType> {
        let b = self.rigid_bodies.get(body.0)?;
        if b.is_dynamic() {
            Some(RigidBodyType::Dynamic)
        } else {
            Some(RigidBodyType::Fixed)
        }
    }

    pub fn gravity_scale(&self, body: BodyHandle) -> Option<f64> {
        let b = self.rigid_bodies.get(body.0)?;
        Some(b.gravity_scale() as f64)
    }

    /// The collider attached to `body`, as `(shape, density, is_sensor)`.
    pub fn collider(&self, body: BodyHandle) -> Option<(ColliderShape, f64, bool)> {
        let b = self.rigid_bodies.get(body.0)?;
        let handle = *b.colliders().first()?;
        let c = self.colliders.get(handle)?;
        let shape = match c.shape().as_typed_shape() {
            TypedShape::Cuboid(cuboid) => ColliderShape::Box {
                hx: cuboid.half_extents.x as f64,
                hy: cuboid.half_extents.y as f64,
            },
            TypedShape::Ball(ball) => ColliderShape::Circle {
                radius: ball.radius as f64,
            },
            _ => return None,
        };
        Some((shape, c.density() as f64, c.is_sensor()))
    }
}

/// Resolve the body a collider is attached to.
pub(crate) fn collider_body(colliders: &ColliderSet, collider: ColliderHandle) -> Option<BodyHandle> {
    colliders.get(collider)?.parent().map(BodyHandle)
}

fn to_rapier_shape(s: ColliderShape) -> SharedShape {
    match s {
        ColliderShape::Box { hx, hy } => SharedShape::cuboid(hx as Real, hy as Real),
        ColliderShape::Circle { radius } => SharedShape::ball(radius as Real),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ball(position: Vector2) -> BodyDesc {
        BodyDesc {
            body_type: RigidBodyType::Dynamic,
            position,
            rotation: 0.0,
            gravity_scale: 1.0,
            fixed_rotation: false,
            additional_mass: 1.0,
            shape: ColliderShape::Circle { radius: 1.0 },
            density: 0.0,
            friction: 0.0,
            restitution: 0.0,
            sensor: false,
        }
    }

    #[test]
    fn gravity_pulls_dynamic_bodies() {
        let mut physics = PhysicsWorld::new(Vector2::new(0.0, 10.0));
        let body = physics.create_body(&ball(Vector2::ZERO));
        for _ in 0..10 {
            physics.step_unobserved(1.0 / 60.0);
        }
        let pos = physics.body_position(body).unwrap();
        assert!(pos.y > 0.0);
        assert!(physics.mass(body).unwrap() > 0.0);
    }

    #[test]
    fn zero_gravity_scale_floats() {
        let mut physics = PhysicsWorld::new(Vector2::new(0.0, 10.0));
        let mut desc = ball(Vector2::ZERO);
        desc.gravity_scale = 0.0;
        let body = physics.create_body(&desc);
        physics.step_unobserved(1.0 / 60.0);
        assert_eq!(physics.body_position(body).unwrap(), Vector2::ZERO);
    }

    #[test]
    fn removed_bodies_are_gone() {
        let mut physics = PhysicsWorld::default();
        let body = physics.create_body(&ball(Vector2::ZERO));
        assert!(physics.has_body(body));
        assert!(physics.remove_body(body));
        assert!(!physics.remove_body(body));
        assert_eq!(physics.body_position(body), None);
        assert_eq!(physics.body_count(), 0);
    }
}
