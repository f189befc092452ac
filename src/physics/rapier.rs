//! rapier2d physics world
//!
//! Screen-space coordinates (y grows downward), so gravity is +y. Colliders
//! are labelled through a handle map rather than user data. Balls share a
//! collision group that excludes itself, so they pass through one another.

use std::collections::HashMap;
use std::sync::Mutex;

use glam::Vec2;
use rapier2d::prelude::*;

use crate::config::PhysicsTuning;
use crate::sim::body::{BallId, BodyKind, Shape, StaticBody};
use crate::sim::world::{BallMotion, BallSpawn, Contact, PhysicsWorld};

/// Collects collision-start pairs during a pipeline step
#[derive(Default)]
struct CollisionLog {
    started: Mutex<Vec<(ColliderHandle, ColliderHandle)>>,
}

impl CollisionLog {
    fn into_pairs(self) -> Vec<(ColliderHandle, ColliderHandle)> {
        self.started.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

impl EventHandler for CollisionLog {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        if let CollisionEvent::Started(a, b, _) = event {
            if let Ok(mut started) = self.started.lock() {
                started.push((a, b));
            }
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

/// Every rapier set, recreated wholesale on `clear`
struct Sets {
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd: CCDSolver,
    query_pipeline: QueryPipeline,
}

impl Sets {
    fn new() -> Self {
        Self {
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }
}

pub struct RapierWorld {
    gravity: Vector<Real>,
    params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    sets: Sets,
    peg_restitution: f32,
    labels: HashMap<ColliderHandle, BodyKind>,
    balls: HashMap<BallId, RigidBodyHandle>,
}

impl RapierWorld {
    pub fn new(tuning: &PhysicsTuning) -> Self {
        Self {
            gravity: vector![0.0, tuning.gravity],
            params: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            sets: Sets::new(),
            peg_restitution: tuning.peg_restitution,
            labels: HashMap::new(),
            balls: HashMap::new(),
        }
    }

    pub fn body_count(&self) -> usize {
        self.sets.bodies.len()
    }

    fn label_of(&self, handle: ColliderHandle) -> Option<BodyKind> {
        self.labels.get(&handle).copied()
    }
}

fn to_vector(v: Vec2) -> Vector<Real> {
    vector![v.x, v.y]
}

fn to_vec2(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

/// Balls belong to GROUP_2 and only collide with GROUP_1 (static geometry)
fn ball_groups() -> InteractionGroups {
    InteractionGroups::new(Group::GROUP_2, Group::GROUP_1)
}

impl PhysicsWorld for RapierWorld {
    fn clear(&mut self) {
        self.sets = Sets::new();
        self.labels.clear();
        self.balls.clear();
    }

    fn add_static(&mut self, body: &StaticBody) {
        let rb = RigidBodyBuilder::fixed()
            .translation(to_vector(body.shape.center()))
            .build();
        let builder = match body.shape {
            Shape::Circle { radius, .. } => ColliderBuilder::ball(radius),
            Shape::Rect { half_extents, .. } => {
                ColliderBuilder::cuboid(half_extents.x, half_extents.y)
            }
        };
        let restitution = match body.kind {
            BodyKind::Peg => self.peg_restitution,
            _ => 0.0,
        };
        let collider = builder
            .restitution(restitution)
            .collision_groups(InteractionGroups::new(Group::GROUP_1, Group::ALL))
            .build();

        let handle = self.sets.bodies.insert(rb);
        let collider_handle =
            self.sets
                .colliders
                .insert_with_parent(collider, handle, &mut self.sets.bodies);
        self.labels.insert(collider_handle, body.kind);
    }

    fn add_ball(&mut self, id: BallId, spawn: &BallSpawn) {
        let rb = RigidBodyBuilder::dynamic()
            .translation(to_vector(spawn.pos))
            .linear_damping(spawn.material.linear_damping)
            .ccd_enabled(true)
            .build();
        let collider = ColliderBuilder::ball(spawn.radius)
            .restitution(spawn.material.restitution)
            .friction(spawn.material.friction)
            .density(spawn.material.density)
            .collision_groups(ball_groups())
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();

        let handle = self.sets.bodies.insert(rb);
        let collider_handle =
            self.sets
                .colliders
                .insert_with_parent(collider, handle, &mut self.sets.bodies);
        self.labels.insert(collider_handle, BodyKind::Ball(id));
        self.balls.insert(id, handle);
    }

    fn remove_ball(&mut self, id: BallId) -> bool {
        let Some(handle) = self.balls.remove(&id) else {
            return false;
        };
        if let Some(rb) = self.sets.bodies.get(handle) {
            for collider in rb.colliders() {
                self.labels.remove(collider);
            }
        }
        self.sets
            .bodies
            .remove(
                handle,
                &mut self.sets.islands,
                &mut self.sets.colliders,
                &mut self.sets.impulse_joints,
                &mut self.sets.multibody_joints,
                true,
            )
            .is_some()
    }

    fn apply_impulse(&mut self, id: BallId, delta_v: Vec2) {
        let Some(rb) = self
            .balls
            .get(&id)
            .and_then(|h| self.sets.bodies.get_mut(*h))
        else {
            return;
        };
        let mass = rb.mass();
        rb.apply_impulse(to_vector(delta_v * mass), true);
    }

    fn ball_motion(&self, id: BallId) -> Option<BallMotion> {
        let rb = self.sets.bodies.get(*self.balls.get(&id)?)?;
        Some(BallMotion {
            pos: to_vec2(rb.translation()),
            vel: to_vec2(rb.linvel()),
        })
    }

    fn step(&mut self, dt: f32) -> Vec<Contact> {
        self.params.dt = dt;
        let log = CollisionLog::default();
        let sets = &mut self.sets;
        self.pipeline.step(
            &self.gravity,
            &self.params,
            &mut sets.islands,
            &mut sets.broad_phase,
            &mut sets.narrow_phase,
            &mut sets.bodies,
            &mut sets.colliders,
            &mut sets.impulse_joints,
            &mut sets.multibody_joints,
            &mut sets.ccd,
            Some(&mut sets.query_pipeline),
            &(),
            &log,
        );

        log.into_pairs()
            .into_iter()
            .filter_map(|(a, b)| Some(Contact::new(self.label_of(a)?, self.label_of(b)?)))
            .collect()
    }
}
