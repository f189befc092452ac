//! Scripted physics world
//!
//! No gravity and no collision detection: balls drift by their velocity,
//! impulses change velocity directly, and contacts are whatever the caller
//! queued. Every mutation is recorded so tests can inspect it.

use std::collections::{BTreeMap, VecDeque};

use glam::Vec2;

use crate::sim::body::{BallId, BodyKind, StaticBody};
use crate::sim::world::{BallMotion, BallSpawn, Contact, PhysicsWorld};

#[derive(Debug, Default)]
pub struct ScriptedWorld {
    statics: Vec<StaticBody>,
    balls: BTreeMap<BallId, BallMotion>,
    /// Contacts reported by the next step
    queued: VecDeque<Contact>,
    impulses: Vec<(BallId, Vec2)>,
    removed: Vec<BallId>,
}

impl ScriptedWorld {
    /// Report a contact between `a` and `b` on the next step
    pub fn queue_contact(&mut self, a: BodyKind, b: BodyKind) {
        self.queued.push_back(Contact::new(a, b));
    }

    /// Overwrite a ball's position and velocity
    pub fn set_motion(&mut self, id: BallId, motion: BallMotion) {
        if let Some(m) = self.balls.get_mut(&id) {
            *m = motion;
        }
    }

    pub fn statics(&self) -> &[StaticBody] {
        &self.statics
    }

    pub fn count_kind(&self, pred: impl Fn(BodyKind) -> bool) -> usize {
        self.statics.iter().filter(|b| pred(b.kind)).count()
    }

    pub fn ball_count(&self) -> usize {
        self.balls.len()
    }

    pub fn removed(&self) -> &[BallId] {
        &self.removed
    }

    /// Impulses applied since the last call
    pub fn take_impulses(&mut self) -> Vec<(BallId, Vec2)> {
        std::mem::take(&mut self.impulses)
    }
}

impl PhysicsWorld for ScriptedWorld {
    fn clear(&mut self) {
        self.statics.clear();
        self.balls.clear();
        self.queued.clear();
    }

    fn add_static(&mut self, body: &StaticBody) {
        self.statics.push(*body);
    }

    fn add_ball(&mut self, id: BallId, spawn: &BallSpawn) {
        self.balls.insert(
            id,
            BallMotion {
                pos: spawn.pos,
                vel: Vec2::ZERO,
            },
        );
    }

    fn remove_ball(&mut self, id: BallId) -> bool {
        let present = self.balls.remove(&id).is_some();
        if present {
            self.removed.push(id);
        }
        present
    }

    fn apply_impulse(&mut self, id: BallId, delta_v: Vec2) {
        if let Some(m) = self.balls.get_mut(&id) {
            m.vel += delta_v;
            self.impulses.push((id, delta_v));
        }
    }

    fn ball_motion(&self, id: BallId) -> Option<BallMotion> {
        self.balls.get(&id).copied()
    }

    fn step(&mut self, dt: f32) -> Vec<Contact> {
        for m in self.balls.values_mut() {
            m.pos += m.vel * dt;
        }
        self.queued.drain(..).collect()
    }
}
