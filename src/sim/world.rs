//! Physics world adapter contract
//!
//! The simulation core never talks to a physics engine directly. It registers
//! labelled bodies, injects balls, nudges them, and reads back positions and
//! collision-start contacts through this trait.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::{BallId, BodyKind, StaticBody};

/// Physical parameters of a dropped ball
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BallMaterial {
    pub restitution: f32,
    pub friction: f32,
    pub density: f32,
    pub linear_damping: f32,
}

impl Default for BallMaterial {
    fn default() -> Self {
        Self {
            restitution: 0.3,
            friction: 0.001,
            density: 0.001,
            linear_damping: 0.05,
        }
    }
}

/// Everything needed to inject a ball
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallSpawn {
    pub pos: Vec2,
    pub radius: f32,
    pub material: BallMaterial,
}

/// Position and velocity of a ball as last integrated
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallMotion {
    pub pos: Vec2,
    pub vel: Vec2,
}

/// A collision-start pair reported by a world step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub a: BodyKind,
    pub b: BodyKind,
}

impl Contact {
    pub fn new(a: BodyKind, b: BodyKind) -> Self {
        Self { a, b }
    }
}

/// Operations the game core requires from a physics engine
pub trait PhysicsWorld {
    /// Remove every body, static and dynamic
    fn clear(&mut self);

    fn add_static(&mut self, body: &StaticBody);

    /// Inject a dynamic ball. Balls never collide with one another.
    fn add_ball(&mut self, id: BallId, spawn: &BallSpawn);

    /// Remove a ball; returns false if it was not present
    fn remove_ball(&mut self, id: BallId) -> bool;

    /// Apply an instantaneous velocity change (mass-normalised impulse)
    fn apply_impulse(&mut self, id: BallId, delta_v: Vec2);

    fn ball_motion(&self, id: BallId) -> Option<BallMotion>;

    /// Advance by `dt` seconds and return the contacts that started during the step
    fn step(&mut self, dt: f32) -> Vec<Contact>;
}
