//! Body classification
//!
//! Every body handed to the physics world carries a `BodyKind` tag fixed at
//! creation time. Contacts are dispatched by matching on these tags.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Unique ball identifier (monotonic per session)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BallId(pub u32);

impl std::fmt::Display for BallId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ball#{}", self.0)
    }
}

/// Classification label attached to every simulated body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyKind {
    /// Viewport edge wall
    Wall,
    /// Invisible side boundary of the pyramid
    Boundary,
    Peg,
    /// Scoring bin by index (0 = leftmost)
    Bin(usize),
    Ball(BallId),
}

/// Collision shape of a static body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle { center: Vec2, radius: f32 },
    /// Axis-aligned rectangle
    Rect { center: Vec2, half_extents: Vec2 },
}

impl Shape {
    pub fn rect(center: Vec2, size: Vec2) -> Self {
        Shape::Rect {
            center,
            half_extents: size / 2.0,
        }
    }

    pub fn center(&self) -> Vec2 {
        match *self {
            Shape::Circle { center, .. } | Shape::Rect { center, .. } => center,
        }
    }
}

/// A static body description handed to the physics world
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaticBody {
    pub kind: BodyKind,
    pub shape: Shape,
    /// Renderers skip invisible bodies
    pub visible: bool,
}
