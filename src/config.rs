//! Game configuration and physics tuning
//!
//! Every field has a default, so a partial JSON document only needs to name
//! the values it overrides.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::PlinkoError;
use crate::sim::world::BallMaterial;

/// Physics tuning handed to the world adapter and the event resolver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsTuning {
    /// Downward gravity in pixels/s² (screen space, y grows downward)
    pub gravity: f32,
    /// Material of every dropped ball
    pub ball: BallMaterial,
    /// Restitution of pegs
    pub peg_restitution: f32,
    /// Velocity kick applied when a ball strikes a peg (x is mirrored at random)
    pub peg_nudge: Vec2,
    /// Constant downward acceleration applied to in-flight balls (pixels/s²)
    pub settle_accel: f32,
    /// Speed below which a ball counts as stalled (pixels/s)
    pub stall_speed: f32,
    /// Magnitude of the random kick given to a stalled ball (pixels/s)
    pub unstick_impulse: f32,
    /// Seconds without descending before a ball gets an escape kick, repeated
    /// at this interval while it stays put
    pub escape_after: f32,
    /// Escape kick speed as a multiple of the launch speed that lifts a ball
    /// one diameter against gravity
    pub escape_scale: f32,
    /// Seconds without descending after which a ball is retired as lost
    pub stall_timeout: f32,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            gravity: 980.0,
            ball: BallMaterial::default(),
            peg_restitution: 0.5,
            peg_nudge: Vec2::new(40.0, -8.0),
            settle_accel: 12.0,
            stall_speed: 6.0,
            unstick_impulse: 30.0,
            escape_after: 0.5,
            escape_scale: 1.0,
            stall_timeout: 4.0,
        }
    }
}

/// Top-level game configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Balance at session start
    pub starting_balance: u64,
    /// Per-ball wager
    pub wager: u64,
    /// Balls per drop
    pub ball_count: u32,
    /// Rows of pegs
    pub pyramid_height: u32,
    /// Viewport size in pixels
    pub viewport: Vec2,
    /// Delay between successive ball injections of one drop (seconds)
    pub spawn_interval: f32,
    pub physics: PhysicsTuning,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            starting_balance: 1000,
            wager: 10,
            ball_count: 1,
            pyramid_height: 8,
            viewport: Vec2::new(1024.0, 768.0),
            spawn_interval: 0.2,
            physics: PhysicsTuning::default(),
        }
    }
}

impl GameConfig {
    /// Parse a config from JSON (missing fields fall back to defaults)
    pub fn from_json(json: &str) -> Result<Self, PlinkoError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, PlinkoError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a config file from disk
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_file(path: impl AsRef<std::path::Path>) -> Result<Self, PlinkoError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

/// Parse a user-entered count, clamped to at least 1.
///
/// Values that do not fit `T` are rejected rather than truncated.
pub fn parse_positive<T>(raw: &str) -> Option<T>
where
    T: std::str::FromStr + Ord + From<u8>,
{
    raw.trim().parse::<T>().ok().map(|v| v.max(T::from(1)))
}
