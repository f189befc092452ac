//! Plinko Drop - a pyramid-of-pegs wagering game
//!
//! Core modules:
//! - `sim`: Deterministic game core (board layout, payouts, session, event resolution)
//! - `physics`: Physics world adapters (rapier2d, scripted)
//! - `config`: Data-driven game and physics tuning
//! - `error`: Error types

pub mod config;
pub mod error;
pub mod physics;
pub mod sim;

pub use config::{GameConfig, PhysicsTuning};
pub use error::PlinkoError;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz for smooth physics)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Share of the viewport the pyramid and bins may occupy
    pub const PLAY_AREA_FRACTION: f32 = 0.8;
    /// Top margin of the pyramid, and bin height, as a share of viewport height
    pub const MARGIN_FRACTION: f32 = 0.1;
    /// Viewport wall thickness as a share of viewport width
    pub const WALL_THICKNESS_FRACTION: f32 = 0.02;
    /// Peg radius relative to ball radius
    pub const PEG_TO_BALL_RATIO: f32 = 0.5;
    /// Horizontal peg spacing in peg radii
    pub const PEG_SPACING_RADII: f32 = 6.0;
    /// Spawn jitter as a share of pyramid width (total span, so ±5%)
    pub const SPAWN_JITTER_FRACTION: f32 = 0.1;
}
