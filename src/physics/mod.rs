//! Physics world adapters
//!
//! - `rapier`: real rigid-body simulation on rapier2d
//! - `scripted`: deterministic stand-in for tests and headless replays

pub mod rapier;
pub mod scripted;

pub use rapier::RapierWorld;
pub use scripted::ScriptedWorld;
