//! Events emitted by the simulation for UI and logging layers

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::BallId;
use super::session::RoundSummary;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A queued ball entered the world
    BallSpawned { ball: BallId, pos: Vec2 },
    /// A ball landed in a bin and was paid
    BallSettled {
        ball: BallId,
        bin: usize,
        multiplier: u32,
        payout: u64,
    },
    /// A ball left the board without reaching a bin
    BallLost { ball: BallId },
    /// Nothing left in flight or pending
    RoundComplete { summary: RoundSummary },
    /// Board replaced; in-flight balls and pending spawns were discarded
    BoardRegenerated {
        discarded: usize,
        cancelled: usize,
        forfeited: u64,
    },
}
