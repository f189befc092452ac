//! Deterministic game core
//!
//! Board layout, payouts, wagers and contact resolution live here. The module
//! never touches a physics engine directly:
//! - Physics goes through the `PhysicsWorld` trait
//! - Seeded RNG only
//! - Stable iteration order (by ball ID)
//! - No rendering or platform dependencies

pub mod body;
pub mod event;
pub mod game;
pub mod layout;
pub mod multiplier;
pub mod resolver;
pub mod session;
pub mod world;

pub use body::{BallId, BodyKind, Shape, StaticBody};
pub use event::GameEvent;
pub use game::Game;
pub use layout::{Bin, BoardConfig, BoardGeometry, PegPosition, PyramidBounds, generate};
pub use multiplier::multiplier_for;
pub use resolver::{Interaction, classify};
pub use session::{
    Ball, BallState, Discarded, DropTicket, PendingSpawn, RoundSummary, Session, SpawnQueue,
    place_wager,
};
pub use world::{BallMaterial, BallMotion, BallSpawn, Contact, PhysicsWorld};
