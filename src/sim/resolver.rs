//! Contact classification and per-step ball resolution
//!
//! Each ball runs `Falling -> Settled` (touched a bin) or `Falling -> Lost`
//! (dropped below the pyramid, or stuck without descending). Contacts naming a ball
//! or bin that no longer exists are ignored.

use glam::Vec2;
use rand::Rng;

use super::body::{BallId, BodyKind};
use super::event::GameEvent;
use super::layout::{BoardGeometry, PyramidBounds};
use super::session::{BallState, Session};
use super::world::{Contact, PhysicsWorld};
use crate::config::PhysicsTuning;

/// What a contact pair means for gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    BallBin { ball: BallId, bin: usize },
    BallPeg { ball: BallId },
    /// Ball against a viewport wall or a pyramid side boundary
    BallBoundary { ball: BallId },
    Unrelated,
}

/// Classify a contact pair regardless of argument order
pub fn classify(a: BodyKind, b: BodyKind) -> Interaction {
    use BodyKind::*;
    match (a, b) {
        (Ball(ball), Bin(bin)) | (Bin(bin), Ball(ball)) => Interaction::BallBin { ball, bin },
        (Ball(ball), Peg) | (Peg, Ball(ball)) => Interaction::BallPeg { ball },
        (Ball(ball), Wall | Boundary) | (Wall | Boundary, Ball(ball)) => {
            Interaction::BallBoundary { ball }
        }
        _ => Interaction::Unrelated,
    }
}

/// Apply the state transition for one collision-start contact
pub fn resolve_contact<W: PhysicsWorld>(
    session: &mut Session,
    world: &mut W,
    geometry: &BoardGeometry,
    tuning: &PhysicsTuning,
    contact: Contact,
    events: &mut Vec<GameEvent>,
) {
    match classify(contact.a, contact.b) {
        Interaction::BallBin { ball, bin } => {
            let Some(bin) = geometry.bin(bin) else {
                log::debug!("Ignoring contact with unknown bin {}", bin);
                return;
            };
            let Some(settled) = session.settle(ball, bin) else {
                return;
            };
            world.remove_ball(ball);

            let BallState::Settled { payout, .. } = settled.state else {
                return;
            };
            log::info!(
                "{} landed in bin {} (x{}), paid {}",
                ball,
                bin.index,
                bin.multiplier,
                payout
            );
            events.push(GameEvent::BallSettled {
                ball,
                bin: bin.index,
                multiplier: bin.multiplier,
                payout,
            });
            finish_round(session, events);
        }
        Interaction::BallPeg { ball } => {
            if session.ball(ball).is_none() {
                return;
            }
            // Random left/right kick breaks symmetric trajectories and peg-top rests
            let dir = if session.rng().random_bool(0.5) { -1.0 } else { 1.0 };
            world.apply_impulse(ball, Vec2::new(dir * tuning.peg_nudge.x, tuning.peg_nudge.y));
        }
        Interaction::BallBoundary { .. } | Interaction::Unrelated => {}
    }
}

/// Per-step pass run before the world integrates.
///
/// Mirrors ball motion from the world, retires balls that fell below the
/// pyramid or stopped descending for `stall_timeout`, and applies the
/// anti-stall impulses.
pub fn pre_step<W: PhysicsWorld>(
    session: &mut Session,
    world: &mut W,
    bounds: &PyramidBounds,
    tuning: &PhysicsTuning,
    dt: f32,
    events: &mut Vec<GameEvent>,
) {
    for id in session.in_flight_ids() {
        let motion = world.ball_motion(id);
        let below = motion.is_none_or(|m| m.pos.y > bounds.bottom);
        if below {
            // A ball the world no longer tracks can never settle
            retire_lost(session, world, id, events);
            log::debug!("{} lost below the pyramid", id);
            continue;
        }
        let Some(motion) = motion else { continue };
        let Some(ball) = session.ball_mut(id) else { continue };
        ball.pos = motion.pos;
        ball.vel = motion.vel;
        let radius = ball.radius;
        let before = ball.stalled_for;
        let stalled_for = ball.track_progress(motion.pos, dt);

        if stalled_for >= tuning.stall_timeout {
            log::warn!(
                "{} stuck at ({:.1}, {:.1}) for {:.1}s, retired as lost",
                id,
                motion.pos.x,
                motion.pos.y,
                stalled_for
            );
            retire_lost(session, world, id, events);
            continue;
        }

        world.apply_impulse(id, Vec2::new(0.0, tuning.settle_accel * dt));

        let rng = session.rng();
        if motion.vel.length() < tuning.stall_speed {
            let kick = Vec2::new(
                (rng.random::<f32>() - 0.5) * tuning.unstick_impulse,
                rng.random::<f32>() * tuning.unstick_impulse,
            );
            world.apply_impulse(id, kick);
        }

        if crossed_interval(before, stalled_for, tuning.escape_after) {
            let kick = escape_kick(rng, motion.pos, radius, bounds, tuning);
            log::debug!("{} stalled, escape kick ({:.0}, {:.0})", id, kick.x, kick.y);
            world.apply_impulse(id, kick);
        }
    }
    finish_round(session, events);
}

fn retire_lost<W: PhysicsWorld>(
    session: &mut Session,
    world: &mut W,
    id: BallId,
    events: &mut Vec<GameEvent>,
) {
    world.remove_ball(id);
    if session.lose(id).is_some() {
        events.push(GameEvent::BallLost { ball: id });
    }
}

/// True when `after` reaches a multiple of `every` that `before` had not
fn crossed_interval(before: f32, after: f32, every: f32) -> bool {
    every > 0.0 && (after / every).floor() > (before / every).floor()
}

/// Kick a stalled ball up and toward the pyramid's centre line.
///
/// The base speed lifts the ball one diameter against gravity.
fn escape_kick(
    rng: &mut impl Rng,
    pos: Vec2,
    radius: f32,
    bounds: &PyramidBounds,
    tuning: &PhysicsTuning,
) -> Vec2 {
    let speed = tuning.escape_scale * (4.0 * tuning.gravity.abs() * radius).sqrt();
    let centre = (bounds.left + bounds.right) / 2.0;
    let dir = if pos.x < centre {
        1.0
    } else if pos.x > centre {
        -1.0
    } else if rng.random_bool(0.5) {
        1.0
    } else {
        -1.0
    };
    Vec2::new(
        dir * speed * rng.random_range(0.5..1.0),
        -speed * rng.random_range(0.5..1.0),
    )
}

/// Emit the round summary once nothing is in flight or pending
pub fn finish_round(session: &mut Session, events: &mut Vec<GameEvent>) {
    if let Some(summary) = session.take_completed_round() {
        log::info!(
            "Round complete: {} settled, {} lost, winnings {} (net {})",
            summary.settled,
            summary.lost,
            summary.winnings,
            summary.net()
        );
        events.push(GameEvent::RoundComplete { summary });
    }
}
