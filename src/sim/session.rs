//! Session state: balance, wagers, in-flight balls and the spawn queue
//!
//! The balance moves in exactly two places: `drop_balls` debits the whole
//! wager up front, and `settle` credits one ball's payout.

use std::collections::{BTreeMap, VecDeque};

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::body::BallId;
use super::layout::Bin;
use crate::config::GameConfig;
use crate::error::PlinkoError;

/// Lifecycle of a ball
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BallState {
    Falling,
    /// Landed in a bin and paid out (terminal)
    Settled { bin: usize, payout: u64 },
    /// Left the board without reaching a bin (terminal, no payout)
    Lost,
}

/// A ball in play
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub id: BallId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Amount staked on this ball at drop time
    pub wager: u64,
    pub state: BallState,
    /// Lowest point reached so far (largest y)
    pub deepest: f32,
    /// Seconds since the ball last descended by one radius
    pub stalled_for: f32,
}

impl Ball {
    /// Record the ball's position after one step of `dt` seconds.
    ///
    /// Returns the updated stall time. Descending one radius below the
    /// deepest point so far clears it; bouncing up or sideways does not.
    pub fn track_progress(&mut self, pos: Vec2, dt: f32) -> f32 {
        if pos.y >= self.deepest + self.radius {
            self.deepest = pos.y;
            self.stalled_for = 0.0;
        } else {
            self.stalled_for += dt;
        }
        self.stalled_for
    }
}

/// A ball waiting to be injected
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendingSpawn {
    /// Session clock time (seconds) at which to inject
    pub due: f64,
    pub wager: u64,
}

/// Time-ordered queue of pending ball injections
#[derive(Debug, Clone, Default)]
pub struct SpawnQueue {
    pending: VecDeque<PendingSpawn>,
}

impl SpawnQueue {
    pub fn schedule(&mut self, spawn: PendingSpawn) {
        // Stable insert keeps spawns with equal due times in scheduling order
        let at = self.pending.partition_point(|p| p.due <= spawn.due);
        self.pending.insert(at, spawn);
    }

    /// Pop every spawn due at or before `now`
    pub fn pop_due(&mut self, now: f64) -> Vec<PendingSpawn> {
        let mut due = Vec::new();
        while self.pending.front().is_some_and(|p| p.due <= now) {
            due.extend(self.pending.pop_front());
        }
        due
    }

    /// Cancel all pending spawns, returning them
    pub fn cancel_all(&mut self) -> Vec<PendingSpawn> {
        self.pending.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Tally of one round (first drop until nothing is in flight or pending)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub dropped: u32,
    pub settled: u32,
    pub lost: u32,
    pub wagered: u64,
    pub winnings: u64,
}

impl RoundSummary {
    /// Winnings minus wagers (negative when the house won)
    pub fn net(&self) -> i128 {
        self.winnings as i128 - self.wagered as i128
    }
}

/// Result of a successful drop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropTicket {
    pub new_balance: u64,
    pub scheduled: u32,
}

/// What a reset threw away
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Discarded {
    pub balls: Vec<Ball>,
    pub cancelled: usize,
    /// Wagers already debited for the discarded and cancelled balls
    pub forfeited: u64,
}

/// Debit `wager * ball_count` from `balance`.
///
/// Returns the new balance, or `InsufficientFunds` when the total exceeds the
/// balance (an overflowing total never fits).
pub fn place_wager(wager: u64, ball_count: u32, balance: u64) -> Result<u64, PlinkoError> {
    let required = wager.checked_mul(ball_count as u64).unwrap_or(u64::MAX);
    balance
        .checked_sub(required)
        .ok_or(PlinkoError::InsufficientFunds {
            required,
            available: balance,
        })
}

/// Mutable game session
#[derive(Debug, Clone)]
pub struct Session {
    balance: u64,
    wager: u64,
    ball_count: u32,
    spawn_interval: f32,
    /// Simulation time in seconds. f64 so long sessions keep advancing.
    clock: f64,
    /// Balls in flight, ordered by id for deterministic iteration
    in_flight: BTreeMap<BallId, Ball>,
    spawns: SpawnQueue,
    round: RoundSummary,
    rng: Pcg32,
    next_id: u32,
}

impl Session {
    pub fn new(config: &GameConfig, seed: u64) -> Self {
        Self {
            balance: config.starting_balance,
            wager: config.wager,
            ball_count: config.ball_count,
            spawn_interval: config.spawn_interval,
            clock: 0.0,
            in_flight: BTreeMap::new(),
            spawns: SpawnQueue::default(),
            round: RoundSummary::default(),
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        }
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn wager(&self) -> u64 {
        self.wager
    }

    pub fn set_wager(&mut self, amount: u64) {
        self.wager = amount;
    }

    pub fn ball_count(&self) -> u32 {
        self.ball_count
    }

    pub fn set_ball_count(&mut self, count: u32) {
        self.ball_count = count;
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn advance(&mut self, dt: f32) {
        self.clock += f64::from(dt);
    }

    pub fn round(&self) -> &RoundSummary {
        &self.round
    }

    pub fn pending_spawns(&self) -> usize {
        self.spawns.len()
    }

    pub fn in_flight(&self) -> impl Iterator<Item = &Ball> {
        self.in_flight.values()
    }

    pub fn in_flight_ids(&self) -> Vec<BallId> {
        self.in_flight.keys().copied().collect()
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn ball(&self, id: BallId) -> Option<&Ball> {
        self.in_flight.get(&id)
    }

    pub fn ball_mut(&mut self, id: BallId) -> Option<&mut Ball> {
        self.in_flight.get_mut(&id)
    }

    pub fn rng(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    /// Horizontal spawn jitter in [-0.5, 0.5)
    pub fn spawn_jitter(&mut self) -> f32 {
        self.rng.random::<f32>() - 0.5
    }

    /// Debit the full wager and queue `ball_count` staggered spawns.
    ///
    /// On failure nothing changes.
    pub fn drop_balls(&mut self) -> Result<DropTicket, PlinkoError> {
        let new_balance = place_wager(self.wager, self.ball_count, self.balance)?;
        self.balance = new_balance;

        for i in 0..self.ball_count {
            self.spawns.schedule(PendingSpawn {
                due: self.clock + f64::from(i) * f64::from(self.spawn_interval),
                wager: self.wager,
            });
        }
        self.round.dropped += self.ball_count;
        self.round.wagered = self
            .round
            .wagered
            .saturating_add(self.wager * self.ball_count as u64);

        log::info!(
            "Dropped {} ball(s) at {} each, balance {}",
            self.ball_count,
            self.wager,
            self.balance
        );
        Ok(DropTicket {
            new_balance,
            scheduled: self.ball_count,
        })
    }

    /// Spawns whose due time has been reached, in order
    pub fn due_spawns(&mut self) -> Vec<PendingSpawn> {
        self.spawns.pop_due(self.clock)
    }

    /// Register a freshly injected ball as in flight
    pub fn launch(&mut self, spawn: &PendingSpawn, pos: Vec2, radius: f32) -> BallId {
        let id = BallId(self.next_id);
        self.next_id += 1;
        self.in_flight.insert(
            id,
            Ball {
                id,
                pos,
                vel: Vec2::ZERO,
                radius,
                wager: spawn.wager,
                state: BallState::Falling,
                deepest: pos.y,
                stalled_for: 0.0,
            },
        );
        id
    }

    /// Credit `ball.wager * bin.multiplier` and retire the ball.
    ///
    /// Returns `None` if the ball is not in flight.
    pub fn settle(&mut self, id: BallId, bin: &Bin) -> Option<Ball> {
        let mut ball = self.in_flight.remove(&id)?;
        let payout = ball.wager.saturating_mul(bin.multiplier as u64);
        self.balance = self.balance.saturating_add(payout);
        ball.state = BallState::Settled {
            bin: bin.index,
            payout,
        };
        self.round.settled += 1;
        self.round.winnings = self.round.winnings.saturating_add(payout);
        Some(ball)
    }

    /// Retire a ball without payout
    pub fn lose(&mut self, id: BallId) -> Option<Ball> {
        let mut ball = self.in_flight.remove(&id)?;
        ball.state = BallState::Lost;
        self.round.lost += 1;
        Some(ball)
    }

    /// Take the round summary if nothing is in flight or pending
    pub fn take_completed_round(&mut self) -> Option<RoundSummary> {
        if self.round.dropped == 0 || !self.in_flight.is_empty() || !self.spawns.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.round))
    }

    /// Cancel pending spawns and discard in-flight balls without settlement
    pub fn reset(&mut self) -> Discarded {
        let cancelled = self.spawns.cancel_all();
        let balls: Vec<Ball> = std::mem::take(&mut self.in_flight).into_values().collect();
        let forfeited = balls
            .iter()
            .map(|b| b.wager)
            .chain(cancelled.iter().map(|s| s.wager))
            .fold(0u64, u64::saturating_add);
        self.round = RoundSummary::default();
        Discarded {
            balls,
            cancelled: cancelled.len(),
            forfeited,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    fn session() -> Session {
        Session::new(&GameConfig::default(), 7)
    }

    fn bin(index: usize, multiplier: u32) -> Bin {
        Bin {
            index,
            center: Vec2::ZERO,
            width: 10.0,
            height: 10.0,
            multiplier,
        }
    }

    #[test]
    fn test_place_wager() {
        assert_eq!(place_wager(10, 3, 100).unwrap(), 70);
        assert_eq!(place_wager(10, 10, 100).unwrap(), 0);
        let err = place_wager(10, 11, 100).unwrap_err();
        assert!(matches!(
            err,
            PlinkoError::InsufficientFunds {
                required: 110,
                available: 100
            }
        ));
        assert!(place_wager(u64::MAX, 2, u64::MAX).is_err());
    }

    #[test]
    fn test_drop_debits_and_schedules_staggered() {
        let mut s = session();
        s.set_ball_count(3);
        let ticket = s.drop_balls().unwrap();
        assert_eq!(ticket.new_balance, 970);
        assert_eq!(ticket.scheduled, 3);
        assert_eq!(s.balance(), 970);
        assert_eq!(s.pending_spawns(), 3);

        // First spawn due immediately, the rest 0.2s apart
        assert_eq!(s.due_spawns().len(), 1);
        s.advance(0.2);
        assert_eq!(s.due_spawns().len(), 1);
        s.advance(0.1);
        assert!(s.due_spawns().is_empty());
        s.advance(0.15);
        assert_eq!(s.due_spawns().len(), 1);
        assert_eq!(s.pending_spawns(), 0);
    }

    #[test]
    fn test_insufficient_funds_changes_nothing() {
        let mut s = session();
        s.set_wager(600);
        s.set_ball_count(2);
        assert!(matches!(
            s.drop_balls(),
            Err(PlinkoError::InsufficientFunds { .. })
        ));
        assert_eq!(s.balance(), 1000);
        assert_eq!(s.pending_spawns(), 0);
        assert_eq!(*s.round(), RoundSummary::default());
    }

    #[test]
    fn test_settle_uses_per_ball_wager() {
        let mut s = session();
        s.drop_balls().unwrap();
        let spawn = s.due_spawns()[0];
        let id = s.launch(&spawn, Vec2::ZERO, 5.0);

        // Changing the wager after the drop must not change this ball's payout
        s.set_wager(500);
        let ball = s.settle(id, &bin(0, 5)).unwrap();
        assert_eq!(ball.state, BallState::Settled { bin: 0, payout: 50 });
        assert_eq!(s.balance(), 1040);
        assert!(s.settle(id, &bin(0, 5)).is_none());
        assert_eq!(s.balance(), 1040);
    }

    #[test]
    fn test_round_completes_only_when_idle() {
        let mut s = session();
        s.set_ball_count(2);
        s.drop_balls().unwrap();
        let first = s.due_spawns()[0];
        let a = s.launch(&first, Vec2::ZERO, 5.0);
        s.lose(a).unwrap();
        // Second ball still pending
        assert!(s.take_completed_round().is_none());

        s.advance(0.2);
        let second = s.due_spawns()[0];
        let b = s.launch(&second, Vec2::ZERO, 5.0);
        s.settle(b, &bin(4, 1)).unwrap();

        let summary = s.take_completed_round().unwrap();
        assert_eq!(summary.dropped, 2);
        assert_eq!(summary.settled, 1);
        assert_eq!(summary.lost, 1);
        assert_eq!(summary.wagered, 20);
        assert_eq!(summary.winnings, 10);
        assert_eq!(summary.net(), -10);
        assert!(s.take_completed_round().is_none());
    }

    #[test]
    fn test_reset_discards_and_cancels() {
        let mut s = session();
        s.set_ball_count(3);
        s.drop_balls().unwrap();
        let spawn = s.due_spawns()[0];
        s.launch(&spawn, Vec2::ZERO, 5.0);

        let discarded = s.reset();
        assert_eq!(discarded.balls.len(), 1);
        assert_eq!(discarded.cancelled, 2);
        assert_eq!(discarded.forfeited, 30);
        assert_eq!(s.in_flight_count(), 0);
        assert_eq!(s.pending_spawns(), 0);
        assert_eq!(s.balance(), 970);
    }

    #[test]
    fn test_clock_keeps_advancing_in_long_sessions() {
        let mut s = session();
        s.advance(300_000.0);
        let before = s.clock();
        s.advance(SIM_DT);
        assert!(s.clock() > before);

        s.set_ball_count(2);
        s.drop_balls().unwrap();
        assert_eq!(s.due_spawns().len(), 1);
        for _ in 0..25 {
            s.advance(SIM_DT);
        }
        assert_eq!(s.due_spawns().len(), 1);
        assert_eq!(s.pending_spawns(), 0);
    }

    #[test]
    fn test_progress_resets_stall_time() {
        let mut s = session();
        s.drop_balls().unwrap();
        let spawn = s.due_spawns()[0];
        let id = s.launch(&spawn, Vec2::new(0.0, 100.0), 5.0);
        let ball = s.ball_mut(id).unwrap();

        // Sideways and upward motion does not count as progress
        assert_eq!(ball.track_progress(Vec2::new(3.0, 100.0), 0.5), 0.5);
        assert_eq!(ball.track_progress(Vec2::new(3.0, 80.0), 0.5), 1.0);
        assert_eq!(ball.track_progress(Vec2::new(3.0, 104.0), 0.5), 1.5);

        assert_eq!(ball.track_progress(Vec2::new(3.0, 105.0), 0.5), 0.0);
        assert_eq!(ball.deepest, 105.0);
    }

    #[test]
    fn test_spawn_queue_keeps_order() {
        let mut q = SpawnQueue::default();
        q.schedule(PendingSpawn { due: 0.4, wager: 1 });
        q.schedule(PendingSpawn { due: 0.0, wager: 2 });
        q.schedule(PendingSpawn { due: 0.4, wager: 3 });
        let due: Vec<u64> = q.pop_due(1.0).iter().map(|p| p.wager).collect();
        assert_eq!(due, vec![2, 1, 3]);
    }

    #[test]
    fn test_jitter_range_and_determinism() {
        let mut a = session();
        let mut b = session();
        for _ in 0..100 {
            let j = a.spawn_jitter();
            assert!((-0.5..0.5).contains(&j));
            assert_eq!(j, b.spawn_jitter());
        }
    }
}
