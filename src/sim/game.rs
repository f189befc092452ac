//! Game driver
//!
//! Owns the board, the session and the physics world, and advances them in
//! fixed timesteps. All mutation happens on the thread that owns the `Game`.

use glam::Vec2;

use super::event::GameEvent;
use super::layout::{BoardConfig, BoardGeometry};
use super::resolver;
use super::session::{Ball, DropTicket, Session};
use super::world::{BallSpawn, PhysicsWorld};
use crate::config::GameConfig;
use crate::consts::*;
use crate::error::PlinkoError;

pub struct Game<W: PhysicsWorld> {
    config: GameConfig,
    geometry: BoardGeometry,
    session: Session,
    world: W,
    events: Vec<GameEvent>,
    /// Unsimulated frame time carried to the next frame
    accumulator: f32,
}

impl<W: PhysicsWorld> Game<W> {
    /// Build the board from `config` and register it with `world`
    pub fn new(world: W, config: GameConfig, seed: u64) -> Self {
        let board = BoardConfig::new(config.pyramid_height, config.viewport);
        let mut game = Self {
            geometry: BoardGeometry::generate(&board),
            session: Session::new(&config, seed),
            config,
            world,
            events: Vec::new(),
            accumulator: 0.0,
        };
        game.install_geometry();
        log::info!(
            "Board ready: height {}, {} pegs, {} bins (seed {})",
            board.pyramid_height,
            game.geometry.pegs.len(),
            game.geometry.bins.len(),
            seed
        );
        game
    }

    fn install_geometry(&mut self) {
        self.world.clear();
        for body in self.geometry.static_bodies() {
            self.world.add_static(&body);
        }
    }

    /// Replace the board. Balls in flight are discarded without settlement
    /// and pending spawns are cancelled; their wagers stay debited.
    pub fn regenerate_board(&mut self, pyramid_height: u32, viewport: Vec2) {
        let discarded = self.session.reset();
        if discarded.forfeited > 0 {
            log::warn!(
                "Regenerating board forfeits {} ({} in flight, {} pending)",
                discarded.forfeited,
                discarded.balls.len(),
                discarded.cancelled
            );
        }

        self.config.pyramid_height = pyramid_height;
        self.config.viewport = viewport;
        self.geometry = BoardGeometry::generate(&BoardConfig::new(pyramid_height, viewport));
        self.install_geometry();
        self.accumulator = 0.0;

        log::info!(
            "Board regenerated: height {}, viewport {}x{}",
            pyramid_height,
            viewport.x,
            viewport.y
        );
        self.events.push(GameEvent::BoardRegenerated {
            discarded: discarded.balls.len(),
            cancelled: discarded.cancelled,
            forfeited: discarded.forfeited,
        });
    }

    pub fn set_wager(&mut self, amount: u64) {
        self.session.set_wager(amount);
    }

    pub fn set_ball_count(&mut self, count: u32) {
        self.session.set_ball_count(count);
    }

    /// Debit the wager for `ball_count` balls and queue them
    pub fn drop_balls(&mut self) -> Result<DropTicket, PlinkoError> {
        self.session
            .drop_balls()
            .inspect_err(|e| log::warn!("Drop rejected: {}", e))
    }

    /// Advance the simulation by one fixed step of `dt` seconds
    pub fn tick(&mut self, dt: f32) {
        self.session.advance(dt);
        self.spawn_due();

        resolver::pre_step(
            &mut self.session,
            &mut self.world,
            &self.geometry.bounds,
            &self.config.physics,
            dt,
            &mut self.events,
        );

        for contact in self.world.step(dt) {
            resolver::resolve_contact(
                &mut self.session,
                &mut self.world,
                &self.geometry,
                &self.config.physics,
                contact,
                &mut self.events,
            );
        }
    }

    /// Run as many fixed steps as `frame_dt` covers; returns the step count
    pub fn update(&mut self, frame_dt: f32) -> u32 {
        self.accumulator += frame_dt.min(0.1);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.tick(SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        substeps
    }

    fn spawn_due(&mut self) {
        for spawn in self.session.due_spawns() {
            let jitter = self.session.spawn_jitter();
            let pos = self.geometry.spawn_point(jitter);
            let radius = self.geometry.ball_radius;
            let ball = self.session.launch(&spawn, pos, radius);
            self.world.add_ball(
                ball,
                &BallSpawn {
                    pos,
                    radius,
                    material: self.config.physics.ball,
                },
            );
            log::debug!("{} spawned at ({:.1}, {:.1})", ball, pos.x, pos.y);
            self.events.push(GameEvent::BallSpawned { ball, pos });
        }
    }

    pub fn balance(&self) -> u64 {
        self.session.balance()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn geometry(&self) -> &BoardGeometry {
        &self.geometry
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    /// Balls currently in flight
    pub fn balls(&self) -> impl Iterator<Item = &Ball> {
        self.session.in_flight()
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::ScriptedWorld;
    use crate::sim::body::{BallId, BodyKind};
    use crate::sim::session::RoundSummary;
    use crate::sim::world::BallMotion;

    fn game() -> Game<ScriptedWorld> {
        let config = GameConfig {
            viewport: Vec2::new(1000.0, 800.0),
            ..GameConfig::default()
        };
        Game::new(ScriptedWorld::default(), config, 42)
    }

    /// Drop one ball and tick until it is in the world
    fn drop_one(game: &mut Game<ScriptedWorld>) -> BallId {
        game.drop_balls().unwrap();
        game.tick(SIM_DT);
        game.session().in_flight_ids()[0]
    }

    #[test]
    fn test_new_registers_static_geometry() {
        let game = game();
        let statics = game.world().statics();
        assert_eq!(statics.len(), game.geometry().static_bodies().len());
        assert_eq!(game.world().count_kind(|k| k == BodyKind::Peg), 44);
        assert_eq!(game.world().count_kind(|k| matches!(k, BodyKind::Bin(_))), 9);
    }

    #[test]
    fn test_middle_bin_returns_stake() {
        let mut game = game();
        let ball = drop_one(&mut game);
        assert_eq!(game.balance(), 990);

        game.world_mut().queue_contact(BodyKind::Ball(ball), BodyKind::Bin(4));
        game.tick(SIM_DT);
        assert_eq!(game.balance(), 1000);
        assert_eq!(game.session().in_flight_count(), 0);
        assert!(game.world().removed().contains(&ball));
    }

    #[test]
    fn test_leftmost_bin_pays_five_times() {
        let mut game = game();
        let ball = drop_one(&mut game);

        game.world_mut().queue_contact(BodyKind::Bin(0), BodyKind::Ball(ball));
        game.tick(SIM_DT);
        assert_eq!(game.balance(), 1040);

        let events = game.drain_events();
        assert!(events.contains(&GameEvent::BallSettled {
            ball,
            bin: 0,
            multiplier: 5,
            payout: 50
        }));
        assert!(events.contains(&GameEvent::RoundComplete {
            summary: RoundSummary {
                dropped: 1,
                settled: 1,
                lost: 0,
                wagered: 10,
                winnings: 50
            }
        }));
    }

    #[test]
    fn test_duplicate_bin_contact_pays_once() {
        let mut game = game();
        let ball = drop_one(&mut game);
        game.world_mut().queue_contact(BodyKind::Ball(ball), BodyKind::Bin(3));
        game.world_mut().queue_contact(BodyKind::Ball(ball), BodyKind::Bin(4));
        game.tick(SIM_DT);
        assert_eq!(game.balance(), 990 + 20);
    }

    #[test]
    fn test_unknown_ball_or_bin_ignored() {
        let mut game = game();
        let ball = drop_one(&mut game);
        game.world_mut().queue_contact(BodyKind::Ball(BallId(999)), BodyKind::Bin(0));
        game.world_mut().queue_contact(BodyKind::Ball(ball), BodyKind::Bin(42));
        game.world_mut().queue_contact(BodyKind::Peg, BodyKind::Wall);
        game.tick(SIM_DT);
        assert_eq!(game.balance(), 990);
        assert_eq!(game.session().in_flight_count(), 1);
    }

    #[test]
    fn test_peg_contact_nudges_sideways() {
        let mut game = game();
        let ball = drop_one(&mut game);
        game.world_mut().take_impulses();

        game.world_mut().queue_contact(BodyKind::Peg, BodyKind::Ball(ball));
        game.tick(SIM_DT);
        let nudge = game.config().physics.peg_nudge;
        let impulses = game.world_mut().take_impulses();
        assert!(impulses.iter().any(|&(id, dv)| {
            id == ball && (dv.x.abs() - nudge.x).abs() < 1e-6 && dv.y == nudge.y
        }));
    }

    #[test]
    fn test_stalled_ball_gets_unstuck_kick() {
        let mut game = game();
        let ball = drop_one(&mut game);
        game.world_mut().set_motion(
            ball,
            BallMotion {
                pos: Vec2::new(500.0, 300.0),
                vel: Vec2::ZERO,
            },
        );
        game.world_mut().take_impulses();
        game.tick(SIM_DT);

        // Constant settle push plus one random kick
        let impulses: Vec<Vec2> = game
            .world_mut()
            .take_impulses()
            .into_iter()
            .filter(|&(id, _)| id == ball)
            .map(|(_, dv)| dv)
            .collect();
        assert_eq!(impulses.len(), 2);
        let settle = game.config().physics.settle_accel * SIM_DT;
        assert!((impulses[0].y - settle).abs() < 1e-6);
        assert!(impulses[1].y >= 0.0);
    }

    #[test]
    fn test_wedged_ball_gets_escape_kick_then_times_out() {
        let mut game = game();
        let ball = drop_one(&mut game);
        let bounds = game.geometry().bounds;
        // Drifting sideways fast enough to skip the small kicks, never descending
        game.world_mut().set_motion(
            ball,
            BallMotion {
                pos: Vec2::new(bounds.left + 5.0, 300.0),
                vel: Vec2::new(20.0, 0.0),
            },
        );
        game.world_mut().take_impulses();

        let escape_after = game.config().physics.escape_after;
        for _ in 0..((escape_after / SIM_DT) as u32 + 5) {
            game.tick(SIM_DT);
        }
        let escapes: Vec<Vec2> = game
            .world_mut()
            .take_impulses()
            .into_iter()
            .filter(|&(id, dv)| id == ball && dv.y < 0.0)
            .map(|(_, dv)| dv)
            .collect();
        assert_eq!(escapes.len(), 1);
        // Up and away from the left boundary
        assert!(escapes[0].x > 0.0);
        assert_eq!(game.session().in_flight_count(), 1);

        let timeout = game.config().physics.stall_timeout;
        for _ in 0..((timeout / SIM_DT) as u32) {
            game.tick(SIM_DT);
        }
        assert_eq!(game.session().in_flight_count(), 0);
        assert!(game.world().removed().contains(&ball));
        assert_eq!(game.balance(), 990);
        let events = game.drain_events();
        assert!(events.contains(&GameEvent::BallLost { ball }));
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::RoundComplete { summary } if summary.lost == 1 && summary.settled == 0
        )));
    }

    #[test]
    fn test_ball_below_pyramid_is_lost() {
        let mut game = game();
        let ball = drop_one(&mut game);
        let bottom = game.geometry().bounds.bottom;
        game.world_mut().set_motion(
            ball,
            BallMotion {
                pos: Vec2::new(500.0, bottom + 1.0),
                vel: Vec2::new(0.0, 50.0),
            },
        );
        game.tick(SIM_DT);
        assert_eq!(game.balance(), 990);
        assert_eq!(game.session().in_flight_count(), 0);
        let events = game.drain_events();
        assert!(events.contains(&GameEvent::BallLost { ball }));
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::RoundComplete { summary } if summary.lost == 1 && summary.winnings == 0
        )));
    }

    #[test]
    fn test_staggered_spawns() {
        let mut game = game();
        game.set_ball_count(3);
        game.drop_balls().unwrap();
        assert_eq!(game.balance(), 970);

        game.tick(SIM_DT);
        assert_eq!(game.session().in_flight_count(), 1);
        // 0.2s spacing at 120 Hz
        for _ in 0..24 {
            game.tick(SIM_DT);
        }
        assert_eq!(game.session().in_flight_count(), 2);
        for _ in 0..24 {
            game.tick(SIM_DT);
        }
        assert_eq!(game.session().in_flight_count(), 3);
        assert_eq!(game.session().pending_spawns(), 0);
    }

    #[test]
    fn test_spawn_inside_jitter_band() {
        let mut game = game();
        game.set_ball_count(5);
        game.drop_balls().unwrap();
        for _ in 0..120 {
            game.tick(SIM_DT);
        }
        let bounds = game.geometry().bounds;
        for event in game.drain_events() {
            if let GameEvent::BallSpawned { pos, .. } = event {
                assert!((pos.x - 500.0).abs() <= bounds.width() * 0.05 + 1e-3);
            }
        }
    }

    #[test]
    fn test_insufficient_funds_leaves_state() {
        let mut game = game();
        game.set_wager(101);
        game.set_ball_count(10);
        assert!(matches!(
            game.drop_balls(),
            Err(PlinkoError::InsufficientFunds {
                required: 1010,
                available: 1000
            })
        ));
        assert_eq!(game.balance(), 1000);
        game.tick(SIM_DT);
        assert_eq!(game.session().in_flight_count(), 0);
    }

    #[test]
    fn test_regenerate_discards_in_flight_and_pending() {
        let mut game = game();
        game.set_ball_count(5);
        game.drop_balls().unwrap();
        for _ in 0..50 {
            game.tick(SIM_DT);
        }
        assert_eq!(game.session().in_flight_count(), 3);
        assert_eq!(game.session().pending_spawns(), 2);
        game.drain_events();

        game.regenerate_board(10, Vec2::new(800.0, 600.0));
        assert_eq!(game.session().in_flight_count(), 0);
        assert_eq!(game.session().pending_spawns(), 0);
        assert_eq!(game.balance(), 950);
        assert_eq!(game.geometry().bins.len(), 11);
        assert_eq!(
            game.drain_events(),
            vec![GameEvent::BoardRegenerated {
                discarded: 3,
                cancelled: 2,
                forfeited: 50
            }]
        );

        // World holds only the new board; nothing spawns later
        assert_eq!(game.world().ball_count(), 0);
        for _ in 0..120 {
            game.tick(SIM_DT);
        }
        assert_eq!(game.session().in_flight_count(), 0);
        assert!(game.drain_events().is_empty());
    }

    #[test]
    fn test_update_runs_fixed_substeps() {
        let mut game = game();
        assert_eq!(game.update(SIM_DT * 3.5), 3);
        // Remainder carries over
        assert_eq!(game.update(SIM_DT * 0.75), 1);
        // Long frames are clamped
        assert_eq!(game.update(10.0), MAX_SUBSTEPS);
    }
}
