pub mod actions;
pub mod bot;
pub mod config;
pub mod physics;
pub mod scoring;
pub mod state;
pub mod stride;
pub mod track_gen;

use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;

use dinodash_core::game_trait::{GameConfig, GameMetadata, PlayerId, RoundEvent, RoundGame};
use dinodash_core::host::{RoundHost, RoundResults};
use dinodash_core::player::Player;
use dinodash_core::round_game_boilerplate;
use dinodash_core::time::Millis;

use actions::RunnerAction;
use config::RunnerConfig;
use state::{GameEvent, GameState, Runner};
use track_gen::generate_track;

/// Most runners a round can seat.
pub const MAX_PLAYERS: usize = 4;

/// The Dino Dash round simulation.
pub struct DinoDash {
    config: RunnerConfig,
    state: GameState,
    /// Seating order; fixes start positions.
    player_ids: Vec<PlayerId>,
    /// Track generator shared by setup and every restart.
    rng: StdRng,
    restart_pending: bool,
}

impl DinoDash {
    pub fn new() -> Self {
        Self::with_config(RunnerConfig::default())
    }

    /// Build a game around `config`. An invalid config is replaced by the
    /// defaults with a warning.
    pub fn with_config(config: RunnerConfig) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                tracing::warn!("Invalid runner config: {e}, using defaults");
                RunnerConfig::default()
            },
        };
        Self {
            config,
            state: GameState::empty(),
            player_ids: Vec::new(),
            rng: StdRng::seed_from_u64(0),
            restart_pending: false,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Apply an already-decoded action.
    pub fn apply(&mut self, player_id: PlayerId, action: RunnerAction, now: Millis) -> bool {
        let applied = actions::apply_action(&mut self.state, player_id, action, now, &self.config);
        if applied {
            tracing::trace!(player_id, ?action, "Applied action");
        }
        applied
    }

    /// Lay out a fresh track and put every seated runner on the start grid.
    fn init_round(&mut self, now: Millis) {
        self.state.items = generate_track(&self.config.track, &mut self.rng);
        let roster = &self.config.roster;
        for (seat, &id) in self.player_ids.iter().enumerate() {
            let x = roster.spawn_x - seat as f32 * roster.spawn_spacing;
            match self.state.players.get_mut(&id) {
                Some(runner) => runner.reset(x),
                None => {
                    let sprite = self.state.next_sprite_index % roster.sprite_variants.max(1);
                    self.state.next_sprite_index += 1;
                    self.state.players.insert(id, Runner::new(id, x, sprite));
                },
            }
        }
        self.state.end_game_at = now + self.config.timing.round_duration_ms;
        self.state.game_start_at = 0;
        self.state.game_over = false;
        self.state.game_over_reason.clear();
        self.state.report_winner_at = 0;
        self.state.winner_reported = false;
        self.state.restart = true;
    }

    /// One tick of the round. Returns the collision events it produced.
    fn advance(
        &mut self,
        host: &mut dyn RoundHost,
        round_events: &mut Vec<RoundEvent>,
    ) -> Vec<GameEvent> {
        let now = host.now();

        if self.restart_pending {
            self.restart_pending = false;
            self.init_round(now);
            tracing::info!(players = self.player_ids.len(), "Round restarted");
            round_events.push(RoundEvent::Restarted);
            return Vec::new();
        }
        self.state.restart = false;

        let timing = &self.config.timing;
        if !self.state.all_ready() {
            self.state.end_game_at = now + timing.round_duration_ms;
            return Vec::new();
        }
        if self.state.game_start_at == 0 {
            self.state.game_start_at = now + timing.start_delay_ms;
            tracing::info!(starts_at = self.state.game_start_at, "All runners ready");
            round_events.push(RoundEvent::Started {
                starts_at: self.state.game_start_at,
            });
        }
        if now < self.state.game_start_at {
            self.state.end_game_at = now + timing.round_duration_ms;
            return Vec::new();
        }

        if let Some(reason) = scoring::check_game_over(&mut self.state, now, timing) {
            tracing::info!(reason, "Game over");
            round_events.push(RoundEvent::GameOver {
                reason: reason.to_string(),
            });
        }
        if self.state.game_over && now >= self.state.report_winner_at {
            if !self.state.winner_reported {
                let results = scoring::classify(&self.state);
                host.report_result(&results);
                self.state.winner_reported = true;
                tracing::info!(winner = ?scoring::winner(&self.state), "Reported round result");
                round_events.push(RoundEvent::ResultReported(results));
            }
            return Vec::new();
        }

        physics::step_runners(&mut self.state, now, &self.config.physics)
    }
}

impl Default for DinoDash {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundGame for DinoDash {
    fn metadata(&self) -> GameMetadata {
        GameMetadata {
            name: "Dino Dash".to_string(),
            description: "Stride, jump and outrun everyone along the track!".to_string(),
            min_players: 1,
            max_players: MAX_PLAYERS as u8,
            estimated_round_duration: Duration::from_millis(
                self.config.timing.round_duration_ms + self.config.timing.start_delay_ms,
            ),
        }
    }

    fn setup(&mut self, players: &[Player], config: &GameConfig, host: &dyn RoundHost) {
        if !self.metadata().accepts_roster(players.len()) {
            tracing::warn!(
                count = players.len(),
                "Roster outside supported range, seating the first {MAX_PLAYERS}"
            );
        }

        self.rng = StdRng::seed_from_u64(config.seed);
        self.state = GameState::empty();
        self.player_ids.clear();
        self.restart_pending = false;
        for player in players.iter().take(MAX_PLAYERS) {
            if !self.player_ids.contains(&player.id) {
                self.player_ids.push(player.id);
            }
        }
        self.init_round(host.now());
        tracing::debug!(
            seed = config.seed,
            players = self.player_ids.len(),
            items = self.state.items.len(),
            "Round set up"
        );
    }

    fn tick(&mut self, host: &mut dyn RoundHost) -> Vec<RoundEvent> {
        let mut round_events = Vec::new();
        self.state.events = self.advance(host, &mut round_events);
        round_events
    }

    fn apply_action(&mut self, player_id: PlayerId, payload: &[u8], host: &dyn RoundHost) {
        match RunnerAction::decode(payload) {
            Some(action) => {
                self.apply(player_id, action, host.now());
            },
            None => tracing::debug!(player_id, len = payload.len(), "Ignoring undecodable action"),
        }
    }

    fn request_restart(&mut self) {
        self.restart_pending = true;
    }

    round_game_boilerplate!(state_type: GameState);

    fn round_results(&self) -> RoundResults {
        scoring::classify(&self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dinodash_core::host::Outcome;
    use dinodash_core::test_helpers::{
        ManualHost, contract_action_changes_state, contract_garbage_action_is_noop,
        contract_round_eventually_completes, contract_setup_creates_player_state,
        contract_state_roundtrip_preserves, default_config, make_players, run_game_ticks,
    };
    use state::{EventKind, Item};

    const TICK_MS: Millis = 33;

    fn setup_game(n: usize, host: &ManualHost) -> DinoDash {
        let mut game = DinoDash::new();
        game.setup(&make_players(n), &default_config(42), host);
        game
    }

    fn ready_all(game: &mut DinoDash, host: &ManualHost) {
        for id in game.player_ids.clone() {
            game.apply_action(id, &RunnerAction::Ready.encode(), host);
        }
    }

    /// Set up, ready everyone and run until the race has started.
    fn racing_game(n: usize, host: &mut ManualHost) -> DinoDash {
        let mut game = setup_game(n, host);
        ready_all(&mut game, host);
        game.tick(host);
        host.now = game.state.game_start_at;
        game.tick(host);
        assert!(game.state.race_started(host.now));
        game
    }

    #[test]
    fn setup_seats_runners_on_start_grid() {
        let host = ManualHost::at(1_000);
        let game = setup_game(4, &host);
        let s = &game.state;
        assert_eq!(s.players.len(), 4);
        assert_eq!(s.players[&1].x, 100.0);
        assert_eq!(s.players[&2].x, 80.0);
        assert_eq!(s.players[&4].x, 40.0);
        let sprites: Vec<u32> = s.players.values().map(|r| r.sprite).collect();
        assert_eq!(sprites, vec![0, 1, 2, 3]);
        assert_eq!(s.next_sprite_index, 4);
        assert_eq!(s.items.len(), 500);
        assert_eq!(s.end_game_at, 61_000);
        assert_eq!(s.game_start_at, 0);
        assert!(s.restart);
        assert!(s.players.values().all(|r| !r.ready && !r.dead));
    }

    #[test]
    fn invalid_config_falls_back_to_defaults() {
        let mut cfg = RunnerConfig::default();
        cfg.track.min_step = 12;
        cfg.track.max_step = 11;
        cfg.physics.gravity = 3.0;
        let mut game = DinoDash::with_config(cfg);
        assert_eq!(game.config().track.min_step, 10);
        assert_eq!(game.config().physics.gravity, 1.9);

        let host = ManualHost::at(0);
        game.setup(&make_players(2), &default_config(42), &host);
        assert_eq!(game.state.items.len(), 500);
    }

    #[test]
    fn oversized_roster_is_truncated() {
        let host = ManualHost::at(0);
        let game = setup_game(6, &host);
        assert_eq!(game.state.players.len(), MAX_PLAYERS);
    }

    #[test]
    fn same_seed_same_track() {
        let host = ManualHost::at(0);
        let a = setup_game(2, &host);
        let b = setup_game(2, &host);
        assert_eq!(a.state.items, b.state.items);

        let mut c = DinoDash::new();
        c.setup(&make_players(2), &default_config(43), &host);
        assert_ne!(a.state.items, c.state.items);
    }

    #[test]
    fn waiting_for_ready_pushes_end_forward() {
        let mut host = ManualHost::at(1_000);
        let mut game = setup_game(2, &host);
        game.apply_action(1, &RunnerAction::Ready.encode(), &host);
        for _ in 0..50 {
            host.advance(TICK_MS);
            let events = game.tick(&mut host);
            assert!(events.is_empty());
            assert_eq!(game.state.game_start_at, 0);
            assert_eq!(game.state.end_game_at, host.now + 60_000);
        }
    }

    #[test]
    fn start_scheduled_exactly_once() {
        let mut host = ManualHost::at(1_000);
        let mut game = setup_game(2, &host);
        ready_all(&mut game, &host);

        host.advance(TICK_MS);
        let events = game.tick(&mut host);
        let scheduled = game.state.game_start_at;
        assert_eq!(scheduled, host.now + 4_000);
        assert_eq!(events, vec![RoundEvent::Started { starts_at: scheduled }]);

        for _ in 0..300 {
            host.advance(TICK_MS);
            assert!(!game.tick(&mut host).iter().any(|e| matches!(e, RoundEvent::Started { .. })));
            assert_eq!(game.state.game_start_at, scheduled);
        }
    }

    #[test]
    fn countdown_freezes_physics() {
        let mut host = ManualHost::at(1_000);
        let mut game = setup_game(1, &host);
        ready_all(&mut game, &host);
        host.advance(TICK_MS);
        game.tick(&mut host);

        // Actions are rejected before the start
        game.apply_action(1, &RunnerAction::Speed { speed: 10.0 }.encode(), &host);
        game.apply_action(1, &RunnerAction::Jump.encode(), &host);
        host.advance(TICK_MS);
        game.tick(&mut host);
        assert_eq!(game.state.players[&1].vx, 0.0);
        assert_eq!(game.state.players[&1].vy, 0.0);
        assert_eq!(game.state.end_game_at, host.now + 60_000);
    }

    #[test]
    fn restart_flag_clears_on_first_tick() {
        let mut host = ManualHost::at(0);
        let mut game = setup_game(1, &host);
        assert!(game.state.restart);
        host.advance(TICK_MS);
        game.tick(&mut host);
        assert!(!game.state.restart);
    }

    #[test]
    fn runner_moves_with_speed_and_jumps() {
        let mut host = ManualHost::at(1_000);
        let mut game = racing_game(1, &mut host);
        game.state.items.clear();

        game.apply_action(1, &RunnerAction::Speed { speed: 8.0 }.encode(), &host);
        game.apply_action(1, &RunnerAction::Jump.encode(), &host);
        assert_eq!(game.state.players[&1].vy, -10.0);
        game.apply_action(1, &RunnerAction::Jump.encode(), &host);
        assert_eq!(game.state.players[&1].vy, -10.0, "no double jump");

        host.advance(TICK_MS);
        game.tick(&mut host);
        let r = &game.state.players[&1];
        assert_eq!(r.x, 104.0);
        assert_eq!(r.y, -10.0);
        assert!((r.vy - -8.1).abs() < 1e-5);
    }

    #[test]
    fn obstacle_hit_emits_single_event_for_that_tick() {
        let mut host = ManualHost::at(1_000);
        let mut game = racing_game(1, &mut host);
        game.state.items.clear();
        // Runner at x=100 is in cell 3
        game.state.items.insert(3, Item::Rocks);

        host.advance(TICK_MS);
        game.tick(&mut host);
        let r = &game.state.players[&1];
        assert_eq!(r.vx, -20.0);
        assert_eq!(r.last_bounce_at, host.now);
        assert!(game.state.items.is_empty());
        assert_eq!(game.state.events.len(), 1);
        let e = &game.state.events[0];
        assert_eq!((e.cell_index, e.player_id, e.kind), (3, 1, EventKind::Hit));

        host.advance(TICK_MS);
        game.tick(&mut host);
        assert!(game.state.events.is_empty(), "events last one tick");

        // Cooldown blocks speed input right after the bounce
        game.apply_action(1, &RunnerAction::Speed { speed: 5.0 }.encode(), &host);
        assert_eq!(game.state.players[&1].vx, -20.0);
    }

    #[test]
    fn gap_fall_kills_and_excludes_from_collisions() {
        let mut host = ManualHost::at(1_000);
        let mut game = racing_game(2, &mut host);
        game.state.items.clear();
        // Runner 1 at x=100 (cell 3), runner 2 at x=80 (cell 2)
        game.state.items.insert(3, Item::Gap);

        host.advance(TICK_MS);
        game.tick(&mut host);
        assert!(game.state.players[&1].dead);
        assert!(game.state.players[&2].dead, "gap at next cell also swallows");
        let died: Vec<_> = game
            .state
            .events
            .iter()
            .filter(|e| e.kind == EventKind::Died)
            .collect();
        assert_eq!(died.len(), 2);

        game.state.items.insert(4, Item::Cactus);
        let y_before = game.state.players[&1].y;
        host.advance(TICK_MS);
        game.tick(&mut host);
        assert!(game.state.events.is_empty());
        assert!(game.state.players[&1].y > y_before, "dead runners keep falling");
        assert!(game.state.items.contains_key(&4));
    }

    #[test]
    fn all_dead_reports_winner_after_one_second() {
        let mut host = ManualHost::at(1_000);
        let mut game = racing_game(3, &mut host);
        game.state.items.clear();
        for (id, x) in [(1, 500.0), (2, 900.0), (3, 700.0)] {
            let r = game.state.players.get_mut(&id).unwrap();
            r.x = x;
            r.dead = true;
        }

        host.advance(TICK_MS);
        let events = game.tick(&mut host);
        let over_at = host.now;
        assert!(game.state.game_over);
        assert_eq!(game.state.game_over_reason, "All out!");
        assert_eq!(game.state.report_winner_at, over_at + 1_000);
        assert_eq!(
            events,
            vec![RoundEvent::GameOver {
                reason: "All out!".to_string()
            }]
        );

        host.now = over_at + 999;
        game.tick(&mut host);
        assert!(host.reports.is_empty());

        host.now = over_at + 1_000;
        let events = game.tick(&mut host);
        assert_eq!(host.reports.len(), 1);
        let results = &host.reports[0];
        assert_eq!(results.outcome(2), Some(Outcome::Won));
        assert_eq!(results.outcome(1), Some(Outcome::Lost));
        assert_eq!(results.outcome(3), Some(Outcome::Lost));
        assert!(matches!(events.as_slice(), [RoundEvent::ResultReported(_)]));
        assert!(game.is_round_complete());

        run_game_ticks(&mut game, &mut host, 30, TICK_MS);
        assert_eq!(host.reports.len(), 1, "reported exactly once");
    }

    #[test]
    fn game_over_freezes_horizontal_progress() {
        let mut host = ManualHost::at(1_000);
        let mut game = racing_game(2, &mut host);
        game.state.items.clear();
        game.state.players.get_mut(&1).unwrap().dead = true;
        game.apply_action(2, &RunnerAction::Speed { speed: 10.0 }.encode(), &host);
        host.now = game.state.end_game_at;

        game.tick(&mut host);
        assert_eq!(game.state.game_over_reason, "Time over!");
        let x = game.state.players[&2].x;
        host.advance(TICK_MS);
        game.tick(&mut host);
        assert_eq!(game.state.players[&2].x, x);
    }

    #[test]
    fn restart_resets_round_for_one_tick() {
        let mut host = ManualHost::at(1_000);
        let mut game = racing_game(2, &mut host);
        let first_items = game.state.items.clone();
        let sprites: Vec<u32> = game.state.players.values().map(|r| r.sprite).collect();
        game.apply_action(1, &RunnerAction::Speed { speed: 12.0 }.encode(), &host);
        run_game_ticks(&mut game, &mut host, 20, TICK_MS);
        game.state.players.get_mut(&2).unwrap().dead = true;

        game.request_restart();
        host.advance(TICK_MS);
        let events = game.tick(&mut host);
        assert_eq!(events, vec![RoundEvent::Restarted]);
        let s = &game.state;
        assert!(s.restart);
        assert_ne!(s.items, first_items, "fresh track");
        assert_eq!(s.items.len(), 500);
        assert_eq!(s.game_start_at, 0);
        assert!(!s.game_over);
        assert_eq!(s.players[&1].x, 100.0);
        assert_eq!(s.players[&2].x, 80.0);
        assert!(s.players.values().all(|r| {
            r.vx == 0.0 && r.vy == 0.0 && r.y == 0.0 && !r.dead && !r.ready
        }));
        let sprites_after: Vec<u32> = s.players.values().map(|r| r.sprite).collect();
        assert_eq!(sprites, sprites_after, "sprites are stable");

        let mut restart_ticks = 1;
        for _ in 0..10 {
            host.advance(TICK_MS);
            game.tick(&mut host);
            if game.state.restart {
                restart_ticks += 1;
            }
        }
        assert_eq!(restart_ticks, 1);
    }

    #[test]
    fn restart_is_deterministic_across_replicas() {
        let host = ManualHost::at(0);
        let mut a = setup_game(2, &host);
        let mut b = setup_game(2, &host);
        for game in [&mut a, &mut b] {
            game.request_restart();
            game.tick(&mut ManualHost::at(10));
        }
        assert_eq!(a.serialize_state(), b.serialize_state());
    }

    #[test]
    fn bots_keep_replicas_identical() {
        let cfg = RunnerConfig::default();
        let mut host_a = ManualHost::at(1_000);
        let mut host_b = ManualHost::at(1_000);
        let mut a = setup_game(3, &host_a);
        let mut b = setup_game(3, &host_b);
        let mut bots_a: Vec<_> = (1..=3).map(|id| bot::BotDriver::new(id, &cfg)).collect();
        let mut bots_b = bots_a.clone();

        for _ in 0..600 {
            for (game, bots, host) in [
                (&mut a, &mut bots_a, &mut host_a),
                (&mut b, &mut bots_b, &mut host_b),
            ] {
                for bot in bots.iter_mut() {
                    for action in bot.drive(&game.state, host.now, &cfg) {
                        game.apply(bot.player_id(), action, host.now);
                    }
                }
                host.advance(TICK_MS);
                game.tick(host);
            }
            assert_eq!(a.serialize_state(), b.serialize_state());
        }
        assert!(a.state.race_started(host_a.now));
        assert!(
            a.state.players.values().any(|r| r.x > 150.0 || r.dead),
            "bots should have made progress"
        );
    }

    // ================================================================
    // Contract tests
    // ================================================================

    #[test]
    fn contract_setup() {
        let host = ManualHost::at(0);
        contract_setup_creates_player_state(&mut DinoDash::new(), &host, 3);
    }

    #[test]
    fn contract_action() {
        let mut host = ManualHost::at(0);
        let mut game = setup_game(2, &host);
        contract_action_changes_state(&mut game, &mut host, &RunnerAction::Ready.encode(), 1);
    }

    #[test]
    fn contract_garbage_action() {
        let host = ManualHost::at(0);
        let mut game = setup_game(2, &host);
        contract_garbage_action_is_noop(&mut game, &host, 1);
    }

    #[test]
    fn contract_roundtrip() {
        let mut host = ManualHost::at(1_000);
        let mut game = racing_game(2, &mut host);
        contract_state_roundtrip_preserves(&mut game);
    }

    #[test]
    fn contract_completes() {
        let mut host = ManualHost::at(1_000);
        let mut game = setup_game(2, &host);
        ready_all(&mut game, &host);
        contract_round_eventually_completes(&mut game, &mut host, 5_000, TICK_MS);
    }
}
