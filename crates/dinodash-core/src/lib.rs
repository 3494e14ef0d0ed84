pub mod game_trait;
pub mod host;
pub mod net;
pub mod player;
pub mod room;
pub mod time;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use crate::game_trait::{GameConfig, PlayerId, RoundEvent, RoundGame};
    use crate::host::{RoundHost, RoundResults};
    use crate::player::Player;
    use crate::time::Millis;

    /// Host with a hand-driven clock that records every result report.
    #[derive(Debug, Default)]
    pub struct ManualHost {
        pub now: Millis,
        pub reports: Vec<RoundResults>,
    }

    impl ManualHost {
        pub fn at(now: Millis) -> Self {
            Self {
                now,
                reports: Vec::new(),
            }
        }

        pub fn advance(&mut self, ms: Millis) {
            self.now += ms;
        }
    }

    impl RoundHost for ManualHost {
        fn now(&self) -> Millis {
            self.now
        }

        fn report_result(&mut self, results: &RoundResults) {
            self.reports.push(results.clone());
        }
    }

    /// Create `n` test players with sequential IDs starting at 1.
    pub fn make_players(n: usize) -> Vec<Player> {
        (0..n)
            .map(|i| Player::new(i as PlayerId + 1, format!("Player{}", i + 1)))
            .collect()
    }

    /// Create a GameConfig with the given seed.
    pub fn default_config(seed: u64) -> GameConfig {
        GameConfig {
            seed,
            ..GameConfig::default()
        }
    }

    /// Run `n` ticks, advancing the host clock by `step_ms` before each one.
    /// Returns all accumulated round events.
    pub fn run_game_ticks(
        game: &mut dyn RoundGame,
        host: &mut ManualHost,
        n: usize,
        step_ms: Millis,
    ) -> Vec<RoundEvent> {
        let mut all_events = Vec::new();
        for _ in 0..n {
            host.advance(step_ms);
            all_events.extend(game.tick(host));
        }
        all_events
    }

    // ================================================================
    // Game Trait Contract Tests
    // ================================================================
    // Every RoundGame implementation must pass these. Game crates call them
    // from their own #[cfg(test)] modules with a concrete game instance and
    // encoded actions for "ready" and "jump".

    /// After setup() with N players, serialize_state() must return non-empty bytes.
    pub fn contract_setup_creates_player_state(
        game: &mut dyn RoundGame,
        host: &ManualHost,
        player_count: usize,
    ) {
        game.setup(&make_players(player_count), &default_config(42), host);
        assert!(
            !game.serialize_state().is_empty(),
            "serialize_state() must return non-empty bytes after setup"
        );
        assert_eq!(game.round_results().len(), player_count);
    }

    /// A valid action followed by tick() must change state.
    pub fn contract_action_changes_state(
        game: &mut dyn RoundGame,
        host: &mut ManualHost,
        action: &[u8],
        player_id: PlayerId,
    ) {
        let before = game.serialize_state();
        game.apply_action(player_id, action, host);
        host.advance(33);
        game.tick(host);
        assert_ne!(
            before,
            game.serialize_state(),
            "State must change after apply_action + tick"
        );
    }

    /// Garbage payloads must leave state untouched.
    pub fn contract_garbage_action_is_noop(
        game: &mut dyn RoundGame,
        host: &ManualHost,
        player_id: PlayerId,
    ) {
        let before = game.serialize_state();
        game.apply_action(player_id, &[0xC1, 0xFF, 0x00], host);
        game.apply_action(player_id, &[], host);
        assert_eq!(before, game.serialize_state());
    }

    /// serialize_state → apply_state must be stable after one roundtrip.
    pub fn contract_state_roundtrip_preserves(game: &mut dyn RoundGame) {
        let state_a = game.serialize_state();
        game.apply_state(&state_a);
        let state_b = game.serialize_state();
        game.apply_state(&state_b);
        let state_c = game.serialize_state();
        assert_eq!(
            state_b, state_c,
            "State must be stable after serialize→apply→serialize roundtrip"
        );
    }

    /// With everyone ready and no input, the round must end and report
    /// exactly once within `max_ticks` ticks of `step_ms` each.
    pub fn contract_round_eventually_completes(
        game: &mut dyn RoundGame,
        host: &mut ManualHost,
        max_ticks: usize,
        step_ms: Millis,
    ) {
        for _ in 0..max_ticks {
            host.advance(step_ms);
            game.tick(host);
            if game.is_round_complete() {
                break;
            }
        }
        assert!(
            game.is_round_complete(),
            "Round must complete after {max_ticks} ticks of {step_ms}ms"
        );
        run_game_ticks(game, host, 10, step_ms);
        assert_eq!(host.reports.len(), 1, "Result must be reported exactly once");
    }
}
