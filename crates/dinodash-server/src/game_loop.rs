use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use dinodash_core::game_trait::{GameConfig, PlayerId, RoundEvent, RoundGame};
use dinodash_core::net::messages::{
    ClientMessage, GameEndMsg, GameStartMsg, GameStateMsg, RoundEndMsg, ServerMessage,
};
use dinodash_core::net::protocol::{
    PROTOCOL_VERSION, ProtocolError, decode_client_message, encode_server_message,
};
use dinodash_core::player::Player;
use dinodash_core::room::{RoomConfig, RoomState};
use dinodash_runner::DinoDash;
use dinodash_runner::bot::BotDriver;
use dinodash_runner::config::RunnerConfig;

use crate::host::SessionHost;

/// Commands sent from connection handlers to the game tick loop.
#[derive(Debug)]
pub enum GameCommand {
    Action { player_id: PlayerId, data: Vec<u8> },
    /// Start a fresh round on the same roster at the next tick.
    Restart,
    Stop,
}

impl GameCommand {
    /// Decode a wire-encoded client message into a command.
    pub fn from_wire(data: &[u8]) -> Result<Self, ProtocolError> {
        match decode_client_message(data)? {
            ClientMessage::Action(msg) => Ok(Self::Action {
                player_id: msg.player_id,
                data: msg.data,
            }),
        }
    }
}

/// Broadcasts sent from the game tick loop to all connected clients.
#[derive(Debug, Clone)]
pub enum GameBroadcast {
    /// Serialized ServerMessage bytes. `Bytes` keeps fan-out clones cheap.
    EncodedMessage(Bytes),
    /// The session is over and the loop has exited.
    GameEnded,
}

/// Configuration for a game session.
#[derive(Debug, Clone)]
pub struct GameSessionConfig {
    pub players: Vec<Player>,
    pub seed: u64,
    pub room: RoomConfig,
    pub runner: RunnerConfig,
}

/// Spawn a game tick loop as a tokio task.
/// Returns the command sender and broadcast receiver.
pub fn spawn_game_session(
    config: GameSessionConfig,
) -> (
    mpsc::UnboundedSender<GameCommand>,
    mpsc::UnboundedReceiver<GameBroadcast>,
    JoinHandle<()>,
) {
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (broadcast_tx, broadcast_rx) = mpsc::unbounded_channel();

    let handle = tokio::spawn(async move {
        run_game_tick_loop(config, cmd_rx, broadcast_tx).await;
    });

    (cmd_tx, broadcast_rx, handle)
}

fn broadcast(tx: &mpsc::UnboundedSender<GameBroadcast>, msg: &ServerMessage) {
    match encode_server_message(msg) {
        Ok(data) => {
            let _ = tx.send(GameBroadcast::EncodedMessage(Bytes::from(data)));
        },
        Err(e) => tracing::error!(error = %e, "Failed to encode server message"),
    }
}

fn bot_drivers(players: &[Player], config: &RunnerConfig) -> Vec<BotDriver> {
    players
        .iter()
        .filter(|p| p.is_bot)
        .map(|p| BotDriver::new(p.id, config))
        .collect()
}

fn set_room_state(current: &mut RoomState, next: RoomState, round: u8) {
    if *current != next {
        tracing::info!(from = ?current, to = ?next, round, "Room state changed");
        *current = next;
    }
}

/// The server-authoritative tick loop.
///
/// Actions are applied in arrival order between ticks. Every tick is
/// followed by a state snapshot broadcast.
async fn run_game_tick_loop(
    config: GameSessionConfig,
    mut cmd_rx: mpsc::UnboundedReceiver<GameCommand>,
    broadcast_tx: mpsc::UnboundedSender<GameBroadcast>,
) {
    let mut room_state = RoomState::Lobby;
    let mut game = DinoDash::with_config(config.runner.clone());
    let metadata = game.metadata();
    if !metadata.accepts_roster(config.players.len()) {
        tracing::warn!(
            count = config.players.len(),
            max = config.room.max_players,
            "Roster outside supported range"
        );
    }
    let round_count = config.room.round_count.max(1);

    let mut host = SessionHost::new();
    host.latch();
    let game_config = GameConfig {
        seed: config.seed,
        custom: HashMap::new(),
    };
    game.setup(&config.players, &game_config, &host);

    let mut current_round: u8 = 1;
    set_room_state(&mut room_state, RoomState::InGame, current_round);
    broadcast(
        &broadcast_tx,
        &ServerMessage::GameStart(GameStartMsg {
            protocol_version: PROTOCOL_VERSION,
            game_name: metadata.name.clone(),
            round: current_round,
            players: config.players.clone(),
        }),
    );
    // Setup snapshot carries `restart = true`; tick 0 precedes the first tick.
    broadcast(
        &broadcast_tx,
        &ServerMessage::GameState(GameStateMsg {
            tick: 0,
            state_data: game.serialize_state(),
        }),
    );

    let mut bots = bot_drivers(&config.players, &config.runner);
    let tick_interval = Duration::from_secs_f32(1.0 / game.tick_rate());
    let mut interval = tokio::time::interval(tick_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut tick: u32 = 0;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let now = host.latch();
                for bot in &mut bots {
                    for action in bot.drive(game.state(), now, game.config()) {
                        game.apply(bot.player_id(), action, now);
                    }
                }

                tick += 1;
                for event in game.tick(&mut host) {
                    match event {
                        RoundEvent::Started { starts_at } => {
                            tracing::info!(tick, starts_at, "Countdown started");
                        },
                        RoundEvent::GameOver { reason } => {
                            tracing::info!(tick, reason = %reason, "Round over");
                        },
                        RoundEvent::ResultReported(_) => {
                            tracing::debug!(tick, "Result reported");
                        },
                        RoundEvent::Restarted => {
                            tracing::info!(tick, round = current_round, "Round reset");
                        },
                    }
                }

                broadcast(
                    &broadcast_tx,
                    &ServerMessage::GameState(GameStateMsg {
                        tick,
                        state_data: game.serialize_state(),
                    }),
                );

                if room_state != RoomState::InGame || !game.is_round_complete() {
                    continue;
                }

                let results = host.take_report().unwrap_or_else(|| game.round_results());
                broadcast(
                    &broadcast_tx,
                    &ServerMessage::RoundEnd(RoundEndMsg {
                        round: current_round,
                        results,
                    }),
                );

                if current_round >= round_count {
                    broadcast(
                        &broadcast_tx,
                        &ServerMessage::GameEnd(GameEndMsg {
                            rounds_played: current_round,
                        }),
                    );
                    set_room_state(&mut room_state, RoomState::Finished, current_round);
                    break;
                }

                // Pause between rounds (drain commands but don't tick)
                set_room_state(&mut room_state, RoomState::BetweenRounds, current_round);
                let pause_end = tokio::time::Instant::now() + config.room.between_round_duration;
                loop {
                    tokio::select! {
                        cmd = cmd_rx.recv() => {
                            match cmd {
                                Some(GameCommand::Stop) | None => {
                                    let _ = broadcast_tx.send(GameBroadcast::GameEnded);
                                    return;
                                },
                                Some(other) => {
                                    tracing::trace!(command = ?other, "Dropping command between rounds");
                                },
                            }
                        }
                        _ = tokio::time::sleep_until(pause_end) => {
                            break;
                        }
                    }
                }

                current_round += 1;
                game.request_restart();
                bots = bot_drivers(&config.players, &config.runner);
                set_room_state(&mut room_state, RoomState::InGame, current_round);
                broadcast(
                    &broadcast_tx,
                    &ServerMessage::GameStart(GameStartMsg {
                        protocol_version: PROTOCOL_VERSION,
                        game_name: metadata.name.clone(),
                        round: current_round,
                        players: config.players.clone(),
                    }),
                );

                // Reset interval for clean timing
                interval = tokio::time::interval(tick_interval);
                interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            }
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(GameCommand::Action { player_id, data }) => {
                        host.latch();
                        game.apply_action(player_id, &data, &host);
                    },
                    Some(GameCommand::Restart) => {
                        tracing::info!(round = current_round, "Restart requested");
                        game.request_restart();
                    },
                    Some(GameCommand::Stop) | None => {
                        break;
                    },
                }
            }
        }
    }

    let _ = broadcast_tx.send(GameBroadcast::GameEnded);
}

#[cfg(test)]
mod tests {
    use super::*;
    use dinodash_core::net::messages::ActionMsg;
    use dinodash_core::net::protocol::{decode_server_message, encode_client_message};
    use dinodash_runner::actions::RunnerAction;

    #[test]
    fn command_from_wire_decodes_actions() {
        let data = encode_client_message(&ClientMessage::Action(ActionMsg {
            player_id: 3,
            data: RunnerAction::Jump.encode(),
        }))
        .unwrap();
        match GameCommand::from_wire(&data).unwrap() {
            GameCommand::Action { player_id, data } => {
                assert_eq!(player_id, 3);
                assert_eq!(RunnerAction::decode(&data), Some(RunnerAction::Jump));
            },
            other => panic!("Expected Action, got: {other:?}"),
        }
    }

    #[test]
    fn command_from_wire_rejects_garbage() {
        assert!(GameCommand::from_wire(&[]).is_err());
        assert!(GameCommand::from_wire(&[0x7F, 0x00]).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn session_starts_and_broadcasts_state() {
        let config = GameSessionConfig {
            players: vec![Player::new(1, "Alice")],
            seed: 7,
            room: RoomConfig::default(),
            runner: RunnerConfig::default(),
        };
        let (cmd_tx, mut broadcast_rx, handle) = spawn_game_session(config);

        // First message should be GameStart
        match broadcast_rx.recv().await.expect("should receive broadcast") {
            GameBroadcast::EncodedMessage(data) => {
                let decoded = decode_server_message(&data).expect("should decode");
                match decoded {
                    ServerMessage::GameStart(start) => {
                        assert_eq!(start.protocol_version, PROTOCOL_VERSION);
                        assert_eq!(start.game_name, "Dino Dash");
                        assert_eq!(start.round, 1);
                        assert_eq!(start.players.len(), 1);
                    },
                    other => panic!("First message should be GameStart, got: {other:?}"),
                }
            },
            other => panic!("Expected EncodedMessage, got: {other:?}"),
        }

        for expected_tick in [0, 1] {
            match broadcast_rx.recv().await.expect("should receive tick") {
                GameBroadcast::EncodedMessage(data) => match decode_server_message(&data) {
                    Ok(ServerMessage::GameState(gs)) => {
                        assert_eq!(gs.tick, expected_tick);
                        let state: dinodash_runner::state::GameState =
                            rmp_serde::from_slice(&gs.state_data).unwrap();
                        assert_eq!(state.restart, expected_tick == 0);
                    },
                    other => panic!("Expected GameState, got: {other:?}"),
                },
                other => panic!("Expected EncodedMessage, got: {other:?}"),
            }
        }

        let _ = cmd_tx.send(GameCommand::Stop);
        let _ = handle.await;
        let mut saw_end = false;
        while let Some(msg) = broadcast_rx.recv().await {
            saw_end |= matches!(msg, GameBroadcast::GameEnded);
        }
        assert!(saw_end);
    }
}
