use tracing_subscriber::EnvFilter;

use dinodash_core::net::messages::ServerMessage;
use dinodash_core::net::protocol::decode_server_message;
use dinodash_runner::config::RunnerConfig;
use dinodash_server::bot_roster;
use dinodash_server::config::{LogFormat, ServerConfig};
use dinodash_server::game_loop::{GameBroadcast, GameCommand, GameSessionConfig, spawn_game_session};

#[tokio::main]
async fn main() {
    let config = ServerConfig::load();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    }

    let runner = RunnerConfig::load();
    if let Err(e) = runner.validate() {
        tracing::error!(error = %e, "Invalid runner configuration");
        std::process::exit(1);
    }

    let seed = config.seed.unwrap_or_else(rand::random);
    tracing::info!(seed, bots = config.bots, rounds = config.rounds, "Dino Dash server starting");

    let (cmd_tx, mut broadcast_rx, handle) = spawn_game_session(GameSessionConfig {
        players: bot_roster(config.bots),
        seed,
        room: config.room_config(),
        runner,
    });

    loop {
        tokio::select! {
            msg = broadcast_rx.recv() => {
                match msg {
                    Some(GameBroadcast::EncodedMessage(data)) => {
                        match decode_server_message(&data) {
                            Ok(ServerMessage::RoundEnd(end)) => {
                                let winners: Vec<_> = end.results.winners().collect();
                                tracing::info!(round = end.round, ?winners, "Round finished");
                            },
                            Ok(ServerMessage::GameEnd(end)) => {
                                tracing::info!(rounds = end.rounds_played, "Session finished");
                            },
                            Ok(_) => {},
                            Err(e) => tracing::warn!(error = %e, "Undecodable broadcast"),
                        }
                    },
                    Some(GameBroadcast::GameEnded) | None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                let _ = cmd_tx.send(GameCommand::Stop);
            }
        }
    }

    let _ = handle.await;
}
