//! Chatplays console host entry point.

use std::error::Error;
use std::sync::Arc;

use chatplays_core::scheduler::TokioScheduler;
use chatplays_server::config::Config;
use chatplays_server::console::ConsoleChat;
use chatplays_server::router::RouteOutcome;
use chatplays_server::state::AppState;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Logs go to stderr; stdout carries chat.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting chatplays console host");

    let config = Config::from_env()?;
    let settings = config.load_settings()?;

    let chat = Arc::new(ConsoleChat::new(std::io::stdout()));
    let state = Arc::new(
        AppState::build(&config, settings, chat, Arc::new(TokioScheduler)).await?,
    );
    state.persist().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut commands = JoinSet::new();
    while !state.is_over() {
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let state = Arc::clone(&state);
        commands.spawn(async move { state.router.route(&line).await });
        while let Some(finished) = commands.try_join_next() {
            log_finished(finished);
        }
    }
    while let Some(finished) = commands.join_next().await {
        log_finished(finished);
    }

    state.persist().await?;
    tracing::info!(
        solved = state.bomb.solved(),
        explosion = ?state.bomb.explosion(),
        standings = %state.scoreboard.standings_json(),
        "bomb finished"
    );

    Ok(())
}

fn log_finished(finished: Result<RouteOutcome, tokio::task::JoinError>) {
    match finished {
        Ok(outcome) => tracing::debug!(?outcome, "command finished"),
        Err(error) => tracing::error!(%error, "command task failed"),
    }
}
