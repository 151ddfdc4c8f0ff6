//! Game binary for the Herding simulation.
//!
//! Wires the round, the persuasion judge, and the presentation server
//! together and runs the frame loop until Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `herding-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Build the first round and its judge link
//! 4. Start the judge dispatcher, or run offline if `JUDGE_*` is unset
//! 5. Start the presentation API server
//! 6. Run the frame loop
//! 7. Stop the server and log the totals

mod error;
mod frame_loop;

use std::path::Path;
use std::sync::Arc;

use herding_judge::{Dispatcher, JudgeConfig, PromptEngine, create_backend};
use herding_server::{AppState, ServerConfig, start_server};
use herding_server::state::INTENT_QUEUE_CAPACITY;
use herding_sim::{JudgeEndpoint, JudgeLink, Round, SimulationConfig};
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::frame_loop::FrameLoop;

/// Where the configuration file is looked up, relative to the working
/// directory.
const CONFIG_PATH: &str = "herding-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, round setup, judge setup, or the
/// server fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging is not up yet, so a missing file is
    //    reported once the subscriber exists.
    let (config, from_file) = load_config()?;

    // 2. Initialize structured logging. RUST_LOG wins over the config.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("herding-engine starting");
    if !from_file {
        info!(path = CONFIG_PATH, "Config file not found, using defaults");
    }
    info!(
        seed = config.world.seed,
        frame_rate = config.world.frame_rate,
        snapshot_hz = config.server.snapshot_hz,
        agents = config.agents.roster.len(),
        dog = config.dog.enabled,
        "Configuration loaded"
    );

    // 3. Build the first round.
    let (link, endpoint) = JudgeLink::pair();
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };
    let round = Round::new(config, link).map_err(EngineError::from)?;
    info!(
        round = round.number,
        waypoints = round.waypoints.all().len(),
        "Round created"
    );

    // 4. Start the judge.
    start_judge(endpoint)?;

    // 5. Start the presentation API server.
    let (intent_tx, intent_rx) = mpsc::channel(INTENT_QUEUE_CAPACITY);
    let app_state = Arc::new(AppState::new(intent_tx));
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server_state = Arc::clone(&app_state);
    let server = tokio::spawn(async move {
        start_server(&server_config, server_state, async move {
            // A dropped sender also means stop.
            let _ = stop_rx.await;
        })
        .await
    });

    // 6. Run the frame loop.
    let frames = FrameLoop::new(round, intent_rx, app_state);
    let stats = frames.run(shutdown_signal()).await;

    // 7. Stop the server.
    if stop_tx.send(()).is_err() {
        warn!("Server already stopped before shutdown");
    }
    match server.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            return Err(EngineError::Server {
                message: format!("{e}"),
            }
            .into());
        }
        Err(e) => {
            return Err(EngineError::Server {
                message: format!("server task failed: {e}"),
            }
            .into());
        }
    }

    info!(
        total_frames = stats.total_frames,
        rounds_won = stats.rounds_won,
        "herding-engine shutdown complete"
    );

    Ok(())
}

/// Load the game configuration from [`CONFIG_PATH`].
///
/// Falls back to defaults when the file does not exist. The flag reports
/// whether the file was read.
fn load_config() -> Result<(SimulationConfig, bool), EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        Ok((SimulationConfig::from_file(config_path)?, true))
    } else {
        Ok((SimulationConfig::default(), false))
    }
}

/// Spawn the judge dispatcher on the round's judge endpoint.
///
/// Without `JUDGE_*` configuration the endpoint is dropped: every message
/// then fails inside the round and the agent answers with its fallback
/// line. Broken templates with a valid configuration are fatal.
fn start_judge(endpoint: JudgeEndpoint) -> Result<(), EngineError> {
    let config = match JudgeConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            warn!(
                error = %e,
                "Judge not configured, agents will answer with fallback lines"
            );
            drop(endpoint);
            return Ok(());
        }
    };

    let prompts = PromptEngine::new(&config.templates_dir)?;
    let backend = create_backend(&config.backend);
    info!(
        backend = backend.name(),
        model = %config.backend.model,
        api_url = %config.backend.api_url,
        templates_dir = %config.templates_dir,
        "Judge configured"
    );

    let dispatcher = Dispatcher::new(backend, prompts, &config);
    let JudgeEndpoint { requests, events } = endpoint;
    tokio::spawn(dispatcher.run(requests, events));
    Ok(())
}

/// Resolves on Ctrl-C. If the handler cannot be installed, the game runs
/// until the process is killed.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
