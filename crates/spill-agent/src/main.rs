//! Voice agent worker binary.
//!
//! Loads the VAD once, then serves jobs from the platform adapter over
//! stdin/stdout until the adapter closes the stream or the process is asked
//! to stop. Either way running sessions are closed and their usage logged
//! before exit. Logs go to stderr.

use spill_agent::{bridge, config, VoiceAgent, Worker};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("SPILL_AGENT_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path
        .as_deref()
        .or(Some("spill-agent.toml"));

    let config = config::load_config(selected_config_path)?;

    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    let worker = Arc::new(Worker::prewarm(config, VoiceAgent::spill())?);
    tracing::info!(
        stt = %worker.session_options().stt.model,
        llm = %worker.session_options().llm.model,
        "starting spill agent worker"
    );

    bridge::run_stdio(worker, shutdown_signal()).await?;

    tracing::info!("spill agent worker shut down");
    // A pending blocking stdin read would keep runtime shutdown waiting.
    std::process::exit(0)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, draining sessions"); }
        () = terminate => { tracing::info!("received SIGTERM, draining sessions"); }
    }
}
