//! Startup helpers for the chat backend server.

use std::future::Future;
use std::process::ExitCode;
use std::sync::Arc;

use crate::chat::ChatConfig;
use crate::server::{self, AppState};

/// Run the server until Ctrl-C (used by the `skald-server` binary).
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting skald-chat v{}", env!("CARGO_PKG_VERSION"));

    let config = ChatConfig::from_env();
    tracing::info!("Ollama endpoint: {}", config.ollama.base_url);
    tracing::info!("Database: {}", config.storage.sqlite_path.display());

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    let port = config.server.port;
    let result = rt.block_on(async {
        let state = AppState::new(config).await?;
        server::run_server(state, port).await
    });

    if let Err(e) = result {
        tracing::error!("Server error: {e:#}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

/// Initialize application state without starting the server.
///
/// # Errors
/// Returns an error if state creation fails.
pub async fn initialize(config: ChatConfig) -> anyhow::Result<Arc<AppState>> {
    AppState::new(config).await
}

/// Run the server with a caller-provided shutdown signal.
///
/// # Errors
/// Returns an error if the server fails.
pub async fn run_server_with_shutdown<F>(
    state: Arc<AppState>,
    port: u16,
    shutdown_signal: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    server::run_server_with_shutdown(state, port, shutdown_signal).await
}
