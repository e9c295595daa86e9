//! Tutorial server.
//!
//! Serves every tutorial chapter under its prefix (`/c01` ... `/c15`,
//! `/hello`).
//!
//! # Usage
//!
//! Settings come from `PARAMBIND_*` variables, with `./.env` filling in any
//! that are unset.
//!
//! ```bash
//! PARAMBIND_PORT=8000 PARAMBIND_LOG_LEVEL=debug cargo run --bin tutorial-server
//! curl 'http://127.0.0.1:8000/c03/items/?skip=1&limit=1'
//! ```

use parambind_web::{ServerConfig, init_tracing};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match ServerConfig::from_env_file(".env") {
        Ok(config) => config,
        Err(err) if err.not_found() => ServerConfig::from_env(),
        Err(err) => return Err(err.into()),
    };
    init_tracing(&config.log_level)?;
    for ignored in &config.ignored {
        tracing::warn!(variable = %ignored, "ignoring unparsable configuration value");
    }

    let router = tutorial::app()?
        .redirect_slashes(config.redirect_slashes)
        .into_router()?;

    let listener = TcpListener::bind(config.addr()).await?;
    tracing::info!(addr = %listener.local_addr()?, "tutorial server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %err, "failed to listen for shutdown signal");
            }
        })
        .await?;

    tracing::info!("shutting down");
    Ok(())
}
