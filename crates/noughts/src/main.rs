//! `noughts` server binary.
//!
//! Configuration is read from `NOUGHTS_*` environment variables (and an
//! optional `.env` file); logging honours `RUST_LOG`.

use noughts::prelude::*;

#[tokio::main]
async fn main() {
    if let Err(e) = noughts::telemetry::init_tracing() {
        eprintln!("warning: {e}");
    }

    if let Err(e) = run().await {
        tracing::error!(error = %e, "server failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), NoughtsError> {
    let config = ServerConfig::from_env()?;
    tracing::info!(
        bind = %config.bind_addr,
        max_sessions = config.registry.max_sessions,
        session_ttl_secs = config.registry.session_ttl.as_secs(),
        "configuration loaded"
    );

    NoughtsServer::builder().config(config).build().await?.run().await
}
