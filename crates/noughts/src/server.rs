//! `NoughtsServer` builder, router and serve loop.
//!
//! This ties together all the layers: transport → protocol → session →
//! hub. One listener serves both the HTTP routes and WebSocket upgrades.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use noughts_hub::{Hub, HubConfig};
use noughts_protocol::{JsonCodec, SessionId};
use noughts_session::{RegistryConfig, SessionRegistry};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::{create_session, fetch_session};
use crate::handler::upgrade;
use crate::{NoughtsError, ServerConfig};

/// Shared server state passed to every request and connection task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The
/// registry is internally synchronized; the hub sits behind a `Mutex`
/// that is held only for admission, removal and reaping.
pub(crate) struct ServerState {
    pub(crate) registry: Arc<SessionRegistry>,
    pub(crate) hub: Mutex<Hub>,
    pub(crate) codec: JsonCodec,
    pub(crate) idle_timeout: Duration,
}

impl ServerState {
    fn new(config: &ServerConfig) -> Self {
        let registry = Arc::new(SessionRegistry::new(config.registry.clone()));
        let hub = Hub::new(Arc::clone(&registry), config.hub.clone());
        Self {
            registry,
            hub: Mutex::new(hub),
            codec: JsonCodec,
            idle_timeout: config.idle_timeout,
        }
    }
}

/// Builds the application router: the two HTTP routes and the
/// WebSocket endpoint, with permissive CORS and request tracing.
fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/create", post(create_session))
        .route("/game/:id", get(fetch_session))
        .route("/ws/:id", get(upgrade))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Evicts idle sessions nobody is connected to.
///
/// The hub lock is held across the scan so no connection can be
/// admitted into a session while it is being evicted.
async fn reap_idle(state: &ServerState) -> Vec<SessionId> {
    let hub = state.hub.lock().await;
    let live = hub.live_sessions();
    let expired = state.registry.expire_idle(|id| live.contains(id));
    drop(hub);

    if !expired.is_empty() {
        tracing::info!(
            evicted = expired.len(),
            remaining = state.registry.len(),
            "reaped idle sessions"
        );
    }
    expired
}

fn spawn_reaper(state: Arc<ServerState>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            reap_idle(&state).await;
        }
    })
}

/// Builder for configuring and starting a noughts server.
///
/// # Example
///
/// ```rust,no_run
/// use noughts::prelude::*;
///
/// # async fn run() -> Result<(), NoughtsError> {
/// let server = NoughtsServer::builder()
///     .bind("0.0.0.0:8000")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct NoughtsServerBuilder {
    config: ServerConfig,
}

impl NoughtsServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Replaces the whole configuration, e.g. one read by
    /// [`ServerConfig::from_env`].
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the session registry configuration.
    pub fn registry_config(mut self, config: RegistryConfig) -> Self {
        self.config.registry = config;
        self
    }

    pub fn hub_config(mut self, config: HubConfig) -> Self {
        self.config.hub = config;
        self
    }

    pub fn reap_interval(mut self, every: Duration) -> Self {
        self.config.reap_interval = every;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// Binds the listener and assembles the server state.
    ///
    /// # Errors
    /// Returns [`NoughtsError::Io`] if the address cannot be bound.
    pub async fn build(self) -> Result<NoughtsServer, NoughtsError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        let state = Arc::new(ServerState::new(&self.config));

        Ok(NoughtsServer {
            listener,
            state,
            reap_interval: self.config.reap_interval,
        })
    }
}

impl Default for NoughtsServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound noughts server.
///
/// Call [`run()`](Self::run) to start serving.
pub struct NoughtsServer {
    listener: TcpListener,
    state: Arc<ServerState>,
    reap_interval: Duration,
}

impl NoughtsServer {
    /// Creates a new builder.
    pub fn builder() -> NoughtsServerBuilder {
        NoughtsServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// The server's session registry.
    pub fn registry(&self) -> Arc<SessionRegistry> {
        Arc::clone(&self.state.registry)
    }

    /// The router over this server's state, for serving it elsewhere or
    /// driving it in-process.
    pub fn app(&self) -> Router {
        router(Arc::clone(&self.state))
    }

    /// Serves until Ctrl-C. Runs the idle-session reaper alongside.
    pub async fn run(self) -> Result<(), NoughtsError> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Serves until `shutdown` resolves.
    pub async fn run_until(
        self,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), NoughtsError> {
        let addr = self.listener.local_addr()?;
        tracing::info!(%addr, "noughts server running");

        let reaper = spawn_reaper(Arc::clone(&self.state), self.reap_interval);
        let app = router(Arc::clone(&self.state));

        let result = axum::serve(self.listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        reaper.abort();
        tracing::info!("noughts server stopped");
        result.map_err(NoughtsError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_ttl(session_ttl: Duration) -> ServerState {
        ServerState::new(&ServerConfig {
            registry: RegistryConfig {
                session_ttl,
                ..RegistryConfig::default()
            },
            ..ServerConfig::default()
        })
    }

    #[tokio::test]
    async fn test_reap_idle_evicts_sessions_without_connections() {
        let state = state_with_ttl(Duration::ZERO);
        let idle = state.registry.create_session().unwrap();

        let evicted = reap_idle(&state).await;

        assert_eq!(evicted, vec![idle]);
        assert!(state.registry.is_empty());
    }

    #[tokio::test]
    async fn test_reap_idle_keeps_sessions_with_connections() {
        let state = state_with_ttl(Duration::ZERO);
        let live = state.registry.create_session().unwrap();
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        state
            .hub
            .lock()
            .await
            .admit(&live, noughts_transport::ConnectionId::next(), tx)
            .await
            .unwrap();

        let evicted = reap_idle(&state).await;

        assert!(evicted.is_empty());
        assert!(state.registry.contains(&live));
    }

    #[tokio::test]
    async fn test_reap_idle_keeps_recent_sessions() {
        let state = state_with_ttl(Duration::from_secs(3600));
        state.registry.create_session().unwrap();

        assert!(reap_idle(&state).await.is_empty());
        assert_eq!(state.registry.len(), 1);
    }
}
