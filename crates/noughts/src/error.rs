//! Unified error type for the noughts server.

use noughts_hub::HubError;
use noughts_protocol::ProtocolError;
use noughts_session::RegistryError;
use noughts_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates a `From` impl, so
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum NoughtsError {
    /// A transport-level error (send, recv, closed).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, bad session id).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A registry error (not found, full, rejected move).
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A hub error (session full, group unavailable).
    #[error(transparent)]
    Hub(#[from] HubError),

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Binding or serving the listener failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A global tracing subscriber was already installed.
    #[error("tracing init failed: {0}")]
    Telemetry(#[from] tracing_subscriber::util::TryInitError),
}

/// Errors raised while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}")]
    Invalid { var: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use noughts_protocol::SessionId;
    use noughts_session::Rejection;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let noughts_err: NoughtsError = err.into();
        assert!(matches!(noughts_err, NoughtsError::Transport(_)));
        assert!(noughts_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = SessionId::parse("no").unwrap_err();
        let noughts_err: NoughtsError = err.into();
        assert!(matches!(noughts_err, NoughtsError::Protocol(_)));
    }

    #[test]
    fn test_from_registry_error() {
        let err = RegistryError::from(Rejection::GameOver);
        let noughts_err: NoughtsError = err.into();
        assert!(matches!(noughts_err, NoughtsError::Registry(_)));
        assert!(noughts_err.to_string().contains("game is over"));
    }

    #[test]
    fn test_from_hub_error() {
        let err = HubError::SessionFull(SessionId::parse("ABCDE").unwrap());
        let noughts_err: NoughtsError = err.into();
        assert!(matches!(noughts_err, NoughtsError::Hub(_)));
        assert_eq!(noughts_err.to_string(), "session ABCDE is full");
    }

    #[test]
    fn test_config_error_names_variable() {
        let err = ConfigError::Invalid {
            var: "NOUGHTS_MAX_SESSIONS",
            value: "lots".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid value \"lots\" for NOUGHTS_MAX_SESSIONS"
        );
    }
}
