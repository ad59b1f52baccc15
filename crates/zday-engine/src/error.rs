//! Error types for the tracker binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup and shutdown.

/// Top-level error for the tracker binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: zday_core::config::ConfigError,
    },

    /// Loading or saving the nation table failed.
    #[error("persistence error: {source}")]
    Persist {
        /// The underlying persistence error.
        #[from]
        source: zday_core::persist::PersistError,
    },

    /// The `NationStates` client could not be built.
    #[error("API client error: {source}")]
    Client {
        /// The underlying client error.
        #[from]
        source: zday_nationstates::ClientError,
    },

    /// The query server could not be started.
    #[error("observer error: {source}")]
    Observer {
        /// The underlying startup error.
        #[from]
        source: zday_observer::startup::StartupError,
    },

    /// Waiting for the termination signal failed.
    #[error("signal error: {source}")]
    Signal {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}
