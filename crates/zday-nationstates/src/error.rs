//! Error types for the `NationStates` client.
//!
//! Request-time failures are reported to the tracker as
//! [`SourceError`](zday_core::source::SourceError); the types here cover
//! client construction and response decoding.

/// Errors building a [`NationStatesClient`](crate::NationStatesClient).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP client could not be constructed (bad user agent, TLS
    /// backend unavailable).
    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),

    /// The configured base URL is unusable.
    #[error("invalid API base URL {url:?}: {reason}")]
    BaseUrl {
        /// The offending URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// A response body that does not have the expected shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    /// A required element is absent.
    #[error("response has no <{0}> element")]
    Missing(&'static str),

    /// An element is present but its content cannot be parsed.
    #[error("response has a malformed <{0}> element")]
    Invalid(&'static str),
}
