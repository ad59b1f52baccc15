//! `NationStates` API client for the Z-Day tracker.
//!
//! [`NationStatesClient`] implements [`NationSource`] over the public
//! `NationStates` API:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | happenings | `q=happenings&view=region.<region>[&sinceid=<id>]` |
//! | region nations | `region=<region>&q=nations` |
//! | nation region | `nation=<nation>&q=region` |
//! | nation zombie | `nation=<nation>&q=zombie` |
//!
//! A `404` on a nation lookup surfaces as [`SourceError::NotFound`]; every
//! other failure (transport, non-success status, rate limiting, malformed
//! body) surfaces as [`SourceError::Upstream`].
//!
//! [`NationSource`]: zday_core::source::NationSource
//! [`SourceError::NotFound`]: zday_core::source::SourceError::NotFound
//! [`SourceError::Upstream`]: zday_core::source::SourceError::Upstream

pub mod client;
pub mod error;
pub mod xml;

pub use client::NationStatesClient;
pub use error::{ClientError, PayloadError};
