//! Query surface for the Z-Day tracker.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **Target redirects** (`/cure`, `/exterminate`) answering `303 See
//!   Other` with the chosen nation's page, or `503` while no nation
//!   qualifies
//! - **REST endpoints** for reading the tracked nations
//! - **Minimal HTML status page** (`GET /`) showing the region, table
//!   counts, and the happenings feed state
//!
//! # Architecture
//!
//! Handlers read the live [`NationTable`] and [`Selector`] through
//! [`AppState`]; nothing here writes to the table.
//!
//! [`NationTable`]: zday_core::table::NationTable
//! [`Selector`]: zday_core::select::Selector

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use startup::spawn_observer;
pub use state::AppState;
