//! Shared type definitions for the Z-Day tracker.
//!
//! # Modules
//!
//! - [`ids`] -- Normalized nation and region name wrappers
//! - [`enums`] -- Zombie actions and transfer kinds
//! - [`structs`] -- Tracked records, snapshots, and raw happenings

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{TransferKind, ZombieAction};
pub use ids::{NationName, RegionName, normalize};
pub use structs::{Happening, NEVER_ACTIVE, Record, Snapshot, ZombieStatus};
