//! Parsing raw happening text into typed deltas.
//!
//! Only two shapes matter to the tracker:
//!
//! ```text
//! @@sender@@ unleashed a zombie horde upon @@recipient@@, infecting 1,200 survivors.
//! @@sender@@ fired cure missiles at @@recipient@@, curing 300 infected.
//! @@nation@@ relocated from %%old_region%% to %%new_region%%.
//! ```
//!
//! Anything else parses to `None` and is dropped by the caller.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use zday_types::{Happening, NationName, RegionName, TransferKind};

static TRANSFER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^@@(.+?)@@ (.+?) @@(.+?)@@.*? (\d[\d,]*)").ok());

static RELOCATION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^@@(.+?)@@ relocated from %%(.+?)%% to %%(.+?)%%").ok());

/// A happening the tracker knows how to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delta {
    /// Zombies or cure missiles sent from one nation to another.
    Transfer {
        /// The acting nation.
        sender: NationName,
        /// The nation on the receiving end.
        recipient: NationName,
        /// Infecting or curing.
        kind: TransferKind,
        /// Number of zombies added to (or cured from) the recipient.
        amount: i64,
        /// When it happened.
        timestamp: DateTime<Utc>,
    },
    /// A nation moved between regions.
    Relocation {
        /// The moving nation.
        nation: NationName,
        /// Region it left.
        from: RegionName,
        /// Region it joined.
        to: RegionName,
        /// When it happened.
        timestamp: DateTime<Utc>,
    },
}

impl Delta {
    /// When the underlying happening occurred.
    pub const fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Transfer { timestamp, .. } | Self::Relocation { timestamp, .. } => *timestamp,
        }
    }
}

/// Parse a happening into a [`Delta`], or `None` if it has neither shape.
pub fn parse(happening: &Happening) -> Option<Delta> {
    parse_transfer(happening).or_else(|| parse_relocation(happening))
}

fn parse_transfer(happening: &Happening) -> Option<Delta> {
    let caps = TRANSFER.as_ref()?.captures(&happening.text)?;
    let kind = TransferKind::classify(caps.get(2)?.as_str())?;
    let amount = parse_amount(caps.get(4)?.as_str())?;

    Some(Delta::Transfer {
        sender: NationName::new(caps.get(1)?.as_str()),
        recipient: NationName::new(caps.get(3)?.as_str()),
        kind,
        amount,
        timestamp: happening.timestamp,
    })
}

fn parse_relocation(happening: &Happening) -> Option<Delta> {
    let caps = RELOCATION.as_ref()?.captures(&happening.text)?;

    Some(Delta::Relocation {
        nation: NationName::new(caps.get(1)?.as_str()),
        from: RegionName::new(caps.get(2)?.as_str()),
        to: RegionName::new(caps.get(3)?.as_str()),
        timestamp: happening.timestamp,
    })
}

/// Parse a non-negative count that may carry thousands separators.
fn parse_amount(raw: &str) -> Option<i64> {
    raw.chars()
        .filter(|c| *c != ',')
        .collect::<String>()
        .parse()
        .ok()
}
