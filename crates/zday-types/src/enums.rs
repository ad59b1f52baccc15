//! Enumeration types shared across the tracker.

use serde::{Deserialize, Serialize};

/// The Z-Day action a nation has set for itself.
///
/// Only [`ZombieAction::Export`] matters to the tracker: an exporting
/// nation is a source of the infection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZombieAction {
    /// Fighting the infection by exterminating zombies.
    Exterminate,
    /// Researching a cure.
    Research,
    /// Sending zombie hordes to other nations.
    Export,
    /// No action chosen, or a value the tracker does not recognize.
    Unknown,
}

impl ZombieAction {
    /// Parse the action string the API reports (`exterminate`, `research`,
    /// `export`). Anything else maps to [`ZombieAction::Unknown`].
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "exterminate" => Self::Exterminate,
            "research" => Self::Research,
            "export" => Self::Export,
            _ => Self::Unknown,
        }
    }

    /// Whether this action makes the nation a source of the infection.
    pub const fn is_export(self) -> bool {
        matches!(self, Self::Export)
    }
}

/// Kind of a transfer happening. The two kinds are inverse operations on
/// the recipient's zombie count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    /// The sender unleashed zombies on the recipient.
    Infecting,
    /// The sender fired cure missiles at the recipient.
    Curing,
}

impl TransferKind {
    /// Classify a happening action phrase, e.g. `unleashed a zombie horde
    /// upon` or `fired cure missiles at`. Returns `None` for phrases that
    /// belong to neither kind.
    pub fn classify(phrase: &str) -> Option<Self> {
        let phrase = phrase.to_lowercase();
        if phrase.contains("zombie horde") {
            Some(Self::Infecting)
        } else if phrase.contains("cure missile") {
            Some(Self::Curing)
        } else {
            None
        }
    }

    /// Export status the sender is known to have after a transfer of this kind.
    pub const fn sender_exports(self) -> bool {
        matches!(self, Self::Infecting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_api_actions() {
        assert_eq!(ZombieAction::parse("export"), ZombieAction::Export);
        assert_eq!(ZombieAction::parse(" Exterminate "), ZombieAction::Exterminate);
        assert_eq!(ZombieAction::parse("research"), ZombieAction::Research);
        assert_eq!(ZombieAction::parse(""), ZombieAction::Unknown);
        assert!(ZombieAction::Export.is_export());
        assert!(!ZombieAction::Research.is_export());
    }

    #[test]
    fn classifies_transfer_phrases() {
        assert_eq!(
            TransferKind::classify("unleashed a zombie horde upon"),
            Some(TransferKind::Infecting)
        );
        assert_eq!(
            TransferKind::classify("unleashed massive zombie hordes upon"),
            Some(TransferKind::Infecting)
        );
        assert_eq!(
            TransferKind::classify("fired cure missiles at"),
            Some(TransferKind::Curing)
        );
        assert_eq!(TransferKind::classify("waved at"), None);
    }
}
