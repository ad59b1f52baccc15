//! Normalized name wrappers for nations and regions.
//!
//! `NationStates` accepts names in any casing and with either spaces or
//! underscores, so every name entering the tracker is normalized once at
//! construction. Two names compare equal iff they refer to the same
//! nation (or region) upstream.

use serde::{Deserialize, Serialize};

/// Normalize a raw `NationStates` name: trim, lowercase, spaces to
/// underscores.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "_")
}

/// Generates a normalized string newtype with standard derives.
macro_rules! define_name {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Create a name from raw input, normalizing it.
            pub fn new(raw: &str) -> Self {
                Self(normalize(raw))
            }

            /// Return the normalized name.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self::new(&raw)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self::new(raw)
            }
        }

        impl From<$name> for String {
            fn from(name: $name) -> Self {
                name.0
            }
        }
    };
}

define_name! {
    /// Normalized name of a nation. The entity table key.
    NationName
}

define_name! {
    /// Normalized name of a region (the tracked scope, or any other).
    RegionName
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_spaces() {
        assert_eq!(NationName::new("  Testlandia ").as_str(), "testlandia");
        assert_eq!(
            RegionName::new("The Communist Bloc").as_str(),
            "the_communist_bloc"
        );
    }

    #[test]
    fn spelling_variants_compare_equal() {
        assert_eq!(NationName::new("Max Barry"), NationName::new("max_barry"));
    }

    #[test]
    fn serializes_as_normalized_string() {
        let name = NationName::new("Max Barry");
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"max_barry\"");

        let back: NationName = serde_json::from_str("\"Max Barry\"").unwrap();
        assert_eq!(back, name);
    }
}
