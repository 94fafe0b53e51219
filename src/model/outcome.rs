//! Outcome: the tagged result recorded for one key

use serde::{Deserialize, Deserializer, Serialize, Serializer};

const EXISTS: &str = "EXISTS";
const MISSING: &str = "MISSING";
const ERROR: &str = "ERROR";

/// Result of resolving one key against an upstream source.
///
/// On disk every variant is a bare string: the three reserved words for the
/// existence check, or the linked identifier itself. An empty linked
/// identifier means "checked, no link found", which is distinct from a key
/// that has never been checked (absent from the snapshot).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// An article exists under the key or its aliased name
    Exists,
    /// The source confirmed no article for the key
    Missing,
    /// Every attempt for the key's batch failed; eligible for re-resolution
    Error,
    /// Linked external identifier, or empty when no link exists
    Linked(String),
}

impl Outcome {
    /// Whether a key holding this outcome should be resolved again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Outcome::Error)
    }

    /// The linked identifier, if this is a non-empty link.
    pub fn linked_id(&self) -> Option<&str> {
        match self {
            Outcome::Linked(id) if !id.is_empty() => Some(id),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Outcome::Exists => EXISTS,
            Outcome::Missing => MISSING,
            Outcome::Error => ERROR,
            Outcome::Linked(id) => id,
        }
    }

    /// Parse the on-disk representation. Never fails: unknown words are links.
    pub fn parse(raw: &str) -> Self {
        match raw {
            EXISTS => Outcome::Exists,
            MISSING => Outcome::Missing,
            ERROR => Outcome::Error,
            other => Outcome::Linked(other.to_string()),
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Outcome {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Outcome::parse(&raw))
    }
}
