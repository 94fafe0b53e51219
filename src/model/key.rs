//! LookupKey: the opaque identifier of one vocabulary entry

use serde::{Deserialize, Serialize};

/// Identifier for one vocabulary entry (a title or a stable descriptor id)
///
/// Serializes as a plain string so checkpoint files stay a flat JSON object.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LookupKey(String);

impl LookupKey {
    /// Create a key from any string-like value
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LookupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LookupKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for LookupKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for LookupKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for LookupKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}
