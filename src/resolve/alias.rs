//! Per-batch reconciliation of upstream renames back onto requested keys

use std::collections::HashMap;

/// Maps a requested name to the name the upstream source treats as
/// authoritative.
///
/// Normalization is applied first, then redirection, so a key may be
/// normalized and its normalized form redirected. Only one redirect hop is
/// followed, matching what the upstream reports. Lives for one batch.
#[derive(Debug, Clone, Default)]
pub struct ResponseAliasMap {
    normalized: HashMap<String, String>,
    redirects: HashMap<String, String>,
}

impl ResponseAliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_normalization(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.normalized.insert(from.into(), to.into());
    }

    pub fn add_redirect(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.redirects.insert(from.into(), to.into());
    }

    /// Canonical name for `key`; the key itself when no alias applies.
    pub fn resolve<'a>(&'a self, key: &'a str) -> &'a str {
        let normalized = self.normalized.get(key).map_or(key, String::as_str);
        self.redirects
            .get(normalized)
            .map_or(normalized, String::as_str)
    }
}
