//! Run configuration
//!
//! Loaded from YAML. Every field is optional in the file; anything left out
//! keeps the per-source default. Lookup order: explicit `--config` path, then
//! `<config_dir>/mesh-enrich/config.yaml`, then built-in defaults.

use crate::pipeline::{Pass, RateGovernor, RetryPolicy, RunSettings};
use crate::resolve::wikipedia::MAX_TITLES_PER_QUERY;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const APP_DIR: &str = "mesh-enrich";
const USER_AGENT: &str = concat!("mesh-enrich/", env!("CARGO_PKG_VERSION"), " (research project)");

/// Errors from loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Settings for one upstream source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub endpoint: String,
    pub user_agent: String,
    pub batch_size: usize,
    pub timeout_secs: u64,
    pub retry: RetryPolicy,
    /// Pause after every batch on a first pass
    pub pace_ms: u64,
    /// Pause after every batch when re-sweeping `ERROR` keys
    pub resweep_pace_ms: u64,
    pub flush_every: usize,
    pub progress_every: usize,
}

impl SourceConfig {
    /// MediaWiki Action API defaults.
    pub fn wikipedia() -> Self {
        Self {
            endpoint: "https://en.wikipedia.org/w/api.php".to_string(),
            user_agent: USER_AGENT.to_string(),
            batch_size: MAX_TITLES_PER_QUERY,
            timeout_secs: 30,
            retry: RetryPolicy::existence_check(),
            pace_ms: 100,
            resweep_pace_ms: 500,
            flush_every: 100,
            progress_every: 50,
        }
    }

    /// Wikidata SPARQL defaults.
    pub fn wikidata() -> Self {
        Self {
            endpoint: "https://query.wikidata.org/sparql".to_string(),
            user_agent: USER_AGENT.to_string(),
            batch_size: 300,
            timeout_secs: 60,
            retry: RetryPolicy::linked_id(),
            pace_ms: 1_500,
            resweep_pace_ms: 1_500,
            flush_every: 20,
            progress_every: 10,
        }
    }

    pub fn run_settings(&self, pass: Pass) -> RunSettings {
        let pace_ms = match pass {
            Pass::Initial => self.pace_ms,
            Pass::Resweep => self.resweep_pace_ms,
        };
        RunSettings {
            batch_size: self.batch_size,
            retry: self.retry,
            governor: RateGovernor::new(Duration::from_millis(pace_ms)),
            flush_every: self.flush_every,
            progress_every: self.progress_every,
        }
    }

    fn validate(&self, name: &str, max_batch: usize) -> Result<(), ConfigError> {
        if self.batch_size == 0 || self.batch_size > max_batch {
            let message = if max_batch == usize::MAX {
                format!("{}.batch_size must be at least 1, got {}", name, self.batch_size)
            } else {
                format!(
                    "{}.batch_size must be between 1 and {}, got {}",
                    name, max_batch, self.batch_size
                )
            };
            return Err(ConfigError::Invalid(message));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(format!(
                "{}.retry.max_attempts must be at least 1",
                name
            )));
        }
        if self.flush_every == 0 {
            return Err(ConfigError::Invalid(format!(
                "{}.flush_every must be at least 1",
                name
            )));
        }
        if self.progress_every == 0 {
            return Err(ConfigError::Invalid(format!(
                "{}.progress_every must be at least 1",
                name
            )));
        }
        Ok(())
    }

    fn apply(&mut self, overrides: SourceOverrides) {
        let SourceOverrides {
            endpoint,
            user_agent,
            batch_size,
            timeout_secs,
            retry,
            pace_ms,
            resweep_pace_ms,
            flush_every,
            progress_every,
        } = overrides;

        if let Some(v) = endpoint {
            self.endpoint = v;
        }
        if let Some(v) = user_agent {
            self.user_agent = v;
        }
        if let Some(v) = batch_size {
            self.batch_size = v;
        }
        if let Some(v) = timeout_secs {
            self.timeout_secs = v;
        }
        if let Some(v) = retry {
            self.retry = v;
        }
        if let Some(v) = pace_ms {
            self.pace_ms = v;
        }
        if let Some(v) = resweep_pace_ms {
            self.resweep_pace_ms = v;
        }
        if let Some(v) = flush_every {
            self.flush_every = v;
        }
        if let Some(v) = progress_every {
            self.progress_every = v;
        }
    }
}

/// Complete configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Where checkpoint files live when no explicit path is given
    pub checkpoint_dir: PathBuf,
    pub wikipedia: SourceConfig,
    pub wikidata: SourceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            checkpoint_dir: default_checkpoint_dir(),
            wikipedia: SourceConfig::wikipedia(),
            wikidata: SourceConfig::wikidata(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    checkpoint_dir: Option<PathBuf>,
    wikipedia: Option<SourceOverrides>,
    wikidata: Option<SourceOverrides>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SourceOverrides {
    endpoint: Option<String>,
    user_agent: Option<String>,
    batch_size: Option<usize>,
    timeout_secs: Option<u64>,
    retry: Option<RetryPolicy>,
    pace_ms: Option<u64>,
    resweep_pace_ms: Option<u64>,
    flush_every: Option<usize>,
    progress_every: Option<usize>,
}

impl Config {
    /// Load from `path` if given, else from the default location if that
    /// file exists, else return defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_path() {
                Some(p) if p.is_file() => p,
                _ => return Ok(Self::default()),
            },
        };

        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// Parse YAML text over the defaults and validate the result.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        // An empty document deserializes as unit, not as an empty map.
        if !text.trim().is_empty() {
            let file: ConfigFile = serde_yaml::from_str(text)?;
            if let Some(dir) = file.checkpoint_dir {
                config.checkpoint_dir = dir;
            }
            if let Some(o) = file.wikipedia {
                config.wikipedia.apply(o);
            }
            if let Some(o) = file.wikidata {
                config.wikidata.apply(o);
            }
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.wikipedia.validate("wikipedia", MAX_TITLES_PER_QUERY)?;
        self.wikidata.validate("wikidata", usize::MAX)
    }

    /// Checkpoint file for a named source inside `checkpoint_dir`.
    pub fn checkpoint_path(&self, source: &str) -> PathBuf {
        self.checkpoint_dir.join(format!("{}_checkpoint.json", source))
    }
}

/// `<config_dir>/mesh-enrich/config.yaml`, when a config dir is known
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.yaml"))
}

/// `<data_dir>/mesh-enrich` (~/.local/share/mesh-enrich on Linux)
fn default_checkpoint_dir() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join(APP_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Backoff;

    #[test]
    fn defaults_match_source_pacing() {
        let config = Config::default();

        let initial = config.wikipedia.run_settings(Pass::Initial);
        let resweep = config.wikipedia.run_settings(Pass::Resweep);
        let linked = config.wikidata.run_settings(Pass::Initial);

        assert_eq!(initial.governor.interval(), Duration::from_millis(100));
        assert_eq!(resweep.governor.interval(), Duration::from_millis(500));
        assert_eq!(linked.governor.interval(), Duration::from_millis(1_500));
        assert_eq!(initial.retry, resweep.retry);
        assert_eq!(initial.batch_size, 50);
        assert_eq!(linked.flush_every, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_document_is_defaults() {
        assert_eq!(Config::from_yaml("").unwrap(), Config::default());
        assert_eq!(Config::from_yaml("# nothing\n").unwrap(), Config::default());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config = Config::from_yaml(
            r#"
checkpoint_dir: /tmp/ckpt
wikipedia:
  batch_size: 20
  retry:
    max_attempts: 4
    backoff:
      kind: linear
      base_ms: 250
wikidata:
  pace_ms: 3000
"#,
        )
        .unwrap();

        assert_eq!(config.checkpoint_dir, PathBuf::from("/tmp/ckpt"));
        assert_eq!(config.wikipedia.batch_size, 20);
        assert_eq!(
            config.wikipedia.retry,
            RetryPolicy::new(4, Backoff::Linear { base_ms: 250 })
        );
        assert_eq!(config.wikipedia.timeout_secs, 30);
        assert_eq!(config.wikidata.pace_ms, 3_000);
        assert_eq!(config.wikidata.batch_size, 300);
        assert_eq!(
            config.checkpoint_path("wikidata"),
            PathBuf::from("/tmp/ckpt/wikidata_checkpoint.json")
        );
    }

    #[test]
    fn rejects_oversized_wikipedia_batch() {
        let err = Config::from_yaml("wikipedia:\n  batch_size: 51\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("wikipedia.batch_size")));
    }

    #[test]
    fn zero_wikidata_batch_names_only_the_lower_bound() {
        let err = Config::from_yaml("wikidata:\n  batch_size: 0\n").unwrap_err();
        let ConfigError::Invalid(msg) = &err else {
            panic!("expected Invalid, got {:?}", err);
        };
        assert!(msg.contains("wikidata.batch_size must be at least 1, got 0"));
        assert!(!msg.contains(&usize::MAX.to_string()));
    }

    #[test]
    fn rejects_zero_attempts_and_zero_flush() {
        let attempts = Config::from_yaml(
            "wikidata:\n  retry:\n    max_attempts: 0\n    backoff:\n      kind: fixed\n      delay_ms: 10\n",
        );
        assert!(matches!(attempts, Err(ConfigError::Invalid(_))));

        let flush = Config::from_yaml("wikidata:\n  flush_every: 0\n");
        assert!(matches!(flush, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn unknown_field_is_a_parse_error() {
        let err = Config::from_yaml("wikipedia:\n  batchsize: 10\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reads_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "wikidata:\n  batch_size: 100\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.wikidata.batch_size, 100);
    }

    #[test]
    fn load_missing_explicit_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("absent.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
