//! `chaosboard.toml` loading.
//!
//! Precedence, lowest first: built-in defaults, the config file,
//! `CHAOSBOARD_*` environment variables, command-line flags.

use std::path::{Path, PathBuf};

use chaosboard_core::generate::DEFAULT_SEED;
use chaosboard_core::{CorpusSize, DEFAULT_ACTING_USER, DEFAULT_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::logging::LogFormat;

/// File read when `--config` is not given. Absent means defaults.
pub(crate) const DEFAULT_CONFIG_FILE: &str = "chaosboard.toml";

pub(crate) const RATE_LIMIT_ENV: &str = "CHAOSBOARD_RATE_LIMIT";
pub(crate) const API_KEY_ENV: &str = "CHAOSBOARD_API_KEY";

#[derive(Debug, thiserror::Error)]
pub(crate) enum ConfigError {
    #[error("error reading config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("error parsing config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid {name}: {value}")]
    Env { name: &'static str, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Config {
    pub(crate) corpus: CorpusConfig,
    pub(crate) query: QueryConfig,
    pub(crate) server: ServerConfig,
    pub(crate) log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct CorpusConfig {
    pub(crate) seed: u64,
    pub(crate) runs: usize,
    pub(crate) scenarios: usize,
    pub(crate) incidents: usize,
    /// Fixed "now" for generation. Unset means the wall clock at startup.
    #[serde(with = "time::serde::rfc3339::option")]
    pub(crate) anchor: Option<OffsetDateTime>,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        let size = CorpusSize::default();
        Self {
            seed: DEFAULT_SEED,
            runs: size.runs,
            scenarios: size.scenarios,
            incidents: size.incidents,
            anchor: None,
        }
    }
}

impl CorpusConfig {
    pub(crate) fn size(&self) -> CorpusSize {
        CorpusSize {
            runs: self.runs,
            scenarios: self.scenarios,
            incidents: self.incidents,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct QueryConfig {
    pub(crate) page_size: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ServerConfig {
    pub(crate) port: u16,
    /// Requests per minute per client IP.
    pub(crate) rate_limit: u64,
    /// Owner recorded when a request carries no `X-Acting-User`.
    pub(crate) acting_user: String,
    /// Only ever set from the environment.
    #[serde(skip)]
    pub(crate) api_key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            rate_limit: 60,
            acting_user: DEFAULT_ACTING_USER.to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct LogConfig {
    pub(crate) level: String,
    pub(crate) format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Load from `path`, or from [`DEFAULT_CONFIG_FILE`] when it exists,
    /// then apply environment overrides.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::from_file(default)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(value) = var(RATE_LIMIT_ENV) {
            self.server.rate_limit = value.parse().map_err(|_| ConfigError::Env {
                name: RATE_LIMIT_ENV,
                value,
            })?;
        }
        if let Some(key) = var(API_KEY_ENV).filter(|k| !k.is_empty()) {
            self.server.api_key = Some(key);
        }
        Ok(())
    }
}
