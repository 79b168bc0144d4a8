//! Application configuration loaded from a RON file.
//!
//! Every field has a default, so a config file only needs the values it
//! changes. Without `--config`, `./postwatch.ron` is used when present.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use log::LevelFilter;
use postwatch_core::{UnknownPolicy, ZeroViewsPolicy};
use postwatch_engine::{EngineConfig, FetchSettings, GalleryPostExtractor};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use watch_logging::LogDestination;

pub const DEFAULT_CONFIG_FILE: &str = "postwatch.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error(transparent)]
    Policy(#[from] UnknownPolicy),
    #[error("unknown log level '{0}'")]
    LogLevel(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogTarget {
    #[default]
    Terminal,
    File,
    Both,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub target: LogTarget,
    pub file: PathBuf,
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            target: LogTarget::Terminal,
            file: PathBuf::from("postwatch.log"),
            level: "info".to_string(),
        }
    }
}

impl LogConfig {
    pub fn destination(&self) -> LogDestination {
        match self.target {
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::File => LogDestination::File(self.file.clone()),
            LogTarget::Both => LogDestination::Both(self.file.clone()),
        }
    }

    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        LevelFilter::from_str(self.level.trim())
            .map_err(|_| ConfigError::LogLevel(self.level.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub seed_path: PathBuf,
    pub history_path: PathBuf,
    pub snapshot_path: PathBuf,
    pub current_csv_path: Option<PathBuf>,
    pub request_delay_ms: u64,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub redirect_limit: usize,
    pub max_body_bytes: u64,
    pub user_agent: Option<String>,
    /// One of `trust-when-corroborated`, `treat-as-removed`, `always-trust`.
    pub zero_views_policy: String,
    /// Replaces the built-in listing URL markers when set.
    pub listing_path_markers: Option<Vec<String>>,
    /// Replaces the built-in deletion notices when set.
    pub deletion_markers: Option<Vec<String>>,
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let fetch = FetchSettings::default();
        Self {
            seed_path: PathBuf::from("data/seed.csv"),
            history_path: PathBuf::from("data/history.csv"),
            snapshot_path: PathBuf::from("public/views.json"),
            current_csv_path: None,
            request_delay_ms: 1000,
            connect_timeout_secs: fetch.connect_timeout.as_secs(),
            request_timeout_secs: fetch.request_timeout.as_secs(),
            redirect_limit: fetch.redirect_limit,
            max_body_bytes: fetch.max_bytes,
            user_agent: None,
            zero_views_policy: ZeroViewsPolicy::default().to_string(),
            listing_path_markers: None,
            deletion_markers: None,
            log: LogConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads `explicit` when given (it must exist), otherwise the default file
    /// if present, otherwise built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn zero_views(&self) -> Result<ZeroViewsPolicy, ConfigError> {
        Ok(self.zero_views_policy.parse::<ZeroViewsPolicy>()?)
    }

    pub fn engine_config(&self) -> Result<EngineConfig, ConfigError> {
        let mut fetch = FetchSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            redirect_limit: self.redirect_limit,
            max_bytes: self.max_body_bytes,
            ..FetchSettings::default()
        };
        if let Some(agent) = &self.user_agent {
            fetch.user_agent = agent.clone();
        }
        if let Some(markers) = &self.listing_path_markers {
            fetch.listing_path_markers = markers.clone();
        }

        let mut config =
            EngineConfig::with_paths(&self.seed_path, &self.history_path, &self.snapshot_path);
        config.current_csv_path = self.current_csv_path.clone();
        config.request_delay = Duration::from_millis(self.request_delay_ms);
        config.fetch = fetch;
        config.zero_views = self.zero_views()?;
        Ok(config)
    }

    pub fn extractor(&self) -> GalleryPostExtractor {
        match &self.deletion_markers {
            Some(markers) => GalleryPostExtractor::new().with_deletion_markers(markers.clone()),
            None => GalleryPostExtractor::new(),
        }
    }
}
