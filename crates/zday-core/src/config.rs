//! Configuration loading and typed config structures for the tracker.
//!
//! The configuration lives in `zday-config.yaml` in the working directory.
//! Every section and field has a default, so an absent file or an empty
//! document yields a runnable configuration tracking the default region.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use zday_types::RegionName;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is not usable.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level tracker configuration, mirroring `zday-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TrackerConfig {
    /// Tracked region and loop timing.
    #[serde(default)]
    pub tracker: LoopConfig,

    /// Target selection parameters.
    #[serde(default)]
    pub selection: SelectionConfig,

    /// `NationStates` API client settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Query surface settings.
    #[serde(default)]
    pub observer: ObserverConfig,

    /// Table persistence settings.
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl TrackerConfig {
    /// Load configuration from `path`, falling back to defaults when the
    /// file does not exist, then apply environment overrides:
    ///
    /// - `ZDAY_REGION` overrides `tracker.region`
    /// - `ZDAY_USER_AGENT` overrides `api.user_agent`
    /// - `ZDAY_OBSERVER_PORT` overrides `observer.port`
    /// - `ZDAY_STATE_PATH` overrides `persistence.state_path`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if an existing file cannot be read,
    /// [`ConfigError::Yaml`] if it is not valid YAML, or
    /// [`ConfigError::Invalid`] if an override or value is unusable.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            tracing::info!(path = %path.display(), "Config file not found, using defaults");
            Self::default()
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Override selected values with environment variables when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `ZDAY_OBSERVER_PORT` is not a port number.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("ZDAY_REGION") {
            self.tracker.region = val;
        }
        if let Ok(val) = std::env::var("ZDAY_USER_AGENT") {
            self.api.user_agent = val;
        }
        if let Ok(val) = std::env::var("ZDAY_OBSERVER_PORT") {
            self.observer.port = val
                .parse()
                .map_err(|e| ConfigError::Invalid(format!("invalid ZDAY_OBSERVER_PORT: {e}")))?;
        }
        if let Ok(val) = std::env::var("ZDAY_STATE_PATH") {
            self.persistence.state_path = val;
        }
        Ok(())
    }

    /// Reject values the tracker cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tracker.region.trim().is_empty() {
            return Err(ConfigError::Invalid("tracker.region is empty".to_owned()));
        }
        if self.api.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "api.user_agent is empty; NationStates rejects anonymous clients".to_owned(),
            ));
        }
        if self.tracker.happenings_poll_secs == 0 {
            return Err(ConfigError::Invalid(
                "tracker.happenings_poll_secs must be positive".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Tracked region and background loop timing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoopConfig {
    /// Region whose population is tracked (any spelling; normalized on use).
    #[serde(default = "default_region")]
    pub region: String,

    /// Seconds between polls of the happenings feed.
    #[serde(default = "default_happenings_poll_secs")]
    pub happenings_poll_secs: u64,

    /// Milliseconds to wait after each refresh during a throttled sync cycle.
    #[serde(default = "default_sync_item_delay_ms")]
    pub sync_item_delay_ms: u64,

    /// Seconds a supervised loop waits before restarting after a failure.
    #[serde(default = "default_supervisor_cooldown_secs")]
    pub supervisor_cooldown_secs: u64,

    /// Seconds after which a tracked nation touched by a happening is
    /// re-fetched before the happening applies.
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
}

impl LoopConfig {
    /// The tracked region, normalized.
    pub fn region_name(&self) -> RegionName {
        RegionName::new(&self.region)
    }

    /// Happenings poll interval.
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.happenings_poll_secs)
    }

    /// Delay between refreshes within a throttled sync cycle.
    pub const fn sync_item_delay(&self) -> Duration {
        Duration::from_millis(self.sync_item_delay_ms)
    }

    /// Supervisor restart cooldown.
    pub const fn supervisor_cooldown(&self) -> Duration {
        Duration::from_secs(self.supervisor_cooldown_secs)
    }

    /// Age past which a record is refreshed when a happening touches it.
    pub const fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            happenings_poll_secs: default_happenings_poll_secs(),
            sync_item_delay_ms: default_sync_item_delay_ms(),
            supervisor_cooldown_secs: default_supervisor_cooldown_secs(),
            stale_after_secs: default_stale_after_secs(),
        }
    }
}

/// Target selection parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SelectionConfig {
    /// The cached cure target is kept until its zombie count drops below this.
    #[serde(default = "default_cure_recompute_threshold")]
    pub cure_recompute_threshold: i64,

    /// Exporters that sent a horde within this many seconds are deprioritized
    /// as extermination targets.
    #[serde(default = "default_inactivity_window_secs")]
    pub inactivity_window_secs: u64,
}

impl SelectionConfig {
    /// The inactivity window as a duration.
    pub const fn inactivity_window(&self) -> Duration {
        Duration::from_secs(self.inactivity_window_secs)
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            cure_recompute_threshold: default_cure_recompute_threshold(),
            inactivity_window_secs: default_inactivity_window_secs(),
        }
    }
}

/// `NationStates` API client settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiConfig {
    /// API endpoint.
    #[serde(default = "default_api_base_url")]
    pub base_url: String,

    /// `User-Agent` header identifying the operator, required upstream.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Minimum spacing between any two API requests, in milliseconds.
    #[serde(default = "default_min_request_interval_ms")]
    pub min_request_interval_ms: u64,
}

impl ApiConfig {
    /// Minimum request spacing as a duration.
    pub const fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            user_agent: default_user_agent(),
            min_request_interval_ms: default_min_request_interval_ms(),
        }
    }
}

/// Query surface settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObserverConfig {
    /// Address to bind.
    #[serde(default = "default_observer_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_observer_port")]
    pub port: u16,

    /// Prefix joined with a nation name to form its canonical page.
    #[serde(default = "default_nation_url_base")]
    pub nation_url_base: String,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            host: default_observer_host(),
            port: default_observer_port(),
            nation_url_base: default_nation_url_base(),
        }
    }
}

/// Table persistence settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PersistenceConfig {
    /// File the table is saved to at shutdown and restored from at startup.
    #[serde(default = "default_state_path")]
    pub state_path: String,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_region() -> String {
    "the communist bloc".to_owned()
}

const fn default_happenings_poll_secs() -> u64 {
    10
}

const fn default_sync_item_delay_ms() -> u64 {
    2000
}

const fn default_supervisor_cooldown_secs() -> u64 {
    5
}

const fn default_stale_after_secs() -> u64 {
    300
}

const fn default_cure_recompute_threshold() -> i64 {
    40
}

const fn default_inactivity_window_secs() -> u64 {
    300
}

fn default_api_base_url() -> String {
    "https://www.nationstates.net/cgi-bin/api.cgi".to_owned()
}

fn default_user_agent() -> String {
    "zday-tracker/0.1 (set api.user_agent to your nation name)".to_owned()
}

const fn default_min_request_interval_ms() -> u64 {
    650
}

fn default_observer_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_observer_port() -> u16 {
    5000
}

fn default_nation_url_base() -> String {
    "https://www.nationstates.net/nation=".to_owned()
}

fn default_state_path() -> String {
    "zday-state.json".to_owned()
}
