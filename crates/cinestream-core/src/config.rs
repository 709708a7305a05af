//! Player and streaming configuration

use crate::{Error, PlaybackRate, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// Tuning handed to the segmented-protocol handler on construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Run demuxing off the main thread when the handler supports it
    pub enable_worker: bool,
    /// Forward buffer target (seconds)
    pub max_buffer_length: f64,
    /// Hard forward buffer ceiling (seconds)
    pub max_max_buffer_length: f64,
    /// Initial bandwidth estimate in bps
    pub abr_ewma_default_estimate: u64,
    /// Fraction of the estimate considered usable
    pub abr_bandwidth_factor: f64,
    /// Fragment retries before a network error becomes fatal
    pub frag_loading_max_retry: u32,
    /// Fixed delay between fragment retries in milliseconds
    pub frag_loading_retry_delay_ms: u64,
    /// Manifest retries; `None` retries forever
    pub manifest_loading_max_retry: Option<u32>,
    /// Fixed delay between manifest retries in milliseconds
    pub manifest_loading_retry_delay_ms: u64,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            enable_worker: true,
            max_buffer_length: 30.0,
            max_max_buffer_length: 60.0,
            abr_ewma_default_estimate: 4_000_000,
            abr_bandwidth_factor: 0.7,
            frag_loading_max_retry: 6,
            frag_loading_retry_delay_ms: 1000,
            manifest_loading_max_retry: None,
            manifest_loading_retry_delay_ms: 1000,
        }
    }
}

impl StreamingConfig {
    pub fn frag_retry_delay(&self) -> Duration {
        Duration::from_millis(self.frag_loading_retry_delay_ms)
    }

    pub fn manifest_retry_delay(&self) -> Duration {
        Duration::from_millis(self.manifest_loading_retry_delay_ms)
    }

    /// True when manifest loading never gives up on its own
    pub fn manifest_retry_unbounded(&self) -> bool {
        self.manifest_loading_max_retry.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.max_buffer_length > 0.0) || !(self.max_max_buffer_length > 0.0) {
            return Err(Error::InvalidConfig(
                "buffer lengths must be positive".into(),
            ));
        }
        if self.max_max_buffer_length < self.max_buffer_length {
            return Err(Error::InvalidConfig(
                "max_max_buffer_length must not be below max_buffer_length".into(),
            ));
        }
        if !(self.abr_bandwidth_factor > 0.0 && self.abr_bandwidth_factor <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "abr_bandwidth_factor {} outside (0, 1]",
                self.abr_bandwidth_factor
            )));
        }
        Ok(())
    }
}

/// Player configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Inactivity window before the controls auto-hide (milliseconds)
    pub controls_hide_delay_ms: u64,
    /// Relative seek step (seconds)
    pub seek_step_secs: f64,
    /// Lifetime of the seek indicator (milliseconds)
    pub seek_feedback_ms: u64,
    /// Rates offered in the settings modal
    pub playback_rates: Vec<f64>,
    /// Progress percent above which a watch checkpoint is reported
    pub min_history_progress: f64,
    /// Progress percent below which a watch checkpoint is reported
    pub max_history_progress: f64,
    /// Segmented-protocol handler tuning
    pub streaming: StreamingConfig,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            controls_hide_delay_ms: 4000,
            seek_step_secs: 10.0,
            seek_feedback_ms: 600,
            playback_rates: vec![0.5, 1.0, 1.5, 2.0],
            min_history_progress: 5.0,
            max_history_progress: 95.0,
            streaming: StreamingConfig::default(),
        }
    }
}

impl PlayerConfig {
    /// Parse and validate a JSON configuration; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PlayerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn controls_hide_delay(&self) -> Duration {
        Duration::from_millis(self.controls_hide_delay_ms)
    }

    pub fn seek_feedback_duration(&self) -> Duration {
        Duration::from_millis(self.seek_feedback_ms)
    }

    /// Offered playback rates as validated values
    pub fn rates(&self) -> Result<Vec<PlaybackRate>> {
        self.playback_rates
            .iter()
            .map(|r| PlaybackRate::new(*r))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.controls_hide_delay_ms == 0 {
            return Err(Error::InvalidConfig("controls_hide_delay_ms must be > 0".into()));
        }
        if !(self.seek_step_secs.is_finite() && self.seek_step_secs > 0.0) {
            return Err(Error::InvalidConfig("seek_step_secs must be positive".into()));
        }
        if self.playback_rates.is_empty() {
            return Err(Error::InvalidConfig("playback_rates must not be empty".into()));
        }
        self.rates()?;
        if !(self.min_history_progress < self.max_history_progress) {
            return Err(Error::InvalidConfig(format!(
                "history window {}..{} is empty",
                self.min_history_progress, self.max_history_progress
            )));
        }
        self.streaming.validate()
    }
}

/// Stream resolver endpoint settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Endpoint receiving `title`, `type`, `season`, `episode` query parameters
    pub endpoint: Url,
    /// Request timeout in milliseconds
    #[serde(default = "default_resolver_timeout_ms")]
    pub timeout_ms: u64,
    /// Extra request headers
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

fn default_resolver_timeout_ms() -> u64 {
    45_000
}

impl ResolverConfig {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            timeout_ms: default_resolver_timeout_ms(),
            headers: BTreeMap::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
