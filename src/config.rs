use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::prelude::*;

pub const DEFAULT_CONFIG_PATH: &str = "config/order-bench.yaml";
pub const BASE_URL_ENV: &str = "ORDER_BENCH_BASE_URL";

const CATALOG_PATH: &str = "/catalog";
const ORDER_PATH: &str = "/order";

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheMode {
    #[serde(rename = "cache")]
    Enabled,
    #[serde(rename = "nocache")]
    Disabled,
}

impl CacheMode {
    pub fn is_enabled(self) -> bool {
        matches!(self, CacheMode::Enabled)
    }

    /// Label used in result file names.
    pub fn label(self) -> &'static str {
        match self {
            CacheMode::Enabled => "cache",
            CacheMode::Disabled => "nocache",
        }
    }
}

impl fmt::Display for CacheMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One sweep cell's parameters. Constructed through [`RunConfiguration::new`]
/// so the bounds are always checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfiguration {
    post_probability_percent: u8,
    cache_mode: CacheMode,
    workers: u32,
    requests_per_worker: u32,
}

impl RunConfiguration {
    pub fn new(
        post_probability_percent: u8,
        cache_mode: CacheMode,
        workers: u32,
        requests_per_worker: u32,
    ) -> Result<Self> {
        if post_probability_percent > 100 {
            return Err(Error::InvalidConfig(format!(
                "POST probability must be within 0..=100, got {}",
                post_probability_percent
            )));
        }
        if workers == 0 {
            return Err(Error::InvalidConfig("workers must be at least 1".to_string()));
        }
        if requests_per_worker == 0 {
            return Err(Error::InvalidConfig(
                "requests_per_worker must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            post_probability_percent,
            cache_mode,
            workers,
            requests_per_worker,
        })
    }

    pub fn post_probability_percent(&self) -> u8 {
        self.post_probability_percent
    }

    pub fn post_probability(&self) -> f64 {
        self.post_probability_percent as f64 / 100.0
    }

    pub fn cache_mode(&self) -> CacheMode {
        self.cache_mode
    }

    pub fn workers(&self) -> u32 {
        self.workers
    }

    pub fn requests_per_worker(&self) -> u32 {
        self.requests_per_worker
    }

    pub fn total_iterations(&self) -> u64 {
        self.workers as u64 * self.requests_per_worker as u64
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TargetConfig {
    pub base_url: String,
    pub stock: String,
    pub order_qty: u32,
    /// Opt-in per-request transport timeout; unset waits for the round trip.
    pub timeout_secs: Option<u64>,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:7070".to_string(),
            stock: "Stock1".to_string(),
            order_qty: 1,
            timeout_secs: None,
        }
    }
}

impl TargetConfig {
    pub fn catalog_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), CATALOG_PATH)
    }

    pub fn order_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), ORDER_PATH)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RunSettings {
    pub workers: u32,
    pub requests_per_worker: u32,
    /// Seeds the per-client POST dice; unset draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            workers: 5,
            requests_per_worker: 100,
            seed: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SweepConfig {
    pub probabilities: Vec<u8>,
    pub cache_modes: Vec<CacheMode>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            probabilities: vec![0, 20, 40, 60, 80],
            cache_modes: vec![CacheMode::Enabled, CacheMode::Disabled],
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct HarnessConfig {
    pub target: TargetConfig,
    pub run: RunSettings,
    pub sweep: SweepConfig,
    pub output_dir: PathBuf,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            target: TargetConfig::default(),
            run: RunSettings::default(),
            sweep: SweepConfig::default(),
            output_dir: PathBuf::from("."),
        }
    }
}

impl HarnessConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Defaults, then the YAML file (explicit path or the default location
    /// when present), then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                debug!("Loading configuration from {}", path.display());
                Self::from_file(path)?
            }
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                debug!("Loading configuration from {}", DEFAULT_CONFIG_PATH);
                Self::from_file(DEFAULT_CONFIG_PATH)?
            }
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        match env::var(BASE_URL_ENV) {
            Ok(url) => self.target.base_url = url,
            Err(env::VarError::NotPresent) => {}
            Err(e) => {
                return Err(Error::EnvVarError {
                    key: BASE_URL_ENV,
                    reason: e.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.target.base_url).map_err(|e| {
            Error::InvalidConfig(format!("invalid base_url '{}': {}", self.target.base_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidConfig(format!(
                "base_url must use http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.target.timeout_secs == Some(0) {
            return Err(Error::InvalidConfig(
                "target.timeout_secs must be at least 1 when set".to_string(),
            ));
        }
        if self.sweep.probabilities.is_empty() {
            return Err(Error::InvalidConfig("sweep.probabilities is empty".to_string()));
        }
        if self.sweep.cache_modes.is_empty() {
            return Err(Error::InvalidConfig("sweep.cache_modes is empty".to_string()));
        }
        // Every cell shares the worker bounds, so checking each probability covers the matrix.
        for &p in &self.sweep.probabilities {
            RunConfiguration::new(p, CacheMode::Enabled, self.run.workers, self.run.requests_per_worker)?;
        }
        Ok(())
    }

    pub fn run_configuration(&self, probability: u8, cache_mode: CacheMode) -> Result<RunConfiguration> {
        RunConfiguration::new(
            probability,
            cache_mode,
            self.run.workers,
            self.run.requests_per_worker,
        )
    }
}
