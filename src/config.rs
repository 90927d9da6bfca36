//! Simulator constants and runtime configuration.
//!
//! Configuration is a small JSON document (`endpoint`, `interval_seconds`,
//! ...) that can live in the platform config directory, be pointed at with
//! `PACKSIM_CONFIG`, or be skipped entirely in favour of the defaults.
//! Individual values can be overridden with `PACKSIM_*` environment
//! variables.

use crate::error::{Result, SimError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000/verify";
pub const DEFAULT_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DEVICE_ID: &str = "device-1";

pub const VALID_PREFIX: &str = "89";
pub const INVALID_PREFIX: &str = "50";
pub const INVALID_BARCODE_PROBABILITY: f64 = 0.1;
pub const BARCODE_RANDOM_DIGITS: usize = 10;
pub const BARCODE_LEN: usize = 12;

pub const WEIGHT_RANGE: RangeInclusive<f64> = 50.0..=1000.0;
pub const MRP_RANGE: RangeInclusive<f64> = 10.0..=500.0;
pub const EXPIRY_OFFSET_DAYS: RangeInclusive<i64> = -60..=365;

pub const ENV_CONFIG_PATH: &str = "PACKSIM_CONFIG";
pub const ENV_ENDPOINT: &str = "PACKSIM_ENDPOINT";
pub const ENV_INTERVAL_SECS: &str = "PACKSIM_INTERVAL_SECS";
pub const ENV_TIMEOUT_SECS: &str = "PACKSIM_TIMEOUT_SECS";
pub const ENV_MAX_CYCLES: &str = "PACKSIM_MAX_CYCLES";
pub const ENV_SEED: &str = "PACKSIM_SEED";
pub const ENV_DEVICES: &str = "PACKSIM_DEVICES";

/// Runtime configuration for one simulator process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// Verification endpoint every record is POSTed to.
    pub endpoint: String,
    /// Pause between cycles, in seconds. Processing time is not subtracted.
    pub interval_seconds: f64,
    /// Per-request timeout. `None` (`null` in the file, `none` in
    /// `PACKSIM_TIMEOUT_SECS`) leaves the request unbounded; `0` is invalid
    /// from either source.
    pub timeout_seconds: Option<f64>,
    /// Stop after this many cycles. `None` runs until interrupted.
    pub max_cycles: Option<u64>,
    /// Seed for reproducible records. `None` seeds from OS entropy.
    pub seed: Option<u64>,
    /// Number of simulated devices (more than one needs the `async` feature).
    pub devices: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            interval_seconds: DEFAULT_INTERVAL_SECS as f64,
            timeout_seconds: Some(DEFAULT_TIMEOUT_SECS as f64),
            max_cycles: None,
            seed: None,
            devices: 1,
        }
    }
}

impl SimConfig {
    /// Parse a JSON config file. Missing keys take their default value.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .map_err(|e| SimError::InvalidConfig(format!("{}: {}", path.display(), e)))
    }

    /// Resolve the effective configuration.
    ///
    /// Lookup order for the file is `explicit`, then `$PACKSIM_CONFIG`, then
    /// [`default_config_path`] if that file exists. With no file the defaults
    /// are used. Environment overrides are applied last and the result is
    /// validated.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(ENV_CONFIG_PATH).map(PathBuf::from))
            .or_else(|| default_config_path().filter(|p| p.exists()));

        let mut config = match path {
            Some(p) => {
                tracing::debug!(path = %p.display(), "loading config file");
                Self::from_file(&p)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `PACKSIM_*` overrides using `lookup` to read variables.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup(ENV_ENDPOINT) {
            self.endpoint = endpoint;
        }
        if let Some(v) = lookup(ENV_INTERVAL_SECS) {
            self.interval_seconds = parse_var(ENV_INTERVAL_SECS, &v)?;
        }
        if let Some(v) = lookup(ENV_TIMEOUT_SECS) {
            self.timeout_seconds = match v.trim() {
                "none" => None,
                other => Some(parse_var(ENV_TIMEOUT_SECS, other)?),
            };
        }
        if let Some(v) = lookup(ENV_MAX_CYCLES) {
            self.max_cycles = Some(parse_var(ENV_MAX_CYCLES, &v)?);
        }
        if let Some(v) = lookup(ENV_SEED) {
            self.seed = Some(parse_var(ENV_SEED, &v)?);
        }
        if let Some(v) = lookup(ENV_DEVICES) {
            self.devices = parse_var(ENV_DEVICES, &v)?;
        }
        Ok(())
    }

    /// Check that the configuration describes a runnable simulator.
    pub fn validate(&self) -> Result<()> {
        validate_endpoint(&self.endpoint)?;

        if Duration::try_from_secs_f64(self.interval_seconds).is_err() {
            return Err(SimError::InvalidConfig(format!(
                "interval_seconds must be a non-negative number of seconds a duration can hold, got {}",
                self.interval_seconds
            )));
        }
        if let Some(t) = self.timeout_seconds {
            if t <= 0.0 || Duration::try_from_secs_f64(t).is_err() {
                return Err(SimError::InvalidConfig(format!(
                    "timeout_seconds must be a positive number of seconds a duration can hold, got {}",
                    t
                )));
            }
        }
        if self.devices == 0 {
            return Err(SimError::InvalidConfig(
                "devices must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The cycle interval. Values [`validate`](Self::validate) would reject
    /// saturate instead of panicking.
    pub fn interval(&self) -> Duration {
        seconds_to_duration(self.interval_seconds)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(seconds_to_duration)
    }
}

/// Reject anything that is not an absolute http(s) URL.
pub fn validate_endpoint(endpoint: &str) -> Result<()> {
    let url = reqwest::Url::parse(endpoint)
        .map_err(|e| SimError::InvalidConfig(format!("endpoint '{}': {}", endpoint, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(SimError::InvalidConfig(format!(
            "endpoint '{}': unsupported scheme '{}'",
            endpoint, other
        ))),
    }
}

/// Platform config file location, e.g. `~/.config/packsim/config.json` on Linux.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("packsim").join("config.json"))
}

fn seconds_to_duration(seconds: f64) -> Duration {
    if seconds.is_nan() || seconds <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
}

fn parse_var<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| SimError::InvalidConfig(format!("{}='{}': {}", key, value, e)))
}
