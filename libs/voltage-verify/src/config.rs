//! Run configuration
//!
//! Layered with figment, lowest to highest priority:
//! 1. compiled defaults
//! 2. optional YAML file
//! 3. `MODPOLL_*` environment variables
//! 4. explicit overrides (command line)

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::bytes::{ByteEndian, WordOrder};
use crate::error::{Result, VerifyError};
use crate::orchestrator::{PollSettings, RequestFilter};
use crate::policy::AcquisitionPolicy;
use crate::report::Target;

/// Environment variable prefix, e.g. `MODPOLL_HOST`
pub const ENV_PREFIX: &str = "MODPOLL_";

pub const DEFAULT_PORT: u16 = 502;
pub const DEFAULT_PLAN: &str = "modpoll_verify_gen24.csv";
pub const DEFAULT_TIMEOUT_SECS: f64 = 3.0;
pub const DEFAULT_RETRY_DELAY_SECS: f64 = 0.3;

/// Verification run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    /// Modbus TCP host (required)
    pub host: String,
    pub port: u16,
    /// CSV plan file
    pub plan: PathBuf,
    /// Per-read socket timeout in seconds
    pub timeout: f64,
    /// Retries per read on transport error
    pub retries: u32,
    /// Delay between retries in seconds
    pub retry_delay: f64,
    /// Byte order within 16-bit words
    pub endian: ByteEndian,
    /// Word order for 32-bit values
    pub word_order: WordOrder,
    /// Only read this slave id (0 = all)
    pub only_slave: u8,
    /// Only read rows whose group contains this (case-insensitive)
    pub only_group: String,
    /// Write the JSON report here
    pub json: Option<PathBuf>,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            plan: PathBuf::from(DEFAULT_PLAN),
            timeout: DEFAULT_TIMEOUT_SECS,
            retries: crate::policy::DEFAULT_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY_SECS,
            endian: ByteEndian::default(),
            word_order: WordOrder::default(),
            only_slave: 0,
            only_group: String::new(),
            json: None,
        }
    }
}

impl VerifyConfig {
    /// Provider chain without command line overrides
    pub fn figment(config_file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(VerifyConfig::default()));
        if let Some(path) = config_file {
            figment = figment.merge(Yaml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load defaults + file + environment, then validate
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        Self::load_with(config_file, &Overrides::default())
    }

    /// Load and apply `overrides` on top; only serialized keys take effect
    pub fn load_with<T: Serialize>(config_file: Option<&Path>, overrides: &T) -> Result<Self> {
        if let Some(path) = config_file {
            if !path.exists() {
                return Err(VerifyError::config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
        }

        let config: VerifyConfig = Self::figment(config_file)
            .merge(Serialized::defaults(overrides))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(VerifyError::config("host is required"));
        }
        if self.port == 0 {
            return Err(VerifyError::config("port must be greater than zero"));
        }
        match Duration::try_from_secs_f64(self.timeout) {
            Ok(timeout) if !timeout.is_zero() => {},
            _ => {
                return Err(VerifyError::config(format!(
                    "timeout must be a positive number of seconds, got {}",
                    self.timeout
                )))
            },
        }
        if Duration::try_from_secs_f64(self.retry_delay).is_err() {
            return Err(VerifyError::config(format!(
                "retry_delay must be >= 0 seconds, got {}",
                self.retry_delay
            )));
        }
        Ok(())
    }

    /// Per-read timeout; falls back to the default when not representable
    pub fn timeout_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout)
            .unwrap_or_else(|_| Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS))
    }

    /// Retry delay; falls back to the default when not representable
    pub fn retry_delay_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.retry_delay)
            .unwrap_or_else(|_| Duration::from_secs_f64(DEFAULT_RETRY_DELAY_SECS))
    }

    pub fn target(&self) -> Target {
        Target::new(self.host.clone(), self.port)
    }

    pub fn policy(&self) -> AcquisitionPolicy {
        AcquisitionPolicy::new(self.retries, self.retry_delay_duration())
    }

    pub fn filter(&self) -> RequestFilter {
        RequestFilter::new(self.only_slave, &self.only_group)
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings::new(self.target())
            .with_ordering(self.endian, self.word_order)
            .with_policy(self.policy())
            .with_filter(self.filter())
    }
}

/// Sparse override set; `None` fields leave lower layers untouched
#[derive(Debug, Clone, Default, Serialize)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_delay: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endian: Option<ByteEndian>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_order: Option<WordOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub only_slave: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub only_group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json: Option<PathBuf>,
}
