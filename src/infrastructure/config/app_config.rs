//! Application configuration.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use super::args::CliArgs;
use super::storage::ConfigError;
use crate::application::PaymentFlowConfig;
use crate::domain::entities::{Currency, Money, PaymentRequest};
use crate::infrastructure::reader::SimulatedOutcome;

pub(super) const APP_NAME: &str = "mizpos-terminal";
pub(super) const APP_QUALIFIER: &str = "com";
pub(super) const APP_ORGANIZATION: &str = "mizpos";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Terminal configuration, loaded from `config.toml` and overridden by CLI flags.
#[derive(Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration file path.
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[serde(skip)]
    pub log_path: Option<PathBuf>,

    /// JSON file holding a request to load at startup.
    #[serde(skip)]
    pub request_file: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Name this terminal reports to the POS.
    #[serde(default = "default_terminal_name")]
    pub terminal_name: String,

    /// Card reader settings.
    #[serde(default)]
    pub reader: ReaderConfig,

    /// Pairing session settings.
    #[serde(default)]
    pub session: SessionConfig,
}

/// Simulated card reader settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Delay applied to each reader call, in milliseconds.
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,

    /// Scripted outcome.
    #[serde(default)]
    pub outcome: SimulatedOutcome,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            latency_ms: default_latency_ms(),
            outcome: SimulatedOutcome::default(),
        }
    }
}

/// Pairing session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Upper bound on completion/cancellation notifications, in milliseconds.
    #[serde(default = "default_notify_timeout_ms")]
    pub notify_timeout_ms: u64,

    /// Request pushed when the terminal starts.
    #[serde(default)]
    pub demo_request: Option<DemoRequestConfig>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            notify_timeout_ms: default_notify_timeout_ms(),
            demo_request: None,
        }
    }
}

/// Request template for the simulator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoRequestConfig {
    /// Minor-unit amount.
    pub amount: u64,

    /// ISO-4217 code.
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
}

impl Default for DemoRequestConfig {
    fn default() -> Self {
        Self {
            amount: 1500,
            currency: default_currency(),
            description: None,
        }
    }
}

impl DemoRequestConfig {
    /// Builds a request with the given id.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidRequest` for a bad currency or a zero amount.
    pub fn to_request(&self, id: impl Into<String>) -> Result<PaymentRequest, ConfigError> {
        let currency = Currency::new(&self.currency).ok_or_else(|| {
            ConfigError::InvalidRequest(format!("unknown currency {:?}", self.currency))
        })?;
        let money = Money::new(self.amount, currency)
            .ok_or_else(|| ConfigError::InvalidRequest("amount must be positive".to_string()))?;

        let request = PaymentRequest::new(id, money);
        Ok(match &self.description {
            Some(description) => request.with_description(description.clone()),
            None => request,
        })
    }
}

fn default_terminal_name() -> String {
    "terminal".to_string()
}

const fn default_latency_ms() -> u64 {
    800
}

const fn default_notify_timeout_ms() -> u64 {
    3_000
}

fn default_currency() -> String {
    "JPY".to_string()
}

impl AppConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: CliArgs) {
        if let Some(config_path) = args.config {
            self.config = Some(config_path);
        }
        if let Some(log_path) = args.log_path {
            self.log_path = Some(log_path);
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(terminal_name) = args.terminal_name {
            self.terminal_name = terminal_name;
        }
        if let Some(latency_ms) = args.latency_ms {
            self.reader.latency_ms = latency_ms;
        }
        if let Some(outcome) = args.outcome {
            self.reader.outcome = outcome;
        }
        if let Some(request_file) = args.request {
            self.request_file = Some(request_file);
        }
        if args.amount.is_some() || args.currency.is_some() {
            let demo = self.session.demo_request.get_or_insert_with(DemoRequestConfig::default);
            if let Some(amount) = args.amount {
                demo.amount = amount;
            }
            if let Some(currency) = args.currency {
                demo.currency = currency;
            }
        }
    }

    /// Reader call latency.
    #[must_use]
    pub const fn reader_latency(&self) -> Duration {
        Duration::from_millis(self.reader.latency_ms)
    }

    /// Controller settings.
    #[must_use]
    pub const fn flow_config(&self) -> PaymentFlowConfig {
        PaymentFlowConfig::new()
            .with_notify_timeout(Duration::from_millis(self.session.notify_timeout_ms))
    }

    /// Request to push at startup: the request file wins over the demo request.
    ///
    /// # Errors
    /// Returns error if the request file cannot be read or parsed.
    pub fn initial_request(&self) -> Result<Option<PaymentRequest>, ConfigError> {
        if let Some(path) = &self.request_file {
            let content = std::fs::read_to_string(path)?;
            let request = serde_json::from_str(&content)?;
            return Ok(Some(request));
        }
        self.session
            .demo_request
            .as_ref()
            .map(|demo| demo.to_request("demo-1"))
            .transpose()
    }

    /// Returns default config directory.
    #[must_use]
    pub fn default_config_dir() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns default config file path.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        Self::default_config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Returns default log file path.
    #[must_use]
    pub fn default_log_path() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.data_dir().join("mizpos-terminal.log"))
    }

    /// Returns effective config path.
    #[must_use]
    pub fn effective_config_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(Self::default_config_path)
    }

    /// Returns effective log path.
    #[must_use]
    pub fn effective_log_path(&self) -> Option<PathBuf> {
        self.log_path.clone().or_else(Self::default_log_path)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config: None,
            log_path: None,
            request_file: None,
            log_level: LogLevel::Info,
            terminal_name: default_terminal_name(),
            reader: ReaderConfig::default(),
            session: SessionConfig::default(),
        }
    }
}
