//! Configuration Module - TOML-based Bot Configuration
//!
//! Loads and validates configuration from `config.toml` with
//! environment variable overrides (`.env` supported via dotenvy).
//! Secrets (the bot token) never live in the TOML file.

pub mod loader;

use anyhow::{Context, Result};
use rust_decimal::prelude::*;
use serde::Deserialize;

use crate::domain::{KellyCriterion, Probabilities, ProfileDefaults, RiskPolicy};

/// Top-level bot configuration.
///
/// Loaded from `config.toml` at startup. All fields are validated
/// before the bot begins operation.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Bot identity and logging.
  pub bot: BotConfig,
  /// Telegram Bot API transport.
  #[serde(default)]
  pub telegram: TelegramConfig,
  /// Values a new user's profile starts with.
  #[serde(default)]
  pub defaults: DefaultsConfig,
  /// Stake advisor parameters.
  #[serde(default)]
  pub advisor: AdvisorConfig,
  /// Periodic suggestion driver.
  #[serde(default)]
  pub auto: AutoConfig,
  /// Persistence configuration.
  #[serde(default)]
  pub persistence: PersistenceConfig,
  /// Health and metrics endpoints.
  #[serde(default)]
  pub health: HealthConfig,
}

/// Bot identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
  /// Human-readable bot name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// Emit JSON logs (plain text when false).
  #[serde(default = "default_true")]
  pub json_logs: bool,
}

/// Telegram Bot API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
  /// API base URL.
  #[serde(default = "default_telegram_url")]
  pub api_base_url: String,
  /// Long-poll timeout passed to getUpdates (seconds).
  #[serde(default = "default_poll_timeout")]
  pub poll_timeout_seconds: u64,
  /// Maximum outbound messages per second.
  #[serde(default = "default_max_messages")]
  pub max_messages_per_second: u32,
  /// Maximum retries on transient errors.
  #[serde(default = "default_max_retries")]
  pub max_retries: u32,
  /// Base delay between retries (exponential backoff, milliseconds).
  #[serde(default = "default_retry_delay")]
  pub retry_base_delay_ms: u64,
}

/// Profile defaults for first-time users.
#[derive(Debug, Clone, Deserialize)]
pub struct DefaultsConfig {
  #[serde(default = "default_bankroll")]
  pub bankroll: f64,
  #[serde(default)]
  pub stop_loss: f64,
  #[serde(default)]
  pub stop_win: f64,
  #[serde(default)]
  pub cooldown_minutes: u32,
  #[serde(default = "default_even_probability")]
  pub dragon_probability: f64,
  #[serde(default = "default_even_probability")]
  pub tiger_probability: f64,
  #[serde(default = "default_tie_probability")]
  pub tie_probability: f64,
}

/// Stake advisor configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AdvisorConfig {
  /// Kelly fraction multiplier (1.0 = full Kelly).
  #[serde(default = "default_kelly_fraction")]
  pub kelly_fraction: f64,
  /// Smallest stake ever recommended.
  #[serde(default = "default_min_stake")]
  pub min_stake: f64,
}

/// Periodic suggestion configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AutoConfig {
  /// Default interval between automatic suggestions (seconds).
  #[serde(default = "default_auto_interval")]
  pub interval_seconds: u64,
}

/// Persistence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
  /// Directory holding one JSON profile per user.
  #[serde(default = "default_data_dir")]
  pub data_dir: String,
}

/// Health and metrics server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthConfig {
  /// Serve /live, /ready and /metrics.
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Bind address.
  #[serde(default = "default_bind_host")]
  pub bind_host: String,
  /// Port (overridden by the PORT env var when set).
  #[serde(default = "default_health_port")]
  pub port: u16,
}

impl DefaultsConfig {
  /// Convert to domain defaults.
  pub fn to_profile_defaults(&self) -> Result<ProfileDefaults> {
    Ok(ProfileDefaults {
      bankroll: to_decimal(self.bankroll, "defaults.bankroll")?,
      policy: RiskPolicy {
        stop_loss: to_decimal(self.stop_loss, "defaults.stop_loss")?,
        stop_win: to_decimal(self.stop_win, "defaults.stop_win")?,
        cooldown_minutes: self.cooldown_minutes,
      },
      probabilities: Probabilities {
        dragon: to_decimal(self.dragon_probability, "defaults.dragon_probability")?,
        tiger: to_decimal(self.tiger_probability, "defaults.tiger_probability")?,
        tie: to_decimal(self.tie_probability, "defaults.tie_probability")?,
      },
    })
  }
}

impl AdvisorConfig {
  pub fn to_kelly(&self) -> Result<KellyCriterion> {
    Ok(KellyCriterion::new(
      to_decimal(self.kelly_fraction, "advisor.kelly_fraction")?,
      to_decimal(self.min_stake, "advisor.min_stake")?,
    ))
  }
}

fn to_decimal(value: f64, field: &str) -> Result<Decimal> {
  Decimal::from_f64(value).with_context(|| format!("{field} is not a finite number: {value}"))
}

impl Default for TelegramConfig {
  fn default() -> Self {
    Self {
      api_base_url: default_telegram_url(),
      poll_timeout_seconds: default_poll_timeout(),
      max_messages_per_second: default_max_messages(),
      max_retries: default_max_retries(),
      retry_base_delay_ms: default_retry_delay(),
    }
  }
}

impl Default for DefaultsConfig {
  fn default() -> Self {
    Self {
      bankroll: default_bankroll(),
      stop_loss: 0.0,
      stop_win: 0.0,
      cooldown_minutes: 0,
      dragon_probability: default_even_probability(),
      tiger_probability: default_even_probability(),
      tie_probability: default_tie_probability(),
    }
  }
}

impl Default for AdvisorConfig {
  fn default() -> Self {
    Self {
      kelly_fraction: default_kelly_fraction(),
      min_stake: default_min_stake(),
    }
  }
}

impl Default for AutoConfig {
  fn default() -> Self {
    Self {
      interval_seconds: default_auto_interval(),
    }
  }
}

impl Default for PersistenceConfig {
  fn default() -> Self {
    Self {
      data_dir: default_data_dir(),
    }
  }
}

impl Default for HealthConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      bind_host: default_bind_host(),
      port: default_health_port(),
    }
  }
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_true() -> bool {
  true
}

fn default_telegram_url() -> String {
  "https://api.telegram.org".to_string()
}

fn default_poll_timeout() -> u64 {
  30
}

fn default_max_messages() -> u32 {
  25
}

fn default_max_retries() -> u32 {
  3
}

fn default_retry_delay() -> u64 {
  200
}

fn default_bankroll() -> f64 {
  100.0
}

fn default_even_probability() -> f64 {
  0.5
}

fn default_tie_probability() -> f64 {
  0.08
}

fn default_kelly_fraction() -> f64 {
  1.0
}

fn default_min_stake() -> f64 {
  1.0
}

fn default_auto_interval() -> u64 {
  300
}

fn default_data_dir() -> String {
  "data".to_string()
}

fn default_bind_host() -> String {
  "0.0.0.0".to_string()
}

fn default_health_port() -> u16 {
  8080
}
