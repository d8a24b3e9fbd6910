//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, applying environment overrides,
//! validating all parameters, and reading the bot token.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;

/// Environment variable holding the Telegram bot token.
pub const TOKEN_ENV: &str = "BOT_TOKEN";
/// Environment variable overriding the config path.
pub const CONFIG_PATH_ENV: &str = "BOT_CONFIG";
/// Environment variable overriding the health port (set by hosting platforms).
pub const PORT_ENV: &str = "PORT";

/// Config path from `BOT_CONFIG`, defaulting to `config.toml`.
pub fn config_path() -> String {
  std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config.toml".to_string())
}

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let mut config = parse_config(&content)?;
  apply_env_overrides(&mut config, std::env::var(PORT_ENV).ok().as_deref())?;

  info!(
    data_dir = %config.persistence.data_dir,
    kelly = config.advisor.kelly_fraction,
    auto_interval = config.auto.interval_seconds,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig =
    toml::from_str(content).with_context(|| "Failed to parse config.toml")?;
  validate_config(&config)?;
  Ok(config)
}

/// Apply environment overrides on top of the parsed file.
pub fn apply_env_overrides(config: &mut AppConfig, port: Option<&str>) -> Result<()> {
  if let Some(port) = port {
    config.health.port = port
      .trim()
      .parse()
      .with_context(|| format!("{PORT_ENV} must be a port number, got '{port}'"))?;
  }
  Ok(())
}

/// Read the bot token from the environment.
pub fn bot_token() -> Result<String> {
  let token = std::env::var(TOKEN_ENV).with_context(|| format!("{TOKEN_ENV} is not set"))?;
  anyhow::ensure!(!token.trim().is_empty(), "{TOKEN_ENV} is empty");
  Ok(token.trim().to_string())
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Positive numeric values where required
/// - Valid probability ranges (0..1)
/// - Non-negative risk limits
fn validate_config(config: &AppConfig) -> Result<()> {
  anyhow::ensure!(!config.bot.name.trim().is_empty(), "bot.name must not be empty");

  // Defaults validation
  let d = &config.defaults;
  anyhow::ensure!(
    d.bankroll.is_finite() && d.bankroll > 0.0,
    "defaults.bankroll must be positive, got {}",
    d.bankroll
  );
  anyhow::ensure!(
    d.stop_loss >= 0.0 && d.stop_win >= 0.0,
    "defaults stop_loss/stop_win must be >= 0, got {}/{}",
    d.stop_loss,
    d.stop_win
  );
  for (name, p) in [
    ("dragon", d.dragon_probability),
    ("tiger", d.tiger_probability),
    ("tie", d.tie_probability),
  ] {
    anyhow::ensure!(
      (0.0..=1.0).contains(&p),
      "defaults.{name}_probability must be in [0, 1], got {p}"
    );
  }

  // Advisor validation
  anyhow::ensure!(
    config.advisor.kelly_fraction > 0.0 && config.advisor.kelly_fraction <= 1.0,
    "Kelly fraction must be in (0, 1], got {}",
    config.advisor.kelly_fraction
  );
  anyhow::ensure!(
    config.advisor.min_stake > 0.0,
    "advisor.min_stake must be positive, got {}",
    config.advisor.min_stake
  );

  // Auto validation
  anyhow::ensure!(
    (10..=86_400).contains(&config.auto.interval_seconds),
    "auto.interval_seconds must be between 10 and 86400, got {}",
    config.auto.interval_seconds
  );

  // Telegram validation
  anyhow::ensure!(
    !config.telegram.api_base_url.is_empty(),
    "Telegram API URL must not be empty"
  );
  anyhow::ensure!(
    config.telegram.max_messages_per_second > 0,
    "telegram.max_messages_per_second must be positive"
  );

  anyhow::ensure!(
    !config.persistence.data_dir.is_empty(),
    "persistence.data_dir must not be empty"
  );

  Ok(())
}
