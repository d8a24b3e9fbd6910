//! Telegram HTTP Client - Rate-limited Bot API Client
//!
//! Wraps reqwest with bounded concurrency, retries with exponential
//! backoff and an outbound message rate limiter. The token is part of
//! every URL, so errors are stripped of their URL before logging.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

use super::types::{ApiResponse, GetUpdatesRequest, SendMessageRequest, Update, User};
use crate::adapters::metrics::MetricsRegistry;
use crate::config::TelegramConfig;
use crate::domain::UserId;
use crate::ports::Notifier;

/// Configuration for the Telegram client.
#[derive(Debug, Clone)]
pub struct TelegramClientConfig {
  pub api_base_url: String,
  pub token: String,
  /// Long-poll timeout sent to getUpdates.
  pub poll_timeout: Duration,
  /// Timeout for non-polling requests.
  pub request_timeout: Duration,
  pub max_concurrent: usize,
  pub max_retries: u32,
  /// Base delay between retries (exponential backoff).
  pub retry_base_delay: Duration,
  pub max_messages_per_second: u32,
}

impl TelegramClientConfig {
  pub fn new(config: &TelegramConfig, token: String) -> Self {
    Self {
      api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
      token,
      poll_timeout: Duration::from_secs(config.poll_timeout_seconds),
      request_timeout: Duration::from_secs(15),
      max_concurrent: 10,
      max_retries: config.max_retries,
      retry_base_delay: Duration::from_millis(config.retry_base_delay_ms),
      max_messages_per_second: config.max_messages_per_second,
    }
  }
}

/// Rate-limited client for the Telegram Bot API.
pub struct TelegramClient {
  http: Client,
  config: TelegramClientConfig,
  /// Concurrency limiter.
  semaphore: Arc<Semaphore>,
  /// Outbound message limiter.
  limiter: DefaultDirectRateLimiter,
  metrics: Option<Arc<MetricsRegistry>>,
}

impl TelegramClient {
  pub fn new(config: TelegramClientConfig) -> Result<Self> {
    let http = Client::builder()
      .pool_max_idle_per_host(5)
      .build()
      .context("Failed to build HTTP client")?;

    let per_second = NonZeroU32::new(config.max_messages_per_second)
      .context("telegram.max_messages_per_second must be > 0")?;
    let limiter = RateLimiter::direct(Quota::per_second(per_second));
    let semaphore = Arc::new(Semaphore::new(config.max_concurrent));

    Ok(Self {
      http,
      config,
      semaphore,
      limiter,
      metrics: None,
    })
  }

  pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
    self.metrics = Some(metrics);
    self
  }

  pub fn poll_timeout(&self) -> Duration {
    self.config.poll_timeout
  }

  /// Identity of the bot behind the token.
  pub async fn get_me(&self) -> Result<User> {
    self
      .call("getMe", &serde_json::json!({}), self.config.request_timeout)
      .await
  }

  /// Long-poll for updates after `offset`.
  #[instrument(skip(self))]
  pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
    let request = GetUpdatesRequest {
      offset,
      timeout: self.config.poll_timeout.as_secs(),
      allowed_updates: vec!["message"],
    };
    // HTTP timeout must outlast the server-side long poll.
    let timeout = self.config.poll_timeout + Duration::from_secs(10);
    self.call("getUpdates", &request, timeout).await
  }

  /// Send a plain-text message, waiting for the rate limiter.
  #[instrument(skip(self, text))]
  pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
    self.limiter.until_ready().await;

    let request = SendMessageRequest { chat_id, text };
    let result: Result<serde_json::Value> = self
      .call("sendMessage", &request, self.config.request_timeout)
      .await;

    if let Some(m) = &self.metrics {
      let status = if result.is_ok() { "ok" } else { "error" };
      m.messages_sent.with_label_values(&[status]).inc();
    }
    result.map(|_| ())
  }

  /// Execute a Bot API method with concurrency limiting and retries.
  async fn call<P, R>(&self, method: &str, payload: &P, timeout: Duration) -> Result<R>
  where
    P: Serialize + ?Sized,
    R: DeserializeOwned,
  {
    let _permit = self
      .semaphore
      .acquire()
      .await
      .context("Semaphore closed")?;

    let url = format!("{}/bot{}/{method}", self.config.api_base_url, self.config.token);
    let mut last_error = None;

    for attempt in 0..=self.config.max_retries {
      if attempt > 0 {
        let delay = self.config.retry_base_delay * 2u32.pow(attempt - 1);
        debug!(method, attempt, delay_ms = delay.as_millis(), "Retrying request");
        sleep(delay).await;
      }

      let response = match self
        .http
        .post(&url)
        .timeout(timeout)
        .json(payload)
        .send()
        .await
      {
        Ok(response) => response,
        Err(e) => {
          let e = e.without_url();
          warn!(method, error = %e, attempt, "Request failed");
          last_error = Some(anyhow::Error::from(e));
          continue;
        }
      };

      let status = response.status();
      let body: ApiResponse<R> = match response.json().await {
        Ok(body) => body,
        Err(e) => {
          let e = e.without_url();
          warn!(method, %status, error = %e, "Undecodable response");
          last_error = Some(anyhow::anyhow!("{method}: undecodable response ({status}): {e}"));
          continue;
        }
      };

      if body.ok {
        return body
          .result
          .with_context(|| format!("{method}: ok response without result"));
      }

      let description = body.description.clone().unwrap_or_default();
      if let Some(wait) = body.retry_after() {
        warn!(method, retry_after = wait, "Flood control, backing off");
        sleep(Duration::from_secs(wait)).await;
        last_error = Some(anyhow::anyhow!("{method}: rate limited"));
        continue;
      }
      if status.is_server_error() {
        warn!(method, %status, "Server error, retrying");
        last_error = Some(anyhow::anyhow!("{method}: server error {status}"));
        continue;
      }
      anyhow::bail!(
        "{method} failed ({}): {description}",
        body.error_code.unwrap_or_else(|| i64::from(status.as_u16()))
      );
    }

    Err(last_error.unwrap_or_else(|| anyhow::anyhow!("{method}: max retries exceeded")))
  }
}

#[async_trait]
impl Notifier for TelegramClient {
  async fn notify(&self, chat_id: UserId, text: &str) -> Result<()> {
    self.send_message(chat_id, text).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_config_from_section() {
    let section = TelegramConfig {
      api_base_url: "https://api.telegram.org/".to_string(),
      ..TelegramConfig::default()
    };
    let cfg = TelegramClientConfig::new(&section, "123:abc".to_string());
    assert_eq!(cfg.api_base_url, "https://api.telegram.org");
    assert_eq!(cfg.poll_timeout, Duration::from_secs(30));
    assert_eq!(cfg.retry_base_delay, Duration::from_millis(200));
  }

  #[test]
  fn test_zero_message_rate_is_rejected() {
    let section = TelegramConfig {
      max_messages_per_second: 0,
      ..TelegramConfig::default()
    };
    let cfg = TelegramClientConfig::new(&section, "t".to_string());
    assert!(TelegramClient::new(cfg).is_err());
  }
}
