//! Telegram Long-Polling Loop
//!
//! Fetches updates with `getUpdates`, hands every text message to the
//! `CommandHandler` and sends the reply back. Updates of a batch are
//! handled in order. Exits on the shutdown signal.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use super::client::TelegramClient;
use super::types::Update;
use crate::usecases::CommandHandler;

/// Pause after a failed poll before trying again.
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

pub struct TelegramPoller {
  client: Arc<TelegramClient>,
  handler: Arc<CommandHandler>,
  /// Next update id to request.
  offset: i64,
}

impl TelegramPoller {
  pub fn new(client: Arc<TelegramClient>, handler: Arc<CommandHandler>) -> Self {
    Self {
      client,
      handler,
      offset: 0,
    }
  }

  /// Poll until shutdown.
  #[instrument(skip(self, shutdown_rx))]
  pub async fn run(mut self, mut shutdown_rx: broadcast::Receiver<()>) -> anyhow::Result<()> {
    info!(
      poll_timeout_secs = self.client.poll_timeout().as_secs(),
      "Telegram polling started"
    );

    loop {
      tokio::select! {
        _ = shutdown_rx.recv() => {
          info!("Shutdown signal received, stopping polling");
          return Ok(());
        }
        result = self.client.get_updates(self.offset) => match result {
          Ok(updates) => {
            for update in updates {
              self.dispatch(update).await;
            }
          }
          Err(e) => {
            warn!(error = %e, "getUpdates failed");
            sleep(ERROR_BACKOFF).await;
          }
        },
      }
    }
  }

  async fn dispatch(&mut self, update: Update) {
    self.offset = self.offset.max(update.update_id + 1);

    let Some(message) = update.message else {
      return;
    };
    let Some(text) = message.text.as_deref() else {
      return;
    };

    let chat_id = message.chat.id;
    debug!(chat_id, update_id = update.update_id, "Message received");

    if let Some(reply) = self.handler.handle(chat_id, text).await {
      if let Err(e) = self.client.send_message(chat_id, &reply).await {
        warn!(chat_id, error = %e, "Reply not delivered");
      }
    }
  }
}
