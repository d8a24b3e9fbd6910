//! Notifier Port - Outbound Chat Messages
//!
//! Used by the chat transport loop to answer commands and by the
//! auto-suggestion driver to push periodic messages. The session core
//! never calls it.

use async_trait::async_trait;

use crate::domain::UserId;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
  /// Send a plain-text message to a chat.
  async fn notify(&self, chat_id: UserId, text: &str) -> anyhow::Result<()>;
}
