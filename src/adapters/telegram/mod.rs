//! Telegram Bot API Adapter
//!
//! Long-polling transport for the chat commands and the `Notifier`
//! implementation used by the auto-suggestion driver.
//!
//! Sub-modules:
//! - `client`: HTTP client with rate limiting and retries
//! - `poller`: getUpdates loop dispatching to the command handler
//! - `types`: API request/response type definitions

pub mod client;
pub mod poller;
pub mod types;

pub use client::{TelegramClient, TelegramClientConfig};
pub use poller::TelegramPoller;
