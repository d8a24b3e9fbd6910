//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates the domain session rules with the port interfaces.
//!
//! Use cases:
//! - `SessionService`: per-user load → operate → persist cycle
//! - `CommandHandler`: chat command parsing and replies
//! - `AutoSuggestScheduler`: periodic suggestions per chat
//! - `format`: plain-text rendering of results

pub mod auto_suggest;
pub mod commands;
pub mod format;
pub mod session_service;

pub use auto_suggest::{AutoSuggestScheduler, TickOutcome};
pub use commands::{Command, CommandHandler, ParseError};
pub use session_service::{ServiceError, SessionService};
