//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (HTTP, file I/O). Each sub-module groups
//! adapters by infrastructure concern.
//!
//! Adapter categories:
//! - `telegram`: Telegram Bot API polling and messaging
//! - `metrics`: Prometheus metrics export and health checks
//! - `persistence`: JSON profile files and in-memory store

pub mod metrics;
pub mod persistence;
pub mod telegram;
