//! Metrics and Monitoring Adapters
//!
//! Prometheus counters plus /live, /ready and /metrics endpoints
//! served by axum 0.7.

pub mod health;
pub mod prometheus;

pub use health::{HealthServer, HealthState};
pub use prometheus::MetricsRegistry;
