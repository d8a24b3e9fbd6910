//! Prometheus Metrics Registry - Session Observability
//!
//! Counters for chat commands, wagers, settlements, suggestions, gate
//! blocks and outbound messages. Exposed in text format on /metrics
//! by the health server.

use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// Centralized Prometheus metrics for the bot.
///
/// All metrics follow the naming convention `bankroll_bot_*`.
#[derive(Clone)]
pub struct MetricsRegistry {
    /// Prometheus registry.
    registry: Registry,
    /// Chat commands handled, by command name.
    pub commands: IntCounterVec,
    /// Wagers accepted, by market.
    pub wagers_placed: IntCounterVec,
    /// Wagers settled, by outcome.
    pub results_recorded: IntCounterVec,
    /// Advisor outputs, by kind (stake / no_edge).
    pub suggestions: IntCounterVec,
    /// Gate decisions that blocked an action, by reason.
    pub gate_blocks: IntCounterVec,
    /// Outbound chat messages, by status (ok / error).
    pub messages_sent: IntCounterVec,
    /// Chats with automatic suggestions enabled.
    pub auto_sessions: IntGauge,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let commands = IntCounterVec::new(
            Opts::new("bankroll_bot_commands_total", "Chat commands handled"),
            &["command"],
        )?;

        let wagers_placed = IntCounterVec::new(
            Opts::new("bankroll_bot_wagers_placed_total", "Wagers accepted"),
            &["market"],
        )?;

        let results_recorded = IntCounterVec::new(
            Opts::new("bankroll_bot_results_recorded_total", "Wagers settled"),
            &["outcome"],
        )?;

        let suggestions = IntCounterVec::new(
            Opts::new("bankroll_bot_suggestions_total", "Advisor suggestions produced"),
            &["kind"],
        )?;

        let gate_blocks = IntCounterVec::new(
            Opts::new(
                "bankroll_bot_gate_blocks_total",
                "Actions blocked by cooldown or stop limits",
            ),
            &["reason"],
        )?;

        let messages_sent = IntCounterVec::new(
            Opts::new("bankroll_bot_messages_sent_total", "Outbound chat messages"),
            &["status"],
        )?;

        let auto_sessions = IntGauge::new(
            "bankroll_bot_auto_sessions",
            "Chats with automatic suggestions enabled",
        )?;

        // Register all metrics
        registry.register(Box::new(commands.clone()))?;
        registry.register(Box::new(wagers_placed.clone()))?;
        registry.register(Box::new(results_recorded.clone()))?;
        registry.register(Box::new(suggestions.clone()))?;
        registry.register(Box::new(gate_blocks.clone()))?;
        registry.register(Box::new(messages_sent.clone()))?;
        registry.register(Box::new(auto_sessions.clone()))?;

        Ok(Self {
            registry,
            commands,
            wagers_placed,
            results_recorded,
            suggestions,
            gate_blocks,
            messages_sent,
            auto_sessions,
        })
    }

    /// Encode all metrics in the Prometheus text format.
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_contains_counters() {
        let metrics = MetricsRegistry::new().unwrap();
        metrics.commands.with_label_values(&["bet"]).inc();
        metrics.gate_blocks.with_label_values(&["cooldown"]).inc_by(2);

        let text = metrics.render().unwrap();
        assert!(text.contains("bankroll_bot_commands_total{command=\"bet\"} 1"));
        assert!(text.contains("bankroll_bot_gate_blocks_total{reason=\"cooldown\"} 2"));
    }
}
