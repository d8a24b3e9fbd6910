//! Auto-Suggest Scheduler - Periodic Suggestions per Chat
//!
//! One cancellable tokio task per chat. Every tick asks the session
//! service for a suggestion and pushes it through the `Notifier`:
//! - suggestion (stake or no edge): sent
//! - cooldown block: skipped silently
//! - stop-loss / stop-win block: final notice, then the task removes
//!   itself so automatic mode turns off
//!
//! Re-enabling replaces the running task for that chat.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use crate::adapters::metrics::MetricsRegistry;
use crate::domain::{GateResult, Gated, UserId};
use crate::ports::Notifier;

use super::format;
use super::session_service::{ServiceError, SessionService};

/// What a single tick should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Notify(String),
    Skip,
    /// Send the notice and turn automatic mode off.
    Stop(String),
}

/// Decide the message for one tick.
pub async fn next_message(
    service: &SessionService,
    chat_id: UserId,
) -> Result<TickOutcome, ServiceError> {
    Ok(match service.request_suggestion(chat_id).await? {
        Gated::Allowed(suggestion) => TickOutcome::Notify(format::suggestion(&suggestion)),
        Gated::Blocked(GateResult::CooldownActive { .. } | GateResult::Clear) => TickOutcome::Skip,
        Gated::Blocked(gate) => TickOutcome::Stop(format!(
            "{}\n🔕 Automatic suggestions turned off.",
            format::blocked(&gate)
        )),
    })
}

struct AutoTask {
    id: u64,
    handle: JoinHandle<()>,
}

type TaskMap = Arc<Mutex<HashMap<UserId, AutoTask>>>;

/// Shortest period between automatic suggestions.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);
/// Longest period between automatic suggestions (one day).
pub const MAX_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

pub struct AutoSuggestScheduler {
    service: Arc<SessionService>,
    notifier: Arc<dyn Notifier>,
    default_interval: Duration,
    tasks: TaskMap,
    next_id: AtomicU64,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl AutoSuggestScheduler {
    pub fn new(
        service: Arc<SessionService>,
        notifier: Arc<dyn Notifier>,
        default_interval: Duration,
    ) -> Self {
        Self {
            service,
            notifier,
            default_interval,
            tasks: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Start (or restart) automatic suggestions for a chat.
    ///
    /// The period is clamped to `MIN_INTERVAL..=MAX_INTERVAL`. Returns
    /// the effective period.
    #[instrument(skip(self))]
    pub fn enable(&self, chat_id: UserId, interval: Option<Duration>) -> Duration {
        let period = interval
            .unwrap_or(self.default_interval)
            .clamp(MIN_INTERVAL, MAX_INTERVAL);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let mut tasks = lock(&self.tasks);
        let handle = tokio::spawn(drive(
            Arc::clone(&self.service),
            Arc::clone(&self.notifier),
            Arc::clone(&self.tasks),
            self.metrics.clone(),
            chat_id,
            id,
            period,
        ));
        if let Some(previous) = tasks.insert(chat_id, AutoTask { id, handle }) {
            previous.handle.abort();
            debug!(chat_id, "Replaced running auto task");
        }
        set_gauge(self.metrics.as_deref(), tasks.len());

        info!(chat_id, period_secs = period.as_secs(), "Auto suggestions enabled");
        period
    }

    /// Stop automatic suggestions. Returns false if none were running.
    #[instrument(skip(self))]
    pub fn disable(&self, chat_id: UserId) -> bool {
        let mut tasks = lock(&self.tasks);
        let removed = tasks.remove(&chat_id);
        set_gauge(self.metrics.as_deref(), tasks.len());

        match removed {
            Some(task) => {
                task.handle.abort();
                info!(chat_id, "Auto suggestions disabled");
                true
            }
            None => false,
        }
    }

    pub fn is_enabled(&self, chat_id: UserId) -> bool {
        lock(&self.tasks).contains_key(&chat_id)
    }

    /// Abort every task.
    pub fn shutdown(&self) {
        let mut tasks = lock(&self.tasks);
        let count = tasks.len();
        for (_, task) in tasks.drain() {
            task.handle.abort();
        }
        set_gauge(self.metrics.as_deref(), 0);
        info!(count, "Auto suggestion tasks stopped");
    }
}

async fn drive(
    service: Arc<SessionService>,
    notifier: Arc<dyn Notifier>,
    tasks: TaskMap,
    metrics: Option<Arc<MetricsRegistry>>,
    chat_id: UserId,
    id: u64,
    period: Duration,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        match next_message(&service, chat_id).await {
            Ok(TickOutcome::Notify(text)) => {
                if let Err(e) = notifier.notify(chat_id, &text).await {
                    warn!(chat_id, error = %e, "Auto suggestion not delivered");
                }
            }
            Ok(TickOutcome::Skip) => debug!(chat_id, "Cooldown active, tick skipped"),
            Ok(TickOutcome::Stop(text)) => {
                {
                    let mut tasks = lock(&tasks);
                    if tasks.get(&chat_id).is_some_and(|t| t.id == id) {
                        tasks.remove(&chat_id);
                    }
                    set_gauge(metrics.as_deref(), tasks.len());
                }
                info!(chat_id, "Stop limit reached, auto suggestions off");
                if let Err(e) = notifier.notify(chat_id, &text).await {
                    warn!(chat_id, error = %e, "Stop notice not delivered");
                }
                return;
            }
            Err(e) => warn!(chat_id, error = %e, "Auto suggestion tick failed"),
        }
    }
}

fn lock(tasks: &TaskMap) -> std::sync::MutexGuard<'_, HashMap<UserId, AutoTask>> {
    tasks.lock().unwrap_or_else(PoisonError::into_inner)
}

fn set_gauge(metrics: Option<&MetricsRegistry>, running: usize) {
    if let Some(m) = metrics {
        m.auto_sessions.set(i64::try_from(running).unwrap_or(i64::MAX));
    }
}
