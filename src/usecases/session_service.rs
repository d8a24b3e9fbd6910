//! Session Service Use Case - Load, Operate, Persist
//!
//! Wraps the pure `SessionController` with the repository and clock
//! ports. Each call runs one load→operate→persist cycle while holding
//! a per-user async mutex, so two operations for the same user never
//! interleave while different users proceed concurrently.
//!
//! A profile is only written back when the operation succeeded and
//! actually changed it.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::adapters::metrics::MetricsRegistry;
use crate::domain::{
    Advisor, Gated, Profile, ProfileDefaults, SessionController, SessionError, SessionStats,
    Settlement, Suggestion, UserId, Wager,
};
use crate::ports::{Clock, ProfileRepository};

/// Failure of a service call.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Rejected by the session rules; shown to the user.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Persistence collaborator failed; surfaced unchanged.
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub struct SessionService {
    repository: Arc<dyn ProfileRepository>,
    clock: Arc<dyn Clock>,
    advisor: Advisor,
    defaults: ProfileDefaults,
    /// One mutex per user id with a call in flight.
    locks: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl SessionService {
    pub fn new(
        repository: Arc<dyn ProfileRepository>,
        clock: Arc<dyn Clock>,
        advisor: Advisor,
        defaults: ProfileDefaults,
    ) -> Self {
        Self {
            repository,
            clock,
            advisor,
            defaults,
            locks: Mutex::new(HashMap::new()),
            metrics: None,
        }
    }

    /// Record counters in the given registry.
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Load the profile, creating and saving the defaults on first access.
    pub async fn ensure_profile(&self, user_id: UserId) -> Result<Profile, ServiceError> {
        self.run(user_id, |c, _| Ok(c.profile().clone())).await
    }

    /// Gate then advise. Blocks are returned, not raised.
    #[instrument(skip(self))]
    pub async fn request_suggestion(&self, user_id: UserId) -> Result<Gated<Suggestion>, ServiceError> {
        let result = self.run(user_id, |c, now| Ok(c.request_suggestion(now))).await?;

        match &result {
            Gated::Allowed(Suggestion::Stake { market, stake, .. }) => {
                debug!(user_id, %market, %stake, "Stake suggested");
                self.count(|m| m.suggestions.with_label_values(&["stake"]).inc());
            }
            Gated::Allowed(Suggestion::NoEdge { .. }) => {
                self.count(|m| m.suggestions.with_label_values(&["no_edge"]).inc());
            }
            Gated::Blocked(gate) => {
                debug!(user_id, reason = gate.reason(), "Suggestion blocked");
                self.count(|m| m.gate_blocks.with_label_values(&[gate.reason()]).inc());
            }
        }
        Ok(result)
    }

    #[instrument(skip(self))]
    pub async fn place_wager(
        &self,
        user_id: UserId,
        stake: Decimal,
        market: &str,
    ) -> Result<Gated<Wager>, ServiceError> {
        let result = self
            .run(user_id, |c, now| c.place_wager(stake, market, now))
            .await?;

        match &result {
            Gated::Allowed(wager) => {
                info!(user_id, stake = %wager.stake, market = %wager.market, "Wager placed");
                self.count(|m| {
                    m.wagers_placed
                        .with_label_values(&[wager.market.as_str()])
                        .inc();
                });
            }
            Gated::Blocked(gate) => {
                info!(user_id, reason = gate.reason(), "Wager blocked");
                self.count(|m| m.gate_blocks.with_label_values(&[gate.reason()]).inc());
            }
        }
        Ok(result)
    }

    #[instrument(skip(self))]
    pub async fn record_result(&self, user_id: UserId, outcome: &str) -> Result<Settlement, ServiceError> {
        let settlement = self.run(user_id, |c, _| c.record_result(outcome)).await?;

        if let Some(outcome) = settlement.wager.outcome {
            info!(
                user_id,
                %outcome,
                pnl = %settlement.wager.realized_pnl(),
                bankroll = %settlement.bankroll,
                "Wager settled"
            );
            self.count(|m| {
                m.results_recorded
                    .with_label_values(&[outcome.as_str()])
                    .inc();
            });
        }
        Ok(settlement)
    }

    #[instrument(skip(self))]
    pub async fn reset_session(&self, user_id: UserId) -> Result<(), ServiceError> {
        self.run(user_id, |c, now| {
            c.reset_session(now);
            Ok(())
        })
        .await?;
        info!(user_id, "Session reset");
        Ok(())
    }

    pub async fn set_bankroll(&self, user_id: UserId, value: Decimal) -> Result<(), ServiceError> {
        self.run(user_id, |c, _| c.set_bankroll(value)).await
    }

    pub async fn set_limits(
        &self,
        user_id: UserId,
        stop_loss: Decimal,
        stop_win: Decimal,
    ) -> Result<(), ServiceError> {
        self.run(user_id, |c, _| c.set_limits(stop_loss, stop_win)).await
    }

    pub async fn set_cooldown(&self, user_id: UserId, minutes: i64) -> Result<(), ServiceError> {
        self.run(user_id, |c, _| c.set_cooldown(minutes)).await
    }

    pub async fn set_probability(
        &self,
        user_id: UserId,
        market: &str,
        p: Decimal,
    ) -> Result<(), ServiceError> {
        self.run(user_id, |c, _| c.set_probability(market, p)).await
    }

    pub async fn stats(&self, user_id: UserId) -> Result<SessionStats, ServiceError> {
        self.run(user_id, |c, _| Ok(c.stats())).await
    }

    /// Run one operation under the user's lock.
    async fn run<T>(
        &self,
        user_id: UserId,
        op: impl FnOnce(&mut SessionController, DateTime<Utc>) -> Result<T, SessionError>,
    ) -> Result<T, ServiceError> {
        let lock = self.user_lock(user_id).await;
        let result = {
            let _guard = lock.lock().await;
            self.run_locked(user_id, op).await
        };
        drop(lock);
        self.release_lock(user_id).await;
        result
    }

    async fn run_locked<T>(
        &self,
        user_id: UserId,
        op: impl FnOnce(&mut SessionController, DateTime<Utc>) -> Result<T, SessionError>,
    ) -> Result<T, ServiceError> {
        let now = self.clock.now();
        let (profile, created) = match self.repository.load(user_id).await? {
            Some(profile) => (profile, false),
            None => (Profile::new(&self.defaults, now), true),
        };

        let before = profile.clone();
        let mut controller = SessionController::new(profile, self.advisor.clone());

        let output = match op(&mut controller, now) {
            Ok(output) => output,
            Err(e) => {
                warn!(user_id, error = %e, "Operation rejected");
                if created {
                    self.repository.save(user_id, &before).await?;
                }
                return Err(e.into());
            }
        };

        if created || controller.profile() != &before {
            self.repository.save(user_id, controller.profile()).await?;
        }
        if created {
            info!(user_id, "Profile created");
        }

        Ok(output)
    }

    async fn user_lock(&self, user_id: UserId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        Arc::clone(locks.entry(user_id).or_default())
    }

    /// Drop the user's mutex once no other call holds or awaits it, so
    /// the map only tracks users with calls in flight.
    async fn release_lock(&self, user_id: UserId) {
        let mut locks = self.locks.lock().await;
        if locks
            .get(&user_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&user_id);
        }
    }

    fn count(&self, f: impl FnOnce(&MetricsRegistry)) {
        if let Some(metrics) = &self.metrics {
            f(metrics);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    use crate::adapters::persistence::MemoryProfileStore;
    use crate::domain::{GateResult, Market, ValidationError};
    use crate::ports::ManualClock;
    use crate::ports::repository::MockProfileRepository;

    fn service(
        repo: Arc<dyn ProfileRepository>,
        clock: Arc<ManualClock>,
    ) -> SessionService {
        SessionService::new(repo, clock, Advisor::default(), ProfileDefaults::default())
    }

    #[tokio::test]
    async fn test_first_access_creates_default_profile() {
        let repo = Arc::new(MemoryProfileStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let svc = service(repo.clone(), clock);

        let stats = svc.stats(5).await.unwrap();
        assert_eq!(stats.bankroll, dec!(100));
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_bet_and_result_are_persisted() {
        let repo = Arc::new(MemoryProfileStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let svc = service(repo.clone(), clock);

        svc.place_wager(1, dec!(10), "dragon").await.unwrap();
        let stored = repo.load(1).await.unwrap().unwrap();
        assert!(stored.ledger.open_wager().is_some());

        let settled = svc.record_result(1, "win").await.unwrap();
        assert_eq!(settled.bankroll, dec!(110));

        let stored = repo.load(1).await.unwrap().unwrap();
        assert_eq!(stored.bankroll, dec!(110));
        assert_eq!(stored.ledger.lifetime_wager_count, 1);
    }

    #[tokio::test]
    async fn test_cooldown_uses_injected_clock() {
        let repo = Arc::new(MemoryProfileStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let svc = service(repo, clock.clone());

        svc.set_cooldown(1, 1).await.unwrap();
        svc.place_wager(1, dec!(5), "tiger").await.unwrap();

        clock.advance(Duration::seconds(30));
        let blocked = svc.place_wager(1, dec!(5), "tiger").await.unwrap();
        assert_eq!(
            blocked,
            Gated::Blocked(GateResult::CooldownActive {
                remaining_seconds: 30
            })
        );

        clock.advance(Duration::seconds(31));
        assert!(matches!(
            svc.place_wager(1, dec!(5), "tiger").await.unwrap(),
            Gated::Allowed(Wager { market: Market::Tiger, .. })
        ));
    }

    #[tokio::test]
    async fn test_rejected_operation_is_not_saved() {
        let mut repo = MockProfileRepository::new();
        let existing = Profile::new(&ProfileDefaults::default(), Utc::now());
        repo.expect_load()
            .returning(move |_| Ok(Some(existing.clone())));
        repo.expect_save().times(0);

        let svc = service(Arc::new(repo), Arc::new(ManualClock::new(Utc::now())));
        let err = svc.set_bankroll(3, dec!(-5)).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Session(SessionError::Validation(ValidationError::InvalidBankroll(_)))
        ));
    }

    #[tokio::test]
    async fn test_read_only_operation_is_not_saved() {
        let mut repo = MockProfileRepository::new();
        let existing = Profile::new(&ProfileDefaults::default(), Utc::now());
        repo.expect_load()
            .returning(move |_| Ok(Some(existing.clone())));
        repo.expect_save().times(0);

        let svc = service(Arc::new(repo), Arc::new(ManualClock::new(Utc::now())));
        svc.stats(3).await.unwrap();
        svc.request_suggestion(3).await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_user_locks_are_released_after_calls() {
        let svc = Arc::new(service(
            Arc::new(MemoryProfileStore::new()),
            Arc::new(ManualClock::new(Utc::now())),
        ));

        let tasks: Vec<_> = (0..20)
            .map(|i| {
                let svc = Arc::clone(&svc);
                tokio::spawn(async move {
                    svc.place_wager(i % 3, dec!(1), "dragon").await.unwrap();
                    svc.record_result(i % 3, "win").await.unwrap();
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        // rejected calls release their lock too
        assert!(svc.record_result(0, "win").await.is_err());

        assert!(svc.locks.lock().await.is_empty());
        let mut total = Decimal::ZERO;
        for user in 0..3 {
            total += svc.stats(user).await.unwrap().session_pnl;
        }
        assert_eq!(total, dec!(20));
        assert!(svc.locks.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_storage_failure_surfaces_unchanged() {
        let mut repo = MockProfileRepository::new();
        repo.expect_load()
            .returning(|_| Err(anyhow::anyhow!("disk on fire")));

        let svc = service(Arc::new(repo), Arc::new(ManualClock::new(Utc::now())));
        let err = svc.stats(9).await.unwrap_err();
        assert!(matches!(err, ServiceError::Storage(_)));
        assert_eq!(err.to_string(), "disk on fire");
    }
}
