//! Session Controller - the per-user state machine.
//!
//! Owns one `Profile`, runs the risk gate before exposing advisor
//! output or accepting a wager, and applies settlements to the ledger
//! and bankroll. Time is always passed in; nothing here does I/O.
//!
//! Every operation validates before it commits, so an `Err` means the
//! profile is unchanged.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::advisor::{Advisor, Suggestion};
use super::error::{SessionError, ValidationError};
use super::market::{Market, Outcome};
use super::profile::Profile;
use super::risk::{self, GateResult, GateScope, RiskPolicy};
use super::wager::Wager;

/// Result of a gated operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gated<T> {
    Allowed(T),
    Blocked(GateResult),
}

/// A settled wager and the bankroll after applying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub wager: Wager,
    pub bankroll: Decimal,
}

/// Read-only session summary.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStats {
    pub session_start: DateTime<Utc>,
    pub wagers: usize,
    pub wins: u32,
    pub losses: u32,
    pub pushes: u32,
    pub open: u32,
    pub session_pnl: Decimal,
    /// Wins as a percentage of all session wagers (0 with none).
    pub win_rate: f64,
    pub bankroll: Decimal,
    pub policy: RiskPolicy,
    pub lifetime_wagers: u64,
    pub lifetime_pnl: Decimal,
}

#[derive(Debug, Clone)]
pub struct SessionController {
    profile: Profile,
    advisor: Advisor,
}

impl SessionController {
    pub fn new(profile: Profile, advisor: Advisor) -> Self {
        Self { profile, advisor }
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn into_profile(self) -> Profile {
        self.profile
    }

    /// Gate (cooldown, then stop limits) and, if clear, advise.
    pub fn request_suggestion(&self, now: DateTime<Utc>) -> Gated<Suggestion> {
        match risk::evaluate(&self.profile, now, GateScope::Full) {
            GateResult::Clear => Gated::Allowed(self.advisor.suggest(&self.profile)),
            blocked => Gated::Blocked(blocked),
        }
    }

    /// Open a wager. Only the cooldown blocks manual wagers.
    pub fn place_wager(
        &mut self,
        stake: Decimal,
        market: &str,
        now: DateTime<Utc>,
    ) -> Result<Gated<Wager>, SessionError> {
        if stake <= Decimal::ZERO {
            return Err(ValidationError::InvalidStake(stake).into());
        }
        let market: Market = market.parse()?;

        let gate = risk::evaluate(&self.profile, now, GateScope::CooldownOnly);
        if !gate.is_clear() {
            return Ok(Gated::Blocked(gate));
        }

        let wager = self.profile.ledger.record_wager(stake, market, now)?;
        self.profile.last_wager_at = Some(now);
        Ok(Gated::Allowed(wager))
    }

    /// Settle the open wager and apply its pnl to the bankroll.
    pub fn record_result(&mut self, outcome: &str) -> Result<Settlement, SessionError> {
        let outcome: Outcome = outcome.parse()?;
        let open = self
            .profile
            .ledger
            .open_wager()
            .ok_or(SessionError::NoOpenWager)?;
        let bankroll = self
            .profile
            .bankroll
            .checked_add(Wager::pnl_for(open.stake, outcome))
            .ok_or(ValidationError::AmountOverflow)?;

        let wager = self.profile.ledger.close_wager(outcome)?;
        self.profile.bankroll = bankroll;

        Ok(Settlement {
            wager,
            bankroll: self.profile.bankroll,
        })
    }

    pub fn reset_session(&mut self, now: DateTime<Utc>) {
        self.profile.ledger.reset_session(now);
    }

    pub fn set_bankroll(&mut self, value: Decimal) -> Result<(), SessionError> {
        if value <= Decimal::ZERO {
            return Err(ValidationError::InvalidBankroll(value).into());
        }
        self.profile.bankroll = value;
        Ok(())
    }

    pub fn set_limits(&mut self, stop_loss: Decimal, stop_win: Decimal) -> Result<(), SessionError> {
        if stop_loss < Decimal::ZERO || stop_win < Decimal::ZERO {
            return Err(ValidationError::InvalidLimits {
                stop_loss,
                stop_win,
            }
            .into());
        }
        self.profile.policy.stop_loss = stop_loss;
        self.profile.policy.stop_win = stop_win;
        Ok(())
    }

    pub fn set_cooldown(&mut self, minutes: i64) -> Result<(), SessionError> {
        let minutes =
            u32::try_from(minutes).map_err(|_| ValidationError::InvalidCooldown(minutes))?;
        self.profile.policy.cooldown_minutes = minutes;
        Ok(())
    }

    pub fn set_probability(&mut self, market: &str, p: Decimal) -> Result<(), SessionError> {
        let market: Market = market.parse()?;
        self.profile.probabilities.set(market, p)?;
        Ok(())
    }

    pub fn stats(&self) -> SessionStats {
        let ledger = &self.profile.ledger;
        let tally = ledger.tally();
        let wagers = ledger.session.len();

        let win_rate = if wagers == 0 {
            0.0
        } else {
            f64::from(tally.wins) / wagers as f64 * 100.0
        };

        SessionStats {
            session_start: ledger.session_start,
            wagers,
            wins: tally.wins,
            losses: tally.losses,
            pushes: tally.pushes,
            open: tally.open,
            session_pnl: ledger.session_pnl(),
            win_rate,
            bankroll: self.profile.bankroll,
            policy: self.profile.policy,
            lifetime_wagers: ledger.lifetime_wager_count,
            lifetime_pnl: ledger.lifetime_pnl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    use crate::domain::profile::ProfileDefaults;

    fn controller() -> SessionController {
        let profile = Profile::new(&ProfileDefaults::default(), Utc::now());
        SessionController::new(profile, Advisor::default())
    }

    #[test]
    fn test_bet_then_win_updates_bankroll_and_lifetime() {
        let mut c = controller();
        let now = Utc::now();
        let bankroll = c.profile().bankroll;

        let placed = c.place_wager(dec!(10), "dragon", now).unwrap();
        assert!(matches!(placed, Gated::Allowed(ref w) if w.is_open()));
        assert_eq!(c.profile().bankroll, bankroll);

        let settled = c.record_result("win").unwrap();
        assert_eq!(settled.bankroll, bankroll + dec!(10));
        assert_eq!(settled.wager.pnl, Some(dec!(10)));
        assert_eq!(c.profile().ledger.lifetime_pnl, dec!(10));
        assert_eq!(c.profile().ledger.lifetime_wager_count, 1);
    }

    #[test]
    fn test_invalid_wager_does_not_mutate() {
        let mut c = controller();
        let before = c.profile().clone();
        assert_eq!(
            c.place_wager(dec!(-1), "dragon", Utc::now()),
            Err(SessionError::Validation(ValidationError::InvalidStake(dec!(-1))))
        );
        assert!(matches!(
            c.place_wager(dec!(5), "banker", Utc::now()),
            Err(SessionError::Validation(ValidationError::UnknownMarket(_)))
        ));
        assert_eq!(c.profile(), &before);
    }

    #[test]
    fn test_cooldown_blocks_second_wager() {
        let mut c = controller();
        c.set_cooldown(2).unwrap();
        let now = Utc::now();
        c.place_wager(dec!(5), "tiger", now).unwrap();

        let again = c.place_wager(dec!(5), "tiger", now + Duration::seconds(30)).unwrap();
        assert_eq!(
            again,
            Gated::Blocked(GateResult::CooldownActive {
                remaining_seconds: 90
            })
        );
        assert_eq!(c.profile().ledger.session.len(), 1);

        let later = c.place_wager(dec!(5), "tiger", now + Duration::minutes(2)).unwrap();
        assert!(matches!(later, Gated::Allowed(_)));
    }

    #[test]
    fn test_stop_loss_blocks_suggestion_but_not_bet() {
        let mut c = controller();
        c.set_limits(dec!(10), dec!(0)).unwrap();
        c.set_probability("dragon", dec!(0.7)).unwrap();
        let now = Utc::now();
        c.place_wager(dec!(10), "dragon", now).unwrap();
        c.record_result("lose").unwrap();

        assert!(matches!(
            c.request_suggestion(now),
            Gated::Blocked(GateResult::StopLossHit { .. })
        ));
        assert!(matches!(
            c.place_wager(dec!(1), "dragon", now).unwrap(),
            Gated::Allowed(_)
        ));
    }

    #[test]
    fn test_reset_reenables_suggestions() {
        let mut c = controller();
        c.set_limits(dec!(0), dec!(5)).unwrap();
        let now = Utc::now();
        c.place_wager(dec!(5), "tiger", now).unwrap();
        c.record_result("win").unwrap();
        assert!(matches!(
            c.request_suggestion(now),
            Gated::Blocked(GateResult::StopWinHit { .. })
        ));

        c.reset_session(now);
        assert!(matches!(c.request_suggestion(now), Gated::Allowed(_)));
        assert_eq!(c.profile().ledger.lifetime_pnl, dec!(5));
    }

    #[test]
    fn test_record_result_rejects_unknown_outcome() {
        let mut c = controller();
        c.place_wager(dec!(5), "tie", Utc::now()).unwrap();
        assert!(matches!(
            c.record_result("draw"),
            Err(SessionError::Validation(ValidationError::InvalidOutcome(_)))
        ));
        assert!(c.profile().ledger.open_wager().is_some());
    }

    #[test]
    fn test_record_result_without_open_wager() {
        let mut c = controller();
        assert_eq!(c.record_result("win"), Err(SessionError::NoOpenWager));
    }

    #[test]
    fn test_settlement_overflow_is_rejected_without_mutation() {
        let mut c = controller();
        let now = Utc::now();
        assert!(matches!(
            c.place_wager(Decimal::MAX, "dragon", now).unwrap(),
            Gated::Allowed(_)
        ));

        let before = c.profile().clone();
        assert_eq!(
            c.record_result("win"),
            Err(SessionError::Validation(ValidationError::AmountOverflow))
        );
        assert_eq!(c.profile(), &before);

        // the bet stays open and can still be settled as a push
        let settled = c.record_result("push").unwrap();
        assert_eq!(settled.bankroll, before.bankroll);
        assert_eq!(c.stats().pushes, 1);
    }

    #[test]
    fn test_huge_bankroll_losses_settle() {
        let mut c = controller();
        c.set_bankroll(Decimal::MAX).unwrap();
        let now = Utc::now();
        c.place_wager(Decimal::MAX, "tiger", now).unwrap();
        let settled = c.record_result("lose").unwrap();
        assert_eq!(settled.bankroll, Decimal::ZERO);
        assert_eq!(c.stats().session_pnl, -Decimal::MAX);
    }

    #[test]
    fn test_setters_validate() {
        let mut c = controller();
        let before = c.profile().clone();

        assert!(c.set_bankroll(dec!(0)).is_err());
        assert!(c.set_limits(dec!(-1), dec!(10)).is_err());
        assert!(c.set_cooldown(-5).is_err());
        assert!(c.set_probability("dragon", dec!(1.5)).is_err());
        assert!(c.set_probability("phoenix", dec!(0.5)).is_err());
        assert_eq!(c.profile(), &before);

        c.set_bankroll(dec!(250)).unwrap();
        c.set_limits(dec!(50), dec!(75)).unwrap();
        c.set_cooldown(3).unwrap();
        c.set_probability("TIGER", dec!(0.62)).unwrap();
        let p = c.profile();
        assert_eq!(p.bankroll, dec!(250));
        assert_eq!(p.policy.stop_loss, dec!(50));
        assert_eq!(p.policy.stop_win, dec!(75));
        assert_eq!(p.policy.cooldown_minutes, 3);
        assert_eq!(p.probabilities.tiger, dec!(0.62));
    }

    #[test]
    fn test_stats_counts_and_is_idempotent() {
        let mut c = controller();
        let now = Utc::now();
        for outcome in ["win", "lose", "push", "win"] {
            c.place_wager(dec!(10), "dragon", now).unwrap();
            c.record_result(outcome).unwrap();
        }

        let first = c.stats();
        assert_eq!(first.wagers, 4);
        assert_eq!(first.wins, 2);
        assert_eq!(first.losses, 1);
        assert_eq!(first.pushes, 1);
        assert_eq!(first.session_pnl, dec!(10));
        assert!((first.win_rate - 50.0).abs() < f64::EPSILON);
        assert_eq!(first, c.stats());
    }

    #[test]
    fn test_stats_empty_session() {
        let c = controller();
        let s = c.stats();
        assert_eq!(s.wagers, 0);
        assert!(s.win_rate.abs() < f64::EPSILON);
    }
}
