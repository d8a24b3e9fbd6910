//! Ledger - session wagers plus lifetime aggregates.
//!
//! The session list is append-only between resets. Settling a wager
//! never removes it; only `reset_session` clears the list, and the
//! lifetime counters survive resets.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::{SessionError, ValidationError};
use super::market::{Market, Outcome};
use super::wager::Wager;

/// Counts of session wagers by state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionTally {
    pub wins: u32,
    pub losses: u32,
    pub pushes: u32,
    pub open: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    /// Start of the current session.
    pub session_start: DateTime<Utc>,
    /// Wagers of the current session, oldest first.
    #[serde(default)]
    pub session: Vec<Wager>,
    /// Wagers settled since the profile was created.
    #[serde(default)]
    pub lifetime_wager_count: u64,
    /// Realized pnl since the profile was created.
    #[serde(default)]
    pub lifetime_pnl: Decimal,
}

impl Ledger {
    pub fn new(session_start: DateTime<Utc>) -> Self {
        Self {
            session_start,
            session: Vec::new(),
            lifetime_wager_count: 0,
            lifetime_pnl: Decimal::ZERO,
        }
    }

    /// Append an open wager. Bankroll is untouched until settlement.
    pub fn record_wager(
        &mut self,
        stake: Decimal,
        market: Market,
        now: DateTime<Utc>,
    ) -> Result<Wager, ValidationError> {
        if stake <= Decimal::ZERO {
            return Err(ValidationError::InvalidStake(stake));
        }

        let wager = Wager::open(stake, market, now);
        self.session.push(wager.clone());
        Ok(wager)
    }

    /// Settle the most recently placed open wager.
    ///
    /// Fails with `AmountOverflow`, leaving the ledger untouched, when
    /// the session or lifetime pnl would no longer fit a `Decimal`.
    pub fn close_wager(&mut self, outcome: Outcome) -> Result<Wager, SessionError> {
        let index = self
            .session
            .iter()
            .rposition(Wager::is_open)
            .ok_or(SessionError::NoOpenWager)?;

        let pnl = Wager::pnl_for(self.session[index].stake, outcome);
        let lifetime_pnl = self
            .lifetime_pnl
            .checked_add(pnl)
            .ok_or(ValidationError::AmountOverflow)?;
        self.checked_session_pnl(index, pnl)
            .ok_or(ValidationError::AmountOverflow)?;

        let wager = &mut self.session[index];
        wager.settle(outcome);
        let closed = wager.clone();

        self.lifetime_wager_count += 1;
        self.lifetime_pnl = lifetime_pnl;

        Ok(closed)
    }

    /// Session pnl with wager `index` settled at `pnl`, `None` on overflow.
    fn checked_session_pnl(&self, index: usize, pnl: Decimal) -> Option<Decimal> {
        self.session
            .iter()
            .enumerate()
            .map(|(i, w)| if i == index { pnl } else { w.realized_pnl() })
            .try_fold(Decimal::ZERO, Decimal::checked_add)
    }

    /// Sum of realized pnl over the session. Open wagers count as zero.
    pub fn session_pnl(&self) -> Decimal {
        self.session
            .iter()
            .map(Wager::realized_pnl)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    pub fn reset_session(&mut self, now: DateTime<Utc>) {
        self.session.clear();
        self.session_start = now;
    }

    /// The most recent open wager, if any.
    pub fn open_wager(&self) -> Option<&Wager> {
        self.session.iter().rev().find(|w| w.is_open())
    }

    pub fn tally(&self) -> SessionTally {
        self.session
            .iter()
            .fold(SessionTally::default(), |mut tally, w| {
                match w.outcome {
                    Some(Outcome::Win) => tally.wins += 1,
                    Some(Outcome::Lose) => tally.losses += 1,
                    Some(Outcome::Push) => tally.pushes += 1,
                    None => tally.open += 1,
                }
                tally
            })
    }
}
