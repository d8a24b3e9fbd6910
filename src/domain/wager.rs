//! A single wager and its settlement rule.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::market::{Market, Outcome};

/// A stake placed on one market.
///
/// Opened without an outcome, settled exactly once. After settlement
/// the wager is only ever read for aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wager {
    /// When the wager was placed.
    pub placed_at: DateTime<Utc>,
    /// Amount staked (always > 0).
    pub stake: Decimal,
    /// Market the stake was placed on.
    pub market: Market,
    /// `None` while open.
    #[serde(default)]
    pub outcome: Option<Outcome>,
    /// Realized profit/loss, `None` while open.
    #[serde(default)]
    pub pnl: Option<Decimal>,
}

impl Wager {
    pub(crate) fn open(stake: Decimal, market: Market, placed_at: DateTime<Utc>) -> Self {
        Self {
            placed_at,
            stake,
            market,
            outcome: None,
            pnl: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.outcome.is_none()
    }

    /// Profit/loss of a 1:1 payout for the given outcome.
    pub fn pnl_for(stake: Decimal, outcome: Outcome) -> Decimal {
        match outcome {
            Outcome::Win => stake,
            Outcome::Lose => -stake,
            Outcome::Push => Decimal::ZERO,
        }
    }

    /// Settle the wager. Returns the realized pnl.
    pub(crate) fn settle(&mut self, outcome: Outcome) -> Decimal {
        let pnl = Self::pnl_for(self.stake, outcome);
        self.outcome = Some(outcome);
        self.pnl = Some(pnl);
        pnl
    }

    /// Realized pnl, zero while open.
    pub fn realized_pnl(&self) -> Decimal {
        self.pnl.unwrap_or(Decimal::ZERO)
    }
}
