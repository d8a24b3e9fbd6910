//! Risk Gate - Cooldown, Stop-Loss and Stop-Win
//!
//! Pure checks over a profile snapshot:
//! - Cooldown between consecutive wagers
//! - Stop-loss on session PnL (checked first)
//! - Stop-win on session PnL
//!
//! Suggestions and manual wagers both go through `evaluate`, which
//! differ only in the `GateScope` they pass.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::profile::Profile;

/// Per-user risk settings. A zero value disables the corresponding check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskPolicy {
  /// Session loss that suspends suggestions (0 = off).
  #[serde(default)]
  pub stop_loss: Decimal,
  /// Session profit that suspends suggestions (0 = off).
  #[serde(default)]
  pub stop_win: Decimal,
  /// Minimum minutes between wagers (0 = off).
  #[serde(default)]
  pub cooldown_minutes: u32,
}

/// Outcome of a gate evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateResult {
  Clear,
  CooldownActive { remaining_seconds: i64 },
  StopLossHit { session_pnl: Decimal, limit: Decimal },
  StopWinHit { session_pnl: Decimal, limit: Decimal },
}

impl GateResult {
  pub const fn is_clear(&self) -> bool {
    matches!(self, Self::Clear)
  }

  /// Stop conditions end automated play for the session.
  pub const fn is_stop(&self) -> bool {
    matches!(self, Self::StopLossHit { .. } | Self::StopWinHit { .. })
  }

  /// Short label used in logs and metrics.
  pub const fn reason(&self) -> &'static str {
    match self {
      Self::Clear => "clear",
      Self::CooldownActive { .. } => "cooldown",
      Self::StopLossHit { .. } => "stop_loss",
      Self::StopWinHit { .. } => "stop_win",
    }
  }
}

/// Which checks a call site applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateScope {
  /// Cooldown, then stop-loss/stop-win. Used before suggestions.
  Full,
  /// Cooldown only. Used before manual wagers.
  CooldownOnly,
}

impl RiskPolicy {
  /// Whole seconds left before another wager is allowed.
  ///
  /// `None` when the cooldown is disabled, no wager was ever placed,
  /// or the window has elapsed. A sub-second remainder reports 1.
  pub fn cooldown_remaining(
    &self,
    last_wager_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
  ) -> Option<i64> {
    if self.cooldown_minutes == 0 {
      return None;
    }
    let last = last_wager_at?;

    let remaining = last + Duration::minutes(i64::from(self.cooldown_minutes)) - now;
    if remaining <= Duration::zero() {
      return None;
    }
    Some(remaining.num_seconds().max(1))
  }

  /// Compare session PnL against the stop limits.
  ///
  /// Stop-loss wins when both limits are crossed.
  pub fn check_limits(&self, session_pnl: Decimal) -> GateResult {
    if self.stop_loss > Decimal::ZERO && session_pnl <= -self.stop_loss {
      return GateResult::StopLossHit {
        session_pnl,
        limit: self.stop_loss,
      };
    }
    if self.stop_win > Decimal::ZERO && session_pnl >= self.stop_win {
      return GateResult::StopWinHit {
        session_pnl,
        limit: self.stop_win,
      };
    }
    GateResult::Clear
  }
}

/// Evaluate the gate for a profile. Cooldown is always checked first.
pub fn evaluate(profile: &Profile, now: DateTime<Utc>, scope: GateScope) -> GateResult {
  if let Some(remaining_seconds) = profile
    .policy
    .cooldown_remaining(profile.last_wager_at, now)
  {
    return GateResult::CooldownActive { remaining_seconds };
  }

  match scope {
    GateScope::Full => profile.policy.check_limits(profile.ledger.session_pnl()),
    GateScope::CooldownOnly => GateResult::Clear,
  }
}
