//! Domain errors.
//!
//! Every variant is recoverable and user-facing. Gate decisions
//! (cooldown, stop-loss, stop-win) are NOT errors; they are returned
//! as `Gated::Blocked` values by the session controller.

use rust_decimal::Decimal;
use thiserror::Error;

/// Rejected input. The operation performed no mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("stake must be greater than zero, got {0}")]
    InvalidStake(Decimal),

    #[error("unknown market '{0}' (expected dragon, tiger or tie)")]
    UnknownMarket(String),

    #[error("unknown outcome '{0}' (expected win, lose or push)")]
    InvalidOutcome(String),

    #[error("bankroll must be greater than zero, got {0}")]
    InvalidBankroll(Decimal),

    #[error("limits must be zero or positive, got stop-loss {stop_loss} and stop-win {stop_win}")]
    InvalidLimits { stop_loss: Decimal, stop_win: Decimal },

    #[error("cooldown must be a whole number of minutes >= 0, got {0}")]
    InvalidCooldown(i64),

    #[error("probability must be between 0 and 1, got {0}")]
    InvalidProbability(Decimal),

    #[error("amount too large: settling this bet would overflow the bankroll or pnl")]
    AmountOverflow,
}

/// Failure of a session controller operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("there is no open wager to settle")]
    NoOpenWager,
}
