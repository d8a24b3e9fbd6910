//! Per-user durable state.
//!
//! A `Profile` is created with defaults on first access and then only
//! changes through the session controller.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::error::ValidationError;
use super::ledger::Ledger;
use super::market::Market;
use super::risk::RiskPolicy;

/// Chat/user identifier (Telegram chat id).
pub type UserId = i64;

/// Declared win probability per market. Values are always in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Probabilities {
    pub dragon: Decimal,
    pub tiger: Decimal,
    pub tie: Decimal,
}

impl Probabilities {
    pub const fn get(&self, market: Market) -> Decimal {
        match market {
            Market::Dragon => self.dragon,
            Market::Tiger => self.tiger,
            Market::Tie => self.tie,
        }
    }

    /// Validating setter; leaves `self` untouched on error.
    pub fn set(&mut self, market: Market, p: Decimal) -> Result<(), ValidationError> {
        let p = validate_probability(p)?;
        match market {
            Market::Dragon => self.dragon = p,
            Market::Tiger => self.tiger = p,
            Market::Tie => self.tie = p,
        }
        Ok(())
    }
}

impl Default for Probabilities {
    fn default() -> Self {
        Self {
            dragon: dec!(0.5),
            tiger: dec!(0.5),
            tie: dec!(0.08),
        }
    }
}

pub fn validate_probability(p: Decimal) -> Result<Decimal, ValidationError> {
    if p < Decimal::ZERO || p > Decimal::ONE {
        return Err(ValidationError::InvalidProbability(p));
    }
    Ok(p)
}

/// Values a fresh profile starts with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDefaults {
    pub bankroll: Decimal,
    pub policy: RiskPolicy,
    pub probabilities: Probabilities,
}

impl Default for ProfileDefaults {
    fn default() -> Self {
        Self {
            bankroll: dec!(100),
            policy: RiskPolicy::default(),
            probabilities: Probabilities::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Current bankroll. May go negative after losses.
    pub bankroll: Decimal,
    /// Stop-loss, stop-win and cooldown settings.
    #[serde(default)]
    pub policy: RiskPolicy,
    /// Time of the last accepted wager, drives the cooldown.
    #[serde(default)]
    pub last_wager_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub probabilities: Probabilities,
    pub ledger: Ledger,
}

impl Profile {
    pub fn new(defaults: &ProfileDefaults, now: DateTime<Utc>) -> Self {
        Self {
            bankroll: defaults.bankroll,
            policy: defaults.policy,
            last_wager_at: None,
            probabilities: defaults.probabilities,
            ledger: Ledger::new(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_probabilities() {
        let p = Probabilities::default();
        assert_eq!(p.get(Market::Dragon), dec!(0.5));
        assert_eq!(p.get(Market::Tiger), dec!(0.5));
        assert_eq!(p.get(Market::Tie), dec!(0.08));
    }

    #[test]
    fn test_set_probability_out_of_range_is_rejected() {
        let mut p = Probabilities::default();
        assert_eq!(
            p.set(Market::Tiger, dec!(1.01)),
            Err(ValidationError::InvalidProbability(dec!(1.01)))
        );
        assert_eq!(p, Probabilities::default());
        assert!(p.set(Market::Tiger, Decimal::ONE).is_ok());
        assert!(p.set(Market::Tie, Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_profile_json_roundtrip_keeps_fields() {
        let profile = Profile::new(&ProfileDefaults::default(), Utc::now());
        let json = serde_json::to_string(&profile).unwrap();
        assert!(json.contains("\"dragon\""));
        let back: Profile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, profile);
    }
}
