//! Kelly Criterion stake sizing.
//!
//! Dragon and Tiger pay 1:1, so with `b = 1` the classic
//!   f* = (p * b - q) / b
//! reduces to `f* = 2p - 1`. The fraction multiplier defaults to 1.0
//! (full Kelly); operators may configure a fractional Kelly instead.

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;

/// Payout ratio of the primary markets.
pub const EVEN_MONEY: Decimal = Decimal::ONE;

/// Round a monetary amount to cents, half away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Kelly Criterion calculator for even-money bets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KellyCriterion {
    /// Kelly fraction multiplier (1.0 = full Kelly).
    fraction: Decimal,
    /// Smallest stake ever recommended.
    min_stake: Decimal,
}

impl KellyCriterion {
    pub fn new(fraction: Decimal, min_stake: Decimal) -> Self {
        Self {
            fraction,
            min_stake,
        }
    }

    /// Full Kelly fraction for payout ratio `b`, clamped to [0, 1].
    pub fn full_kelly(prob: Decimal, b: Decimal) -> Decimal {
        if b <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let q = Decimal::ONE - prob;
        ((prob * b - q) / b).clamp(Decimal::ZERO, Decimal::ONE)
    }

    /// Fraction of bankroll to stake on an even-money bet.
    pub fn optimal_fraction(&self, prob: Decimal) -> Decimal {
        Self::full_kelly(prob, EVEN_MONEY) * self.fraction
    }

    /// Stake for the given fraction, in cents, never below `min_stake`.
    pub fn stake(&self, bankroll: Decimal, fraction: Decimal) -> Decimal {
        round_money(bankroll.saturating_mul(fraction)).max(self.min_stake)
    }
}

impl Default for KellyCriterion {
    /// Full Kelly with a 1.00 minimum stake.
    fn default() -> Self {
        Self {
            fraction: Decimal::ONE,
            min_stake: dec!(1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kelly_positive_edge() {
        let k = KellyCriterion::default();
        assert_eq!(k.optimal_fraction(dec!(0.7)), dec!(0.4));
    }

    #[test]
    fn test_kelly_no_edge_is_zero() {
        let k = KellyCriterion::default();
        assert_eq!(k.optimal_fraction(dec!(0.5)), Decimal::ZERO);
        assert_eq!(k.optimal_fraction(dec!(0.3)), Decimal::ZERO);
    }

    #[test]
    fn test_kelly_certain_win_capped_at_one() {
        assert_eq!(KellyCriterion::full_kelly(Decimal::ONE, EVEN_MONEY), Decimal::ONE);
    }

    #[test]
    fn test_fractional_kelly() {
        let k = KellyCriterion::new(dec!(0.5), dec!(1));
        assert_eq!(k.optimal_fraction(dec!(0.7)), dec!(0.2));
    }

    #[test]
    fn test_stake_rounds_half_away_from_zero() {
        let k = KellyCriterion::default();
        // 33.335 -> 33.34
        assert_eq!(k.stake(dec!(66.67), dec!(0.5)), dec!(33.34));
        assert_eq!(round_money(dec!(-2.345)), dec!(-2.35));
    }

    #[test]
    fn test_stake_on_maximal_bankroll() {
        let k = KellyCriterion::default();
        assert_eq!(k.stake(Decimal::MAX, Decimal::ONE), Decimal::MAX);
    }

    #[test]
    fn test_stake_floor_is_min_stake() {
        let k = KellyCriterion::default();
        assert_eq!(k.stake(dec!(2), dec!(0.02)), dec!(1.0));
        assert_eq!(k.stake(dec!(-50), dec!(0.4)), dec!(1.0));
    }
}
