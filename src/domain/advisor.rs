//! Stake advisor.
//!
//! Picks the stronger of Dragon/Tiger from the declared probabilities
//! and sizes the stake with Kelly. Tie is never auto-staked. Each
//! market is evaluated on its own; correlation between markets is
//! ignored.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::kelly::KellyCriterion;
use super::market::Market;
use super::profile::Profile;

/// Advisor output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suggestion {
    /// No positive edge on either primary market: do not bet.
    NoEdge {
        /// Highest declared probability among the primary markets.
        best_probability: Decimal,
    },
    Stake {
        market: Market,
        probability: Decimal,
        /// Fraction of bankroll the stake was sized from.
        fraction: Decimal,
        stake: Decimal,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Advisor {
    kelly: KellyCriterion,
}

impl Advisor {
    pub fn new(kelly: KellyCriterion) -> Self {
        Self { kelly }
    }

    /// Primary market with the highest declared probability.
    /// Equal probabilities resolve to the first market (Dragon).
    pub fn pick_market(profile: &Profile) -> (Market, Decimal) {
        let [first, rest @ ..] = Market::PRIMARY;
        rest.iter().fold(
            (first, profile.probabilities.get(first)),
            |best, &market| {
                let p = profile.probabilities.get(market);
                if p > best.1 { (market, p) } else { best }
            },
        )
    }

    pub fn suggest(&self, profile: &Profile) -> Suggestion {
        let (market, probability) = Self::pick_market(profile);
        let fraction = self.kelly.optimal_fraction(probability);

        if probability <= dec!(0.5) || fraction <= Decimal::ZERO {
            return Suggestion::NoEdge {
                best_probability: probability,
            };
        }

        Suggestion::Stake {
            market,
            probability,
            fraction,
            stake: self.kelly.stake(profile.bankroll, fraction),
        }
    }
}
