//! Markets and wager outcomes of a Dragon Tiger round.
//!
//! Parsing goes through `FromStr` so every boundary (chat commands,
//! controller setters) shares the same validation and error variants.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::ValidationError;

/// One of the three wager categories of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    Dragon,
    Tiger,
    /// Push-prone market, never auto-staked by the advisor.
    Tie,
}

impl Market {
    /// All markets in enumeration order.
    pub const ALL: [Self; 3] = [Self::Dragon, Self::Tiger, Self::Tie];

    /// Markets the advisor may pick from, in tie-break order.
    pub const PRIMARY: [Self; 2] = [Self::Dragon, Self::Tiger];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dragon => "dragon",
            Self::Tiger => "tiger",
            Self::Tie => "tie",
        }
    }
}

impl std::fmt::Display for Market {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Market {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dragon" | "dragao" | "dragão" | "d" => Ok(Self::Dragon),
            "tiger" | "tigre" | "t" => Ok(Self::Tiger),
            "tie" | "empate" => Ok(Self::Tie),
            _ => Err(ValidationError::UnknownMarket(s.trim().to_string())),
        }
    }
}

/// Settled result of a wager.
///
/// An open wager carries no outcome (`Option<Outcome>::None`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Lose,
    /// Stake returned, zero profit.
    Push,
}

impl Outcome {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Win => "win",
            Self::Lose => "lose",
            Self::Push => "push",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "win" | "w" | "ganhei" | "green" => Ok(Self::Win),
            "lose" | "loss" | "l" | "perdi" | "red" => Ok(Self::Lose),
            "push" | "p" | "devolvida" => Ok(Self::Push),
            _ => Err(ValidationError::InvalidOutcome(s.trim().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_parse_is_case_insensitive() {
        assert_eq!("Dragon".parse::<Market>().unwrap(), Market::Dragon);
        assert_eq!(" TIGRE ".parse::<Market>().unwrap(), Market::Tiger);
        assert_eq!("tie".parse::<Market>().unwrap(), Market::Tie);
    }

    #[test]
    fn test_market_parse_unknown() {
        let err = "banker".parse::<Market>().unwrap_err();
        assert_eq!(err, ValidationError::UnknownMarket("banker".to_string()));
    }

    #[test]
    fn test_outcome_parse() {
        assert_eq!("WIN".parse::<Outcome>().unwrap(), Outcome::Win);
        assert_eq!("lose".parse::<Outcome>().unwrap(), Outcome::Lose);
        assert_eq!("push".parse::<Outcome>().unwrap(), Outcome::Push);
        assert!(matches!(
            "draw".parse::<Outcome>(),
            Err(ValidationError::InvalidOutcome(_))
        ));
    }

    #[test]
    fn test_market_serde_lowercase() {
        let json = serde_json::to_string(&Market::Tiger).unwrap();
        assert_eq!(json, "\"tiger\"");
    }
}
