//! Plain-text rendering of session decisions for chat replies.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::kelly::round_money;
use crate::domain::{GateResult, SessionError, SessionStats, Settlement, Suggestion, Wager};

use super::session_service::ServiceError;

pub fn money(amount: Decimal) -> String {
    format!("{:.2}", round_money(amount))
}

/// Signed money, e.g. `+10.00` / `-5.00`.
pub fn signed_money(amount: Decimal) -> String {
    let rounded = round_money(amount);
    if rounded > Decimal::ZERO {
        format!("+{rounded:.2}")
    } else {
        format!("{rounded:.2}")
    }
}

/// Probability as a percentage, e.g. `0.7` -> `70.0%`.
pub fn percent(p: Decimal) -> String {
    format!("{:.1}%", (p * dec!(100)).round_dp(1))
}

/// `95` -> `1m 35s`.
pub fn duration(seconds: i64) -> String {
    let (m, s) = (seconds / 60, seconds % 60);
    match (m, s) {
        (0, s) => format!("{s}s"),
        (m, 0) => format!("{m}m"),
        (m, s) => format!("{m}m {s}s"),
    }
}

pub fn suggestion(s: &Suggestion) -> String {
    match s {
        Suggestion::Stake {
            market,
            probability,
            fraction,
            stake,
        } => format!(
            "🎯 Suggestion: {market} with stake {}\nProbability {} · Kelly {}",
            money(*stake),
            percent(*probability),
            percent(*fraction),
        ),
        Suggestion::NoEdge { best_probability } => format!(
            "⏸ No edge (best probability {}). Better not to bet this round.",
            percent(*best_probability)
        ),
    }
}

pub fn blocked(gate: &GateResult) -> String {
    match gate {
        GateResult::Clear => "✅ Clear.".to_string(),
        GateResult::CooldownActive { remaining_seconds } => format!(
            "⏳ Cooldown active. Wait {} before the next bet.",
            duration(*remaining_seconds)
        ),
        GateResult::StopLossHit { session_pnl, limit } => format!(
            "🛑 Stop-loss reached: session {} (limit -{}). Take a break or /reset.",
            signed_money(*session_pnl),
            money(*limit)
        ),
        GateResult::StopWinHit { session_pnl, limit } => format!(
            "🏁 Stop-win reached: session {} (target {}). Lock in the profit or /reset.",
            signed_money(*session_pnl),
            money(*limit)
        ),
    }
}

pub fn wager_placed(w: &Wager) -> String {
    format!(
        "📝 Bet recorded: {} on {}. Send /result win|lose|push when it settles.",
        money(w.stake),
        w.market
    )
}

pub fn settlement(s: &Settlement) -> String {
    let outcome = s
        .wager
        .outcome
        .map_or("open", crate::domain::Outcome::as_str);
    format!(
        "💰 {} on {}: {}. Bankroll now {}.",
        outcome,
        s.wager.market,
        signed_money(s.wager.realized_pnl()),
        money(s.bankroll)
    )
}

pub fn stats(s: &SessionStats) -> String {
    let limit = |v: Decimal| {
        if v > Decimal::ZERO {
            money(v)
        } else {
            "off".to_string()
        }
    };
    let cooldown = if s.policy.cooldown_minutes > 0 {
        format!("{}m", s.policy.cooldown_minutes)
    } else {
        "off".to_string()
    };

    format!(
        "📊 Session since {}\n\
         Bets: {} (W {} / L {} / P {}{})\n\
         Session PnL: {}\n\
         Win rate: {:.1}%\n\
         Bankroll: {}\n\
         Stop-loss: {} · Stop-win: {} · Cooldown: {}\n\
         Lifetime: {} bets, PnL {}",
        s.session_start.format("%Y-%m-%d %H:%M UTC"),
        s.wagers,
        s.wins,
        s.losses,
        s.pushes,
        if s.open > 0 {
            format!(" / open {}", s.open)
        } else {
            String::new()
        },
        signed_money(s.session_pnl),
        s.win_rate,
        money(s.bankroll),
        limit(s.policy.stop_loss),
        limit(s.policy.stop_win),
        cooldown,
        s.lifetime_wagers,
        signed_money(s.lifetime_pnl),
    )
}

pub fn error(e: &ServiceError) -> String {
    match e {
        ServiceError::Session(SessionError::NoOpenWager) => {
            "⚠️ There is no open bet. Use /bet <stake> <market> first.".to_string()
        }
        ServiceError::Session(SessionError::Validation(v)) => format!("⚠️ {v}"),
        ServiceError::Storage(_) => "❌ Internal error, please try again.".to_string(),
    }
}
