//! Chat Commands - Parsing and Dispatch
//!
//! Turns a chat message into a `Command`, runs it against the session
//! service (or the auto-suggest scheduler) and renders the reply.
//! Non-command text is ignored; malformed arguments get a usage line.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::adapters::metrics::MetricsRegistry;
use crate::domain::{Gated, Market, UserId};

use super::auto_suggest::AutoSuggestScheduler;
use super::format;
use super::session_service::{ServiceError, SessionService};

pub const HELP: &str = "\
🐉🐯 Dragon/Tiger session assistant

/bankroll <value> - set your bankroll
/limits <stop_loss> <stop_win> - session limits (0 = off)
/cooldown <minutes> - pause after each bet (0 = off)
/prob <dragon|tiger|tie> <p> - your probability estimate (0.6 or 60%)
/suggest - Kelly stake for the best market
/bet <stake> <market> - record a bet
/result <win|lose|push> - settle the open bet
/stats - session statistics
/reset - start a new session
/auto_on [minutes] - periodic suggestions (up to 1440)
/auto_off - stop periodic suggestions";

/// Longest `/auto_on` period, in minutes (one day).
pub const MAX_AUTO_MINUTES: u64 = 24 * 60;

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Bankroll(Decimal),
    Limits { stop_loss: Decimal, stop_win: Decimal },
    Cooldown(i64),
    Prob { market: String, probability: Decimal },
    Suggest,
    Bet { stake: Decimal, market: String },
    Result(String),
    Reset,
    Stats,
    AutoOn(Option<u64>),
    AutoOff,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("not a command")]
    NotACommand,

    #[error("Unknown command /{0}. Send /help for the list.")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),
}

impl Command {
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut tokens = text.split_whitespace();
        let head = tokens
            .next()
            .and_then(|t| t.strip_prefix('/'))
            .filter(|t| !t.is_empty())
            .ok_or(ParseError::NotACommand)?;
        // "/bet@MyBot" in group chats
        let name = head.split('@').next().unwrap_or(head).to_lowercase();
        let args: Vec<&str> = tokens.collect();

        let command = match name.as_str() {
            "start" => Self::Start,
            "help" | "ajuda" => Self::Help,
            "bankroll" | "banca" => {
                const USAGE: &str = "/bankroll <value>";
                match args.as_slice() {
                    [v] => Self::Bankroll(number(v).ok_or(ParseError::Usage(USAGE))?),
                    _ => return Err(ParseError::Usage(USAGE)),
                }
            }
            "limits" | "limites" => {
                const USAGE: &str = "/limits <stop_loss> <stop_win>";
                match args.as_slice() {
                    [sl, sw] => Self::Limits {
                        stop_loss: number(sl).ok_or(ParseError::Usage(USAGE))?,
                        stop_win: number(sw).ok_or(ParseError::Usage(USAGE))?,
                    },
                    _ => return Err(ParseError::Usage(USAGE)),
                }
            }
            "cooldown" => {
                const USAGE: &str = "/cooldown <minutes>";
                match args.as_slice() {
                    [m] => Self::Cooldown(m.parse().map_err(|_| ParseError::Usage(USAGE))?),
                    _ => return Err(ParseError::Usage(USAGE)),
                }
            }
            "prob" => {
                const USAGE: &str = "/prob <dragon|tiger|tie> <p>";
                match args.as_slice() {
                    [market, p] => Self::Prob {
                        market: (*market).to_string(),
                        probability: probability(p).ok_or(ParseError::Usage(USAGE))?,
                    },
                    _ => return Err(ParseError::Usage(USAGE)),
                }
            }
            "suggest" | "sugestao" | "sugestão" => Self::Suggest,
            "bet" | "aposta" => {
                const USAGE: &str = "/bet <stake> <market>";
                match args.as_slice() {
                    // either order: "/bet 10 dragon" or "/bet dragon 10"
                    [a, b] => match (number(a), number(b)) {
                        (Some(stake), _) => Self::Bet {
                            stake,
                            market: (*b).to_string(),
                        },
                        (None, Some(stake)) => Self::Bet {
                            stake,
                            market: (*a).to_string(),
                        },
                        (None, None) => return Err(ParseError::Usage(USAGE)),
                    },
                    _ => return Err(ParseError::Usage(USAGE)),
                }
            }
            "result" | "resultado" => match args.as_slice() {
                [outcome] => Self::Result((*outcome).to_string()),
                _ => return Err(ParseError::Usage("/result <win|lose|push>")),
            },
            "reset" => Self::Reset,
            "stats" => Self::Stats,
            "auto_on" => {
                const USAGE: &str = "/auto_on [minutes, 1 to 1440]";
                match args.as_slice() {
                    [] => Self::AutoOn(None),
                    [m] => match m.parse::<u64>() {
                        Ok(minutes) if (1..=MAX_AUTO_MINUTES).contains(&minutes) => {
                            Self::AutoOn(Some(minutes))
                        }
                        _ => return Err(ParseError::Usage(USAGE)),
                    },
                    _ => return Err(ParseError::Usage(USAGE)),
                }
            }
            "auto_off" => Self::AutoOff,
            other => return Err(ParseError::Unknown(other.to_string())),
        };
        Ok(command)
    }

    /// Metric label.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Help => "help",
            Self::Bankroll(_) => "bankroll",
            Self::Limits { .. } => "limits",
            Self::Cooldown(_) => "cooldown",
            Self::Prob { .. } => "prob",
            Self::Suggest => "suggest",
            Self::Bet { .. } => "bet",
            Self::Result(_) => "result",
            Self::Reset => "reset",
            Self::Stats => "stats",
            Self::AutoOn(_) => "auto_on",
            Self::AutoOff => "auto_off",
        }
    }
}

/// Decimal with either `.` or `,` as separator.
fn number(raw: &str) -> Option<Decimal> {
    Decimal::from_str(&raw.replace(',', ".")).ok()
}

/// `0.6`, `0,6` or `60%`.
fn probability(raw: &str) -> Option<Decimal> {
    match raw.strip_suffix('%') {
        Some(pct) => number(pct).map(|v| v / dec!(100)),
        None => number(raw),
    }
}

/// Executes chat commands for one bot.
pub struct CommandHandler {
    service: Arc<SessionService>,
    scheduler: Arc<AutoSuggestScheduler>,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl CommandHandler {
    pub fn new(service: Arc<SessionService>, scheduler: Arc<AutoSuggestScheduler>) -> Self {
        Self {
            service,
            scheduler,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Reply to a message, or `None` when it is not a command.
    #[instrument(skip(self, text))]
    pub async fn handle(&self, chat_id: UserId, text: &str) -> Option<String> {
        let command = match Command::parse(text) {
            Ok(command) => command,
            Err(ParseError::NotACommand) => return None,
            Err(e) => {
                debug!(chat_id, error = %e, "Unparsable command");
                return Some(format!("⚠️ {e}"));
            }
        };

        if let Some(m) = &self.metrics {
            m.commands.with_label_values(&[command.name()]).inc();
        }

        let name = command.name();
        match self.execute(chat_id, command).await {
            Ok(reply) => Some(reply),
            Err(e) => {
                if let ServiceError::Storage(inner) = &e {
                    error!(chat_id, command = name, error = %inner, "Storage failure");
                }
                Some(format::error(&e))
            }
        }
    }

    async fn execute(&self, chat_id: UserId, command: Command) -> Result<String, ServiceError> {
        let reply = match command {
            Command::Start => {
                let profile = self.service.ensure_profile(chat_id).await?;
                format!(
                    "✅ Bot active! Bankroll {}.\nSend /help to see the commands.",
                    format::money(profile.bankroll)
                )
            }
            Command::Help => HELP.to_string(),
            Command::Bankroll(value) => {
                self.service.set_bankroll(chat_id, value).await?;
                format!("💼 Bankroll set to {}.", format::money(value))
            }
            Command::Limits {
                stop_loss,
                stop_win,
            } => {
                self.service.set_limits(chat_id, stop_loss, stop_win).await?;
                format!(
                    "🛡 Stop-loss {} · Stop-win {}.",
                    format::money(stop_loss),
                    format::money(stop_win)
                )
            }
            Command::Cooldown(minutes) => {
                self.service.set_cooldown(chat_id, minutes).await?;
                if minutes == 0 {
                    "⏱ Cooldown off.".to_string()
                } else {
                    format!("⏱ Cooldown set to {minutes} min after each bet.")
                }
            }
            Command::Prob {
                market,
                probability,
            } => {
                self.service
                    .set_probability(chat_id, &market, probability)
                    .await?;
                let label = Market::from_str(&market).map_or(market, |m| m.to_string());
                format!(
                    "🎲 {label} probability set to {}.",
                    format::percent(probability)
                )
            }
            Command::Suggest => match self.service.request_suggestion(chat_id).await? {
                Gated::Allowed(suggestion) => format::suggestion(&suggestion),
                Gated::Blocked(gate) => format::blocked(&gate),
            },
            Command::Bet { stake, market } => {
                match self.service.place_wager(chat_id, stake, &market).await? {
                    Gated::Allowed(wager) => format::wager_placed(&wager),
                    Gated::Blocked(gate) => format::blocked(&gate),
                }
            }
            Command::Result(outcome) => {
                let settlement = self.service.record_result(chat_id, &outcome).await?;
                format::settlement(&settlement)
            }
            Command::Reset => {
                self.service.reset_session(chat_id).await?;
                "🔄 New session started. Session PnL back to 0.00.".to_string()
            }
            Command::Stats => format::stats(&self.service.stats(chat_id).await?),
            Command::AutoOn(minutes) => {
                self.service.ensure_profile(chat_id).await?;
                let period = self
                    .scheduler
                    .enable(chat_id, minutes.map(|m| Duration::from_secs(m.saturating_mul(60))));
                format!(
                    "🔔 Auto on. A suggestion every {}. Send /auto_off to stop.",
                    format::duration(i64::try_from(period.as_secs()).unwrap_or(i64::MAX))
                )
            }
            Command::AutoOff => {
                if self.scheduler.disable(chat_id) {
                    "🔕 Auto off.".to_string()
                } else {
                    "🔕 Auto was not on.".to_string()
                }
            }
        };
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::adapters::persistence::MemoryProfileStore;
    use crate::domain::{Advisor, ProfileDefaults};
    use crate::ports::ManualClock;
    use crate::ports::notifier::MockNotifier;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/start"), Ok(Command::Start));
        assert_eq!(Command::parse("/HELP"), Ok(Command::Help));
        assert_eq!(Command::parse("/banca 250,50"), Ok(Command::Bankroll(dec!(250.50))));
        assert_eq!(
            Command::parse("/limits 50 30"),
            Ok(Command::Limits {
                stop_loss: dec!(50),
                stop_win: dec!(30)
            })
        );
        assert_eq!(Command::parse("/cooldown -2"), Ok(Command::Cooldown(-2)));
        assert_eq!(Command::parse("/auto_on"), Ok(Command::AutoOn(None)));
        assert_eq!(Command::parse("/auto_on 5"), Ok(Command::AutoOn(Some(5))));
        assert_eq!(Command::parse("/auto_on 1440"), Ok(Command::AutoOn(Some(1440))));
        assert_eq!(
            Command::parse("/resultado perdi"),
            Ok(Command::Result("perdi".into()))
        );
    }

    #[test]
    fn test_parse_bot_suffix_and_argument_order() {
        let expected = Command::Bet {
            stake: dec!(10),
            market: "dragon".into(),
        };
        assert_eq!(Command::parse("/bet@DragonTigerBot 10 dragon"), Ok(expected.clone()));
        assert_eq!(Command::parse("/aposta dragon 10"), Ok(expected));
    }

    #[test]
    fn test_parse_probability_forms() {
        for raw in ["0.6", "0,6", "60%"] {
            assert_eq!(
                Command::parse(&format!("/prob tiger {raw}")),
                Ok(Command::Prob {
                    market: "tiger".into(),
                    probability: dec!(0.6)
                })
            );
        }
    }

    #[test]
    fn test_parse_rejections() {
        assert_eq!(Command::parse("hello"), Err(ParseError::NotACommand));
        assert_eq!(Command::parse("/"), Err(ParseError::NotACommand));
        assert!(matches!(Command::parse("/fly"), Err(ParseError::Unknown(_))));
        assert!(matches!(Command::parse("/bet ten"), Err(ParseError::Usage(_))));
        assert!(matches!(Command::parse("/bet x y"), Err(ParseError::Usage(_))));
        assert!(matches!(Command::parse("/auto_on 0"), Err(ParseError::Usage(_))));
        assert!(matches!(Command::parse("/auto_on 1441"), Err(ParseError::Usage(_))));
        assert!(matches!(
            Command::parse("/auto_on 300000000000000000"),
            Err(ParseError::Usage(_))
        ));
        assert!(matches!(
            Command::parse("/auto_on 18446744073709551615"),
            Err(ParseError::Usage(_))
        ));
        assert!(matches!(Command::parse("/prob dragon lots"), Err(ParseError::Usage(_))));
    }

    fn handler() -> CommandHandler {
        let service = Arc::new(SessionService::new(
            Arc::new(MemoryProfileStore::new()),
            Arc::new(ManualClock::new(Utc::now())),
            Advisor::default(),
            ProfileDefaults::default(),
        ));
        let scheduler = Arc::new(AutoSuggestScheduler::new(
            Arc::clone(&service),
            Arc::new(MockNotifier::new()),
            Duration::from_secs(300),
        ));
        CommandHandler::new(service, scheduler)
    }

    #[tokio::test]
    async fn test_plain_text_is_ignored() {
        assert_eq!(handler().handle(1, "good luck").await, None);
    }

    #[tokio::test]
    async fn test_suggest_bet_result_flow() {
        let h = handler();
        h.handle(1, "/prob dragon 70%").await.unwrap();

        let reply = h.handle(1, "/suggest").await.unwrap();
        assert!(reply.contains("dragon"), "{reply}");
        assert!(reply.contains("40.00"), "{reply}");

        let reply = h.handle(1, "/bet 40 dragon").await.unwrap();
        assert!(reply.contains("Bet recorded"), "{reply}");

        let reply = h.handle(1, "/result win").await.unwrap();
        assert!(reply.contains("+40.00"), "{reply}");
        assert!(reply.contains("140.00"), "{reply}");
    }

    #[tokio::test]
    async fn test_validation_errors_become_replies() {
        let h = handler();
        let reply = h.handle(1, "/result win").await.unwrap();
        assert!(reply.contains("no open bet"), "{reply}");

        let reply = h.handle(1, "/bet 10 banker").await.unwrap();
        assert!(reply.starts_with("⚠️"), "{reply}");
    }

    #[tokio::test]
    async fn test_huge_bet_settles_without_panicking() {
        let h = handler();
        let reply = h.handle(4, "/bet 79228162514264337593543950335 dragon").await.unwrap();
        assert!(reply.contains("Bet recorded"), "{reply}");

        let reply = h.handle(4, "/result win").await.unwrap();
        assert!(reply.contains("too large"), "{reply}");

        let reply = h.handle(4, "/result lose").await.unwrap();
        assert!(reply.contains("-79228162514264337593543950335.00"), "{reply}");
    }

    #[tokio::test]
    async fn test_out_of_range_auto_interval_is_rejected() {
        let h = handler();
        for text in ["/auto_on 300000000000000000", "/auto_on 18446744073709551615"] {
            let reply = h.handle(5, text).await.unwrap();
            assert!(reply.contains("Usage"), "{reply}");
        }
        assert!(!h.scheduler.is_enabled(5));
    }

    #[tokio::test]
    async fn test_auto_on_direct_command_saturates() {
        let h = handler();
        let reply = h
            .execute(6, Command::AutoOn(Some(u64::MAX)))
            .await
            .unwrap();
        assert!(reply.contains("1440m"), "{reply}");
        assert!(h.scheduler.is_enabled(6));
        h.scheduler.shutdown();
    }

    #[tokio::test]
    async fn test_auto_on_off() {
        let h = handler();
        let reply = h.handle(3, "/auto_on 2").await.unwrap();
        assert!(reply.contains("2m"), "{reply}");
        assert!(h.scheduler.is_enabled(3));

        assert_eq!(h.handle(3, "/auto_off").await.unwrap(), "🔕 Auto off.");
        assert!(!h.scheduler.is_enabled(3));
    }
}
