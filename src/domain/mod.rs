//! Domain layer - Core business logic and models.
//!
//! Ledger, risk gate, Kelly advisor and the session controller that
//! sequences them. No I/O and no clock reads in here (hexagonal
//! architecture inner ring): every operation takes `now` explicitly.

pub mod advisor;
pub mod error;
pub mod kelly;
pub mod ledger;
pub mod market;
pub mod profile;
pub mod risk;
pub mod session;
pub mod wager;

// Re-export core types for convenience
pub use advisor::{Advisor, Suggestion};
pub use error::{SessionError, ValidationError};
pub use kelly::KellyCriterion;
pub use ledger::Ledger;
pub use market::{Market, Outcome};
pub use profile::{Probabilities, Profile, ProfileDefaults, UserId};
pub use risk::{GateResult, GateScope, RiskPolicy};
pub use session::{Gated, SessionController, SessionStats, Settlement};
pub use wager::Wager;
