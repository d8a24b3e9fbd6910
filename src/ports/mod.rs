//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the usecases layer requires
//! from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `ProfileRepository`: per-user profile persistence
//! - `Clock`: time source
//! - `Notifier`: outbound chat messages

pub mod clock;
pub mod notifier;
pub mod repository;

pub use clock::{Clock, ManualClock, SystemClock};
pub use notifier::Notifier;
pub use repository::ProfileRepository;
