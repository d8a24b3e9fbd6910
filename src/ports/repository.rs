//! Repository Port - Profile Persistence Interface
//!
//! One durable `Profile` per user. The use cases only see this trait;
//! whether profiles live in JSON files or in memory is an adapter
//! concern.

use async_trait::async_trait;

use crate::domain::{Profile, UserId};

/// Trait for profile persistence providers.
///
/// Failures are returned unchanged to the caller; no retry policy is
/// applied at this layer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileRepository: Send + Sync + 'static {
  /// Load a user's profile. `Ok(None)` when the user has none yet.
  async fn load(&self, user_id: UserId) -> anyhow::Result<Option<Profile>>;

  /// Persist a user's profile, replacing any previous version.
  async fn save(&self, user_id: UserId, profile: &Profile) -> anyhow::Result<()>;

  /// Check if the storage is usable (directory writable, etc.).
  async fn is_healthy(&self) -> bool;
}
