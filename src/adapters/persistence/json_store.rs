//! JSON Profile Store - Atomic Per-User JSON Files
//!
//! Saves each profile to `profiles/<user_id>.json` using atomic writes
//! (write to tmp file, then rename). A crash mid-write leaves the old
//! version in place, never a partial document.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, instrument};

use crate::domain::{Profile, UserId};
use crate::ports::repository::ProfileRepository;

/// File-backed profile repository.
pub struct JsonProfileStore {
    /// Directory holding `<user_id>.json` files.
    profiles_dir: PathBuf,
}

impl JsonProfileStore {
    /// Create a store under the given data directory.
    ///
    /// Creates `<data_dir>/profiles` if it doesn't exist.
    pub async fn new(data_dir: &str) -> Result<Self> {
        let profiles_dir = Path::new(data_dir).join("profiles");
        fs::create_dir_all(&profiles_dir)
            .await
            .context("Failed to create profiles directory")?;

        Ok(Self { profiles_dir })
    }

    fn profile_path(&self, user_id: UserId) -> PathBuf {
        self.profiles_dir.join(format!("{user_id}.json"))
    }

    fn tmp_path(&self, user_id: UserId) -> PathBuf {
        self.profiles_dir.join(format!("{user_id}.json.tmp"))
    }
}

#[async_trait]
impl ProfileRepository for JsonProfileStore {
    #[instrument(skip(self))]
    async fn load(&self, user_id: UserId) -> Result<Option<Profile>> {
        let path = self.profile_path(user_id);
        let json = match fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No profile file found");
                return Ok(None);
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read profile file {}", path.display()));
            }
        };

        let profile: Profile = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse profile JSON {}", path.display()))?;

        Ok(Some(profile))
    }

    #[instrument(skip(self, profile))]
    async fn save(&self, user_id: UserId, profile: &Profile) -> Result<()> {
        let json = serde_json::to_string_pretty(profile)
            .context("Failed to serialize profile")?;

        let tmp = self.tmp_path(user_id);
        fs::write(&tmp, &json)
            .await
            .context("Failed to write tmp profile file")?;

        // Atomic rename
        fs::rename(&tmp, self.profile_path(user_id))
            .await
            .context("Failed to rename profile file")?;

        debug!(wagers = profile.ledger.session.len(), "Profile saved");
        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        let test_path = self.profiles_dir.join(".health_check");
        let result = fs::write(&test_path, b"ok").await;
        let _ = fs::remove_file(&test_path).await;
        result.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    use crate::domain::{Market, Outcome, ProfileDefaults};

    fn scratch_dir(name: &str) -> String {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        std::env::temp_dir()
            .join(format!("dtbot-{name}-{}-{nanos}", std::process::id()))
            .to_string_lossy()
            .into_owned()
    }

    #[tokio::test]
    async fn test_missing_profile_loads_none() {
        let dir = scratch_dir("missing");
        let store = JsonProfileStore::new(&dir).await.unwrap();
        assert!(store.load(42).await.unwrap().is_none());
        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = scratch_dir("roundtrip");
        let store = JsonProfileStore::new(&dir).await.unwrap();

        let mut profile = Profile::new(&ProfileDefaults::default(), Utc::now());
        profile.ledger.record_wager(dec!(12.5), Market::Tiger, Utc::now()).unwrap();
        profile.ledger.close_wager(Outcome::Lose).unwrap();
        profile.bankroll -= dec!(12.5);

        store.save(-1001, &profile).await.unwrap();
        let loaded = store.load(-1001).await.unwrap().unwrap();
        assert_eq!(loaded, profile);
        assert!(!fs::try_exists(store.tmp_path(-1001)).await.unwrap());
        assert!(store.is_healthy().await);

        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_unreadable_profile_is_an_error_not_missing() {
        let dir = scratch_dir("unreadable");
        let store = JsonProfileStore::new(&dir).await.unwrap();
        // profiles/ replaced by a plain file: lookups fail with ENOTDIR
        fs::remove_dir_all(&store.profiles_dir).await.unwrap();
        fs::write(&store.profiles_dir, "").await.unwrap();

        assert!(store.load(7).await.is_err());
        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = scratch_dir("corrupt");
        let store = JsonProfileStore::new(&dir).await.unwrap();
        fs::write(store.profile_path(7), "{not json").await.unwrap();
        assert!(store.load(7).await.is_err());
        let _ = fs::remove_dir_all(&dir).await;
    }
}
