//! In-memory profile repository, for tests and dry runs.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{Profile, UserId};
use crate::ports::repository::ProfileRepository;

#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<HashMap<UserId, Profile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored profiles.
    pub async fn len(&self) -> usize {
        self.profiles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.profiles.read().await.is_empty()
    }
}

#[async_trait]
impl ProfileRepository for MemoryProfileStore {
    async fn load(&self, user_id: UserId) -> Result<Option<Profile>> {
        Ok(self.profiles.read().await.get(&user_id).cloned())
    }

    async fn save(&self, user_id: UserId, profile: &Profile) -> Result<()> {
        self.profiles.write().await.insert(user_id, profile.clone());
        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}
