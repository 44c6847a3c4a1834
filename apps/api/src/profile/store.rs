//! Per-conversation state: the accumulated profile and the last list of jobs shown.
//!
//! Each conversation sits behind its own async mutex. The orchestrator holds that
//! lock for a whole turn, so two messages of the same conversation never race on
//! the profile, while different conversations never contend.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::info;

use crate::models::profile::UserProfile;

#[derive(Debug, Clone)]
pub struct Conversation {
    pub profile: UserProfile,
    /// Job ids of the last `jobs` / `matches` payload, in display order.
    pub last_shown: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self {
            profile: UserProfile::default(),
            last_shown: Vec::new(),
            updated_at: Utc::now(),
        }
    }
}

impl Conversation {
    /// Writes a finished turn back: the staged profile, and the shown list when
    /// the turn displayed one.
    pub fn commit(&mut self, profile: UserProfile, shown: Option<Vec<String>>) {
        self.profile = profile;
        if let Some(shown) = shown {
            self.last_shown = shown;
        }
        self.updated_at = Utc::now();
    }

    fn idle_longer_than(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        (now - self.updated_at)
            .to_std()
            .map(|age| age > ttl)
            .unwrap_or(false)
    }
}

/// Profile store injected into the orchestrator.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Returns the conversation handle, creating an empty one on first use.
    async fn session(&self, conversation_id: &str) -> Arc<Mutex<Conversation>>;

    /// Returns the profile without creating the conversation.
    async fn get(&self, conversation_id: &str) -> Option<UserProfile>;

    /// Ends a conversation, discarding its profile. True if it existed.
    async fn remove(&self, conversation_id: &str) -> bool;

    /// Drops conversations idle for longer than `ttl`. Returns how many went.
    async fn evict_idle(&self, ttl: Duration) -> usize;
}

#[derive(Default)]
pub struct InMemoryProfileStore {
    conversations: RwLock<HashMap<String, Arc<Mutex<Conversation>>>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.conversations.read().await.len()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn session(&self, conversation_id: &str) -> Arc<Mutex<Conversation>> {
        let existing = self.conversations.read().await.get(conversation_id).cloned();
        if let Some(existing) = existing {
            return existing;
        }
        self.conversations
            .write()
            .await
            .entry(conversation_id.to_string())
            .or_default()
            .clone()
    }

    async fn get(&self, conversation_id: &str) -> Option<UserProfile> {
        let session = self.conversations.read().await.get(conversation_id).cloned()?;
        let profile = session.lock().await.profile.clone();
        Some(profile)
    }

    async fn remove(&self, conversation_id: &str) -> bool {
        self.conversations
            .write()
            .await
            .remove(conversation_id)
            .is_some()
    }

    async fn evict_idle(&self, ttl: Duration) -> usize {
        let now = Utc::now();
        let mut conversations = self.conversations.write().await;
        let before = conversations.len();
        // A conversation mid-turn holds its lock and is never idle.
        conversations.retain(|_, session| match session.try_lock() {
            Ok(conversation) => !conversation.idle_longer_than(ttl, now),
            Err(_) => true,
        });
        let evicted = before - conversations.len();
        if evicted > 0 {
            info!("Evicted {evicted} idle conversations");
        }
        evicted
    }
}
