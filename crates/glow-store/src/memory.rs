//! In-memory store (for development and tests)

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use glow_core::{PaymentAttempt, PaymentStatus, ProfileHints, User, UserId};

use crate::error::StoreError;
use crate::ledger::{AdminStore, LedgerStore, VideoAsset};

#[derive(Default)]
struct Inner {
    users: HashMap<UserId, User>,
    attempts: HashMap<String, PaymentAttempt>,
    /// Insertion order, used to break created-at ties in history listings
    attempt_order: Vec<String>,
    videos: HashMap<String, VideoAsset>,
    upload_sessions: HashMap<UserId, DateTime<Utc>>,
}

/// Mutex-guarded maps mirroring the Postgres schema
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn ensure_user(&self, id: UserId, hints: &ProfileHints) -> Result<User, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let user = inner
            .users
            .entry(id)
            .or_insert_with(|| User::new(id, hints));
        if hints.username.is_some() {
            user.username = hints.username.clone();
        }
        if hints.first_name.is_some() {
            user.first_name = hints.first_name.clone();
        }
        if hints.last_name.is_some() {
            user.last_name = hints.last_name.clone();
        }
        Ok(user.clone())
    }

    async fn user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.get(&id).cloned())
    }

    async fn grant_access(&self, id: UserId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(user) = inner.users.get_mut(&id) {
            user.has_access = true;
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn insert_attempt(&self, attempt: &PaymentAttempt) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.attempts.contains_key(&attempt.charge_id) {
            return Err(StoreError::Duplicate(attempt.charge_id.clone()));
        }
        inner.attempt_order.push(attempt.charge_id.clone());
        inner
            .attempts
            .insert(attempt.charge_id.clone(), attempt.clone());
        Ok(())
    }

    async fn attempt(&self, charge_id: &str) -> Result<Option<PaymentAttempt>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.attempts.get(charge_id).cloned())
    }

    async fn advance_status(
        &self,
        charge_id: &str,
        status: PaymentStatus,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let Some(attempt) = inner.attempts.get_mut(charge_id) else {
            return Ok(false);
        };
        if attempt.status.is_terminal() || attempt.status == status {
            return Ok(false);
        }
        attempt.status = status;
        attempt.updated_at = Utc::now();
        Ok(true)
    }

    async fn attempts_for_user(&self, id: UserId) -> Result<Vec<PaymentAttempt>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .attempt_order
            .iter()
            .rev()
            .filter_map(|charge_id| inner.attempts.get(charge_id))
            .filter(|a| a.user_id == id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AdminStore for MemoryStore {
    async fn save_video(&self, video: &VideoAsset) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.videos.insert(video.name.clone(), video.clone());
        Ok(())
    }

    async fn video(&self, name: &str) -> Result<Option<VideoAsset>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.videos.get(name).cloned())
    }

    async fn open_upload_session(&self, admin: UserId, ttl: Duration) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.upload_sessions.insert(admin, Utc::now() + ttl);
        Ok(())
    }

    async fn take_upload_session(&self, admin: UserId) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.upload_sessions.remove(&admin) {
            Some(expires_at) => Ok(expires_at > Utc::now()),
            None => Ok(false),
        }
    }

    async fn close_upload_session(&self, admin: UserId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.upload_sessions.remove(&admin);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glow_core::Tier;

    use super::*;

    fn hints(name: &str) -> ProfileHints {
        ProfileHints {
            username: Some(name.into()),
            ..ProfileHints::default()
        }
    }

    #[tokio::test]
    async fn test_ensure_user_is_idempotent() {
        let store = MemoryStore::new();
        let first = store.ensure_user(UserId(7), &hints("a")).await.unwrap();
        let second = store.ensure_user(UserId(7), &hints("b")).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.username.as_deref(), Some("b"));
        assert!(!second.has_access);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_first_contact_creates_one_row() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.ensure_user(UserId(99), &ProfileHints::default()).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        let created = store.user(UserId(99)).await.unwrap();
        assert!(created.is_some());
        assert_eq!(store.inner.lock().unwrap().users.len(), 1);
    }

    #[tokio::test]
    async fn test_advance_status_applies_forward_transitions() {
        let store = MemoryStore::new();
        let attempt = PaymentAttempt::pending("c1", UserId(1), Tier::SelfPaced);
        store.insert_attempt(&attempt).await.unwrap();

        assert!(
            store
                .advance_status("c1", PaymentStatus::WaitingForCapture)
                .await
                .unwrap()
        );
        assert!(
            store
                .advance_status("c1", PaymentStatus::Succeeded)
                .await
                .unwrap()
        );
        let stored = store.attempt("c1").await.unwrap().unwrap();
        assert_eq!(stored.status, PaymentStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_terminal_status_never_regresses() {
        let store = MemoryStore::new();
        store
            .insert_attempt(&PaymentAttempt::pending("c2", UserId(1), Tier::Mentored))
            .await
            .unwrap();
        assert!(
            store
                .advance_status("c2", PaymentStatus::Succeeded)
                .await
                .unwrap()
        );

        // duplicate delivery of the same terminal status
        assert!(
            !store
                .advance_status("c2", PaymentStatus::Succeeded)
                .await
                .unwrap()
        );
        // stale cancellation arriving after the fact
        assert!(
            !store
                .advance_status("c2", PaymentStatus::Canceled)
                .await
                .unwrap()
        );
        let stored = store.attempt("c2").await.unwrap().unwrap();
        assert_eq!(stored.status, PaymentStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_duplicate_charge_id_rejected() {
        let store = MemoryStore::new();
        let attempt = PaymentAttempt::pending("c3", UserId(1), Tier::SelfPaced);
        store.insert_attempt(&attempt).await.unwrap();
        assert!(matches!(
            store.insert_attempt(&attempt).await,
            Err(StoreError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn test_history_is_newest_first() {
        let store = MemoryStore::new();
        for charge_id in ["old", "mid", "new"] {
            store
                .insert_attempt(&PaymentAttempt::pending(charge_id, UserId(5), Tier::SelfPaced))
                .await
                .unwrap();
        }
        store
            .insert_attempt(&PaymentAttempt::pending("other", UserId(6), Tier::SelfPaced))
            .await
            .unwrap();

        let history = store.attempts_for_user(UserId(5)).await.unwrap();
        let ids: Vec<&str> = history.iter().map(|a| a.charge_id.as_str()).collect();
        assert_eq!(ids, ["new", "mid", "old"]);
    }

    #[tokio::test]
    async fn test_upload_session_consumed_once() {
        let store = MemoryStore::new();
        store
            .open_upload_session(UserId(1), Duration::minutes(10))
            .await
            .unwrap();
        assert!(store.take_upload_session(UserId(1)).await.unwrap());
        assert!(!store.take_upload_session(UserId(1)).await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_upload_session_is_dead() {
        let store = MemoryStore::new();
        store
            .open_upload_session(UserId(2), Duration::minutes(-1))
            .await
            .unwrap();
        assert!(!store.take_upload_session(UserId(2)).await.unwrap());
    }
}
