//! 内存会话存储（单节点开发 / 测试）

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::debug;

use crate::clock::Clock;
use crate::error::{Result, ServerError};
use crate::session::{Namespace, SessionStore};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: DateTime<Utc>,
}

/// 基于 DashMap 的会话存储，读取时惰性过期
pub struct MemorySessionStore {
    entries: DashMap<String, Entry>,
    clock: Arc<dyn Clock>,
}

impl MemorySessionStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    fn is_live(&self, entry: &Entry) -> bool {
        self.clock.now() < entry.expires_at
    }

    /// 清理所有已过期条目，返回清理数量
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| now < entry.expires_at);
        let purged = before.saturating_sub(self.entries.len());
        if purged > 0 {
            debug!("清理过期会话条目: {}", purged);
        }
        purged
    }

    /// 当前未过期条目数
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        self.entries.iter().filter(|e| now < e.expires_at).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 指定命名空间内未过期条目数
    pub fn count(&self, ns: Namespace) -> usize {
        let now = self.clock.now();
        self.entries
            .iter()
            .filter(|e| e.key().starts_with(ns.prefix()) && now < e.expires_at)
            .count()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn put(&self, ns: Namespace, digest: &str, value: &str, ttl: Duration) -> Result<()> {
        if ttl <= Duration::zero() {
            return Err(ServerError::internal(format!(
                "non-positive ttl for {} entry",
                ns.prefix()
            )));
        }
        let expires_at = self.clock.now().checked_add_signed(ttl).ok_or_else(|| {
            ServerError::internal(format!("ttl out of range for {} entry", ns.prefix()))
        })?;
        self.entries.insert(
            ns.key(digest),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn get(&self, ns: Namespace, digest: &str) -> Result<Option<String>> {
        let key = ns.key(digest);
        let value = match self.entries.get(&key) {
            Some(entry) if self.is_live(&entry) => Some(entry.value.clone()),
            _ => None,
        };
        if value.is_none() {
            self.entries.remove_if(&key, |_, entry| !self.is_live(entry));
        }
        Ok(value)
    }

    async fn delete(&self, ns: Namespace, digest: &str) -> Result<bool> {
        Ok(self
            .entries
            .remove(&ns.key(digest))
            .map(|(_, entry)| self.is_live(&entry))
            .unwrap_or(false))
    }

    async fn exists(&self, ns: Namespace, digest: &str) -> Result<bool> {
        Ok(self.get(ns, digest).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn store() -> (MemorySessionStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_now());
        (MemorySessionStore::new(clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let (store, _clock) = store();
        store
            .put(Namespace::Refresh, "d1", "v1", Duration::minutes(5))
            .await
            .unwrap();

        assert_eq!(
            store.get(Namespace::Refresh, "d1").await.unwrap(),
            Some("v1".to_string())
        );
        // 命名空间互相隔离
        assert!(!store.exists(Namespace::Blacklist, "d1").await.unwrap());

        assert!(store.delete(Namespace::Refresh, "d1").await.unwrap());
        assert!(!store.delete(Namespace::Refresh, "d1").await.unwrap());
        assert_eq!(store.get(Namespace::Refresh, "d1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_entries_expire_at_ttl() {
        let (store, clock) = store();
        store
            .put(Namespace::Blacklist, "d1", "revoked", Duration::seconds(10))
            .await
            .unwrap();

        clock.advance(Duration::seconds(9));
        assert!(store.exists(Namespace::Blacklist, "d1").await.unwrap());

        clock.advance(Duration::seconds(1));
        assert!(!store.exists(Namespace::Blacklist, "d1").await.unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_delete_of_expired_entry_reports_false() {
        let (store, clock) = store();
        store
            .put(Namespace::Refresh, "d1", "v1", Duration::seconds(1))
            .await
            .unwrap();
        clock.advance(Duration::seconds(2));
        assert!(!store.delete(Namespace::Refresh, "d1").await.unwrap());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let (store, clock) = store();
        store
            .put(Namespace::Refresh, "a", "1", Duration::seconds(5))
            .await
            .unwrap();
        store
            .put(Namespace::Refresh, "b", "2", Duration::seconds(50))
            .await
            .unwrap();

        clock.advance(Duration::seconds(10));
        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.count(Namespace::Refresh), 1);
    }

    #[tokio::test]
    async fn test_rejects_non_positive_ttl() {
        let (store, _clock) = store();
        let err = store
            .put(Namespace::Blacklist, "d1", "revoked", Duration::zero())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Internal);
    }

    #[tokio::test]
    async fn test_rejects_ttl_past_calendar_range() {
        let (store, _clock) = store();
        let err = store
            .put(Namespace::Refresh, "d1", "v1", Duration::days(200_000_000))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Internal);
        assert_eq!(store.count(Namespace::Refresh), 0);
    }
}
