//! 令牌仓库
//!
//! 每个仓库只绑定会话存储的一个命名空间：刷新令牌仓库只由 `TokenService` 持有，
//! 黑名单仓库只由 `SessionManager` 持有。

use std::sync::Arc;

use chrono::Duration;
use tracing::error;

use crate::auth::models::{RefreshToken, SessionPayload};
use crate::error::{Result, ServerError};
use crate::session::{Namespace, SessionStore};

/// 黑名单占位值
const REVOKED_SENTINEL: &str = "revoked";

/// 刷新令牌仓库（`refresh:` 命名空间）
#[derive(Clone)]
pub struct RefreshTokenRepository {
    store: Arc<dyn SessionStore>,
}

impl RefreshTokenRepository {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// 以摘要为键保存序列化后的会话载荷，TTL = 刷新令牌有效期
    pub async fn save(&self, token: &RefreshToken) -> Result<()> {
        let value = serde_json::to_string(&token.payload)?;
        self.store
            .put(Namespace::Refresh, &token.digest, &value, token.expires_in)
            .await
            .map_err(|e| {
                error!("error setting refresh token: {}", e);
                e
            })
    }

    /// 读取摘要对应的会话载荷；不存在或已过期返回 None
    pub async fn fetch(&self, digest: &str) -> Result<Option<SessionPayload>> {
        let Some(json) = self.store.get(Namespace::Refresh, digest).await? else {
            return Ok(None);
        };
        let payload = serde_json::from_str(&json).map_err(|e| {
            error!("error unmarshaling token payload: {}", e);
            ServerError::internal("error unmarshaling token payload").with_source(e)
        })?;
        Ok(Some(payload))
    }

    /// 删除摘要；返回是否确实删除了一条
    pub async fn delete(&self, digest: &str) -> Result<bool> {
        self.store.delete(Namespace::Refresh, digest).await
    }
}

/// 访问令牌黑名单（`blacklist:` 命名空间）
#[derive(Clone)]
pub struct DenylistRepository {
    store: Arc<dyn SessionStore>,
}

impl DenylistRepository {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// 拉黑访问令牌摘要，TTL = 令牌剩余寿命
    pub async fn revoke(&self, digest: &str, remaining: Duration) -> Result<()> {
        self.store
            .put(Namespace::Blacklist, digest, REVOKED_SENTINEL, remaining)
            .await
            .map_err(|e| {
                error!("error blacklisting access token: {}", e);
                e
            })
    }

    pub async fn is_revoked(&self, digest: &str) -> Result<bool> {
        self.store.exists(Namespace::Blacklist, digest).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::Role;
    use crate::clock::ManualClock;
    use crate::session::MemorySessionStore;

    fn store() -> (Arc<MemorySessionStore>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_now());
        (Arc::new(MemorySessionStore::new(clock.clone())), clock)
    }

    #[tokio::test]
    async fn test_refresh_payload_roundtrip_through_store() {
        let (store, _clock) = store();
        let repo = RefreshTokenRepository::new(store.clone());
        let payload = SessionPayload {
            user_id: 5,
            role: Role::Admin,
            company_id: 9,
        };
        let token = RefreshToken {
            payload: payload.clone(),
            secret: "raw".to_string(),
            digest: "digest-1".to_string(),
            expires_in: Duration::hours(1),
        };

        repo.save(&token).await.unwrap();
        assert_eq!(repo.fetch("digest-1").await.unwrap(), Some(payload));
        // 原始令牌从不落库
        assert_eq!(store.get(Namespace::Refresh, "raw").await.unwrap(), None);

        assert!(repo.delete("digest-1").await.unwrap());
        assert_eq!(repo.fetch("digest-1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupted_payload_is_internal() {
        let (store, _clock) = store();
        store
            .put(Namespace::Refresh, "d", "not json", Duration::hours(1))
            .await
            .unwrap();
        let repo = RefreshTokenRepository::new(store);
        let err = repo.fetch("d").await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Internal);
    }

    #[tokio::test]
    async fn test_denylist_entry_expires() {
        let (store, clock) = store();
        let repo = DenylistRepository::new(store);

        repo.revoke("a", Duration::seconds(30)).await.unwrap();
        assert!(repo.is_revoked("a").await.unwrap());

        clock.advance(Duration::seconds(30));
        assert!(!repo.is_revoked("a").await.unwrap());
    }
}
