// RedisClient - Redis客户端实现
// 基于 bb8-redis 连接池

use async_trait::async_trait;
use bb8::Pool;
use bb8_redis::RedisConnectionManager;
use chrono::Duration as ChronoDuration;
use redis::AsyncCommands;
use std::sync::Arc;
use std::time::Duration;

use crate::config::RedisConfig;
use crate::error::{Result, ServerError};
use crate::session::{Namespace, SessionStore};

/// Redis 客户端（基于连接池）
pub struct RedisClient {
    pool: Arc<Pool<RedisConnectionManager>>,
    /// 单条 Redis 命令的执行超时
    command_timeout: Duration,
}

impl RedisClient {
    /// 创建新的 Redis 客户端（从 RedisConfig 配置）
    pub async fn new(config: &RedisConfig) -> Result<Self> {
        let manager = RedisConnectionManager::new(config.url.clone()).map_err(|e| {
            ServerError::internal("Failed to create Redis manager").with_source(e)
        })?;

        let pool = Pool::builder()
            .max_size(config.pool_size)
            .min_idle(Some(config.min_idle))
            .connection_timeout(config.connection_timeout())
            .idle_timeout(Some(config.idle_timeout()))
            .build(manager)
            .await
            .map_err(|e| ServerError::internal("Failed to create Redis pool").with_source(e))?;

        let command_timeout = config.command_timeout();

        // 测试连接
        {
            let mut conn = pool.get().await.map_err(|e| {
                ServerError::internal("Failed to get Redis connection").with_source(e)
            })?;

            let _: String = conn
                .ping()
                .await
                .map_err(|e| ServerError::internal("Redis ping failed").with_source(e))?;
        }

        tracing::info!(
            "✅ Redis 连接池已创建 (pool_size={}, min_idle={}, conn_timeout={}s, cmd_timeout={}ms, idle_timeout={}s)",
            config.pool_size,
            config.min_idle,
            config.connection_timeout_secs,
            config.command_timeout_ms,
            config.idle_timeout_secs,
        );

        Ok(Self {
            pool: Arc::new(pool),
            command_timeout,
        })
    }

    /// 获取连接池状态（活跃连接数、空闲连接数）
    pub fn pool_state(&self) -> bb8::State {
        self.pool.state()
    }

    /// 从连接池获取连接
    async fn get_conn(&self) -> Result<bb8::PooledConnection<'_, RedisConnectionManager>> {
        self.pool.get().await.map_err(|e| {
            ServerError::internal("Failed to get Redis connection").with_source(e)
        })
    }

    /// 执行带超时的 Redis 操作
    async fn with_timeout<F, T>(&self, op: F) -> Result<T>
    where
        F: std::future::Future<Output = Result<T>>,
    {
        tokio::time::timeout(self.command_timeout, op)
            .await
            .map_err(|e| {
                ServerError::internal(format!(
                    "Redis command timeout ({}ms)",
                    self.command_timeout.as_millis()
                ))
                .with_source(e)
            })?
    }
}

/// TTL 转为毫秒，至少 1ms
fn ttl_millis(ttl: ChronoDuration) -> Result<u64> {
    if ttl <= ChronoDuration::zero() {
        return Err(ServerError::internal("non-positive ttl for session entry"));
    }
    Ok(ttl.num_milliseconds().max(1) as u64)
}

#[async_trait]
impl SessionStore for RedisClient {
    /// PSETEX key milliseconds value
    async fn put(&self, ns: Namespace, digest: &str, value: &str, ttl: ChronoDuration) -> Result<()> {
        let millis = ttl_millis(ttl)?;
        let key = ns.key(digest);
        self.with_timeout(async {
            let mut conn = self.get_conn().await?;
            conn.pset_ex::<_, _, ()>(&key, value, millis)
                .await
                .map_err(|e| ServerError::internal("Redis PSETEX failed").with_source(e))?;
            Ok(())
        })
        .await
    }

    /// GET key
    async fn get(&self, ns: Namespace, digest: &str) -> Result<Option<String>> {
        let key = ns.key(digest);
        self.with_timeout(async {
            let mut conn = self.get_conn().await?;
            let result: Option<String> = conn
                .get(&key)
                .await
                .map_err(|e| ServerError::internal("Redis GET failed").with_source(e))?;
            Ok(result)
        })
        .await
    }

    /// DEL key，返回是否删除了条目
    async fn delete(&self, ns: Namespace, digest: &str) -> Result<bool> {
        let key = ns.key(digest);
        self.with_timeout(async {
            let mut conn = self.get_conn().await?;
            let removed: i64 = conn
                .del(&key)
                .await
                .map_err(|e| ServerError::internal("Redis DEL failed").with_source(e))?;
            Ok(removed > 0)
        })
        .await
    }

    /// EXISTS key
    async fn exists(&self, ns: Namespace, digest: &str) -> Result<bool> {
        let key = ns.key(digest);
        self.with_timeout(async {
            let mut conn = self.get_conn().await?;
            let result: bool = conn
                .exists(&key)
                .await
                .map_err(|e| ServerError::internal("Redis EXISTS failed").with_source(e))?;
            Ok(result)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_millis() {
        assert_eq!(ttl_millis(ChronoDuration::seconds(2)).unwrap(), 2000);
        assert_eq!(ttl_millis(ChronoDuration::milliseconds(1)).unwrap(), 1);
        assert_eq!(ttl_millis(ChronoDuration::microseconds(300)).unwrap(), 1);
        assert!(ttl_millis(ChronoDuration::zero()).is_err());
        assert!(ttl_millis(ChronoDuration::seconds(-5)).is_err());
    }
}
