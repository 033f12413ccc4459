//! 会话存储
//!
//! 带 TTL 的键值存储，两个互不相干的命名空间：
//! - `refresh:` 活跃刷新令牌摘要 -> 序列化的会话载荷
//! - `blacklist:` 已撤销访问令牌摘要 -> 占位值
//!
//! 所有操作都可以被多个请求并发调用；条目在 TTL 到期时或之后自动失效。

pub mod memory;

use async_trait::async_trait;
use chrono::Duration;

use crate::error::Result;

pub use memory::MemorySessionStore;

/// 存储命名空间
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Refresh,
    Blacklist,
}

impl Namespace {
    pub fn prefix(&self) -> &'static str {
        match self {
            Namespace::Refresh => "refresh:",
            Namespace::Blacklist => "blacklist:",
        }
    }

    /// 完整存储键
    pub fn key(&self, digest: &str) -> String {
        format!("{}{}", self.prefix(), digest)
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// 写入条目，`ttl` 必须为正
    async fn put(&self, ns: Namespace, digest: &str, value: &str, ttl: Duration) -> Result<()>;

    async fn get(&self, ns: Namespace, digest: &str) -> Result<Option<String>>;

    /// 删除条目；返回是否真的删掉了一条。删除不存在的键不是错误。
    ///
    /// 刷新令牌轮换以这里为串行化点：同一摘要的并发删除只有一个返回 `true`。
    async fn delete(&self, ns: Namespace, digest: &str) -> Result<bool>;

    async fn exists(&self, ns: Namespace, digest: &str) -> Result<bool>;
}
