// Infrastructure layer - 基础设施层
// 负责数据库连接、Redis 会话存储和监控指标

pub mod database;
pub mod metrics;
pub mod redis;

// 数据库连接管理
pub use database::Database;

// Redis 会话存储
pub use redis::RedisClient;
