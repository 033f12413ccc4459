//! 仓库层
//!
//! - 用户 / 公司目录：PostgreSQL 实现 + 内存实现
//! - 令牌仓库：绑定到会话存储某个命名空间的类型化读写

pub mod company_repo;
pub mod memory;
pub mod token_repo;
pub mod user_repo;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Company, NewUser, UserRecord};

pub use company_repo::PgCompanyRepository;
pub use memory::MemoryDirectory;
pub use token_repo::{DenylistRepository, RefreshTokenRepository};
pub use user_repo::PgUserRepository;

/// 用户目录
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// 按邮箱查找（邮箱已规范化为小写）
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>>;

    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>>;

    /// 创建用户；邮箱重复返回 `AlreadyExists("email already exists")`
    async fn create_user(&self, user: NewUser) -> Result<UserRecord>;
}

/// 公司目录
#[async_trait]
pub trait CompanyDirectory: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Company>>;

    async fn create_company(&self, name: &str) -> Result<Company>;

    async fn delete_company(&self, id: i64) -> Result<()>;
}
