//! 密码加密和验证模块
//!
//! 使用 bcrypt 算法进行密码加密（行业标准）

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::{Result, ServerError};

/// 密码加密成本（默认值12，适合大多数场景）
///
/// 成本值越高，加密越安全，但也越慢：
/// - 10: 约 80ms（适合高并发场景）
/// - 12: 约 300ms（默认，平衡安全和性能）
/// - 14: 约 1200ms（高安全场景）
pub const PASSWORD_COST: u32 = DEFAULT_COST;

/// bcrypt 允许的最小成本，仅适合测试
pub const MIN_PASSWORD_COST: u32 = 4;

/// 密码哈希器
///
/// 持有一个预先计算的占位哈希：邮箱不存在时也执行一次同成本的验证，
/// 让"用户不存在"和"密码错误"的耗时一致。
pub struct PasswordHasher {
    cost: u32,
    dummy_hash: String,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Result<Self> {
        let dummy_hash = hash("certify-dummy-password", cost).map_err(|e| {
            ServerError::internal("error initializing password hasher").with_source(e)
        })?;
        Ok(Self { cost, dummy_hash })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// 加密密码
    pub fn hash_password(&self, password: &str) -> Result<String> {
        hash(password, self.cost)
            .map_err(|e| ServerError::internal("error hashing password").with_source(e))
    }

    /// 验证密码
    ///
    /// - Ok(true): 密码匹配
    /// - Ok(false): 密码不匹配
    /// - Err: 存储的哈希格式损坏
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        verify(password, hash)
            .map_err(|e| ServerError::internal("error verifying password").with_source(e))
    }

    /// 对占位哈希做一次验证，结果丢弃
    pub fn burn_verification(&self, password: &str) {
        let _ = verify(password, &self.dummy_hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(MIN_PASSWORD_COST).unwrap()
    }

    #[test]
    fn test_min_cost_is_accepted() {
        let hasher = hasher();
        assert_eq!(hasher.cost(), MIN_PASSWORD_COST);
        assert!(hasher.hash_password("x").unwrap().starts_with("$2b$04$"));
    }

    #[test]
    fn test_hash_password() {
        let hash = hasher().hash_password("secret123").unwrap();

        // bcrypt 哈希总是 60 字符
        assert_eq!(hash.len(), 60);
        assert!(hash.starts_with("$2b$"));
    }

    #[test]
    fn test_verify_password() {
        let hasher = hasher();
        let hash = hasher.hash_password("secret123").unwrap();

        assert!(hasher.verify_password("secret123", &hash).unwrap());
        assert!(!hasher.verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_corrupted_hash_is_internal() {
        let err = hasher().verify_password("secret123", "not-a-hash").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Internal);
    }

    #[test]
    fn test_same_password_different_hash() {
        let hasher = hasher();
        let hash1 = hasher.hash_password("secret123").unwrap();
        let hash2 = hasher.hash_password("secret123").unwrap();

        // 相同密码的哈希值应该不同（因为 salt 不同）
        assert_ne!(hash1, hash2);
    }
}
