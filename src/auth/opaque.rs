//! 不透明令牌生成
//!
//! 刷新令牌是 64 字节的系统随机数（URL 安全 base64）；存储和黑名单只使用它的
//! SHA-256 摘要，存储被读走也无法还原出可用的令牌。

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::error::ServerError;

/// 随机字节数
pub const SECRET_BYTES: usize = 64;

#[derive(Debug, Error)]
#[error("system randomness source is unavailable: {0}")]
pub struct EntropyError(#[from] rand::Error);

impl From<EntropyError> for ServerError {
    fn from(err: EntropyError) -> Self {
        ServerError::internal("error generating refresh token").with_source(err)
    }
}

/// 生成新的不透明令牌；熵源不可用时直接报错，不降级
pub fn new_opaque_secret() -> Result<String, EntropyError> {
    let mut buf = [0u8; SECRET_BYTES];
    OsRng.try_fill_bytes(&mut buf)?;
    Ok(URL_SAFE_NO_PAD.encode(buf))
}

/// SHA-256 hex 摘要
pub fn digest(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_is_url_safe_and_long_enough() {
        let secret = new_opaque_secret().unwrap();
        // 64 字节 -> 86 个 base64 字符（无填充）
        assert_eq!(secret.len(), 86);
        assert!(secret
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_secrets_are_unique() {
        let a = new_opaque_secret().unwrap();
        let b = new_opaque_secret().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_digest_is_deterministic_hex() {
        let d = digest("abc");
        assert_eq!(
            d,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(digest("abc"), d);
        assert_ne!(digest("abd"), d);
    }
}
