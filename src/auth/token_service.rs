//! 令牌服务
//!
//! 组合签名器、不透明令牌生成器和刷新令牌仓库：签发令牌对，按原始刷新令牌
//! 查找 / 撤销会话，解析访问令牌。`refresh:` 命名空间只在这里写入。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::auth::models::{RefreshToken, SessionPayload, TokenPair};
use crate::auth::opaque::{digest, new_opaque_secret};
use crate::auth::signer::JwtSigner;
use crate::clock::Clock;
use crate::config::TokenConfig;
use crate::error::Result;
use crate::repository::RefreshTokenRepository;
use crate::session::SessionStore;

/// 日志里只打印摘要前缀
pub(crate) fn short(digest: &str) -> &str {
    &digest[..digest.len().min(12)]
}

pub struct TokenService {
    config: TokenConfig,
    signer: JwtSigner,
    refresh_tokens: RefreshTokenRepository,
}

impl TokenService {
    pub fn new(config: TokenConfig, clock: Arc<dyn Clock>, store: Arc<dyn SessionStore>) -> Self {
        let signer = JwtSigner::new(&config.secret, clock);
        Self {
            config,
            signer,
            refresh_tokens: RefreshTokenRepository::new(store),
        }
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// 签发访问令牌，有效期 `access_ttl`
    pub fn generate_access_token(&self, payload: &SessionPayload) -> Result<String> {
        Ok(self.signer.issue(payload, self.config.access_ttl)?)
    }

    /// 生成刷新令牌（尚未持久化）
    pub fn generate_refresh_token(&self, payload: &SessionPayload) -> Result<RefreshToken> {
        let secret = new_opaque_secret()?;
        let digest = digest(&secret);
        Ok(RefreshToken {
            payload: payload.clone(),
            secret,
            digest,
            expires_in: self.config.refresh_ttl,
        })
    }

    /// 解析访问令牌，返回载荷和绝对过期时间
    ///
    /// 伪造 / 格式错误 / 过期都是 `Unauthorized`。
    pub fn parse_access_token(&self, token: &str) -> Result<(SessionPayload, DateTime<Utc>)> {
        Ok(self.signer.verify(token)?)
    }

    pub async fn save_refresh_token(&self, token: &RefreshToken) -> Result<()> {
        self.refresh_tokens.save(token).await
    }

    /// 按原始刷新令牌查找会话载荷
    pub async fn find_refresh_session(&self, secret: &str) -> Result<Option<SessionPayload>> {
        self.refresh_tokens.fetch(&digest(secret)).await
    }

    /// 撤销刷新令牌；返回是否确实删除了一条（并发轮换时只有一个调用方拿到 true）
    pub async fn revoke_refresh_token(&self, secret: &str) -> Result<bool> {
        let digest = digest(secret);
        let removed = self.refresh_tokens.delete(&digest).await?;
        debug!(
            "refresh token revoked: digest={}.., removed={}",
            short(&digest),
            removed
        );
        Ok(removed)
    }

    /// 签发令牌对
    ///
    /// 先签访问令牌、再生成刷新令牌，最后才写入存储；任何一步失败都不返回令牌对，
    /// 也不会留下已持久化却无人持有的刷新令牌。
    pub async fn issue_token_pair(&self, payload: &SessionPayload) -> Result<TokenPair> {
        let access_token = self.generate_access_token(payload)?;
        let refresh = self.generate_refresh_token(payload)?;
        self.save_refresh_token(&refresh).await?;

        debug!(
            "token pair issued: user_id={}, company_id={}, refresh_digest={}..",
            payload.user_id,
            payload.company_id,
            short(&refresh.digest)
        );

        Ok(TokenPair {
            access_token,
            refresh_token: refresh.secret,
        })
    }
}
