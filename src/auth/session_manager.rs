//! 会话管理器
//!
//! 登录、注册、刷新（轮换）、登出（撤销）和访问令牌认证。
//! `blacklist:` 命名空间只在这里写入。

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, error, info, warn};

use crate::auth::models::{
    normalize_email, CreateCompanyRequest, RegisterEmployeeRequest, Role, SessionPayload,
    TokenPair,
};
use crate::auth::opaque::digest;
use crate::auth::password::PasswordHasher;
use crate::auth::token_service::{short, TokenService};
use crate::clock::Clock;
use crate::config::TokenConfig;
use crate::error::{ErrorKind, Result, ServerError};
use crate::infra::metrics::{self, Outcome};
use crate::model::{NewUser, UserRecord};
use crate::repository::{CompanyDirectory, DenylistRepository, UserDirectory};
use crate::session::SessionStore;

const INVALID_CREDENTIALS: &str = "invalid credentials";
const INVALID_REFRESH: &str = "refresh token is invalid or expired";
const TOKEN_REVOKED: &str = "token has been revoked";

pub struct SessionManager {
    tokens: TokenService,
    denylist: DenylistRepository,
    users: Arc<dyn UserDirectory>,
    companies: Arc<dyn CompanyDirectory>,
    passwords: PasswordHasher,
    clock: Arc<dyn Clock>,
}

impl SessionManager {
    pub fn new(
        config: TokenConfig,
        clock: Arc<dyn Clock>,
        store: Arc<dyn SessionStore>,
        users: Arc<dyn UserDirectory>,
        companies: Arc<dyn CompanyDirectory>,
        passwords: PasswordHasher,
    ) -> Self {
        Self {
            tokens: TokenService::new(config, clock.clone(), store.clone()),
            denylist: DenylistRepository::new(store),
            users,
            companies,
            passwords,
            clock,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// 邮箱 + 密码登录
    ///
    /// 邮箱不存在和密码错误返回完全相同的错误，耗时也一致。
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair> {
        let result = self.try_login(email, password).await;
        metrics::record_login(Outcome::of(&result));
        result
    }

    async fn try_login(&self, email: &str, password: &str) -> Result<TokenPair> {
        let email = normalize_email(email);

        let Some(user) = self.users.find_by_email(&email).await? else {
            self.passwords.burn_verification(password);
            warn!("⚠️ 登录失败: 账号不存在");
            return Err(ServerError::unauthorized(INVALID_CREDENTIALS));
        };

        if !self.passwords.verify_password(password, &user.password_hash)? {
            warn!("⚠️ 登录失败: 密码错误 user_id={}", user.id);
            return Err(ServerError::unauthorized(INVALID_CREDENTIALS));
        }

        let pair = self.tokens.issue_token_pair(&user.session_payload()).await?;
        info!(
            "✅ 用户登录成功: user_id={}, company_id={}",
            user.id, user.company_id
        );
        Ok(pair)
    }

    /// 员工注册：公司必须已存在
    pub async fn register(&self, req: RegisterEmployeeRequest) -> Result<TokenPair> {
        req.validate()?;

        if self.companies.find_by_id(req.company_id).await?.is_none() {
            return Err(ServerError::not_found("company"));
        }

        let user = self
            .create_user(
                Role::Employee,
                &req.first_name,
                &req.last_name,
                &req.email,
                &req.password,
                req.company_id,
            )
            .await?;
        info!(
            "✅ 员工注册成功: user_id={}, company_id={}",
            user.id, user.company_id
        );

        self.tokens.issue_token_pair(&user.session_payload()).await
    }

    /// 创建公司并注册其管理员
    ///
    /// 管理员创建失败时删除刚创建的公司，再把原错误返回。
    pub async fn register_company(&self, req: CreateCompanyRequest) -> Result<TokenPair> {
        req.validate()?;

        let company = self
            .companies
            .create_company(req.company_name.trim())
            .await?;

        let admin = &req.admin;
        let user = match self
            .create_user(
                Role::Admin,
                &admin.first_name,
                &admin.last_name,
                &admin.email,
                &admin.password,
                company.id,
            )
            .await
        {
            Ok(user) => user,
            Err(e) => {
                if let Err(cleanup) = self.companies.delete_company(company.id).await {
                    error!(
                        "❌ 回滚公司失败: company_id={}, err={}",
                        company.id, cleanup
                    );
                }
                return Err(e);
            }
        };
        info!(
            "✅ 公司注册成功: company_id={}, admin_id={}",
            company.id, user.id
        );

        self.tokens.issue_token_pair(&user.session_payload()).await
    }

    async fn create_user(
        &self,
        role: Role,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
        company_id: i64,
    ) -> Result<UserRecord> {
        let password_hash = self.passwords.hash_password(password)?;
        self.users
            .create_user(NewUser {
                role,
                first_name: first_name.trim().to_string(),
                last_name: last_name.trim().to_string(),
                email: normalize_email(email),
                password_hash,
                company_id,
            })
            .await
    }

    /// 用刷新令牌换一对新令牌；旧刷新令牌随即失效
    ///
    /// 删除旧摘要是串行化点：并发提交同一个刷新令牌只有一个能成功。
    /// 删除之后的任何失败都让会话处于已登出状态。
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let result = self.try_refresh(refresh_token).await;
        metrics::record_refresh(Outcome::of(&result));
        result
    }

    async fn try_refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        if refresh_token.is_empty() {
            return Err(ServerError::unauthorized(INVALID_REFRESH));
        }

        let Some(payload) = self.tokens.find_refresh_session(refresh_token).await? else {
            debug!(
                "refresh token not found: digest={}..",
                short(&digest(refresh_token))
            );
            return Err(ServerError::unauthorized(INVALID_REFRESH));
        };

        if !self.tokens.revoke_refresh_token(refresh_token).await? {
            warn!(
                "⚠️ 刷新令牌重复使用: user_id={}, digest={}..",
                payload.user_id,
                short(&digest(refresh_token))
            );
            return Err(ServerError::unauthorized(INVALID_REFRESH));
        }

        self.tokens.issue_token_pair(&payload).await
    }

    /// 登出：撤销刷新令牌，并在访问令牌剩余寿命内拉黑它
    ///
    /// 重复登出不报错；已过期或无效的访问令牌不需要拉黑。
    pub async fn logout(&self, access_token: &str, refresh_token: &str) -> Result<()> {
        if !refresh_token.is_empty() {
            self.tokens.revoke_refresh_token(refresh_token).await?;
        }

        match self.tokens.parse_access_token(access_token) {
            Ok((payload, expires_at)) => {
                let remaining = expires_at - self.clock.now();
                if remaining > Duration::zero() {
                    let access_digest = digest(access_token);
                    self.denylist.revoke(&access_digest, remaining).await?;
                    debug!(
                        "access token blacklisted: digest={}.., ttl={}s",
                        short(&access_digest),
                        remaining.num_seconds()
                    );
                }
                info!("👋 用户登出: user_id={}", payload.user_id);
            }
            Err(e) if e.is(ErrorKind::Unauthorized) => {
                debug!("logout with unusable access token, skip blacklist: {}", e);
            }
            Err(e) => return Err(e),
        }

        metrics::record_logout();
        Ok(())
    }

    /// 认证访问令牌：先查黑名单，再验签和过期
    pub async fn authenticate(&self, access_token: &str) -> Result<SessionPayload> {
        if access_token.is_empty() {
            return Err(ServerError::unauthorized("invalid token"));
        }

        let access_digest = digest(access_token);
        if self.denylist.is_revoked(&access_digest).await? {
            warn!(
                "⚠️ 已撤销的访问令牌被再次使用: digest={}..",
                short(&access_digest)
            );
            metrics::record_revoked_rejection();
            return Err(ServerError::unauthorized(TOKEN_REVOKED));
        }

        let (payload, _) = self.tokens.parse_access_token(access_token)?;
        Ok(payload)
    }

    /// 读取已认证会话对应的用户记录
    pub async fn current_user(&self, payload: &SessionPayload) -> Result<UserRecord> {
        self.users
            .find_by_id(payload.user_id)
            .await?
            .ok_or_else(|| ServerError::not_found("user"))
    }
}
