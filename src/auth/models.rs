use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::ServerError;

/// 用户角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Employee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Employee => "employee",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ServerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "employee" => Ok(Role::Employee),
            other => Err(ServerError::internal(format!("unknown role: {}", other))),
        }
    }
}

/// 会话载荷：签发时刻的用户身份快照
///
/// 同时嵌入访问令牌的 claims 和刷新令牌的存储值。角色与公司只在登录/注册时
/// 从数据库重新读取，验证访问令牌时不会回查。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPayload {
    pub user_id: i64,
    pub role: Role,
    pub company_id: i64,
}

/// 访问令牌 claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    #[serde(flatten)]
    pub payload: SessionPayload,
    /// 签发时间（Unix 秒）
    pub iat: i64,
    /// 过期时间（Unix 秒）
    pub exp: i64,
    /// 令牌唯一 ID，保证同一秒签发的两个令牌摘要不同
    pub jti: String,
}

/// 新签发的刷新令牌
///
/// `secret` 只交给客户端，服务端只持久化 `digest`。
#[derive(Clone)]
pub struct RefreshToken {
    pub payload: SessionPayload,
    pub secret: String,
    pub digest: String,
    pub expires_in: Duration,
}

impl RefreshToken {
    pub fn user_id(&self) -> i64 {
        self.payload.user_id
    }
}

impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshToken")
            .field("payload", &self.payload)
            .field("secret", &"***")
            .field("digest", &self.digest)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// 访问令牌 + 刷新令牌
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// 登录请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// 刷新 / 登出请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// 员工注册请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterEmployeeRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub company_id: i64,
}

/// 管理员信息（随公司一起创建）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// 创建公司并注册其管理员
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCompanyRequest {
    pub company_name: String,
    pub admin: AdminUser,
}

/// 邮箱统一去空白、转小写
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn require(field: &str, value: &str) -> Result<(), ServerError> {
    if value.trim().is_empty() {
        return Err(ServerError::bad_request(format!("{} is required", field)));
    }
    Ok(())
}

fn require_email(email: &str) -> Result<(), ServerError> {
    require("email", email)?;
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && domain.contains('.')
        }
        None => false,
    };
    if !valid {
        return Err(ServerError::bad_request("email is malformed"));
    }
    Ok(())
}

impl RegisterEmployeeRequest {
    pub fn validate(&self) -> Result<(), ServerError> {
        require("first_name", &self.first_name)?;
        require("last_name", &self.last_name)?;
        require_email(&self.email)?;
        require("password", &self.password)?;
        if self.company_id <= 0 {
            return Err(ServerError::bad_request("company_id is required"));
        }
        Ok(())
    }
}

impl CreateCompanyRequest {
    pub fn validate(&self) -> Result<(), ServerError> {
        require("company_name", &self.company_name)?;
        require("admin.first_name", &self.admin.first_name)?;
        require("admin.last_name", &self.admin.last_name)?;
        require_email(&self.admin.email)?;
        require("admin.password", &self.admin.password)?;
        Ok(())
    }
}
