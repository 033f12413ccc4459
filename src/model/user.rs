use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::models::{Role, SessionPayload};

/// 用户记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// bcrypt 哈希，不对外序列化
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub company_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// 签发时刻的会话快照
    pub fn session_payload(&self) -> SessionPayload {
        SessionPayload {
            user_id: self.id,
            role: self.role,
            company_id: self.company_id,
        }
    }
}

/// 待创建的用户（密码已哈希，邮箱已规范化）
#[derive(Debug, Clone)]
pub struct NewUser {
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub company_id: i64,
}

/// 公司（租户）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,
    pub name: String,
}
