//! 用户仓库 - PostgreSQL 实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::error;

use crate::error::{Result, ServerError};
use crate::model::{NewUser, UserRecord};
use crate::repository::UserDirectory;

/// PostgreSQL 唯一约束冲突
const UNIQUE_VIOLATION: &str = "23505";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    role: String,
    first_name: String,
    last_name: String,
    email: String,
    password: String,
    company_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = ServerError;

    fn try_from(r: UserRow) -> Result<Self> {
        Ok(UserRecord {
            id: r.id,
            role: r.role.parse()?,
            first_name: r.first_name,
            last_name: r.last_name,
            email: r.email,
            password_hash: r.password,
            company_id: r.company_id,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// 是否是唯一约束冲突
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation() || db_err.code().as_deref() == Some(UNIQUE_VIOLATION)
        }
        _ => false,
    }
}

/// 用户仓库 (PostgreSQL 实现)
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, role, first_name, last_name, email, password, company_id, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("error getting user by email: {}", e);
            ServerError::internal("error getting user").with_source(e)
        })?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, role, first_name, last_name, email, password, company_id, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("error getting user by id: user_id={}, err={}", id, e);
            ServerError::internal("error getting user").with_source(e)
        })?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn create_user(&self, user: NewUser) -> Result<UserRecord> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (role, first_name, last_name, email, password, company_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, role, first_name, last_name, email, password, company_id, created_at, updated_at
            "#,
        )
        .bind(user.role.as_str())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.company_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return ServerError::already_exists("email").with_source(e);
            }
            error!("error creating user: email={}, err={}", user.email, e);
            ServerError::internal("error creating user").with_source(e)
        })?;

        UserRecord::try_from(row)
    }
}
