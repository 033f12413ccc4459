//! 公司仓库 - PostgreSQL 实现

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::error;

use crate::error::{Result, ServerError};
use crate::model::Company;
use crate::repository::CompanyDirectory;

#[derive(Clone)]
pub struct PgCompanyRepository {
    pool: PgPool,
}

impl PgCompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CompanyDirectory for PgCompanyRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Company>> {
        let row: Option<(i64, String)> =
            sqlx::query_as("SELECT id, name FROM companies WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    error!("error getting company by id: company_id={}, err={}", id, e);
                    ServerError::internal("error getting company").with_source(e)
                })?;

        Ok(row.map(|(id, name)| Company { id, name }))
    }

    async fn create_company(&self, name: &str) -> Result<Company> {
        let id: i64 = sqlx::query_scalar("INSERT INTO companies (name) VALUES ($1) RETURNING id")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("error creating company: name={}, err={}", name, e);
                ServerError::internal("error creating company").with_source(e)
            })?;

        Ok(Company {
            id,
            name: name.to_string(),
        })
    }

    async fn delete_company(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("error deleting company: company_id={}, err={}", id, e);
                ServerError::internal("error deleting company").with_source(e)
            })?;
        Ok(())
    }
}
