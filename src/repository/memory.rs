//! 内存用户 / 公司目录（测试和无数据库的本地运行）

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use crate::error::{Result, ServerError};
use crate::model::{Company, NewUser, UserRecord};
use crate::repository::{CompanyDirectory, UserDirectory};

#[derive(Default)]
struct State {
    users: HashMap<i64, UserRecord>,
    companies: HashMap<i64, Company>,
    next_user_id: i64,
    next_company_id: i64,
}

/// 同时实现用户目录和公司目录；邮箱唯一性在锁内检查
#[derive(Default)]
pub struct MemoryDirectory {
    state: Mutex<State>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> usize {
        self.state.lock().users.len()
    }

    pub fn company_count(&self) -> usize {
        self.state.lock().companies.len()
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let state = self.state.lock();
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>> {
        Ok(self.state.lock().users.get(&id).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<UserRecord> {
        let mut state = self.state.lock();
        if state.users.values().any(|u| u.email == user.email) {
            return Err(ServerError::already_exists("email"));
        }
        if !state.companies.contains_key(&user.company_id) {
            return Err(ServerError::internal(format!(
                "foreign key violation: company {} does not exist",
                user.company_id
            )));
        }

        state.next_user_id += 1;
        let now = Utc::now();
        let record = UserRecord {
            id: state.next_user_id,
            role: user.role,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            password_hash: user.password_hash,
            company_id: user.company_id,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(record.id, record.clone());
        Ok(record)
    }
}

#[async_trait]
impl CompanyDirectory for MemoryDirectory {
    async fn find_by_id(&self, id: i64) -> Result<Option<Company>> {
        Ok(self.state.lock().companies.get(&id).cloned())
    }

    async fn create_company(&self, name: &str) -> Result<Company> {
        let mut state = self.state.lock();
        state.next_company_id += 1;
        let company = Company {
            id: state.next_company_id,
            name: name.to_string(),
        };
        state.companies.insert(company.id, company.clone());
        Ok(company)
    }

    async fn delete_company(&self, id: i64) -> Result<()> {
        let mut state = self.state.lock();
        state.companies.remove(&id);
        state.users.retain(|_, u| u.company_id != id);
        Ok(())
    }
}
