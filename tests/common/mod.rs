#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use certify_auth::auth::{
    AdminUser, CreateCompanyRequest, PasswordHasher, SessionManager, MIN_PASSWORD_COST,
};
use certify_auth::clock::ManualClock;
use certify_auth::config::TokenConfig;
use certify_auth::error::{Result, ServerError};
use certify_auth::repository::MemoryDirectory;
use certify_auth::session::{MemorySessionStore, Namespace, SessionStore};
use chrono::Duration;

pub const SECRET: &str = "integration-test-secret-0123456789abcdef";

pub fn token_config() -> TokenConfig {
    TokenConfig {
        secret: SECRET.to_string(),
        access_ttl: Duration::minutes(15),
        refresh_ttl: Duration::hours(24),
    }
}

/// 在内存存储外包一层，可以让写入或读取 / 删除失败
pub struct FlakyStore {
    inner: MemorySessionStore,
    fail_puts: AtomicBool,
    fail_reads: AtomicBool,
}

impl FlakyStore {
    pub fn new(inner: MemorySessionStore) -> Self {
        Self {
            inner,
            fail_puts: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
        }
    }

    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// 让 get / exists / delete 失败
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn check_reads(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ServerError::internal("session store unavailable"));
        }
        Ok(())
    }

    pub fn count(&self, ns: Namespace) -> usize {
        self.inner.count(ns)
    }
}

#[async_trait]
impl SessionStore for FlakyStore {
    async fn put(&self, ns: Namespace, digest: &str, value: &str, ttl: Duration) -> Result<()> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(ServerError::internal("session store unavailable"));
        }
        self.inner.put(ns, digest, value, ttl).await
    }

    async fn get(&self, ns: Namespace, digest: &str) -> Result<Option<String>> {
        self.check_reads()?;
        self.inner.get(ns, digest).await
    }

    async fn delete(&self, ns: Namespace, digest: &str) -> Result<bool> {
        self.check_reads()?;
        self.inner.delete(ns, digest).await
    }

    async fn exists(&self, ns: Namespace, digest: &str) -> Result<bool> {
        self.check_reads()?;
        self.inner.exists(ns, digest).await
    }
}

pub struct Harness {
    pub manager: Arc<SessionManager>,
    pub directory: Arc<MemoryDirectory>,
    pub store: Arc<FlakyStore>,
    pub clock: Arc<ManualClock>,
}

pub fn harness() -> Harness {
    let clock = Arc::new(ManualClock::starting_now());
    let store = Arc::new(FlakyStore::new(MemorySessionStore::new(clock.clone())));
    let directory = Arc::new(MemoryDirectory::new());
    let manager = Arc::new(SessionManager::new(
        token_config(),
        clock.clone(),
        store.clone(),
        directory.clone(),
        directory.clone(),
        PasswordHasher::new(MIN_PASSWORD_COST).unwrap(),
    ));
    Harness {
        manager,
        directory,
        store,
        clock,
    }
}

pub fn company_request(company: &str, email: &str, password: &str) -> CreateCompanyRequest {
    CreateCompanyRequest {
        company_name: company.to_string(),
        admin: AdminUser {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: email.to_string(),
            password: password.to_string(),
        },
    }
}
