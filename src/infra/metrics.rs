//! Prometheus 指标：登录、刷新、登出、撤销拦截次数与 Redis 连接池状态
//!
//! 通过 `init()` 安装全局 Recorder，通过 HTTP GET `/metrics` 暴露抓取端点。
//! 未初始化时各 `record_*` 调用是空操作。

use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::OnceLock;

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// 指标名称
const COUNTER_LOGIN_TOTAL: &str = "certify_auth_login_total";
const COUNTER_REFRESH_TOTAL: &str = "certify_auth_refresh_total";
const COUNTER_LOGOUT_TOTAL: &str = "certify_auth_logout_total";
const COUNTER_REVOKED_REJECTIONS: &str = "certify_auth_revoked_rejections_total";
const GAUGE_REDIS_POOL_ACTIVE: &str = "certify_redis_pool_active";
const GAUGE_REDIS_POOL_IDLE: &str = "certify_redis_pool_idle";

/// 操作结果标签
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Rejected,
    Error,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Rejected => "rejected",
            Outcome::Error => "error",
        }
    }

    /// 按错误分类归档：未授权类记为 rejected，其余记为 error
    pub fn of<T>(result: &crate::error::Result<T>) -> Self {
        match result {
            Ok(_) => Outcome::Success,
            Err(e) if e.kind() == crate::error::ErrorKind::Unauthorized => Outcome::Rejected,
            Err(_) => Outcome::Error,
        }
    }
}

/// 初始化 Prometheus 指标（安装全局 Recorder）。
/// 仅需在进程内调用一次；重复调用会返回 Err。
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let handle = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;
    HANDLE
        .set(handle)
        .map_err(|_| "metrics already initialized")?;
    Ok(())
}

/// 是否已初始化
pub fn is_initialized() -> bool {
    HANDLE.get().is_some()
}

/// 渲染当前指标为 Prometheus 文本格式，供 GET /metrics 使用。
pub fn render_metrics() -> Option<String> {
    HANDLE.get().map(|h| h.render())
}

pub fn record_login(outcome: Outcome) {
    metrics::counter!(COUNTER_LOGIN_TOTAL, "outcome" => outcome.as_str()).increment(1);
}

pub fn record_refresh(outcome: Outcome) {
    metrics::counter!(COUNTER_REFRESH_TOTAL, "outcome" => outcome.as_str()).increment(1);
}

pub fn record_logout() {
    metrics::counter!(COUNTER_LOGOUT_TOTAL).increment(1);
}

/// 已撤销令牌被再次使用
pub fn record_revoked_rejection() {
    metrics::counter!(COUNTER_REVOKED_REJECTIONS).increment(1);
}

/// 更新 Redis 连接池状态（Gauge）。
pub fn record_redis_pool(active: u32, idle: u32) {
    metrics::gauge!(GAUGE_REDIS_POOL_ACTIVE).set(active as f64);
    metrics::gauge!(GAUGE_REDIS_POOL_IDLE).set(idle as f64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServerError;

    #[test]
    fn test_outcome_classification() {
        let ok: crate::error::Result<()> = Ok(());
        assert_eq!(Outcome::of(&ok), Outcome::Success);

        let denied: crate::error::Result<()> = Err(ServerError::unauthorized("invalid credentials"));
        assert_eq!(Outcome::of(&denied), Outcome::Rejected);

        let broken: crate::error::Result<()> = Err(ServerError::internal("redis down"));
        assert_eq!(Outcome::of(&broken), Outcome::Error);
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_login(Outcome::Success);
        record_logout();
        assert!(render_metrics().is_none() || is_initialized());
    }
}
