//! HTTP 路由模块
//!
//! 路由结构：
//! - `/api/auth/*` - 登录、注册、刷新、登出、当前会话
//! - `/api/companies` - 创建公司（同时注册管理员）
//! - `/health` - 存活检查
//! - `/metrics` - Prometheus 抓取端点

pub mod auth;
pub mod health;
pub mod metrics;

use crate::http::HttpServerState;
use axum::{routing::get, Router};

/// 创建所有路由
pub fn create_routes(state: HttpServerState) -> Router<HttpServerState> {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/metrics", get(metrics::metrics_handler))
        .merge(auth::create_route(state)) // /api/auth/*, /api/companies
}
