//! HTTP 服务器模块 - 使用 Axum 暴露认证 API
//!
//! 功能包括：
//! - 登录 / 注册 / 刷新 / 登出
//! - 公司及其管理员注册
//! - 受保护的 `/api/auth/me`
//! - 健康检查与 Prometheus 指标

pub mod middleware;
pub mod routes;
pub mod server;

pub use server::{build_router, AuthHttpServer, HttpServerState};
