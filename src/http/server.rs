//! HTTP 服务器 - 使用 Axum 提供认证接口

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth::SessionManager;
use crate::http::routes;

/// HTTP 服务器共享状态
#[derive(Clone)]
pub struct HttpServerState {
    pub session_manager: Arc<SessionManager>,
}

impl HttpServerState {
    pub fn new(session_manager: Arc<SessionManager>) -> Self {
        Self { session_manager }
    }
}

/// 构建完整路由（测试里直接对它做 oneshot）
pub fn build_router(state: HttpServerState, request_timeout: Duration) -> Router {
    Router::new()
        .merge(routes::create_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(timeout_layer(request_timeout))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// 超时的请求返回 408
fn timeout_layer(request_timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout)
}

/// 认证 HTTP 服务器
pub struct AuthHttpServer {
    state: HttpServerState,
    bind_address: String,
    request_timeout: Duration,
}

impl AuthHttpServer {
    pub fn new(state: HttpServerState, bind_address: String, request_timeout: Duration) -> Self {
        Self {
            state,
            bind_address,
            request_timeout,
        }
    }

    /// 启动 HTTP 服务器，`shutdown` 完成后优雅退出
    pub async fn start<F>(self, shutdown: F) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = build_router(self.state, self.request_timeout);

        let listener = tokio::net::TcpListener::bind(&self.bind_address).await?;
        info!("🌐 HTTP 服务器启动在 {}", self.bind_address);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("👋 HTTP 服务器已停止");
        Ok(())
    }
}
