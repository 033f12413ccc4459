//! 认证 API 路由
//!
//! - `POST /api/auth/login` 登录
//! - `POST /api/auth/register` 员工注册
//! - `POST /api/auth/refresh` 刷新令牌轮换
//! - `POST /api/auth/logout` 登出（需要 bearer 访问令牌）
//! - `POST /api/companies` 创建公司并注册管理员
//! - `GET /api/auth/me` 当前用户（经过认证中间件）

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware,
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use serde_json::{json, Value};

use crate::auth::{
    CreateCompanyRequest, LoginRequest, RefreshRequest, RegisterEmployeeRequest, SessionPayload,
    TokenPair,
};
use crate::error::{Result, ServerError};
use crate::model::UserRecord;
use crate::http::middleware::{bearer_token, require_auth};
use crate::http::HttpServerState;

/// 创建认证路由
pub fn create_route(state: HttpServerState) -> Router<HttpServerState> {
    let protected = Router::new()
        .route("/api/auth/me", get(me))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/logout", post(logout))
        .route("/api/companies", post(create_company))
        .merge(protected)
}

/// POST /api/auth/login
async fn login(
    State(state): State<HttpServerState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenPair>> {
    let pair = state
        .session_manager
        .login(&req.email, &req.password)
        .await?;
    Ok(Json(pair))
}

/// POST /api/auth/register
async fn register(
    State(state): State<HttpServerState>,
    Json(req): Json<RegisterEmployeeRequest>,
) -> Result<(StatusCode, Json<TokenPair>)> {
    let pair = state.session_manager.register(req).await?;
    Ok((StatusCode::CREATED, Json(pair)))
}

/// POST /api/auth/refresh
async fn refresh(
    State(state): State<HttpServerState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<TokenPair>> {
    let pair = state.session_manager.refresh(&req.refresh_token).await?;
    Ok(Json(pair))
}

/// POST /api/auth/logout
///
/// Headers: Authorization: Bearer <access_token>
/// Body: { "refresh_token": "..." }
async fn logout(
    State(state): State<HttpServerState>,
    headers: HeaderMap,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<Value>> {
    let access_token = bearer_token(&headers)?
        .ok_or_else(|| ServerError::bad_request("authorization header is required"))?;

    state
        .session_manager
        .logout(access_token, &req.refresh_token)
        .await?;

    Ok(Json(json!({ "message": "logged out successfully" })))
}

/// POST /api/companies
async fn create_company(
    State(state): State<HttpServerState>,
    Json(req): Json<CreateCompanyRequest>,
) -> Result<(StatusCode, Json<TokenPair>)> {
    let pair = state.session_manager.register_company(req).await?;
    Ok((StatusCode::CREATED, Json(pair)))
}

/// GET /api/auth/me
///
/// 按令牌里的 user_id 重新读取用户记录，不返回密码哈希
async fn me(
    State(state): State<HttpServerState>,
    Extension(payload): Extension<SessionPayload>,
) -> Result<Json<UserRecord>> {
    let user = state.session_manager.current_user(&payload).await?;
    Ok(Json(user))
}
