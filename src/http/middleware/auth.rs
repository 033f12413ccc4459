//! 认证中间件

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::error::{Result, ServerError};
use crate::http::HttpServerState;

/// 从 `Authorization` 头取出 bearer 令牌
///
/// - Ok(None): 没有该请求头
/// - Err: 请求头存在但不是 `Bearer <token>` 格式
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| ServerError::unauthorized("invalid authorization header"))?;

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("Bearer") => {
            let token = token.trim();
            if token.is_empty() {
                return Err(ServerError::unauthorized("invalid authorization header"));
            }
            Ok(Some(token))
        }
        _ => Err(ServerError::unauthorized("invalid authorization header")),
    }
}

/// 验证访问令牌，把 `SessionPayload` 放进请求扩展
pub async fn require_auth(
    State(state): State<HttpServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let token = bearer_token(request.headers())?
        .ok_or_else(|| ServerError::unauthorized("authorization header is required"))?
        .to_string();

    let payload = state.session_manager.authenticate(&token).await?;
    debug!(
        "🔐 请求已认证: user_id={}, company_id={}",
        payload.user_id, payload.company_id
    );

    request.extensions_mut().insert(payload);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&HeaderMap::new()).unwrap(), None);
        assert_eq!(bearer_token(&headers("Bearer abc.def")).unwrap(), Some("abc.def"));
        assert_eq!(bearer_token(&headers("bearer abc")).unwrap(), Some("abc"));

        assert!(bearer_token(&headers("Basic dXNlcjpwdw==")).is_err());
        assert!(bearer_token(&headers("Bearer ")).is_err());
        assert!(bearer_token(&headers("abc")).is_err());
    }
}
