use crate::{
    auth::{
        api_key::key_from_authorization,
        cookies::{read_cookie, AUTH_COOKIE},
        jwt::{verify_token, TokenType},
    },
    error::AppError,
    state::AppState,
};
use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, Query, State},
    http::{header, request::Parts, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use uuid::Uuid;

/// Largest JSON body buffered while looking for an `api_key` field.
const API_KEY_BODY_LIMIT: usize = 64 * 1024;

/// Copies the `auth_token` cookie into a bearer header when the request
/// carries no `Authorization` of its own.
pub async fn forward_auth_cookie(mut req: Request<Body>, next: Next) -> Response {
    if !req.headers().contains_key(header::AUTHORIZATION) {
        if let Some(token) = read_cookie(req.headers(), AUTH_COOKIE) {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                req.headers_mut().insert(header::AUTHORIZATION, value);
            }
        }
    }

    next.run(req).await
}

#[derive(Deserialize)]
struct ApiKeyParam {
    api_key: Option<String>,
}

/// Bearer access token first, then an API key from the `Authorization`
/// header, the `api_key` query parameter or the `api_key` JSON field.
pub async fn auth_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);

    if let Some(token) = authorization.as_deref().and_then(|h| h.strip_prefix("Bearer ")) {
        if let Ok(claims) = verify_token(token, &state.config.jwt_secret, TokenType::Access) {
            let user_id = claims.user_id()?;
            return Ok(run_as(user_id, req, next).await);
        }
    }

    let mut candidates: Vec<String> = Vec::new();
    if let Some(key) = authorization.as_deref().and_then(key_from_authorization) {
        candidates.push(key.to_string());
    }
    if let Ok(Query(ApiKeyParam { api_key: Some(key) })) =
        Query::<ApiKeyParam>::try_from_uri(req.uri())
    {
        candidates.push(key);
    }

    for key in &candidates {
        if let Some(user_id) = state.auth_service.authenticate_api_key(key).await? {
            return Ok(run_as(user_id, req, next).await);
        }
    }

    if is_json(&req) {
        let (parts, body) = req.into_parts();
        let bytes = axum::body::to_bytes(body, API_KEY_BODY_LIMIT)
            .await
            .map_err(|_| AppError::Unauthorized("Invalid credentials".to_string()))?;

        if let Some(key) = api_key_from_json(&bytes) {
            if let Some(user_id) = state.auth_service.authenticate_api_key(&key).await? {
                let req = Request::from_parts(parts, Body::from(bytes));
                return Ok(run_as(user_id, req, next).await);
            }
        }
    }

    Err(AppError::Unauthorized("Invalid credentials".to_string()))
}

async fn run_as(user_id: Uuid, mut req: Request<Body>, next: Next) -> Response {
    req.extensions_mut().insert(user_id);
    next.run(req).await
}

fn is_json(req: &Request<Body>) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

fn api_key_from_json(bytes: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(bytes).ok()?;
    value
        .get("api_key")
        .and_then(serde_json::Value::as_str)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
}

// Extractor for getting user_id from request extensions
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Uuid>()
            .copied()
            .map(AuthUser)
            .ok_or(AppError::Unauthorized("Invalid credentials".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_from_json_body() {
        assert_eq!(
            api_key_from_json(br#"{"api_key": "k1", "action": "join"}"#).as_deref(),
            Some("k1")
        );
        assert_eq!(api_key_from_json(br#"{"api_key": ""}"#), None);
        assert_eq!(api_key_from_json(br#"{"api_key": 5}"#), None);
        assert_eq!(api_key_from_json(b"not json"), None);
    }

    #[test]
    fn test_json_content_type_detection() {
        let req = Request::builder()
            .header(header::CONTENT_TYPE, "application/json; charset=utf-8")
            .body(Body::empty())
            .unwrap();
        assert!(is_json(&req));

        let req = Request::builder()
            .header(header::CONTENT_TYPE, "multipart/form-data; boundary=x")
            .body(Body::empty())
            .unwrap();
        assert!(!is_json(&req));
    }
}
