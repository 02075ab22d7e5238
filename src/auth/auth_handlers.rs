use crate::{
    auth::{
        auth_service::IssuedTokens,
        cookies::{
            build_cookie, clear_cookie, read_cookie, AUTH_COOKIE, OAUTH_STATE_COOKIE,
            REFRESH_COOKIE,
        },
        jwt::TokenSettings,
        oauth::fetch_google_user,
    },
    error::{AppError, Result},
    middleware::AuthUser,
    state::AppState,
};
use super::auth_dto::{
    ApiKeyResponse, AuthResponse, ChangePasswordRequest, GoogleCallback, GoogleTokenRequest,
    LoginRequest, MessageResponse, RefreshTokenRequest, RegisterRequest, RegisterResponse,
    RegisteredUser,
};
use axum::{
    extract::{Query, State},
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Redirect},
    Json,
};
use chrono::Duration;
use oauth2::{AuthorizationCode, CsrfToken, Scope, TokenResponse};
use validator::Validate;

const OAUTH_STATE_TTL_MINUTES: i64 = 10;

/// Sets both auth cookies and returns the token pair in the body.
fn token_response(
    issued: IssuedTokens,
    settings: &TokenSettings,
    secure: bool,
    mut extra_cookies: Vec<String>,
) -> impl IntoResponse {
    extra_cookies.push(build_cookie(
        REFRESH_COOKIE,
        &issued.refresh_token,
        settings.refresh_ttl,
        secure,
    ));
    extra_cookies.push(build_cookie(
        AUTH_COOKIE,
        &issued.access_token,
        settings.access_ttl,
        secure,
    ));

    let cookies: Vec<_> = extra_cookies.into_iter().map(|c| (SET_COOKIE, c)).collect();
    (
        AppendHeaders(cookies),
        Json(AuthResponse {
            access_token: issued.access_token,
            refresh_token: issued.refresh_token,
            user: issued.user.into(),
        }),
    )
}

/// Refresh token from the body, falling back to the cookie.
fn refresh_token_from(headers: &HeaderMap, body: Option<RefreshTokenRequest>) -> Option<String> {
    body.and_then(|b| b.refresh_token)
        .filter(|t| !t.is_empty())
        .or_else(|| read_cookie(headers, REFRESH_COOKIE))
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = RegisterResponse),
        (status = 400, description = "Validation error or duplicate username/email")
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let user = state
        .auth_service
        .register(
            &payload.username,
            &payload.email,
            &payload.first_name,
            &payload.password,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            message: "Account created successfully".to_string(),
            data: RegisteredUser {
                email: user.email,
                first_name: user.first_name,
                username: user.username,
            },
        }),
    ))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/api/log-in",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful, auth cookies set", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let issued = state
        .auth_service
        .login(&payload.email, &payload.password)
        .await?;

    Ok(token_response(
        issued,
        state.auth_service.token_settings(),
        state.config.cookie_secure,
        Vec::new(),
    ))
}

/// Rotate the refresh token
#[utoipa::path(
    post,
    path = "/api/refresh-token",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New token pair, cookies re-set", body = AuthResponse),
        (status = 401, description = "Missing, invalid or expired refresh token")
    ),
    tag = "auth"
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<RefreshTokenRequest>>,
) -> Result<impl IntoResponse> {
    let token = refresh_token_from(&headers, body.map(|Json(b)| b))
        .ok_or_else(|| AppError::Authentication("Refresh token missing".to_string()))?;

    let issued = state.auth_service.refresh(&token).await?;

    Ok(token_response(
        issued,
        state.auth_service.token_settings(),
        state.config.cookie_secure,
        Vec::new(),
    ))
}

/// Log out: revoke the refresh token and clear the auth cookies
#[utoipa::path(
    post,
    path = "/api/logout",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Logged out", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<RefreshTokenRequest>>,
) -> Result<impl IntoResponse> {
    if let Some(token) = refresh_token_from(&headers, body.map(|Json(b)| b)) {
        state.auth_service.logout(&token).await?;
    }

    let secure = state.config.cookie_secure;
    Ok((
        AppendHeaders([
            (SET_COOKIE, clear_cookie(REFRESH_COOKIE, secure)),
            (SET_COOKIE, clear_cookie(AUTH_COOKIE, secure)),
        ]),
        Json(MessageResponse::new("Successfully logged out.")),
    ))
}

/// Change the password of the current user
#[utoipa::path(
    post,
    path = "/api/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Wrong old password or mismatched confirmation")
    ),
    tag = "auth",
    security(("bearer_auth" = []))
)]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>> {
    payload.validate()?;

    state
        .auth_service
        .change_password(
            user_id,
            &payload.old_password,
            &payload.new_password,
            &payload.confirm_password,
        )
        .await?;

    Ok(Json(MessageResponse::new("Password updated successfully.")))
}

/// Start the Google OAuth flow
#[utoipa::path(
    get,
    path = "/api/google-login",
    responses(
        (status = 303, description = "Redirect to Google OAuth"),
    ),
    tag = "auth"
)]
pub async fn google_login_redirect(State(state): State<AppState>) -> impl IntoResponse {
    let (auth_url, csrf_token) = state
        .oauth_client
        .authorize_url(CsrfToken::new_random)
        .add_scope(Scope::new("email".to_string()))
        .add_scope(Scope::new("profile".to_string()))
        .url();

    let state_cookie = build_cookie(
        OAUTH_STATE_COOKIE,
        csrf_token.secret(),
        Duration::minutes(OAUTH_STATE_TTL_MINUTES),
        state.config.cookie_secure,
    );

    (
        AppendHeaders([(SET_COOKIE, state_cookie)]),
        Redirect::to(auth_url.as_str()),
    )
}

/// Handle the Google OAuth callback
#[utoipa::path(
    get,
    path = "/api/google-login/callback",
    params(
        ("code" = String, Query, description = "Authorization code from Google"),
        ("state" = String, Query, description = "CSRF token")
    ),
    responses(
        (status = 200, description = "OAuth successful", body = AuthResponse),
        (status = 401, description = "State mismatch or code exchange failed")
    ),
    tag = "auth"
)]
pub async fn google_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<GoogleCallback>,
) -> Result<impl IntoResponse> {
    let expected = read_cookie(&headers, OAUTH_STATE_COOKIE);
    if expected.as_deref() != Some(params.state.as_str()) {
        tracing::warn!("Google callback with mismatched state");
        return Err(AppError::Authentication("Invalid OAuth state".to_string()));
    }

    let token_result = state
        .oauth_client
        .exchange_code(AuthorizationCode::new(params.code))
        .request_async(oauth2::reqwest::async_http_client)
        .await
        .map_err(|e| {
            tracing::warn!("Google code exchange failed: {}", e);
            AppError::Authentication("Failed to exchange code".to_string())
        })?;

    let user_info =
        fetch_google_user(&state.http_client, token_result.access_token().secret()).await?;
    let issued = state.auth_service.google_login(&user_info).await?;

    let secure = state.config.cookie_secure;
    Ok(token_response(
        issued,
        state.auth_service.token_settings(),
        secure,
        vec![clear_cookie(OAUTH_STATE_COOKIE, secure)],
    ))
}

/// Log in with a Google access token obtained by the frontend
#[utoipa::path(
    post,
    path = "/api/google-login",
    request_body = GoogleTokenRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Google rejected the token")
    ),
    tag = "auth"
)]
pub async fn google_login_token(
    State(state): State<AppState>,
    Json(payload): Json<GoogleTokenRequest>,
) -> Result<impl IntoResponse> {
    let user_info = fetch_google_user(&state.http_client, &payload.access_token).await?;
    let issued = state.auth_service.google_login(&user_info).await?;

    Ok(token_response(
        issued,
        state.auth_service.token_settings(),
        state.config.cookie_secure,
        Vec::new(),
    ))
}

/// Generate an API key for the current user
#[utoipa::path(
    post,
    path = "/api/generate-api-key",
    responses(
        (status = 201, description = "Plaintext key, shown once", body = ApiKeyResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "auth",
    security(("bearer_auth" = []))
)]
pub async fn generate_api_key(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse> {
    let api_key = state.auth_service.generate_api_key(user_id).await?;
    Ok((StatusCode::CREATED, Json(ApiKeyResponse { api_key })))
}

/// Check that API key or token authentication works
#[utoipa::path(
    get,
    path = "/api/protected",
    responses(
        (status = 200, description = "Authenticated", body = MessageResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "auth",
    security(("bearer_auth" = []))
)]
pub async fn protected(AuthUser(_user_id): AuthUser) -> Json<MessageResponse> {
    Json(MessageResponse::new("Protected API endpoint"))
}
