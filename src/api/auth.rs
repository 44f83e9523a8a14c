use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, State},
    http::{request::Parts, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use super::error::ApiError;
use super::JsonObject;
use crate::db::UserResponse;
use crate::services::AuthSession;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub user: UserResponse,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct LogoutAllResponse {
    pub message: &'static str,
    pub revoked: u64,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserResponse,
}

/// Register endpoint
pub async fn register(
    State(state): State<Arc<AppState>>,
    JsonObject(input): JsonObject,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.auth().register(&input).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully.",
            user: UserResponse::from(user),
        }),
    ))
}

/// Login endpoint
pub async fn login(
    State(state): State<Arc<AppState>>,
    JsonObject(input): JsonObject,
) -> Result<Json<LoginResponse>, ApiError> {
    let outcome = state.auth().login(&input).await?;

    Ok(Json(LoginResponse {
        message: "Login successful.",
        user: UserResponse::from(outcome.user),
        token: outcome.token,
    }))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    auth: AuthSession,
) -> Result<Json<MessageResponse>, ApiError> {
    state.auth().logout(&auth).await?;
    Ok(Json(MessageResponse {
        message: "Logout successful.",
    }))
}

pub async fn logout_all(
    State(state): State<Arc<AppState>>,
    auth: AuthSession,
) -> Result<Json<LogoutAllResponse>, ApiError> {
    let revoked = state.auth().logout_all_devices(&auth.user).await?;
    Ok(Json(LogoutAllResponse {
        message: "Successfully logged out from all devices.",
        revoked,
    }))
}

/// Current user, with their member profile
pub async fn me(
    State(state): State<Arc<AppState>>,
    auth: AuthSession,
) -> Result<Json<MeResponse>, ApiError> {
    let user = state.auth().authenticated_user(Some(&auth.user)).await?;
    Ok(Json(MeResponse { user }))
}

/// Extract the bearer token from the Authorization header
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolve the bearer token on every request and hand the session to handlers
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Unauthenticated."))?
        .to_string();

    let session = state.auth().resolve_token(&token).await?;

    tracing::debug!(user_id = %session.user.id, "Request authenticated");
    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

/// Extractor for the session resolved by `auth_middleware`
#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthSession>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Unauthenticated."))
    }
}
