pub mod auth;
pub mod error;
mod members;
pub mod rate_limit;

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::validation::Input;
use crate::AppState;
use error::ApiError;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Credential endpoints (public, stricter rate limit)
    let public_auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_auth,
        ));

    let session_routes = Router::new()
        .route("/logout", post(auth::logout))
        .route("/logout-all", post(auth::logout_all))
        .route("/me", get(auth::me));

    let member_routes = Router::new()
        .route("/", get(members::list_members).post(members::create_member))
        .route("/expiring", get(members::expiring_members))
        .route(
            "/:id",
            get(members::get_member)
                .put(members::update_member)
                .patch(members::update_member)
                .delete(members::delete_member),
        )
        .route("/:id/restore", post(members::restore_member));

    // Protected API routes
    let protected_routes = Router::new()
        .nest("/auth", session_routes)
        .nest("/members", member_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_api,
        ));

    let mut router = Router::new()
        .route("/health", get(health_check))
        .nest("/api/auth", public_auth_routes)
        .nest("/api", protected_routes)
        .fallback(not_found);

    if state.config.server.debug {
        router = router.layer(middleware::map_response(error::expose_internal_detail));
    }

    router
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn not_found() -> ApiError {
    ApiError::not_found("Not found.")
}

/// A JSON object request body, left untyped for the validators
pub struct JsonObject(pub Input);

#[async_trait]
impl<S: Send + Sync> FromRequest<S> for JsonObject {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(ApiError::bad_request("The request body must be a JSON object.")),
        }
    }
}
