use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::ApiError;
use super::JsonObject;
use crate::db::{MemberFilter, MemberResponse};
use crate::services::{AuthSession, PageMeta};
use crate::AppState;

/// Query parameters of the member listing. Numbers are read leniently:
/// anything unparsable falls back to the default.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub search: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExpiringQuery {
    pub days: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MemberListResponse {
    pub data: Vec<MemberResponse>,
    pub meta: PageMeta,
}

#[derive(Debug, Serialize)]
pub struct MemberData<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct MemberMessage {
    pub message: &'static str,
    pub data: MemberResponse,
}

fn number(raw: &Option<String>) -> Option<i64> {
    raw.as_deref().and_then(|s| s.trim().parse().ok())
}

/// Route ids that are not integers can never match a profile
fn member_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::not_found("Member not found."))
}

/// List members (paginated)
pub async fn list_members(
    State(state): State<Arc<AppState>>,
    _auth: AuthSession,
    Query(query): Query<ListQuery>,
) -> Result<Json<MemberListResponse>, ApiError> {
    let filter = match query.status.as_deref() {
        Some("active") => MemberFilter::Active,
        _ => MemberFilter::All,
    };

    let members = state.members();
    let page = members
        .list_members(
            filter,
            number(&query.page),
            number(&query.per_page),
            query.search.as_deref(),
        )
        .await?;

    Ok(Json(MemberListResponse {
        data: page.data.into_iter().map(|m| members.present(m)).collect(),
        meta: page.meta,
    }))
}

pub async fn create_member(
    State(state): State<Arc<AppState>>,
    auth: AuthSession,
    JsonObject(input): JsonObject,
) -> Result<impl IntoResponse, ApiError> {
    let members = state.members();
    let member = members.create_profile(&auth.user, &input).await?;

    Ok((
        StatusCode::CREATED,
        Json(MemberMessage {
            message: "Member profile created successfully.",
            data: members.present(member),
        }),
    ))
}

pub async fn get_member(
    State(state): State<Arc<AppState>>,
    auth: AuthSession,
    Path(id): Path<String>,
) -> Result<Json<MemberData<MemberResponse>>, ApiError> {
    let members = state.members();
    let member = members.get_member(&auth.user, member_id(&id)?).await?;
    Ok(Json(MemberData {
        data: members.present(member),
    }))
}

/// PUT and PATCH share partial-update semantics
pub async fn update_member(
    State(state): State<Arc<AppState>>,
    auth: AuthSession,
    Path(id): Path<String>,
    JsonObject(input): JsonObject,
) -> Result<Json<MemberMessage>, ApiError> {
    let members = state.members();
    let member = members
        .update_profile(&auth.user, member_id(&id)?, &input)
        .await?;

    Ok(Json(MemberMessage {
        message: "Member profile updated successfully.",
        data: members.present(member),
    }))
}

/// Soft delete
pub async fn delete_member(
    State(state): State<Arc<AppState>>,
    auth: AuthSession,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .members()
        .delete_profile(&auth.user, member_id(&id)?)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn restore_member(
    State(state): State<Arc<AppState>>,
    auth: AuthSession,
    Path(id): Path<String>,
) -> Result<Json<MemberMessage>, ApiError> {
    let members = state.members();
    let member = members
        .restore_profile(&auth.user, member_id(&id)?)
        .await?;

    Ok(Json(MemberMessage {
        message: "Member profile restored successfully.",
        data: members.present(member),
    }))
}

/// Active memberships ending soon
pub async fn expiring_members(
    State(state): State<Arc<AppState>>,
    _auth: AuthSession,
    Query(query): Query<ExpiringQuery>,
) -> Result<Json<MemberData<Vec<MemberResponse>>>, ApiError> {
    let members = state.members();
    let expiring = members
        .list_expiring_memberships(number(&query.days))
        .await?;

    Ok(Json(MemberData {
        data: expiring.into_iter().map(|m| members.present(m)).collect(),
    }))
}
