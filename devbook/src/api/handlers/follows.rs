//! The follow graph.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::users::{CurrentUser, UserResponse},
    auth::ownership::forbid_self_reference,
    errors::Result,
    types::{Operation, UserId},
};

/// Start following user `id`
#[tracing::instrument(skip_all, fields(user_id = id))]
pub async fn follow_user(State(state): State<AppState>, current_user: CurrentUser, Path(id): Path<UserId>) -> Result<StatusCode> {
    forbid_self_reference(current_user.id, id, Operation::Follow)?;

    state.db.follow(id, current_user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Stop following user `id`
#[tracing::instrument(skip_all, fields(user_id = id))]
pub async fn unfollow_user(State(state): State<AppState>, current_user: CurrentUser, Path(id): Path<UserId>) -> Result<StatusCode> {
    forbid_self_reference(current_user.id, id, Operation::Unfollow)?;

    state.db.unfollow(id, current_user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Users following `id`
#[tracing::instrument(skip_all, fields(user_id = id))]
pub async fn list_followers(State(state): State<AppState>, _: CurrentUser, Path(id): Path<UserId>) -> Result<Json<Vec<UserResponse>>> {
    let users = state.db.followers(id).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Users that `id` follows
#[tracing::instrument(skip_all, fields(user_id = id))]
pub async fn list_following(State(state): State<AppState>, _: CurrentUser, Path(id): Path<UserId>) -> Result<Json<Vec<UserResponse>>> {
    let users = state.db.following(id).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}
