//! Posts, the feed and likes.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::{
        posts::{PostCreate, PostResponse, PostUpdate},
        users::CurrentUser,
    },
    auth::ownership::authorize_mutation,
    db::{
        handlers::posts::PostFilter,
        models::posts::{PostCreateDBRequest, PostUpdateDBRequest},
    },
    errors::Result,
    types::{Operation, PostId, ResourceKind, UserId},
};

/// Publish a post as the caller
#[tracing::instrument(skip_all)]
pub async fn create_post(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<PostCreate>,
) -> Result<(StatusCode, Json<PostResponse>)> {
    let request = request.normalize()?;
    let post = state.db.create_post(&PostCreateDBRequest::new(current_user.id, request)).await?;
    Ok((StatusCode::CREATED, Json(PostResponse::from(post))))
}

/// The caller's own posts plus those of everyone they follow, newest first
#[tracing::instrument(skip_all)]
pub async fn list_feed(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<Vec<PostResponse>>> {
    let posts = state.db.list_posts(&PostFilter::Feed(current_user.id)).await?;
    Ok(Json(posts.into_iter().map(PostResponse::from).collect()))
}

#[tracing::instrument(skip_all, fields(post_id = id))]
pub async fn get_post(State(state): State<AppState>, _: CurrentUser, Path(id): Path<PostId>) -> Result<Json<PostResponse>> {
    let post = state.db.get_post(id).await?;
    Ok(Json(PostResponse::from(post)))
}

#[tracing::instrument(skip_all, fields(post_id = id))]
pub async fn update_post(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<PostId>,
    Json(update): Json<PostUpdate>,
) -> Result<StatusCode> {
    authorize_mutation(state.db.as_ref(), current_user.id, ResourceKind::Post, id, Operation::Update).await?;

    let update = update.normalize()?;
    state.db.update_post(id, &PostUpdateDBRequest::from(update)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip_all, fields(post_id = id))]
pub async fn delete_post(State(state): State<AppState>, current_user: CurrentUser, Path(id): Path<PostId>) -> Result<StatusCode> {
    authorize_mutation(state.db.as_ref(), current_user.id, ResourceKind::Post, id, Operation::Delete).await?;

    state.db.delete_post(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Posts written by user `id`, newest first
#[tracing::instrument(skip_all, fields(user_id = id))]
pub async fn list_user_posts(State(state): State<AppState>, _: CurrentUser, Path(id): Path<UserId>) -> Result<Json<Vec<PostResponse>>> {
    let posts = state.db.list_posts(&PostFilter::Author(id)).await?;
    Ok(Json(posts.into_iter().map(PostResponse::from).collect()))
}

#[tracing::instrument(skip_all, fields(post_id = id))]
pub async fn like_post(State(state): State<AppState>, _: CurrentUser, Path(id): Path<PostId>) -> Result<StatusCode> {
    state.db.like_post(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Takes back a like; the counter never drops below zero
#[tracing::instrument(skip_all, fields(post_id = id))]
pub async fn unlike_post(State(state): State<AppState>, _: CurrentUser, Path(id): Path<PostId>) -> Result<StatusCode> {
    state.db.unlike_post(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
