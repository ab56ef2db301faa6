//! User registration, lookup and profile management.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::users::{CurrentUser, ListUsersQuery, UserCreate, UserResponse, UserUpdate},
    auth::{
        ownership::authorize_mutation,
        password::{Argon2Params, hash_password_blocking, validate_password_length},
    },
    db::{
        handlers::users::UserFilter,
        models::users::{UserCreateDBRequest, UserUpdateDBRequest},
    },
    errors::Result,
    types::{Operation, ResourceKind, UserId},
};

/// Register a new user. Public.
#[tracing::instrument(skip_all)]
pub async fn create_user(State(state): State<AppState>, Json(request): Json<UserCreate>) -> Result<(StatusCode, Json<UserResponse>)> {
    let request = request.normalize()?;
    let password_config = &state.config.auth.password;
    validate_password_length(&request.password, password_config)?;

    let password_hash = hash_password_blocking(request.password.clone(), Argon2Params::from(password_config)).await?;
    let user = state.db.create_user(&UserCreateDBRequest::new(request, password_hash)).await?;

    tracing::info!(user_id = user.id, nick = %user.nick, "user registered");
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Search users by name or nick
#[tracing::instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    _: CurrentUser,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<UserResponse>>> {
    let users = state.db.search_users(&UserFilter::new(query.user)).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[tracing::instrument(skip_all, fields(user_id = id))]
pub async fn get_user(State(state): State<AppState>, _: CurrentUser, Path(id): Path<UserId>) -> Result<Json<UserResponse>> {
    let user = state.db.get_user(id).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Update the caller's own profile
#[tracing::instrument(skip_all, fields(user_id = id))]
pub async fn update_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<UserId>,
    Json(update): Json<UserUpdate>,
) -> Result<StatusCode> {
    authorize_mutation(state.db.as_ref(), current_user.id, ResourceKind::User, id, Operation::Update).await?;

    let update = update.normalize()?;
    state.db.update_user(id, &UserUpdateDBRequest::from(update)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete the caller's own account, along with their posts and follow edges
#[tracing::instrument(skip_all, fields(user_id = id))]
pub async fn delete_user(State(state): State<AppState>, current_user: CurrentUser, Path(id): Path<UserId>) -> Result<StatusCode> {
    authorize_mutation(state.db.as_ref(), current_user.id, ResourceKind::User, id, Operation::Delete).await?;

    state.db.delete_user(id).await?;
    tracing::info!(user_id = id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
