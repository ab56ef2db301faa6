//! Login and password change.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::info;

use crate::{
    AppState,
    api::models::{
        auth::{AuthResponse, ChangePasswordRequest, LoginRequest, LoginResponse},
        users::CurrentUser,
    },
    auth::{password::verify_password_blocking, rotation::rotate_password},
    errors::{Error, Result},
    types::UserId,
};

fn invalid_login() -> Error {
    Error::Unauthenticated {
        message: Some("Invalid email or password".to_string()),
    }
}

/// Login with email and password
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<LoginResponse> {
    let email = request.email.trim();
    if email.is_empty() || request.password.is_empty() {
        return Err(Error::BadRequest {
            message: "Email and password are required".to_string(),
        });
    }

    // Unknown email and wrong password look the same to the client
    let credentials = state.db.find_credentials_by_email(email).await?.ok_or_else(invalid_login)?;

    if !verify_password_blocking(request.password, credentials.password_hash).await? {
        return Err(invalid_login());
    }

    let token = state.tokens.issue(credentials.id)?;
    info!(user_id = credentials.id, "user logged in");

    Ok(LoginResponse {
        auth_response: AuthResponse {
            id: credentials.id.to_string(),
            token,
        },
    })
}

/// Change the caller's own password
#[tracing::instrument(skip_all, fields(user_id = id))]
pub async fn change_password(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<UserId>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<StatusCode> {
    rotate_password(
        state.db.as_ref(),
        &state.config.auth.password,
        current_user.id,
        id,
        &request.old_password,
        &request.new_password,
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}
