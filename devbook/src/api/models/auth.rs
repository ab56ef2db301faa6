//! API request/response models for login and password changes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body returned by a successful login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    /// The user's id, as a string
    pub id: String,
    pub token: String,
}

/// Login responds 202 Accepted with the credential in the body.
#[derive(Debug)]
pub struct LoginResponse {
    pub auth_response: AuthResponse,
}

impl IntoResponse for LoginResponse {
    fn into_response(self) -> Response {
        (StatusCode::ACCEPTED, Json(self.auth_response)).into_response()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}
