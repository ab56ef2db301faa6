use crate::db::errors::DbError;
use crate::types::{Operation, ResourceKind};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Authentication required but not provided, or the credential proof failed
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// Caller is authenticated but may not act on this resource
    #[error("Forbidden to {action} {resource}")]
    Forbidden { action: Operation, resource: ResourceKind },

    /// Invalid request data or business rule violation
    #[error("{message}")]
    BadRequest { message: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::Forbidden { .. } => StatusCode::FORBIDDEN,
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| "Authentication required".to_string()),
            // Only the category is revealed, never the owner
            Error::Forbidden { action, resource } => format!("You may not {action} this {resource}"),
            Error::BadRequest { message } => message.clone(),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { constraint, table, .. } => match (table.as_deref(), constraint.as_deref()) {
                    (Some("users"), Some(c)) if c.contains("email") => "An account with this email address already exists".to_string(),
                    (Some("users"), Some(c)) if c.contains("nick") => "This nick is already taken".to_string(),
                    _ => "Resource already exists".to_string(),
                },
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::Unauthenticated { .. } | Error::Forbidden { .. } => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::BadRequest { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();
        (status, Json(json!({ "error": self.user_message() }))).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denials_map_to_distinct_statuses() {
        let unauthenticated = Error::Unauthenticated { message: None };
        let forbidden = Error::Forbidden {
            action: Operation::Delete,
            resource: ResourceKind::Post,
        };

        assert_eq!(unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(forbidden.user_message(), "You may not delete this post");
    }

    #[test]
    fn test_storage_not_found_is_404() {
        let err = Error::from(DbError::NotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.user_message(), "Resource not found");
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = Error::Internal {
            operation: "sign credential: secret exploded".to_string(),
        };
        assert_eq!(err.user_message(), "Internal server error");

        let err = Error::from(DbError::Other(anyhow::anyhow!("connection refused on 10.0.0.3")));
        assert_eq!(err.user_message(), "Database error occurred");
    }

    #[test]
    fn test_every_category_has_one_status() {
        let cases = [
            (Error::Unauthenticated { message: None }, StatusCode::UNAUTHORIZED),
            (
                Error::Forbidden {
                    action: Operation::Update,
                    resource: ResourceKind::User,
                },
                StatusCode::FORBIDDEN,
            ),
            (
                Error::BadRequest {
                    message: "Title is required".to_string(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                Error::Internal {
                    operation: "hash password".to_string(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (Error::from(DbError::NotFound), StatusCode::NOT_FOUND),
            (
                Error::from(DbError::ForeignKeyViolation {
                    constraint: Some("followers_user_id_fkey".to_string()),
                    table: Some("followers".to_string()),
                    message: "violates foreign key constraint".to_string(),
                }),
                StatusCode::BAD_REQUEST,
            ),
            (
                Error::from(DbError::CheckViolation {
                    constraint: Some("followers_no_self_follow".to_string()),
                    table: Some("followers".to_string()),
                    message: "violates check constraint".to_string(),
                }),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.status_code(), status, "{err:?}");
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_unique_violation_messages() {
        let err = Error::from(DbError::UniqueViolation {
            constraint: Some("users_nick_key".to_string()),
            table: Some("users".to_string()),
            message: "duplicate key".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.user_message(), "This nick is already taken");
    }
}
