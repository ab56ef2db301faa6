//! The authentication gate wrapped around protected routes.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{debug, trace};

use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::current_user::extract_subject,
    errors::Result,
    types::UserId,
};

/// Where a request stands at the gate. `Authenticated` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Pending,
    Authenticated(UserId),
    Rejected,
}

impl GateState {
    /// Applies the outcome of identity extraction. Terminal states ignore it.
    pub fn advance(self, outcome: &Result<UserId>) -> Self {
        match (self, outcome) {
            (GateState::Pending, Ok(subject)) => GateState::Authenticated(*subject),
            (GateState::Pending, Err(_)) => GateState::Rejected,
            (terminal, _) => terminal,
        }
    }
}

/// Rejects the request with 401 unless it carries a valid credential. On
/// success the caller is stored as a [`CurrentUser`] extension and the wrapped
/// handler runs.
pub async fn require_authentication(State(state): State<AppState>, mut request: Request, next: Next) -> Result<Response> {
    let outcome = extract_subject(request.headers(), &state.tokens);
    trace!(gate = ?GateState::Pending.advance(&outcome), path = %request.uri().path(), "authentication gate");

    match outcome {
        Ok(id) => {
            request.extensions_mut().insert(CurrentUser { id });
            Ok(next.run(request).await)
        }
        Err(e) => {
            debug!(path = %request.uri().path(), "rejected unauthenticated request");
            Err(e)
        }
    }
}
