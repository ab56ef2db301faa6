//! Resolving the caller of a request.
//!
//! [`extract_subject`] reads the `Authorization` header and verifies the
//! credential it carries. The authentication gate calls it once per request and
//! stores the result in the request extensions; handlers then take a
//! [`CurrentUser`] argument, which only reads that extension.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use tracing::trace;

use crate::{
    api::models::users::CurrentUser,
    auth::token::TokenCodec,
    errors::{Error, Result},
    types::UserId,
};

/// Returns the credential part of an `Authorization: <scheme> <credential>`
/// header. The scheme is not checked. Anything other than exactly two
/// space-separated parts yields an empty string.
pub fn credential_from_headers(headers: &HeaderMap) -> &str {
    let Some(value) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) else {
        return "";
    };

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_scheme), Some(credential), None) => credential,
        _ => "",
    }
}

/// Resolves the caller of a request from its credential.
pub fn extract_subject(headers: &HeaderMap, tokens: &TokenCodec) -> Result<UserId> {
    let credential = credential_from_headers(headers);
    let subject = tokens.verify(credential)?;
    trace!(subject, "resolved caller from credential");
    Ok(subject)
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        // Only present when the authentication gate ran for this route
        parts
            .extensions
            .get::<CurrentUser>()
            .copied()
            .ok_or(Error::Unauthenticated { message: None })
    }
}
