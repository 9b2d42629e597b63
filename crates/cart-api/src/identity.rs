//! # Identity Resolution
//!
//! Resolves the request's `CartIdentity` from headers set by the external
//! auth layer: `x-user-id` for authenticated principals, `x-device-id` for
//! anonymous device scopes. Resolution happens once per request; handlers
//! never probe for cart shapes themselves.

use crate::handlers::ErrorResponse;
use axum::{extract::FromRequestParts, http::request::Parts, http::StatusCode, Json};
use cart_core::CartIdentity;

/// Header carrying the authenticated user id
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the anonymous device token
pub const DEVICE_ID_HEADER: &str = "x-device-id";

/// Extractor for the request's cart identity.
///
/// `x-user-id` wins over `x-device-id` when both are present (the merge
/// endpoint reads both explicitly).
pub struct ResolvedIdentity(pub CartIdentity);

fn header_value(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(String::from)
}

impl<S> FromRequestParts<S> for ResolvedIdentity
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user_id) = header_value(parts, USER_ID_HEADER) {
            return Ok(Self(CartIdentity::authenticated(user_id)));
        }
        if let Some(device_token) = header_value(parts, DEVICE_ID_HEADER) {
            return Ok(Self(CartIdentity::anonymous(device_token)));
        }

        Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new(
                format!("Missing {} or {} header", USER_ID_HEADER, DEVICE_ID_HEADER),
                401,
            )),
        ))
    }
}
