//! Caller identity extraction from trusted gateway headers.
//!
//! Authentication happens upstream. The gateway forwards the resolved user
//! in `X-User-Id` and the role in `X-User-Role`; role `admin` grants
//! moderation rights. Requests without `X-User-Id` are anonymous.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;

use crate::domain::entities::Identity;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Extractor yielding the caller's [`Identity`]. Never rejects.
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub Identity);

impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(identity_from_headers(&parts.headers)))
    }
}

/// Builds an identity from request headers.
///
/// Blank values count as absent. Role matching ignores case and surrounding whitespace.
pub fn identity_from_headers(headers: &HeaderMap) -> Identity {
    let user_id = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    let is_admin = headers
        .get(USER_ROLE_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|role| role.trim().eq_ignore_ascii_case("admin"));

    Identity { user_id, is_admin }
}
