//! Request extractors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::domain::UserId;
use crate::error::GatewayError;

/// Header carrying the authenticated user id, set by the upstream auth proxy.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated user making the request.
///
/// Rejects with [`GatewayError::Unauthenticated`] when the
/// [`USER_ID_HEADER`] header is missing or not a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor(pub UserId);

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .map(|id| Self(UserId::from_uuid(id)))
            .ok_or(GatewayError::Unauthenticated)
    }
}
