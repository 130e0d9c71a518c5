//! Caller extraction for the HTTP boundary.
//!
//! Authentication happens upstream: a gateway (or test harness) resolves
//! the request to a user id and capability set and forwards them as
//! headers. This module only turns those headers into a [`Caller`] —
//! requests without a resolved identity are rejected with 401 before any
//! handler runs.

use axum::extract::FromRequestParts;
use axum::http::{StatusCode, request::Parts};
use axum::response::{IntoResponse, Response};

use taskdeck_core::caller::{Caller, CapabilitySet};

/// Header carrying the resolved user id.
pub const USER_HEADER: &str = "x-user-id";
/// Header carrying the comma-separated capability names, if any.
pub const CAPABILITIES_HEADER: &str = "x-capabilities";

/// Extractor wrapping the resolved [`Caller`].
#[derive(Debug, Clone)]
pub struct AuthedCaller(pub Caller);

impl<S> FromRequestParts<S> for AuthedCaller
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|u| !u.is_empty());
        let Some(user) = user else {
            return Err((
                StatusCode::UNAUTHORIZED,
                axum::Json(serde_json::json!({
                    "error": "missing or empty x-user-id header",
                    "kind": "unauthorized",
                })),
            )
                .into_response());
        };

        let capabilities = parts
            .headers
            .get(CAPABILITIES_HEADER)
            .and_then(|v| v.to_str().ok())
            .map_or_else(CapabilitySet::new, CapabilitySet::parse);

        Ok(Self(Caller {
            user: user.to_string(),
            capabilities,
        }))
    }
}
