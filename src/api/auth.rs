// =============================================================================
// Bearer Token Authentication
// =============================================================================
//
// Every non-public endpoint requires `Authorization: Bearer <token>` matching
// the `FINETH_ADMIN_TOKEN` environment variable. The variable is read per
// request, so rotating the token needs no restart. Token comparison never
// exits early on a mismatched byte.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::warn;

/// Extractor gating a handler on a valid admin bearer token. On success it
/// carries the presented token; on failure the request ends with 403 before
/// the handler runs.
///
///   async fn handler(AuthBearer(token): AuthBearer, ...) { ... }
pub struct AuthBearer(pub String);

/// 403 response emitted when token validation fails.
#[derive(Debug)]
pub struct AuthRejection(&'static str);

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::FORBIDDEN,
            axum::Json(serde_json::json!({ "error": self.0 })),
        )
            .into_response()
    }
}

/// The token portion of an `Authorization: Bearer ...` header, if present
/// and well-formed.
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Byte-wise comparison that touches every position of equal-length inputs,
/// so response timing does not reveal how long a matching prefix was.
/// (A length mismatch is observable, but the expected token's length is not
/// attacker-controlled.)
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

impl<S> FromRequestParts<S> for AuthBearer
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let expected = std::env::var("FINETH_ADMIN_TOKEN").unwrap_or_default();
        if expected.is_empty() {
            warn!("FINETH_ADMIN_TOKEN is not set — rejecting all authenticated requests");
            return Err(AuthRejection("Server authentication not configured"));
        }

        let Some(token) = bearer_token(parts) else {
            warn!("Authorization header missing or not a Bearer token");
            return Err(AuthRejection("Missing or invalid authorization token"));
        };

        if !constant_time_eq(token.as_bytes(), expected.as_bytes()) {
            warn!("Rejected request with a non-matching admin token");
            return Err(AuthRejection("Invalid authorization token"));
        }

        Ok(AuthBearer(token.to_string()))
    }
}
