//! Authenticated caller identity
//!
//! Authentication itself happens upstream (session verification, token
//! validation). Whatever that layer is, it installs an `AuthIdentity` into
//! the request extensions; everything in this crate reads it from there.
//! A request with no `AuthIdentity` is unauthenticated, which is a distinct
//! condition from an authenticated caller lacking a permission.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

/// Caller identity established by the upstream authentication layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthIdentity {
    /// Identity ID of the authenticated caller
    pub identity_id: Uuid,
    /// Role ids the authentication layer already resolved, when it did.
    /// Present for callers authenticated via a verified session; absent
    /// when only the identity is known.
    pub role_hint: Option<Vec<Uuid>>,
}

impl AuthIdentity {
    pub fn new(identity_id: Uuid) -> Self {
        Self {
            identity_id,
            role_hint: None,
        }
    }

    pub fn with_role_hint(identity_id: Uuid, role_ids: Vec<Uuid>) -> Self {
        Self {
            identity_id,
            role_hint: Some(role_ids),
        }
    }
}

/// Authentication errors
#[derive(Debug, Clone)]
pub enum AuthError {
    /// No identity in the request extensions
    MissingIdentity,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingIdentity => (StatusCode::UNAUTHORIZED, "Authentication required"),
        };

        (
            status,
            Json(json!({
                "error": message,
                "code": "UNAUTHORIZED"
            })),
        )
            .into_response()
    }
}

impl<S> FromRequestParts<S> for AuthIdentity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthIdentity>()
            .cloned()
            .ok_or(AuthError::MissingIdentity)
    }
}
