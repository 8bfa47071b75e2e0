//! Permission enforcement middleware
//!
//! `require_permission` builds per-route middleware state binding one
//! required permission and one application-scope source. The gate separates
//! four outcomes: no authenticated identity (401), authenticated but not
//! granted (403, generic body), resolution infrastructure failure (the
//! engine's `Lookup` error, 503), and granted (pass-through untouched).
//!
//! An unresolvable scope, such as a missing path parameter on a
//! misconfigured route, denies with 403 rather than allowing the request.

use axum::{
    body::Body,
    extract::{FromRequestParts, RawPathParams, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::middleware::auth::AuthIdentity;
use crate::service::ResolutionEngine;

/// Where the application scope for a check comes from
#[derive(Debug, Clone)]
pub enum ScopeExpr {
    /// Fixed scope known at route definition time
    Static(String),
    /// Scope taken from a path parameter, e.g. `{application}` in the route
    PathParam(String),
}

/// Per-route state for the permission gate
#[derive(Clone)]
pub struct PermissionGuard {
    engine: Arc<ResolutionEngine>,
    permission: String,
    scope: ScopeExpr,
}

/// Build gate state for `axum::middleware::from_fn_with_state` with
/// `permission_gate`.
pub fn require_permission(
    engine: Arc<ResolutionEngine>,
    permission: &str,
    scope: ScopeExpr,
) -> PermissionGuard {
    PermissionGuard {
        engine,
        permission: permission.to_string(),
        scope,
    }
}

/// Permission enforcement middleware
pub async fn permission_gate(
    State(guard): State<PermissionGuard>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let identity = match request.extensions().get::<AuthIdentity>() {
        Some(identity) => identity.clone(),
        None => {
            return unauthorized_response();
        }
    };

    let (mut parts, body) = request.into_parts();

    let scope = match &guard.scope {
        ScopeExpr::Static(scope) => scope.clone(),
        ScopeExpr::PathParam(name) => {
            let params = match RawPathParams::from_request_parts(&mut parts, &()).await {
                Ok(params) => params,
                Err(_) => {
                    tracing::warn!(param = %name, "permission gate could not read path parameters");
                    return forbidden_response();
                }
            };
            match params
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
            {
                Some(scope) => scope,
                None => {
                    tracing::warn!(param = %name, "permission gate scope parameter missing from route");
                    return forbidden_response();
                }
            }
        }
    };

    let request = Request::from_parts(parts, body);

    let granted = guard
        .engine
        .has_permission(
            identity.identity_id,
            &guard.permission,
            &scope,
            identity.role_hint.as_deref(),
        )
        .await;

    match granted {
        Ok(true) => next.run(request).await,
        Ok(false) => forbidden_response(),
        Err(err) => err.into_response(),
    }
}

/// Generate a 401 Unauthorized response
fn unauthorized_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "Authentication required",
            "code": "UNAUTHORIZED"
        })),
    )
        .into_response()
}

/// Generate a 403 Forbidden response. The body never says which permission
/// was required or why it was missing.
fn forbidden_response() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({
            "error": "Permission denied",
            "code": "FORBIDDEN"
        })),
    )
        .into_response()
}
