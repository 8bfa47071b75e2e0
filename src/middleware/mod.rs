//! HTTP middleware (enforcement gate and identity plumbing)

pub mod auth;
pub mod require_permission;

pub use auth::{AuthError, AuthIdentity};
pub use require_permission::{permission_gate, require_permission, PermissionGuard, ScopeExpr};
