//! Authorization resolution engine
//!
//! Applies the one canonical matching rule over the candidate role set. The
//! scan itself is pure computation with no await points; the only I/O is the
//! role store lookup that produces the candidates.

use crate::domain::{Permission, Role};
use crate::error::Result;
use crate::service::role_store::RoleStore;
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

pub struct ResolutionEngine {
    store: Arc<dyn RoleStore>,
}

impl ResolutionEngine {
    pub fn new(store: Arc<dyn RoleStore>) -> Self {
        Self { store }
    }

    /// Decide whether `required` is granted to the identity within the
    /// application scope.
    ///
    /// Fail-closed behavior: a malformed `required` string is `Ok(false)`,
    /// and role store failures propagate as `AppError::Lookup` so the gate
    /// can report them distinctly from an ordinary denial. An identity with
    /// zero matching roles for the scope always denies, even if it holds
    /// roles for other applications.
    pub async fn has_permission(
        &self,
        identity_id: Uuid,
        required: &str,
        application_scope: &str,
        role_hint: Option<&[Uuid]>,
    ) -> Result<bool> {
        let required = match Permission::parse(required) {
            Ok(permission) => permission,
            Err(err) => {
                tracing::warn!(
                    permission = required,
                    error = %err,
                    "denying check for malformed required permission"
                );
                return Ok(false);
            }
        };

        let candidates = self
            .candidate_roles(identity_id, application_scope, role_hint)
            .await?;

        Ok(scan(&candidates, &required))
    }

    /// Deduplicated union of every permission string contributed by the
    /// identity's matching roles. Introspection/UI display only; it is never
    /// a substitute for `has_permission`, which re-applies the matching rule
    /// against the specific request.
    pub async fn effective_permissions(
        &self,
        identity_id: Uuid,
        application_scope: &str,
    ) -> Result<BTreeSet<String>> {
        let roles = self
            .store
            .roles_for_identity(identity_id, application_scope)
            .await?;

        Ok(roles
            .iter()
            .flat_map(|role| role.permissions.iter())
            .filter_map(|stored| Permission::parse_lenient(stored))
            .map(|permission| permission.to_string())
            .collect())
    }

    /// Single-role variant of the matching rule, for previewing a role's
    /// effect in isolation without resolving any identity. An unknown role
    /// id denies.
    pub async fn role_has_permission(&self, role_id: Uuid, required: &str) -> Result<bool> {
        let required = match Permission::parse(required) {
            Ok(permission) => permission,
            Err(err) => {
                tracing::warn!(
                    permission = required,
                    error = %err,
                    "denying role preview for malformed required permission"
                );
                return Ok(false);
            }
        };

        let Some(role) = self.store.role_by_id(role_id).await? else {
            return Ok(false);
        };

        Ok(scan(std::slice::from_ref(&role), &required))
    }

    async fn candidate_roles(
        &self,
        identity_id: Uuid,
        application_scope: &str,
        role_hint: Option<&[Uuid]>,
    ) -> Result<Vec<Role>> {
        match role_hint {
            Some(role_ids) => self.store.roles_by_ids(role_ids, application_scope).await,
            None => {
                self.store
                    .roles_for_identity(identity_id, application_scope)
                    .await
            }
        }
    }
}

/// First match across any candidate role and any of its entries wins; a
/// stored entry that fails to parse is skipped. Order only affects latency,
/// never the result.
fn scan(roles: &[Role], required: &Permission) -> bool {
    for role in roles {
        for stored in &role.permissions {
            let Some(stored) = Permission::parse_lenient(stored) else {
                continue;
            };
            if stored.grants(required) {
                return true;
            }
        }
    }
    false
}
