//! Shared test fixtures
//!
//! An in-memory role store stands in for the database-backed repository so
//! resolution and gate behavior can be exercised end to end without
//! infrastructure.

use async_trait::async_trait;
use authz_core::domain::{Role, StringUuid};
use authz_core::error::Result;
use authz_core::service::role_store::RoleStore;
use std::collections::HashMap;
use uuid::Uuid;

pub fn role(name: &str, scope: &str, permissions: &[&str]) -> Role {
    Role {
        id: StringUuid::new_v4(),
        name: name.to_string(),
        application_scope: scope.to_string(),
        permissions: permissions.iter().map(|p| p.to_string()).collect(),
        ..Default::default()
    }
}

/// Role store holding a fixed role catalogue and identity assignments
#[derive(Default)]
pub struct InMemoryRoleStore {
    roles: Vec<Role>,
    assignments: HashMap<Uuid, Vec<Uuid>>,
}

impl InMemoryRoleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.roles.push(role);
        self
    }

    pub fn assign(mut self, identity_id: Uuid, role_ids: &[Uuid]) -> Self {
        self.assignments
            .entry(identity_id)
            .or_default()
            .extend_from_slice(role_ids);
        self
    }

    fn scoped(&self, ids: &[Uuid], scope: &str) -> Vec<Role> {
        self.roles
            .iter()
            .filter(|r| ids.contains(&r.id.0) && r.applies_to(scope))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RoleStore for InMemoryRoleStore {
    async fn roles_by_ids(&self, role_ids: &[Uuid], scope: &str) -> Result<Vec<Role>> {
        Ok(self.scoped(role_ids, scope))
    }

    async fn roles_for_identity(&self, identity_id: Uuid, scope: &str) -> Result<Vec<Role>> {
        let ids = self
            .assignments
            .get(&identity_id)
            .cloned()
            .unwrap_or_default();
        Ok(self.scoped(&ids, scope))
    }

    async fn role_by_id(&self, role_id: Uuid) -> Result<Option<Role>> {
        Ok(self.roles.iter().find(|r| *r.id == role_id).cloned())
    }
}
