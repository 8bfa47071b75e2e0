//! Administrative role write path
//!
//! Role and assignment mutations live outside the resolution engine, but
//! they carry two obligations toward it: every permission string is
//! validated through the grammar before anything is persisted, and cache
//! entries touching the affected role or identity are invalidated
//! synchronously with the commit.

use crate::cache::RoleCache;
use crate::domain::{AssignRolesInput, CreateRoleInput, Permission, Role, UpdateRoleInput};
use crate::error::{AppError, Result};
use crate::repository::RoleRepository;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub struct RoleAdminService<R: RoleRepository> {
    repo: Arc<R>,
    cache: Arc<dyn RoleCache>,
}

impl<R: RoleRepository> RoleAdminService<R> {
    pub fn new(repo: Arc<R>, cache: Arc<dyn RoleCache>) -> Self {
        Self { repo, cache }
    }

    pub async fn create_role(&self, input: CreateRoleInput) -> Result<Role> {
        input.validate()?;
        validate_permission_strings(&input.permissions)?;

        let role = self.repo.create_role(&input).await?;
        self.invalidate_all().await;
        Ok(role)
    }

    pub async fn get_role(&self, id: Uuid) -> Result<Role> {
        self.repo
            .find_role_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Role {} not found", id)))
    }

    pub async fn update_role(&self, id: Uuid, input: UpdateRoleInput) -> Result<Role> {
        input.validate()?;
        if let Some(permissions) = &input.permissions {
            validate_permission_strings(permissions)?;
        }

        let _ = self.get_role(id).await?;
        let role = self.repo.update_role(id, &input).await?;
        self.invalidate_all().await;
        Ok(role)
    }

    pub async fn delete_role(&self, id: Uuid) -> Result<()> {
        let _ = self.get_role(id).await?;
        self.repo.delete_role(id).await?;
        self.invalidate_all().await;
        Ok(())
    }

    pub async fn assign_roles(&self, input: AssignRolesInput) -> Result<()> {
        input.validate()?;
        self.repo
            .assign_roles_to_identity(input.identity_id, &input.role_ids)
            .await?;
        self.invalidate_identity(input.identity_id).await;
        Ok(())
    }

    pub async fn revoke_role(&self, identity_id: Uuid, role_id: Uuid) -> Result<()> {
        self.repo
            .remove_role_from_identity(identity_id, role_id)
            .await?;
        self.invalidate_identity(identity_id).await;
        Ok(())
    }

    async fn invalidate_all(&self) {
        if let Err(err) = self.cache.invalidate_all_roles().await {
            tracing::warn!(error = %err, "role cache invalidation failed");
        }
    }

    async fn invalidate_identity(&self, identity_id: Uuid) {
        if let Err(err) = self.cache.invalidate_identity(identity_id).await {
            tracing::warn!(error = %err, identity_id = %identity_id, "identity cache invalidation failed");
        }
    }
}

/// Reject the write if any permission string fails the grammar; nothing is
/// persisted on rejection.
fn validate_permission_strings(permissions: &[String]) -> Result<()> {
    for permission in permissions {
        Permission::parse(permission).map_err(|err| {
            AppError::Validation(format!("invalid permission `{}`: {}", permission, err))
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::role::MockRoleRepository;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts invalidation calls so tests can assert the write path keeps
    /// its synchronous-invalidation obligation.
    #[derive(Default)]
    struct RecordingCache {
        all: AtomicUsize,
        identity: AtomicUsize,
    }

    #[async_trait]
    impl RoleCache for RecordingCache {
        async fn get_identity_roles(&self, _: Uuid, _: &str) -> Result<Option<Vec<Role>>> {
            Ok(None)
        }
        async fn set_identity_roles(&self, _: Uuid, _: &str, _: &[Role]) -> Result<()> {
            Ok(())
        }
        async fn invalidate_identity(&self, _: Uuid) -> Result<()> {
            self.identity.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        async fn invalidate_all_roles(&self) -> Result<()> {
            self.all.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn valid_input() -> CreateRoleInput {
        CreateRoleInput {
            name: "editor".to_string(),
            application_scope: "cms".to_string(),
            permissions: vec!["content:read".to_string(), "content:update".to_string()],
        }
    }

    #[tokio::test]
    async fn test_create_role_success_invalidates_cache() {
        let mut mock = MockRoleRepository::new();
        mock.expect_create_role().returning(|input| {
            Ok(Role {
                name: input.name.clone(),
                application_scope: input.application_scope.clone(),
                permissions: input.permissions.clone(),
                ..Default::default()
            })
        });

        let cache = Arc::new(RecordingCache::default());
        let service = RoleAdminService::new(Arc::new(mock), cache.clone());

        let role = service.create_role(valid_input()).await.unwrap();
        assert_eq!(role.name, "editor");
        assert_eq!(cache.all.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_create_role_rejects_malformed_permission() {
        // No repository expectations: nothing may be persisted
        let mock = MockRoleRepository::new();
        let service = RoleAdminService::new(Arc::new(mock), Arc::new(RecordingCache::default()));

        let mut input = valid_input();
        input.permissions.push("content".to_string());

        let result = service.create_role(input).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_role_rejects_unknown_vocabulary_token() {
        let mock = MockRoleRepository::new();
        let service = RoleAdminService::new(Arc::new(mock), Arc::new(RecordingCache::default()));

        let mut input = valid_input();
        input.permissions = vec!["gadget:read".to_string()];

        let result = service.create_role(input).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_role_rejects_invalid_scope() {
        let mock = MockRoleRepository::new();
        let service = RoleAdminService::new(Arc::new(mock), Arc::new(RecordingCache::default()));

        let mut input = valid_input();
        input.application_scope = "Not A Scope".to_string();

        let result = service.create_role(input).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_role_not_found() {
        let mut mock = MockRoleRepository::new();
        mock.expect_find_role_by_id().returning(|_| Ok(None));

        let service = RoleAdminService::new(Arc::new(mock), Arc::new(RecordingCache::default()));

        let input = UpdateRoleInput {
            name: Some("renamed".to_string()),
            application_scope: None,
            permissions: None,
        };

        let result = service.update_role(Uuid::new_v4(), input).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_role_validates_new_permissions() {
        // Validation fails before any repository access
        let mock = MockRoleRepository::new();
        let service = RoleAdminService::new(Arc::new(mock), Arc::new(RecordingCache::default()));

        let input = UpdateRoleInput {
            name: None,
            application_scope: None,
            permissions: Some(vec!["broken".to_string()]),
        };

        let result = service.update_role(Uuid::new_v4(), input).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete_role_invalidates_cache() {
        let existing = Role::default();
        let id = *existing.id;

        let mut mock = MockRoleRepository::new();
        let found = existing.clone();
        mock.expect_find_role_by_id()
            .returning(move |_| Ok(Some(found.clone())));
        mock.expect_delete_role().returning(|_| Ok(()));

        let cache = Arc::new(RecordingCache::default());
        let service = RoleAdminService::new(Arc::new(mock), cache.clone());

        service.delete_role(id).await.unwrap();
        assert_eq!(cache.all.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_assign_roles_invalidates_identity_only() {
        let mut mock = MockRoleRepository::new();
        mock.expect_assign_roles_to_identity()
            .returning(|_, _| Ok(()));

        let cache = Arc::new(RecordingCache::default());
        let service = RoleAdminService::new(Arc::new(mock), cache.clone());

        let input = AssignRolesInput {
            identity_id: Uuid::new_v4(),
            role_ids: vec![Uuid::new_v4()],
        };

        service.assign_roles(input).await.unwrap();
        assert_eq!(cache.identity.load(Ordering::SeqCst), 1);
        assert_eq!(cache.all.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_revoke_role_invalidates_identity() {
        let mut mock = MockRoleRepository::new();
        mock.expect_remove_role_from_identity()
            .returning(|_, _| Ok(()));

        let cache = Arc::new(RecordingCache::default());
        let service = RoleAdminService::new(Arc::new(mock), cache.clone());

        service
            .revoke_role(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(cache.identity.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_role_not_found() {
        let mut mock = MockRoleRepository::new();
        mock.expect_find_role_by_id().returning(|_| Ok(None));

        let service = RoleAdminService::new(Arc::new(mock), Arc::new(RecordingCache::default()));

        let result = service.get_role(Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
