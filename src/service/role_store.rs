//! Role store access
//!
//! Produces the candidate role set for an `(identity, application scope)`
//! pair via two interchangeable strategies: the hint path (caller already
//! knows the role ids, e.g. from a verified session) and the identity path
//! (join identity to its role records). Both apply the same scope filter at
//! the role level, so a role held for a different tenant is excluded either
//! way.
//!
//! Every lookup runs under a bounded timeout; a timeout or repository
//! failure surfaces as `AppError::Lookup`, never as an empty role set.

use crate::cache::RoleCache;
use crate::domain::Role;
use crate::error::{AppError, Result};
use crate::repository::RoleRepository;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Hint path: fetch exactly the given role records, scope-filtered.
    /// Staleness of the hint is the caller's responsibility.
    async fn roles_by_ids(&self, role_ids: &[Uuid], scope: &str) -> Result<Vec<Role>>;

    /// Identity path: identity -> role ids -> role records, scope-filtered
    async fn roles_for_identity(&self, identity_id: Uuid, scope: &str) -> Result<Vec<Role>>;

    /// Single role record, for administrative preview
    async fn role_by_id(&self, role_id: Uuid) -> Result<Option<Role>>;
}

/// The one scope filter both strategies share
fn filter_to_scope(roles: Vec<Role>, scope: &str) -> Vec<Role> {
    roles
        .into_iter()
        .filter(|role| role.applies_to(scope))
        .collect()
}

/// Role store backed directly by the repository
pub struct DirectRoleStore<R> {
    repo: Arc<R>,
    lookup_timeout: Duration,
}

impl<R: RoleRepository> DirectRoleStore<R> {
    pub fn new(repo: Arc<R>, lookup_timeout: Duration) -> Self {
        Self {
            repo,
            lookup_timeout,
        }
    }

    async fn bounded<T>(
        &self,
        what: &str,
        fut: impl Future<Output = Result<T>> + Send,
    ) -> Result<T> {
        match tokio::time::timeout(self.lookup_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                tracing::error!(error = %err, "role store {} failed", what);
                Err(AppError::Lookup(format!("role store {} failed", what)))
            }
            Err(_) => Err(AppError::Lookup(format!(
                "role store {} timed out after {:?}",
                what, self.lookup_timeout
            ))),
        }
    }
}

#[async_trait]
impl<R: RoleRepository> RoleStore for DirectRoleStore<R> {
    async fn roles_by_ids(&self, role_ids: &[Uuid], scope: &str) -> Result<Vec<Role>> {
        if role_ids.is_empty() {
            return Ok(vec![]);
        }
        let roles = self
            .bounded("hint lookup", self.repo.find_roles_by_ids(role_ids))
            .await?;
        Ok(filter_to_scope(roles, scope))
    }

    async fn roles_for_identity(&self, identity_id: Uuid, scope: &str) -> Result<Vec<Role>> {
        let roles = self
            .bounded("identity lookup", self.repo.find_identity_roles(identity_id))
            .await?;
        Ok(filter_to_scope(roles, scope))
    }

    async fn role_by_id(&self, role_id: Uuid) -> Result<Option<Role>> {
        self.bounded("role lookup", self.repo.find_role_by_id(role_id))
            .await
    }
}

/// Read-through cache over another role store.
///
/// Only the identity path is cached, keyed `(identity, scope)`; hint-path
/// lookups carry their freshness contract with the caller. Cache failures
/// degrade to source-of-truth with a warning; they never decide a check.
pub struct CachedRoleStore<S> {
    inner: S,
    cache: Arc<dyn RoleCache>,
}

impl<S: RoleStore> CachedRoleStore<S> {
    pub fn new(inner: S, cache: Arc<dyn RoleCache>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl<S: RoleStore> RoleStore for CachedRoleStore<S> {
    async fn roles_by_ids(&self, role_ids: &[Uuid], scope: &str) -> Result<Vec<Role>> {
        self.inner.roles_by_ids(role_ids, scope).await
    }

    async fn roles_for_identity(&self, identity_id: Uuid, scope: &str) -> Result<Vec<Role>> {
        match self.cache.get_identity_roles(identity_id, scope).await {
            Ok(Some(roles)) => return Ok(roles),
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(error = %err, "role cache read failed, falling through");
            }
        }

        let roles = self.inner.roles_for_identity(identity_id, scope).await?;

        if let Err(err) = self
            .cache
            .set_identity_roles(identity_id, scope, &roles)
            .await
        {
            tracing::warn!(error = %err, "role cache write failed");
        }

        Ok(roles)
    }

    async fn role_by_id(&self, role_id: Uuid) -> Result<Option<Role>> {
        self.inner.role_by_id(role_id).await
    }
}
