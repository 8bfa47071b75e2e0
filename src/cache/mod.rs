//! Role cache layer
//!
//! The cache is a swappable collaborator behind role store access, never a
//! process-wide singleton: a redis backend with a bounded TTL for deployed
//! services, and a no-op backend when no cache is configured. The
//! administrative write path calls the invalidation entry points
//! synchronously on commit.

use crate::config::RedisConfig;
use crate::domain::Role;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Cache key prefixes
mod keys {
    pub const IDENTITY_ROLES: &str = "authz:identity_roles";
}

/// Cache operations used by role store access and the write path
#[async_trait]
pub trait RoleCache: Send + Sync {
    /// Cached candidate roles for an `(identity, application scope)` pair
    async fn get_identity_roles(&self, identity_id: Uuid, scope: &str)
        -> Result<Option<Vec<Role>>>;

    async fn set_identity_roles(&self, identity_id: Uuid, scope: &str, roles: &[Role])
        -> Result<()>;

    /// Invalidate every scope entry for one identity (assignment changed)
    async fn invalidate_identity(&self, identity_id: Uuid) -> Result<()>;

    /// Invalidate everything (a role definition changed)
    async fn invalidate_all_roles(&self) -> Result<()>;
}

/// Redis-backed cache with a bounded TTL
#[derive(Clone)]
pub struct RedisRoleCache {
    conn: ConnectionManager,
    ttl: Duration,
}

impl RedisRoleCache {
    pub async fn connect(config: &RedisConfig, ttl: Duration) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str()).map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to create Redis client: {}", e))
        })?;

        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to connect to Redis: {}", e)))?;

        Ok(Self { conn, ttl })
    }

    fn identity_key(identity_id: Uuid, scope: &str) -> String {
        format!("{}:{}:{}", keys::IDENTITY_ROLES, identity_id, scope)
    }

    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;

        match value {
            Some(v) => {
                let parsed = serde_json::from_str(&v).map_err(|e| {
                    AppError::Internal(anyhow::anyhow!("Cache deserialize error: {}", e))
                })?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let mut conn = self.conn.clone();
        let serialized = serde_json::to_string(value)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Cache serialize error: {}", e)))?;

        let _: () = conn.set_ex(key, serialized, self.ttl.as_secs()).await?;
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = redis::cmd("KEYS")
            .arg(pattern)
            .query_async(&mut conn)
            .await?;

        if !keys.is_empty() {
            conn.del::<_, ()>(keys).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl RoleCache for RedisRoleCache {
    async fn get_identity_roles(
        &self,
        identity_id: Uuid,
        scope: &str,
    ) -> Result<Option<Vec<Role>>> {
        self.get(&Self::identity_key(identity_id, scope)).await
    }

    async fn set_identity_roles(
        &self,
        identity_id: Uuid,
        scope: &str,
        roles: &[Role],
    ) -> Result<()> {
        self.set(&Self::identity_key(identity_id, scope), &roles)
            .await
    }

    async fn invalidate_identity(&self, identity_id: Uuid) -> Result<()> {
        let pattern = format!("{}:{}:*", keys::IDENTITY_ROLES, identity_id);
        self.delete_pattern(&pattern).await
    }

    async fn invalidate_all_roles(&self) -> Result<()> {
        let pattern = format!("{}:*", keys::IDENTITY_ROLES);
        self.delete_pattern(&pattern).await
    }
}

/// Cache backend that stores nothing; every lookup goes to source-of-truth
#[derive(Clone, Copy, Default)]
pub struct NoOpRoleCache;

#[async_trait]
impl RoleCache for NoOpRoleCache {
    async fn get_identity_roles(
        &self,
        _identity_id: Uuid,
        _scope: &str,
    ) -> Result<Option<Vec<Role>>> {
        Ok(None)
    }

    async fn set_identity_roles(
        &self,
        _identity_id: Uuid,
        _scope: &str,
        _roles: &[Role],
    ) -> Result<()> {
        Ok(())
    }

    async fn invalidate_identity(&self, _identity_id: Uuid) -> Result<()> {
        Ok(())
    }

    async fn invalidate_all_roles(&self) -> Result<()> {
        Ok(())
    }
}
