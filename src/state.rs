//! Shared application state
//!
//! Embedding services wire everything here once: a MySQL pool, the redis
//! role cache, the bounded direct store, the read-through cached store, and
//! the resolution engine and admin service on top. Handlers and route
//! guards clone the state and take `Arc` handles from it.

use crate::cache::{NoOpRoleCache, RedisRoleCache, RoleCache};
use crate::config::Config;
use crate::error::Result;
use crate::repository::RoleRepositoryImpl;
use crate::service::{CachedRoleStore, DirectRoleStore, ResolutionEngine, RoleAdminService};
use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use tracing::info;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AuthzState {
    pub config: Config,
    pub engine: Arc<ResolutionEngine>,
    pub admin: Arc<RoleAdminService<RoleRepositoryImpl>>,
}

impl AuthzState {
    /// Connect to MySQL and redis and assemble the resolution stack.
    ///
    /// With no `REDIS_URL` configured the cache degrades to a no-op backend
    /// and every lookup goes to source-of-truth.
    pub async fn connect(config: Config) -> Result<Self> {
        let db_pool = MySqlPoolOptions::new()
            .max_connections(config.database.max_connections)
            .min_connections(config.database.min_connections)
            .connect(&config.database.url)
            .await?;

        info!("Connected to database");

        let cache: Arc<dyn RoleCache> = match &config.redis {
            Some(redis) => {
                let cache = RedisRoleCache::connect(redis, config.authz.cache_ttl()).await?;
                info!("Connected to Redis");
                Arc::new(cache)
            }
            None => {
                info!("No redis configured, role cache disabled");
                Arc::new(NoOpRoleCache)
            }
        };

        let repo = Arc::new(RoleRepositoryImpl::new(db_pool));

        let store = CachedRoleStore::new(
            DirectRoleStore::new(repo.clone(), config.authz.lookup_timeout()),
            cache.clone(),
        );

        let engine = Arc::new(ResolutionEngine::new(Arc::new(store)));
        let admin = Arc::new(RoleAdminService::new(repo, cache));

        Ok(Self {
            config,
            engine,
            admin,
        })
    }
}
