//! Business logic layer

pub mod admin;
pub mod resolver;
pub mod role_store;

pub use admin::RoleAdminService;
pub use resolver::ResolutionEngine;
pub use role_store::{CachedRoleStore, DirectRoleStore, RoleStore};
