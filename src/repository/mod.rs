//! Data access layer (Repository pattern)

pub mod role;

pub use role::{RoleRepository, RoleRepositoryImpl};
