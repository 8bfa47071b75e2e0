//! Domain models for the authorization engine

pub mod common;
pub mod permission;
pub mod role;

pub use common::StringUuid;
pub use permission::{Permission, PermissionParseError, Segment};
pub use role::{
    AssignRolesInput, CreateRoleInput, Identity, Role, UpdateRoleInput, WILDCARD_SCOPE,
};
