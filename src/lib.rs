//! Authz Core - Authorization Policy Resolution Engine
//!
//! This crate decides, for an authenticated identity, whether a requested
//! `resource:action` permission is granted within an application (tenant)
//! scope. It provides the permission grammar, role store access, the
//! resolution engine, and the axum enforcement gate. Token verification and
//! HTTP routing are upstream collaborators.

pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod middleware;
pub mod repository;
pub mod service;
pub mod state;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
pub use state::AuthzState;
