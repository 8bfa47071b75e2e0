//! Role and identity domain models

use super::common::StringUuid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Application scope that applies under any tenant
pub const WILDCARD_SCOPE: &str = "*";

/// Role entity: a named, application-scoped bundle of permission strings.
///
/// Roles mutate only through the administrative write path; during a single
/// check the engine treats them as immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: StringUuid,
    pub name: String,
    /// Concrete tenant identifier, or `"*"` for any application
    pub application_scope: String,
    /// Permission wire strings (e.g., "content:read", "*:*")
    pub permissions: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Role {
    /// Scope comparison is exact-string-or-wildcard only; no partial
    /// similarity between concrete scopes.
    pub fn applies_to(&self, application_scope: &str) -> bool {
        self.application_scope == WILDCARD_SCOPE || self.application_scope == application_scope
    }
}

impl Default for Role {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: StringUuid::new_v4(),
            name: String::new(),
            application_scope: WILDCARD_SCOPE.to_string(),
            permissions: vec![],
            created_at: now,
            updated_at: now,
        }
    }
}

/// Identity entity as consumed by the engine: the engine never mutates it,
/// and token verification happens upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: StringUuid,
    pub role_ids: Vec<StringUuid>,
}

/// Input for creating a role
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRoleInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(custom(function = "validate_application_scope"))]
    pub application_scope: String,
    pub permissions: Vec<String>,
}

/// Input for updating a role; `None` fields keep their existing value
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateRoleInput {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(custom(function = "validate_application_scope"))]
    pub application_scope: Option<String>,
    pub permissions: Option<Vec<String>>,
}

/// Input for assigning roles to an identity
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AssignRolesInput {
    pub identity_id: Uuid,
    pub role_ids: Vec<Uuid>,
}

/// Validate an application scope: a lower-case tenant token or the wildcard
fn validate_application_scope(scope: &str) -> Result<(), validator::ValidationError> {
    if scope == WILDCARD_SCOPE || APPLICATION_SCOPE_REGEX.is_match(scope) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_application_scope"))
    }
}

lazy_static::lazy_static! {
    static ref APPLICATION_SCOPE_REGEX: regex::Regex =
        regex::Regex::new(r"^[a-z][a-z0-9-]*$").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_applies_to_exact_scope() {
        let role = Role {
            application_scope: "cms".to_string(),
            ..Default::default()
        };

        assert!(role.applies_to("cms"));
        assert!(!role.applies_to("billing"));
    }

    #[test]
    fn test_role_scope_no_partial_similarity() {
        let role = Role {
            application_scope: "cms".to_string(),
            ..Default::default()
        };

        assert!(!role.applies_to("cms2"));
        assert!(!role.applies_to("cm"));
    }

    #[test]
    fn test_wildcard_scoped_role_applies_everywhere() {
        let role = Role {
            application_scope: WILDCARD_SCOPE.to_string(),
            ..Default::default()
        };

        assert!(role.applies_to("cms"));
        assert!(role.applies_to("billing"));
        assert!(role.applies_to(WILDCARD_SCOPE));
    }

    #[test]
    fn test_concrete_role_does_not_match_wildcard_query() {
        let role = Role {
            application_scope: "cms".to_string(),
            ..Default::default()
        };

        // A check explicitly issued against the wildcard scope only matches
        // wildcard-scoped roles.
        assert!(!role.applies_to(WILDCARD_SCOPE));
    }

    #[test]
    fn test_create_role_input_valid() {
        let input = CreateRoleInput {
            name: "editor".to_string(),
            application_scope: "cms".to_string(),
            permissions: vec!["content:read".to_string(), "content:update".to_string()],
        };

        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_create_role_input_wildcard_scope() {
        let input = CreateRoleInput {
            name: "superadmin".to_string(),
            application_scope: "*".to_string(),
            permissions: vec!["*:*".to_string()],
        };

        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_create_role_input_empty_name() {
        let input = CreateRoleInput {
            name: "".to_string(),
            application_scope: "cms".to_string(),
            permissions: vec![],
        };

        assert!(input.validate().is_err());
    }

    #[test]
    fn test_create_role_input_bad_scope() {
        for scope in ["CMS", "two words", "", "-cms"] {
            let input = CreateRoleInput {
                name: "editor".to_string(),
                application_scope: scope.to_string(),
                permissions: vec![],
            };
            assert!(input.validate().is_err(), "scope `{}` should fail", scope);
        }
    }

    #[test]
    fn test_update_role_input_partial() {
        let input = UpdateRoleInput {
            name: None,
            application_scope: Some("billing".to_string()),
            permissions: None,
        };

        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_role_serialization() {
        let role = Role {
            name: "editor".to_string(),
            application_scope: "cms".to_string(),
            permissions: vec!["content:read".to_string()],
            ..Default::default()
        };

        let json = serde_json::to_string(&role).unwrap();
        let back: Role = serde_json::from_str(&json).unwrap();

        assert_eq!(back.name, "editor");
        assert_eq!(back.permissions, vec!["content:read"]);
    }
}
