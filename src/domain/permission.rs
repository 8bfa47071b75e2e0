//! Permission grammar and wildcard matching
//!
//! A permission is the wire form `"<resource>:<action>"` where each segment
//! is a lower-case token from the closed admin-backend vocabulary or the
//! wildcard `*`. The literal `"*:*"` is the universal grant. Every consumer
//! in the crate shares this one parse function and this one matching rule.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Wildcard token, valid in either segment position
pub const WILDCARD: &str = "*";

/// Segment separator in the wire form
pub const SEPARATOR: char = ':';

/// Resources the admin backend knows about
const RESOURCES: &[&str] = &[
    "content",
    "media",
    "video",
    "subscription",
    "promo",
    "user",
    "role",
    "application",
];

/// Actions the admin backend knows about
const ACTIONS: &[&str] = &["create", "read", "update", "delete", "publish", "export"];

/// One position of a permission: a concrete vocabulary token or the wildcard
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Segment {
    Wildcard,
    Token(String),
}

impl Segment {
    /// Whether a stored segment covers a required segment: exact token
    /// equality, or the stored segment is the wildcard.
    fn covers(&self, required: &Segment) -> bool {
        match self {
            Segment::Wildcard => true,
            Segment::Token(stored) => {
                matches!(required, Segment::Token(token) if token == stored)
            }
        }
    }

    fn as_str(&self) -> &str {
        match self {
            Segment::Wildcard => WILDCARD,
            Segment::Token(token) => token,
        }
    }
}

/// A parsed permission
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    /// The universal grant, wire form `"*:*"`
    Universal,
    /// A `(resource, action)` pair; at most one side is the wildcard
    Scoped { resource: Segment, action: Segment },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionParseError {
    #[error("expected exactly two non-empty `:`-separated segments")]
    Malformed,
    #[error("unknown resource token `{0}`")]
    UnknownResource(String),
    #[error("unknown action token `{0}`")]
    UnknownAction(String),
}

impl Permission {
    /// Strict parse, used at role-write time to reject malformed input
    /// before it is persisted.
    pub fn parse(s: &str) -> Result<Self, PermissionParseError> {
        let mut segments = s.split(SEPARATOR);
        let (resource, action) = match (segments.next(), segments.next(), segments.next()) {
            (Some(resource), Some(action), None) => (resource, action),
            _ => return Err(PermissionParseError::Malformed),
        };
        if resource.is_empty() || action.is_empty() {
            return Err(PermissionParseError::Malformed);
        }

        let resource = parse_segment(resource, RESOURCES)
            .ok_or_else(|| PermissionParseError::UnknownResource(resource.to_string()))?;
        let action = parse_segment(action, ACTIONS)
            .ok_or_else(|| PermissionParseError::UnknownAction(action.to_string()))?;

        match (resource, action) {
            (Segment::Wildcard, Segment::Wildcard) => Ok(Permission::Universal),
            (resource, action) => Ok(Permission::Scoped { resource, action }),
        }
    }

    /// True iff `s` is accepted by the grammar
    pub fn validate(s: &str) -> bool {
        Self::parse(s).is_ok()
    }

    /// Total parse for scanning stored role entries. A malformed entry is
    /// logged and treated as non-matching; it never aborts a check.
    pub fn parse_lenient(s: &str) -> Option<Self> {
        match Self::parse(s) {
            Ok(permission) => Some(permission),
            Err(err) => {
                tracing::warn!(
                    permission = s,
                    error = %err,
                    "skipping malformed stored permission"
                );
                None
            }
        }
    }

    /// The canonical matching rule: `self` (a stored permission) grants
    /// `required` when each stored segment equals the required segment or is
    /// the wildcard. `Universal` grants anything.
    pub fn grants(&self, required: &Permission) -> bool {
        let (stored_resource, stored_action) = self.segments();
        let (required_resource, required_action) = required.segments();
        stored_resource.covers(required_resource) && stored_action.covers(required_action)
    }

    pub fn is_universal(&self) -> bool {
        matches!(self, Permission::Universal)
    }

    fn segments(&self) -> (&Segment, &Segment) {
        match self {
            Permission::Universal => (&Segment::Wildcard, &Segment::Wildcard),
            Permission::Scoped { resource, action } => (resource, action),
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (resource, action) = self.segments();
        write!(f, "{}{}{}", resource.as_str(), SEPARATOR, action.as_str())
    }
}

fn parse_segment(token: &str, vocabulary: &[&str]) -> Option<Segment> {
    if token == WILDCARD {
        Some(Segment::Wildcard)
    } else if vocabulary.contains(&token) {
        Some(Segment::Token(token.to_string()))
    } else {
        None
    }
}
