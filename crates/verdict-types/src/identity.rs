use crate::version::Version;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The catalog collection an entity belongs to.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Policy,
    Condition,
    Action,
    Variable,
    Resolver,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            EntityKind::Policy => "policy",
            EntityKind::Condition => "condition",
            EntityKind::Action => "action",
            EntityKind::Variable => "variable",
            EntityKind::Resolver => "resolver",
        };
        f.write_str(token)
    }
}

/// Names a catalog entity: a required id plus an optional version.
///
/// The uniqueness key within a catalog is `(kind, id, version)`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
}

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: None,
        }
    }

    pub fn versioned(id: impl Into<String>, version: Version) -> Self {
        Self {
            id: id.into(),
            version: Some(version),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.id.trim().is_empty()
    }

    /// The `id[:version]` string used for cache keys and audit paths.
    pub fn key(&self) -> String {
        match &self.version {
            Some(v) => format!("{}:{}", self.id, v),
            None => self.id.clone(),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// An edge descriptor pointing at a catalog entity.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            version: None,
        }
    }

    pub fn versioned(kind: EntityKind, id: impl Into<String>, version: Version) -> Self {
        Self {
            kind,
            id: id.into(),
            version: Some(version),
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}:{}:{}", self.kind, self.id, v),
            None => write!(f, "{}:{}", self.kind, self.id),
        }
    }
}

/// How a label query matches against an entity's label set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum LabelLogic {
    /// At least one queried label is present.
    AnyOf,
    /// Every queried label is present.
    AllOf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_key_includes_version() {
        assert_eq!(Identity::new("p1").key(), "p1");
        assert_eq!(
            Identity::versioned("p1", Version::new(1, 2, 0)).key(),
            "p1:1.2.0"
        );
    }

    #[test]
    fn blank_detection() {
        assert!(Identity::new("  ").is_blank());
        assert!(!Identity::new("p1").is_blank());
    }

    #[test]
    fn entity_ref_display() {
        let r = EntityRef::versioned(EntityKind::Condition, "c1", Version::new(2, 0, 0));
        assert_eq!(r.to_string(), "condition:c1:2.0.0");
        assert_eq!(
            EntityRef::new(EntityKind::Policy, "p1").to_string(),
            "policy:p1"
        );
    }
}
