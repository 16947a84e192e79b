//! Role/action/resource authorization engine
//!
//! Permissions resolve in two layers: a built-in per-role matrix and an
//! optional team-level override map (`action -> resource -> TriState`).
//! Override entries win verbatim, including explicit `Deny` and explicit
//! `Unset`; only absent entries fall through to the role defaults.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::DomainError;

/// Tri-state permission value, serialized as `true | false | null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriState {
    Allow,
    Deny,
    /// Defers to a lower-priority rule source.
    Unset,
}

impl TriState {
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

impl From<Option<bool>> for TriState {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => Self::Allow,
            Some(false) => Self::Deny,
            None => Self::Unset,
        }
    }
}

impl From<TriState> for Option<bool> {
    fn from(value: TriState) -> Self {
        match value {
            TriState::Allow => Some(true),
            TriState::Deny => Some(false),
            TriState::Unset => None,
        }
    }
}

impl Serialize for TriState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Option::<bool>::from(*self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TriState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Option::<bool>::deserialize(deserializer)?.into())
    }
}

/// Team-scoped authority level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full control including team rules and deletion
    Admin,
    /// Regular contributor
    #[default]
    Member,
    /// Read-only access
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
            Self::Viewer => "viewer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "member" => Some(Self::Member),
            "viewer" => Some(Self::Viewer),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-team rule overrides: `action -> resource -> TriState`.
///
/// Leaf values serialize as `true | false | null`; a `null` leaf is an
/// explicit `Unset` and still shadows the role default on lookup.
pub type CustomRules = BTreeMap<String, BTreeMap<String, TriState>>;

/// Actions known to the built-in matrix. Anything else resolves to Deny.
pub const ACTIONS: [&str; 4] = ["create", "read", "update", "delete"];

/// Resources known to the built-in matrix.
pub const RESOURCES: [&str; 3] = ["bucket", "file", "folder"];

fn default_value(role: Role, action: &str, resource: &str) -> TriState {
    let allowed = match role {
        Role::Admin => ACTIONS.contains(&action) && RESOURCES.contains(&resource),
        Role::Member => match action {
            "read" => RESOURCES.contains(&resource),
            "create" | "update" | "delete" => matches!(resource, "file" | "folder"),
            _ => false,
        },
        Role::Viewer => action == "read" && RESOURCES.contains(&resource),
    };

    if allowed { TriState::Allow } else { TriState::Deny }
}

/// Materialize the built-in matrix for a role.
pub fn default_matrix(role: Role) -> CustomRules {
    let mut matrix = CustomRules::new();
    for action in ACTIONS {
        let mut resources = BTreeMap::new();
        for resource in RESOURCES {
            resources.insert(resource.to_string(), default_value(role, action, resource));
        }
        matrix.insert(action.to_string(), resources);
    }
    matrix
}

/// Resolve a single (role, action, resource) lookup against the override
/// map and the built-in matrix.
///
/// An override entry is returned verbatim, even when it is `Deny` or an
/// explicit `Unset`; the fall-through to defaults happens only when the
/// entry is absent. Unknown actions resolve to `Deny`.
pub fn evaluate(role: Role, action: &str, resource: &str, overrides: &CustomRules) -> TriState {
    if let Some(value) = overrides.get(action).and_then(|r| r.get(resource)) {
        return *value;
    }

    default_value(role, action, resource)
}

/// True iff `evaluate` yields `Allow`.
pub fn can_perform(role: Role, action: &str, resource: &str, overrides: &CustomRules) -> bool {
    evaluate(role, action, resource, overrides).is_allow()
}

/// Whether a role may replace the team's override map.
pub fn can_modify_team_rules(role: Role) -> bool {
    matches!(role, Role::Admin)
}

/// Whether a role may set rule limits on the team.
pub fn can_set_rule_limits(role: Role) -> bool {
    matches!(role, Role::Admin)
}

/// Listing the effective rules is open to every role.
pub fn can_list_team_rules(_role: Role) -> bool {
    true
}

/// Validate an override map before it replaces the team's rules.
///
/// Keys outside the known action/resource sets are rejected so a typo
/// cannot silently deny everything through the unknown-action path.
pub fn validate_rules(rules: &CustomRules) -> Result<(), DomainError> {
    for (action, resources) in rules {
        if !ACTIONS.contains(&action.as_str()) {
            return Err(DomainError::validation(format!(
                "Unknown action '{}' in team rules",
                action
            )));
        }
        for resource in resources.keys() {
            if !RESOURCES.contains(&resource.as_str()) {
                return Err(DomainError::validation(format!(
                    "Unknown resource '{}' in team rules",
                    resource
                )));
            }
        }
    }
    Ok(())
}

/// Materialize the role's default matrix with override action keys merged
/// shallowly on top.
///
/// An override action key replaces the whole default resource map for that
/// action. This is intentionally coarser than `evaluate`, which checks
/// single resource leaves; both behaviors are load-bearing.
pub fn effective_rules(role: Role, overrides: &CustomRules) -> CustomRules {
    let mut rules = default_matrix(role);
    for (action, resources) in overrides {
        rules.insert(action.clone(), resources.clone());
    }
    rules
}
