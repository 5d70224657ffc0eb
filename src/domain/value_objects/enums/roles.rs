use std::{collections::BTreeSet, fmt::Display};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Guest,
    Customer,
    Host,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Guest => "guest",
            Role::Customer => "customer",
            Role::Host => "host",
            Role::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "guest" => Some(Role::Guest),
            "customer" => Some(Role::Customer),
            "host" => Some(Role::Host),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of roles held by a user. Stored as a `text[]` column.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        Self(roles.into_iter().collect())
    }

    pub fn guest() -> Self {
        Self::new([Role::Guest])
    }

    /// Unknown role names are dropped.
    pub fn from_strings<S: AsRef<str>>(values: &[S]) -> Self {
        Self(values.iter().filter_map(|v| Role::parse(v.as_ref())).collect())
    }

    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(|role| role.to_string()).collect()
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn contains_any(&self, roles: &[Role]) -> bool {
        roles.iter().any(|role| self.0.contains(role))
    }

    /// Returns `true` when the role was not already present.
    pub fn insert(&mut self, role: Role) -> bool {
        self.0.insert(role)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Role> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_strings_ignores_unknown_roles() {
        let roles = RoleSet::from_strings(&["Admin", "customer", "superuser"]);

        assert!(roles.contains(Role::Admin));
        assert!(roles.contains(Role::Customer));
        assert_eq!(roles.to_strings(), vec!["customer", "admin"]);
    }

    #[test]
    fn insert_reports_new_roles_only() {
        let mut roles = RoleSet::guest();

        assert!(roles.insert(Role::Host));
        assert!(!roles.insert(Role::Host));
        assert!(roles.contains_any(&[Role::Admin, Role::Host]));
    }
}
