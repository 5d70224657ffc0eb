use serde::Serialize;
use uuid::Uuid;

use crate::domain::value_objects::enums::roles::{Role, RoleSet};

/// Authenticated actor of a request. Anonymous requests carry `Option::None` instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    pub user_id: Uuid,
    pub email: String,
    pub roles: RoleSet,
}

impl Principal {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(role)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Id(Uuid),
    Text(String),
}

/// Declarative `field == value` restriction on the documents a principal may touch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryFilter {
    pub field: &'static str,
    pub equals: FilterValue,
}

impl QueryFilter {
    pub fn id(field: &'static str, id: Uuid) -> Self {
        Self {
            field,
            equals: FilterValue::Id(id),
        }
    }

    pub fn text(field: &'static str, value: impl Into<String>) -> Self {
        Self {
            field,
            equals: FilterValue::Text(value.into()),
        }
    }

    pub fn id_value(&self) -> Option<Uuid> {
        match self.equals {
            FilterValue::Id(id) => Some(id),
            FilterValue::Text(_) => None,
        }
    }
}

/// Outcome of a record-level access check.
#[derive(Debug, Clone, PartialEq)]
pub enum Access {
    Denied,
    All,
    Where(QueryFilter),
}
