use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::privilege::Privilege;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Per-request snapshot of who the caller is and what they may do. Built once by the
/// resolver and discarded with the request; it is never persisted.
///
/// `roles` is for display only. Decisions read `privileges` exclusively.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthContext {
    pub user: AuthUser,
    #[serde(default)]
    pub roles: BTreeSet<String>,
    #[serde(default)]
    pub privileges: BTreeSet<Privilege>,
}

impl AuthContext {
    pub fn new(user: AuthUser, roles: impl IntoIterator<Item = String>, privileges: impl IntoIterator<Item = Privilege>) -> Self {
        Self { user, roles: roles.into_iter().collect(), privileges: privileges.into_iter().collect() }
    }

    pub fn has(&self, privilege: Privilege) -> bool { self.privileges.contains(&privilege) }

    pub fn has_any(&self, privileges: &[Privilege]) -> bool { privileges.iter().any(|p| self.has(*p)) }

    pub fn owns(&self, owner_id: &str) -> bool { self.user.id == owner_id }
}
