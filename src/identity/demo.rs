//! In-memory identity and role directory used for demo mode and tests.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::RwLock;

use super::principal::AuthUser;
use super::privilege::Privilege;
use super::provider::{IdentityStore, RoleStore};

pub const ROLE_USER: &str = "user";
pub const ROLE_MANAGER: &str = "manager";
pub const ROLE_ADMIN: &str = "admin";

const DEMO_USERS: [(&str, &str, &str, &str); 4] = [
    ("u_alice", "Alice", "alice@example.com", ROLE_USER),
    ("u_bob", "Bob", "bob@example.com", ROLE_USER),
    ("u_mona", "Mona", "mona@example.com", ROLE_MANAGER),
    ("u_ada", "Ada", "ada@example.com", ROLE_ADMIN),
];

const DEMO_ROLES: [(&str, &[Privilege]); 3] = [
    (ROLE_USER, &[Privilege::TodoCreateOwn, Privilege::TodoUpdateOwn, Privilege::TodoDeleteOwnDraft]),
    (ROLE_MANAGER, &[Privilege::TodoViewAll]),
    (ROLE_ADMIN, &[Privilege::TodoViewAll, Privilege::TodoDeleteAny]),
];

#[derive(Debug, Default)]
struct DirectoryData {
    users: BTreeMap<String, AuthUser>,
    // role name -> privilege keys, stored as keys the way role assignments are persisted
    roles: BTreeMap<String, BTreeSet<String>>,
    memberships: BTreeMap<String, BTreeSet<String>>,
}

#[derive(Debug, Default)]
pub struct DemoDirectory {
    data: RwLock<DirectoryData>,
}

impl DemoDirectory {
    pub fn new() -> Self { Self::default() }

    /// Alice and Bob are plain users, Mona a manager, Ada an admin.
    pub fn seeded() -> Self {
        let dir = Self::new();
        for (role, privileges) in DEMO_ROLES {
            dir.define_role(role, privileges.iter().map(|p| p.key()));
        }
        for (id, name, email, role) in DEMO_USERS {
            dir.add_user(AuthUser { id: id.into(), name: name.into(), email: Some(email.into()) });
            // roles above are always defined
            let _ = dir.assign_role(id, role);
        }
        dir
    }

    pub fn add_user(&self, user: AuthUser) {
        self.data.write().users.insert(user.id.clone(), user);
    }

    pub fn define_role<I, S>(&self, role: &str, privilege_keys: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: BTreeSet<String> = privilege_keys.into_iter().map(Into::into).collect();
        self.data.write().roles.insert(role.to_string(), keys);
    }

    pub fn assign_role(&self, user_id: &str, role: &str) -> Result<()> {
        let mut data = self.data.write();
        if !data.users.contains_key(user_id) { return Err(anyhow!("unknown user '{}'", user_id)); }
        if !data.roles.contains_key(role) { return Err(anyhow!("unknown role '{}'", role)); }
        data.memberships.entry(user_id.to_string()).or_default().insert(role.to_string());
        Ok(())
    }

    pub fn revoke_role(&self, user_id: &str, role: &str) -> bool {
        let mut data = self.data.write();
        data.memberships.get_mut(user_id).map(|set| set.remove(role)).unwrap_or(false)
    }

    pub fn users(&self) -> Vec<AuthUser> { self.data.read().users.values().cloned().collect() }
}

#[async_trait]
impl IdentityStore for DemoDirectory {
    async fn lookup_user(&self, user_id: &str) -> Result<Option<AuthUser>> {
        Ok(self.data.read().users.get(user_id).cloned())
    }

    async fn lookup_user_by_email(&self, email: &str) -> Result<Option<AuthUser>> {
        let data = self.data.read();
        let found = data
            .users
            .values()
            .find(|u| u.email.as_deref().map(|e| e.eq_ignore_ascii_case(email)).unwrap_or(false));
        Ok(found.cloned())
    }
}

#[async_trait]
impl RoleStore for DemoDirectory {
    async fn roles_of(&self, user_id: &str) -> Result<Vec<String>> {
        let data = self.data.read();
        Ok(data.memberships.get(user_id).map(|set| set.iter().cloned().collect()).unwrap_or_default())
    }

    async fn privileges_of(&self, user_id: &str) -> Result<Vec<String>> {
        let data = self.data.read();
        let Some(roles) = data.memberships.get(user_id) else { return Ok(Vec::new()); };
        let keys: BTreeSet<&String> = roles
            .iter()
            .filter_map(|r| data.roles.get(r))
            .flatten()
            .collect();
        Ok(keys.into_iter().cloned().collect())
    }
}
