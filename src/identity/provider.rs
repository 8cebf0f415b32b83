//! Collaborator seams for privilege resolution. Production deployments put a database
//! behind these traits; `DemoDirectory` is the in-memory implementation.

use anyhow::Result;
use async_trait::async_trait;

use super::principal::AuthUser;

#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn lookup_user(&self, user_id: &str) -> Result<Option<AuthUser>>;

    /// Emails compare case-insensitively.
    async fn lookup_user_by_email(&self, email: &str) -> Result<Option<AuthUser>>;
}

#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn roles_of(&self, user_id: &str) -> Result<Vec<String>>;

    /// Privilege keys reachable from every role the user holds, already flattened.
    /// Roles grant privileges directly; there is no role hierarchy.
    async fn privileges_of(&self, user_id: &str) -> Result<Vec<String>>;
}
