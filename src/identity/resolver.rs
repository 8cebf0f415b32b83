//! Privilege resolution: user id -> identity + roles + flattened privilege set.
//!
//! Every call performs fresh lookups; a context is resolved once per request, so a
//! revocation takes effect on the next request. Each lookup runs under the resolver's
//! timeout and any failure yields an error, never a context with fewer privileges.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use super::principal::{AuthContext, AuthUser};
use super::privilege::Privilege;
use super::provider::{IdentityStore, RoleStore};

pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("user '{0}' not found")]
    NotFound(String),
    #[error("identity lookup timed out after {0:?}")]
    Timeout(Duration),
    #[error("identity lookup failed: {0}")]
    Store(String),
}

#[derive(Clone)]
pub struct PrivilegeResolver {
    identities: Arc<dyn IdentityStore>,
    roles: Arc<dyn RoleStore>,
    timeout: Duration,
}

impl PrivilegeResolver {
    pub fn new(identities: Arc<dyn IdentityStore>, roles: Arc<dyn RoleStore>) -> Self {
        Self { identities, roles, timeout: DEFAULT_LOOKUP_TIMEOUT }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration { self.timeout }

    pub async fn resolve(&self, user_id: &str) -> Result<AuthContext, ResolveError> {
        let user = self
            .bounded(self.identities.lookup_user(user_id))
            .await?
            .ok_or_else(|| ResolveError::NotFound(user_id.to_string()))?;
        self.complete(user).await
    }

    /// Used by login, which only knows the address the caller typed.
    pub async fn resolve_by_email(&self, email: &str) -> Result<AuthContext, ResolveError> {
        let email = email.trim().to_lowercase();
        let user = self
            .bounded(self.identities.lookup_user_by_email(&email))
            .await?
            .ok_or_else(|| ResolveError::NotFound(email.clone()))?;
        self.complete(user).await
    }

    async fn complete(&self, user: AuthUser) -> Result<AuthContext, ResolveError> {
        let roles = self.bounded(self.roles.roles_of(&user.id)).await?;
        let keys = self.bounded(self.roles.privileges_of(&user.id)).await?;
        let privileges = parse_privileges(&user.id, keys);
        debug!(user = %user.id, roles = roles.len(), privileges = privileges.len(), "resolved auth context");
        Ok(AuthContext::new(user, roles, privileges))
    }

    async fn bounded<T, F>(&self, lookup: F) -> Result<T, ResolveError>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        match tokio::time::timeout(self.timeout, lookup).await {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(e)) => {
                warn!("identity lookup failed: {:#}", e);
                Err(ResolveError::Store(e.to_string()))
            }
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "identity lookup timed out");
                Err(ResolveError::Timeout(self.timeout))
            }
        }
    }
}

// Keys the engine does not know grant nothing.
fn parse_privileges(user_id: &str, keys: Vec<String>) -> BTreeSet<Privilege> {
    keys.into_iter()
        .filter_map(|k| match k.parse::<Privilege>() {
            Ok(p) => Some(p),
            Err(e) => {
                warn!(user = %user_id, "dropping privilege: {}", e);
                None
            }
        })
        .collect()
}
