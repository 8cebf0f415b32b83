use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use base64::Engine;
use parking_lot::RwLock;
use tracing::{debug, info};

pub type SessionToken = String;

/// A bearer session. It only remembers the subject; privileges are re-resolved on every
/// request so that role changes apply without re-login.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: SessionToken,
    pub user_id: String,
    pub issued_at: Instant,
    pub expires_at: Instant,
}

#[derive(Debug, Default)]
struct SessionTable {
    by_token: HashMap<SessionToken, Session>,
    by_user: HashMap<String, HashSet<SessionToken>>,
}

impl SessionTable {
    fn remove(&mut self, token: &str) -> Option<Session> {
        let sess = self.by_token.remove(token)?;
        if let Some(set) = self.by_user.get_mut(&sess.user_id) {
            set.remove(token);
            if set.is_empty() { self.by_user.remove(&sess.user_id); }
        }
        Some(sess)
    }

    fn purge_expired(&mut self, now: Instant) -> usize {
        let expired: Vec<SessionToken> =
            self.by_token.values().filter(|s| s.expires_at <= now).map(|s| s.token.clone()).collect();
        for token in &expired {
            self.remove(token);
        }
        expired.len()
    }
}

fn gen_token() -> anyhow::Result<SessionToken> {
    // 256-bit random token, base64url without padding
    let mut buf = [0u8; 32];
    getrandom::getrandom(&mut buf).map_err(|e| anyhow::anyhow!("token entropy unavailable: {}", e))?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf))
}

#[derive(Clone)]
pub struct SessionManager {
    pub ttl: Duration,
    table: Arc<RwLock<SessionTable>>,
}

impl Default for SessionManager {
    fn default() -> Self { Self::new(Duration::from_secs(7 * 24 * 60 * 60)) }
}

impl SessionManager {
    pub fn new(ttl: Duration) -> Self { Self { ttl, table: Arc::new(RwLock::new(SessionTable::default())) } }

    pub fn issue(&self, user_id: &str) -> anyhow::Result<Session> {
        let now = Instant::now();
        let token = gen_token()?;
        let sess = Session { token: token.clone(), user_id: user_id.to_string(), issued_at: now, expires_at: now + self.ttl };
        let purged = {
            let mut t = self.table.write();
            let purged = t.purge_expired(now);
            t.by_token.insert(token.clone(), sess.clone());
            t.by_user.entry(user_id.to_string()).or_default().insert(token);
            purged
        };
        if purged > 0 {
            debug!(purged, "session.purge");
        }
        info!(user = %user_id, ttl_secs = self.ttl.as_secs(), "session.issue");
        Ok(sess)
    }

    /// Returns the subject of a live session. Expired sessions are dropped on sight.
    pub fn validate(&self, token: &str) -> Option<String> {
        let now = Instant::now();
        let expired = {
            let t = self.table.read();
            match t.by_token.get(token) {
                Some(s) if s.expires_at > now => return Some(s.user_id.clone()),
                Some(_) => true,
                None => false,
            }
        };
        if expired {
            debug!("session.expired");
            self.logout(token);
        }
        None
    }

    pub fn logout(&self, token: &str) -> bool {
        self.table.write().remove(token).is_some()
    }

    pub fn revoke_user(&self, user_id: &str) -> usize {
        let mut t = self.table.write();
        let tokens = t.by_user.remove(user_id).unwrap_or_default();
        let count = tokens.iter().filter(|tok| t.by_token.remove(*tok).is_some()).count();
        info!(user = %user_id, count, "session.revoke");
        count
    }
}
