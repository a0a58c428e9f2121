use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Who a bearer token belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Admin {
        id: i64,
        username: String,
        role: String,
    },
    Customer {
        id: i64,
        email: String,
        name: String,
    },
}

struct SessionEntry {
    identity: Identity,
    expires_at: Instant,
}

/// In-memory bearer-token sessions with a fixed TTL. Expired entries are
/// dropped lazily on lookup and in bulk by the periodic sweeper.
pub struct SessionStore {
    ttl: Duration,
    entries: Mutex<HashMap<String, SessionEntry>>,
}

impl SessionStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn issue(&self, identity: Identity) -> String {
        let token = Uuid::new_v4().simple().to_string();
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                token.clone(),
                SessionEntry {
                    identity,
                    expires_at: Instant::now() + self.ttl,
                },
            );
        }
        token
    }

    pub fn resolve(&self, token: &str) -> Option<Identity> {
        let mut entries = self.entries.lock().ok()?;
        match entries.get(token) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.identity.clone()),
            Some(_) => {
                entries.remove(token);
                None
            }
            None => None,
        }
    }

    pub fn revoke(&self, token: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(token);
        }
    }

    /// Drops every expired entry; returns how many were removed.
    pub fn sweep(&self) -> usize {
        let Ok(mut entries) = self.entries.lock() else {
            return 0;
        };
        let before = entries.len();
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Identity {
        Identity::Admin {
            id: 1,
            username: "admin".to_string(),
            role: "admin".to_string(),
        }
    }

    #[test]
    fn issued_tokens_resolve_until_revoked() {
        let store = SessionStore::new(Duration::from_secs(60));
        let token = store.issue(admin());
        assert_eq!(store.resolve(&token), Some(admin()));
        store.revoke(&token);
        assert_eq!(store.resolve(&token), None);
    }

    #[test]
    fn expired_tokens_fail_resolution_and_get_swept() {
        let store = SessionStore::new(Duration::ZERO);
        let token = store.issue(admin());
        assert_eq!(store.resolve(&token), None);

        let another = store.issue(admin());
        assert_eq!(store.sweep(), 1);
        assert!(store.resolve(&another).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn tokens_are_unique_per_issue() {
        let store = SessionStore::new(Duration::from_secs(60));
        let a = store.issue(admin());
        let b = store.issue(admin());
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }
}
