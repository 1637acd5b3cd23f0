use anyhow::Result;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::error::AuthError;
use crate::models::{Role, Session, User};
use crate::store::credentials::{normalize_username, CredentialStore};

/// Credential table cached in memory. Once the TTL elapses the file is hashed
/// again and reloaded only if its content changed, so edits show up within one
/// TTL without a restart.
pub struct CredentialCache {
    store: CredentialStore,
    ttl: Duration,
    users: HashMap<String, User>,
    fingerprint: Option<String>,
    loaded_at: Option<Instant>,
}

impl CredentialCache {
    pub fn new(store: CredentialStore, ttl: Duration) -> Self {
        CredentialCache {
            store,
            ttl,
            users: HashMap::new(),
            fingerprint: None,
            loaded_at: None,
        }
    }

    pub fn users(&mut self) -> Result<&HashMap<String, User>> {
        self.refresh()?;
        Ok(&self.users)
    }

    fn refresh(&mut self) -> Result<()> {
        if let Some(at) = self.loaded_at {
            if at.elapsed() < self.ttl {
                return Ok(());
            }
        }

        let fingerprint = self.store.fingerprint()?;
        if self.loaded_at.is_some() && fingerprint == self.fingerprint {
            self.loaded_at = Some(Instant::now());
            return Ok(());
        }

        debug!(path = %self.store.path().display(), "loading credentials");
        self.users = self.store.load()?;
        self.fingerprint = fingerprint;
        self.loaded_at = Some(Instant::now());
        Ok(())
    }

    /// Checks a username/password pair. Usernames are case-insensitive,
    /// passwords are compared exactly.
    pub fn authenticate(&mut self, username: &str, password: &str) -> Result<Session, AuthError> {
        let key = normalize_username(username);
        let users = self.users()?;
        match users.get(&key) {
            Some(user) if user.password == password => {
                info!(username = %key, role = %user.role, "login succeeded");
                Ok(Session {
                    username: key,
                    role: user.role,
                })
            }
            _ => {
                warn!(username = %key, "login rejected");
                Err(AuthError::InvalidCredentials)
            }
        }
    }
}

/// Fails unless a session exists and its role passes `allowed`.
pub fn require_role(
    session: Option<&Session>,
    action: &'static str,
    allowed: impl Fn(Role) -> bool,
) -> Result<Session, AuthError> {
    let session = session.ok_or(AuthError::NotLoggedIn)?;
    if !allowed(session.role) {
        return Err(AuthError::Forbidden {
            role: session.role,
            action,
        });
    }
    Ok(session.clone())
}
