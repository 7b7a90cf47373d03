//! Login sessions
//!
//! A session is created by a successful login and identified by an opaque
//! bearer token. It ends on logout or when its lifetime runs out.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// The single configured login
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// An authenticated session
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Authentication error types
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingHeader,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Session expired")]
    SessionExpired,

    #[error("Invalid username or password")]
    InvalidCredentials,
}

/// Live sessions keyed by token
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<Uuid, Session>>,
    credentials: Arc<Credentials>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(credentials: Credentials, ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            credentials: Arc::new(credentials),
            ttl,
        }
    }

    /// Check credentials and open a new session
    pub fn login(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        if username != self.credentials.username || password != self.credentials.password {
            warn!(username = %username, "Rejected login");
            return Err(AuthError::InvalidCredentials);
        }

        let now = Utc::now();
        let session = Session {
            token: Uuid::new_v4(),
            username: username.to_string(),
            created_at: now,
            expires_at: now + self.ttl,
        };
        self.sessions.insert(session.token, session.clone());

        info!(username = %username, expires_at = %session.expires_at, "Session opened");
        Ok(session)
    }

    /// Look up a live session. Expired sessions are dropped on sight.
    pub fn get(&self, token: Uuid) -> Result<Session, AuthError> {
        let session = self
            .sessions
            .get(&token)
            .map(|s| s.value().clone())
            .ok_or(AuthError::InvalidToken)?;

        if session.is_expired(Utc::now()) {
            self.sessions.remove(&token);
            debug!(username = %session.username, "Session expired");
            return Err(AuthError::SessionExpired);
        }
        Ok(session)
    }

    /// End a session; returns false if it was not open
    pub fn logout(&self, token: Uuid) -> bool {
        match self.sessions.remove(&token) {
            Some((_, session)) => {
                info!(username = %session.username, "Session closed");
                true
            }
            None => false,
        }
    }

    /// Drop every expired session
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, s| !s.is_expired(now));
        let purged = before.saturating_sub(self.sessions.len());
        if purged > 0 {
            debug!(purged, "Purged expired sessions");
        }
        purged
    }

    pub fn active(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn store(ttl: Duration) -> SessionStore {
        SessionStore::new(
            Credentials {
                username: "admin".into(),
                password: "1234".into(),
            },
            ttl,
        )
    }

    #[test]
    fn login_opens_a_session() {
        let sessions = store(Duration::hours(1));
        let session = assert_ok!(sessions.login("admin", "1234"));

        let found = assert_ok!(sessions.get(session.token));
        assert_eq!(found.username, "admin");
        assert_eq!(sessions.active(), 1);
    }

    #[test]
    fn wrong_credentials_are_rejected() {
        let sessions = store(Duration::hours(1));
        assert!(matches!(
            sessions.login("admin", "wrong"),
            Err(AuthError::InvalidCredentials)
        ));
        assert_err!(sessions.login("root", "1234"));
        assert_eq!(sessions.active(), 0);
    }

    #[test]
    fn logout_clears_the_session() {
        let sessions = store(Duration::hours(1));
        let session = sessions.login("admin", "1234").unwrap();

        assert!(sessions.logout(session.token));
        assert!(!sessions.logout(session.token));
        assert!(matches!(sessions.get(session.token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn expired_sessions_are_refused_and_purged() {
        let sessions = store(Duration::zero());
        let first = sessions.login("admin", "1234").unwrap();
        sessions.login("admin", "1234").unwrap();

        assert!(matches!(sessions.get(first.token), Err(AuthError::SessionExpired)));
        assert_eq!(sessions.purge_expired(), 1);
        assert_eq!(sessions.active(), 0);
    }
}
