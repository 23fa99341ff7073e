//! Session store: who is logged in right now.
//!
//! A [`Session`] is an ordinary value built from a [`KeyValueStore`] and
//! handed to whoever needs it. The token is mirrored into the store so the
//! next process start picks it up; the user snapshot is memory-only and has
//! to be fetched again after a restart.

use std::sync::Arc;

use cloudbp_common::User;

use crate::error::{Error, Result};
use crate::storage::{KeyValueStore, TOKEN_KEY};

pub struct Session {
    store: Arc<dyn KeyValueStore>,
    token: Option<String>,
    user: Option<User>,
}

impl Session {
    /// Seed a session from durable storage. The user is always absent.
    ///
    /// An unreadable store loads as anonymous, so the caller can still log
    /// in or out and overwrite the bad entry.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let token = match store.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!("Ignoring stored token: {}", e);
                None
            }
        };
        tracing::debug!(authenticated = token.is_some(), "Loaded session");
        Ok(Self {
            store,
            token,
            user: None,
        })
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Store a new bearer token, replacing any previous one.
    ///
    /// The token is persisted before it is adopted in memory, so a storage
    /// failure leaves the session unchanged.
    pub fn set_token(&mut self, token: impl Into<String>) -> Result<()> {
        let token = token.into();
        if token.is_empty() {
            return Err(Error::InvalidInput("token must not be empty".to_string()));
        }

        self.store.set(TOKEN_KEY, &token)?;
        if !self.is_authenticated() {
            tracing::info!("Session authenticated");
        }
        self.token = Some(token);
        Ok(())
    }

    /// Replace the cached user profile. Requires a token.
    pub fn set_user(&mut self, user: User) -> Result<()> {
        if !self.is_authenticated() {
            return Err(Error::NotAuthenticated);
        }
        self.user = Some(user);
        Ok(())
    }

    /// Forget the user and token, in memory and on disk.
    ///
    /// In-memory state is cleared even if the durable entry cannot be
    /// removed; the storage error is still returned.
    pub fn logout(&mut self) -> Result<()> {
        let was_authenticated = self.is_authenticated();
        self.user = None;
        self.token = None;
        self.store.remove(TOKEN_KEY)?;
        if was_authenticated {
            tracing::info!("Session cleared");
        }
        Ok(())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .field("user", &self.user.as_ref().map(|u| &u.username))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStore, MemoryStore};
    use cloudbp_common::Role;

    fn user(id: u64) -> User {
        User {
            id,
            username: format!("user{}", id),
            email: format!("user{}@example.com", id),
            role: Role::User,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
            phone: None,
            real_name: None,
            avatar: None,
        }
    }

    fn empty() -> (Arc<MemoryStore>, Session) {
        let store = Arc::new(MemoryStore::new());
        let session = Session::load(store.clone()).unwrap();
        (store, session)
    }

    #[test]
    fn test_full_lifecycle() {
        let (store, mut session) = empty();
        assert!(!session.is_authenticated());
        assert!(session.token().is_none());

        session.set_token("t1").unwrap();
        assert!(session.is_authenticated());
        assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("t1"));

        session.set_user(user(1)).unwrap();
        assert_eq!(session.user().unwrap().id, 1);
        assert!(session.is_authenticated());

        session.logout().unwrap();
        assert!(session.user().is_none());
        assert!(session.token().is_none());
        assert!(!session.is_authenticated());
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_reload_restores_token_but_not_user() {
        let (store, mut session) = empty();
        session.set_token("abc").unwrap();
        session.set_user(user(2)).unwrap();

        let reloaded = Session::load(store).unwrap();
        assert!(reloaded.is_authenticated());
        assert_eq!(reloaded.token(), Some("abc"));
        assert!(reloaded.user().is_none());
    }

    #[test]
    fn test_empty_stored_token_is_anonymous() {
        let store = Arc::new(MemoryStore::new());
        store.set(TOKEN_KEY, "").unwrap();
        let session = Session::load(store).unwrap();
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_empty_token_rejected() {
        let (store, mut session) = empty();
        session.set_token("keep").unwrap();

        let err = session.set_token("").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(session.token(), Some("keep"));
        assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("keep"));
    }

    #[test]
    fn test_set_token_is_idempotent_and_overwrites() {
        let (store, mut session) = empty();
        session.set_token("a").unwrap();
        session.set_token("a").unwrap();
        assert_eq!(session.token(), Some("a"));

        session.set_token("b").unwrap();
        assert_eq!(session.token(), Some("b"));
        assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("b"));
    }

    #[test]
    fn test_set_user_never_touches_token() {
        let (store, mut session) = empty();
        session.set_token("t").unwrap();
        session.set_user(user(1)).unwrap();
        session.set_user(user(2)).unwrap();
        assert_eq!(session.user().unwrap().id, 2);
        assert_eq!(session.token(), Some("t"));
        assert!(session.is_authenticated());
        assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("t"));
    }

    #[test]
    fn test_set_user_requires_token() {
        let (_store, mut session) = empty();
        let err = session.set_user(user(1)).unwrap_err();
        assert!(matches!(err, Error::NotAuthenticated));
        assert!(session.user().is_none());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_logout_is_idempotent() {
        let (store, mut session) = empty();
        session.logout().unwrap();
        session.set_token("x").unwrap();
        session.logout().unwrap();
        session.logout().unwrap();
        assert!(!session.is_authenticated());
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_auth_flag_tracks_token_over_sequences() {
        let (store, mut session) = empty();
        let steps: &[Option<&str>] = &[
            Some("a"),
            None,
            None,
            Some("b"),
            Some("c"),
            None,
            Some("d"),
        ];
        for step in steps {
            match step {
                Some(t) => session.set_token(*t).unwrap(),
                None => session.logout().unwrap(),
            }
            assert_eq!(session.is_authenticated(), session.token().is_some());
            assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), session.token());
        }
    }

    #[test]
    fn test_independent_sessions_do_not_interfere() {
        let (_a_store, mut a) = empty();
        let (_b_store, b) = empty();
        a.set_token("only-a").unwrap();
        assert!(a.is_authenticated());
        assert!(!b.is_authenticated());
    }

    #[test]
    fn test_corrupt_token_file_loads_anonymous_and_logs_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, r#"{"token": 1}"#).unwrap();

        let store = Arc::new(FileStore::new(&path));
        let mut session = Session::load(store.clone()).unwrap();
        assert!(!session.is_authenticated());

        session.logout().unwrap();
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);

        session.set_token("fresh").unwrap();
        let reloaded = Session::load(store).unwrap();
        assert_eq!(reloaded.token(), Some("fresh"));
    }

    #[test]
    fn test_debug_hides_token() {
        let (_store, mut session) = empty();
        session.set_token("secret-token").unwrap();
        let out = format!("{:?}", session);
        assert!(!out.contains("secret-token"));
    }
}
