//! Session persistence across a durable and an ephemeral storage scope.
//!
//! A session is the (credential, profile) pair. It lives in exactly one
//! scope: saving always wipes both scopes before writing the chosen one, so
//! a stale credential can never shadow a fresh one. The credential is also
//! mirrored into a cookie so the edge layer can read it.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::config::keys;
use crate::error::Result;
use crate::models::UserProfile;
use crate::services::storage::{CookieJar, MemoryCookieJar, MemoryStorage, SessionCookie, Storage};
use crate::services::token;

/// How often a signed-in client re-checks its credential
pub const EXPIRY_WATCH_INTERVAL: Duration = Duration::from_secs(60);

/// Which scope holds the current session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageScope {
    Durable,
    Ephemeral,
}

/// Snapshot of the authentication state
#[derive(Debug, Clone, Serialize)]
pub struct AuthState {
    pub is_authenticated: bool,
    pub user: Option<UserProfile>,
    pub token: Option<String>,
}

#[derive(Clone)]
pub struct SessionStore {
    durable: Arc<dyn Storage>,
    ephemeral: Arc<dyn Storage>,
    cookies: Arc<dyn CookieJar>,
    secure_cookies: bool,
}

impl SessionStore {
    pub fn new(
        durable: Arc<dyn Storage>,
        ephemeral: Arc<dyn Storage>,
        cookies: Arc<dyn CookieJar>,
    ) -> Self {
        Self {
            durable,
            ephemeral,
            cookies,
            secure_cookies: false,
        }
    }

    /// Store backed entirely by memory
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(MemoryStorage::new()),
            Arc::new(MemoryCookieJar::new()),
        )
    }

    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    fn scope(&self, scope: StorageScope) -> &dyn Storage {
        match scope {
            StorageScope::Durable => self.durable.as_ref(),
            StorageScope::Ephemeral => self.ephemeral.as_ref(),
        }
    }

    /// Persist a session; `persistent` selects the durable scope
    pub fn save_session(&self, credential: &str, profile: &UserProfile, persistent: bool) -> Result<()> {
        let serialized = serde_json::to_string(profile)?;
        self.clear_storage();

        let target = if persistent {
            StorageScope::Durable
        } else {
            StorageScope::Ephemeral
        };
        let storage = self.scope(target);
        storage.set(keys::TOKEN, credential.to_string());
        storage.set(keys::USER, serialized);

        self.cookies
            .set(SessionCookie::token(credential, persistent).secure(self.secure_cookies));

        tracing::debug!(login = %profile.login, scope = ?target, "session saved");
        Ok(())
    }

    fn clear_storage(&self) {
        for storage in [self.durable.as_ref(), self.ephemeral.as_ref()] {
            storage.remove(keys::TOKEN);
            storage.remove(keys::USER);
        }
    }

    /// Remove the session from both scopes and drop the mirror cookie
    pub fn clear_session(&self) {
        self.clear_storage();
        self.cookies.remove(keys::TOKEN);
        self.cookies.remove(keys::USER);
        tracing::debug!("session cleared");
    }

    pub fn credential(&self) -> Option<String> {
        self.durable
            .get(keys::TOKEN)
            .or_else(|| self.ephemeral.get(keys::TOKEN))
    }

    pub fn profile(&self) -> Option<UserProfile> {
        let raw = self
            .durable
            .get(keys::USER)
            .or_else(|| self.ephemeral.get(keys::USER))?;

        match serde_json::from_str(&raw) {
            Ok(profile) => Some(profile),
            Err(e) => {
                tracing::warn!("Discarding unreadable stored profile: {}", e);
                None
            }
        }
    }

    /// Scope currently holding the credential
    pub fn active_scope(&self) -> Option<StorageScope> {
        if self.durable.get(keys::TOKEN).is_some() {
            Some(StorageScope::Durable)
        } else if self.ephemeral.get(keys::TOKEN).is_some() {
            Some(StorageScope::Ephemeral)
        } else {
            None
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated_at(Utc::now())
    }

    /// Credential present and unexpired; an expired one clears the session
    pub fn is_authenticated_at(&self, now: DateTime<Utc>) -> bool {
        let Some(credential) = self.credential() else {
            return false;
        };

        if token::is_expired_at(&credential, now) {
            tracing::info!("Stored credential expired, clearing session");
            self.clear_session();
            return false;
        }

        true
    }

    /// Re-check the credential every `every` and clear the session once it
    /// expires. Runs until the handle is aborted.
    pub fn spawn_expiry_watch(&self, every: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                store.is_authenticated();
            }
        })
    }

    pub fn auth_state(&self) -> AuthState {
        let is_authenticated = self.is_authenticated();
        AuthState {
            is_authenticated,
            user: self.profile(),
            token: self.credential(),
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::services::token::tests::{future_exp, past_exp, token_with};
    use serde_json::json;

    struct Fixture {
        durable: Arc<MemoryStorage>,
        ephemeral: Arc<MemoryStorage>,
        cookies: Arc<MemoryCookieJar>,
        store: SessionStore,
    }

    fn fixture() -> Fixture {
        let durable = Arc::new(MemoryStorage::new());
        let ephemeral = Arc::new(MemoryStorage::new());
        let cookies = Arc::new(MemoryCookieJar::new());
        let store = SessionStore::new(durable.clone(), ephemeral.clone(), cookies.clone());
        Fixture {
            durable,
            ephemeral,
            cookies,
            store,
        }
    }

    fn profile(login: &str) -> UserProfile {
        UserProfile {
            id: "1".to_string(),
            display_name: "Test User".to_string(),
            email: format!("{}@bioconnect.test", login),
            login: login.to_string(),
            role: Role::User,
            active: true,
            institution: None,
            course: None,
        }
    }

    #[test]
    fn test_save_get_clear_in_both_modes() {
        for persistent in [true, false] {
            let f = fixture();
            let token = token_with(json!({"sub": "alice", "exp": future_exp()}));
            f.store.save_session(&token, &profile("alice"), persistent).unwrap();

            assert_eq!(f.store.credential().as_deref(), Some(token.as_str()));
            assert_eq!(f.store.profile().unwrap().login, "alice");
            assert!(f.store.is_authenticated());

            f.store.clear_session();
            assert_eq!(f.store.credential(), None);
            assert_eq!(f.store.profile(), None);
            assert!(f.cookies.get(keys::TOKEN).is_none());
        }
    }

    #[test]
    fn test_save_uses_exactly_one_scope() {
        let f = fixture();
        let old = token_with(json!({"sub": "old", "exp": future_exp()}));
        let new = token_with(json!({"sub": "new", "exp": future_exp()}));

        f.store.save_session(&old, &profile("old"), true).unwrap();
        f.store.save_session(&new, &profile("new"), false).unwrap();

        assert!(f.durable.is_empty());
        assert_eq!(f.ephemeral.len(), 2);
        assert_eq!(f.store.active_scope(), Some(StorageScope::Ephemeral));
        assert_eq!(f.store.credential().as_deref(), Some(new.as_str()));
    }

    #[test]
    fn test_mirror_cookie_follows_persistence() {
        let f = fixture();
        let token = token_with(json!({"sub": "alice", "exp": future_exp()}));

        f.store.save_session(&token, &profile("alice"), true).unwrap();
        assert!(f.cookies.get(keys::TOKEN).unwrap().persistent);

        f.store.save_session(&token, &profile("alice"), false).unwrap();
        let cookie = f.cookies.get(keys::TOKEN).unwrap();
        assert!(!cookie.persistent);
        assert_eq!(cookie.value, token);
    }

    #[test]
    fn test_expired_credential_clears_session() {
        let f = fixture();
        let token = token_with(json!({"sub": "bob", "exp": past_exp()}));
        f.store.save_session(&token, &profile("bob"), true).unwrap();

        assert!(!f.store.is_authenticated());
        assert_eq!(f.store.credential(), None);
        assert!(f.durable.is_empty());
        assert!(f.ephemeral.is_empty());
    }

    #[test]
    fn test_durable_scope_wins_on_read() {
        let f = fixture();
        f.durable.set(keys::TOKEN, "durable".to_string());
        f.ephemeral.set(keys::TOKEN, "ephemeral".to_string());
        assert_eq!(f.store.credential().as_deref(), Some("durable"));
    }

    #[test]
    fn test_corrupt_profile_reads_as_absent() {
        let f = fixture();
        f.ephemeral.set(keys::USER, "{not json".to_string());
        assert_eq!(f.store.profile(), None);
    }

    #[test]
    fn test_auth_state_without_session() {
        let state = SessionStore::in_memory().auth_state();
        assert!(!state.is_authenticated);
        assert!(state.user.is_none());
        assert!(state.token.is_none());
    }

    #[tokio::test]
    async fn test_expiry_watch_clears_stale_session() {
        let f = fixture();
        let token = token_with(json!({"sub": "bob", "exp": past_exp()}));
        f.store.save_session(&token, &profile("bob"), true).unwrap();

        let watch = f.store.spawn_expiry_watch(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(60)).await;
        watch.abort();

        assert!(f.store.credential().is_none());
        assert!(f.durable.is_empty());
        assert!(f.cookies.get(keys::TOKEN).is_none());
    }

    #[tokio::test]
    async fn test_expiry_watch_keeps_live_session() {
        let f = fixture();
        let token = token_with(json!({"sub": "alice", "exp": future_exp()}));
        f.store.save_session(&token, &profile("alice"), false).unwrap();

        let watch = f.store.spawn_expiry_watch(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(40)).await;
        watch.abort();

        assert_eq!(f.store.credential().as_deref(), Some(token.as_str()));
        assert_eq!(f.store.active_scope(), Some(StorageScope::Ephemeral));
    }
}
