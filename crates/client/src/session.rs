//! Session store: current identity, token pair and active tenant.
//!
//! The store owns its state and writes every mutation through to a
//! [`Storage`] backend before returning. It is shared as `Arc<SessionStore>`
//! between the API client and the route guard.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use loyalty_auth::{AuthPayload, TokenPair, User};
use loyalty_core::TenantSlug;

use crate::storage::{Storage, StorageError};

/// Storage key of the persisted session blob.
pub const STORAGE_KEY: &str = "auth";

/// Snapshot of the session. All fields absent means "logged out".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub tokens: Option<TokenPair>,
    #[serde(default)]
    pub tenant: Option<TenantSlug>,
}

impl Session {
    pub fn is_empty(&self) -> bool {
        self.user.is_none() && self.tokens.is_none() && self.tenant.is_none()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.tokens
            .as_ref()
            .map(|t| t.access.as_str())
            .filter(|a| !a.is_empty())
    }
}

impl From<AuthPayload> for Session {
    fn from(payload: AuthPayload) -> Self {
        Self {
            user: Some(payload.user),
            tokens: Some(payload.tokens),
            tenant: Some(payload.tenant),
        }
    }
}

pub struct SessionStore {
    storage: Arc<dyn Storage>,
    state: Mutex<Session>,
}

impl SessionStore {
    /// Create an empty, *unloaded* store.
    ///
    /// Most callers want [`SessionStore::open`]; this exists for code that
    /// deliberately works against persisted state without loading it.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            state: Mutex::new(Session::default()),
        }
    }

    /// Create a store and load the persisted session into it.
    ///
    /// This is the initialization phase: build the store with `open` before
    /// constructing the guard or API client that share it.
    pub fn open(storage: Arc<dyn Storage>) -> Self {
        let store = Self::new(storage);
        store.load();
        store
    }

    /// Replace in-memory state with the persisted blob.
    ///
    /// A missing, unreadable or corrupt blob yields an empty session; nothing
    /// is surfaced to the caller.
    pub fn load(&self) {
        let loaded = self.read_persisted().unwrap_or_default();
        tracing::debug!(
            has_user = loaded.user.is_some(),
            has_tokens = loaded.tokens.is_some(),
            tenant = loaded.tenant.as_ref().map(TenantSlug::as_str),
            "session loaded"
        );
        *self.state() = loaded;
    }

    /// Replace user, tokens and tenant together and persist.
    pub fn set_auth(&self, payload: AuthPayload) -> Result<(), StorageError> {
        let session = Session::from(payload);
        *self.state() = session.clone();
        tracing::info!(
            tenant = session.tenant.as_ref().map(TenantSlug::as_str),
            "session established"
        );
        self.persist(&session)
    }

    /// Replace only the token pair.
    ///
    /// `user` and `tenant` are kept; when the in-memory copies are unset (a
    /// store that was never loaded) the persisted values are adopted instead.
    pub fn update_tokens(&self, tokens: TokenPair) -> Result<(), StorageError> {
        let session = {
            let mut state = self.state();
            state.tokens = Some(tokens);
            if state.user.is_none() || state.tenant.is_none() {
                let stored = self.read_persisted().unwrap_or_default();
                if state.user.is_none() {
                    state.user = stored.user;
                }
                if state.tenant.is_none() {
                    state.tenant = stored.tenant;
                }
            }
            state.clone()
        };
        tracing::debug!("session tokens replaced");
        self.persist(&session)
    }

    /// Merge a re-fetched identity, keeping tokens and tenant.
    pub fn set_user(&self, user: User) -> Result<(), StorageError> {
        let session = {
            let mut state = self.state();
            state.user = Some(user);
            state.clone()
        };
        self.persist(&session)
    }

    /// Clear everything and drop the persisted blob.
    ///
    /// If the blob cannot be removed it is overwritten with an empty session,
    /// so the persisted-token fallback cannot bring the old tokens back. The
    /// removal error is still returned.
    pub fn logout(&self) -> Result<(), StorageError> {
        *self.state() = Session::default();
        tracing::info!("session cleared");
        self.storage.remove(STORAGE_KEY).inspect_err(|err| {
            tracing::warn!(error = %err, "failed to remove persisted session; blanking it");
            if let Err(err) = self.persist(&Session::default()) {
                tracing::warn!(error = %err, "failed to blank persisted session");
            }
        })
    }

    pub fn snapshot(&self) -> Session {
        self.state().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state().user.clone()
    }

    pub fn tenant(&self) -> Option<TenantSlug> {
        self.state().tenant.clone()
    }

    /// Current access token; falls back to the persisted copy when the
    /// in-memory session has none.
    pub fn access_token(&self) -> Option<String> {
        if let Some(access) = self.state().access_token() {
            return Some(access.to_string());
        }
        self.read_persisted()
            .and_then(|s| s.access_token().map(str::to_string))
    }

    /// Current refresh token, with the same persisted fallback as
    /// [`SessionStore::access_token`].
    pub fn refresh_token(&self) -> Option<String> {
        let in_memory = self.state().tokens.as_ref().map(|t| t.refresh.clone());
        in_memory
            .or_else(|| self.read_persisted().and_then(|s| s.tokens).map(|t| t.refresh))
            .filter(|r| !r.is_empty())
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    fn state(&self) -> MutexGuard<'_, Session> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_persisted(&self) -> Option<Session> {
        let raw = match self.storage.get(STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read persisted session");
                return None;
            }
        };

        match serde_json::from_str::<Session>(&raw) {
            Ok(session) => Some(session),
            Err(err) => {
                tracing::warn!(error = %err, "ignoring corrupt persisted session");
                None
            }
        }
    }

    fn persist(&self, session: &Session) -> Result<(), StorageError> {
        let raw = serde_json::to_string(session).map_err(|e| {
            StorageError::Unavailable(format!("failed to serialize session: {e}"))
        })?;
        self.storage.set(STORAGE_KEY, &raw)
    }
}

impl core::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionStore")
            .field("state", &*self.state())
            .finish_non_exhaustive()
    }
}
