//! Session store: the one place the current identity lives.
//!
//! A session is "authenticated" when both the credential marker and the
//! serialized identity are persisted. Both are written in one transaction so
//! a reader never observes one without the other.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, PersistenceError, Result};
use crate::serde_util::string_or_number;
use crate::storage::Database;

/// Key holding the credential marker.
pub const TOKEN_KEY: &str = "userToken";
/// Key holding the JSON-serialized [`Identity`].
pub const USER_KEY: &str = "userData";
/// Key holding the last email used for a successful login.
pub const REMEMBERED_EMAIL_KEY: &str = "wakapp_remembered_email";

/// Authentication is external; the marker only records that a session exists.
const SESSION_MARKER: &str = "session";

/// A user as known to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

/// Storage seam for [`Session`].
pub trait SessionBackend {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;

    /// Write every entry or none of them.
    fn write_all(&mut self, entries: &[(&str, &str)]) -> Result<(), PersistenceError>;

    fn remove_all(&mut self, keys: &[&str]) -> Result<(), PersistenceError>;
}

impl SessionBackend for Database {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.kv_get(key)?)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        Ok(self.kv_set(key, value)?)
    }

    fn write_all(&mut self, entries: &[(&str, &str)]) -> Result<(), PersistenceError> {
        Ok(self.kv_set_all(entries)?)
    }

    fn remove_all(&mut self, keys: &[&str]) -> Result<(), PersistenceError> {
        Ok(self.kv_delete_all(keys)?)
    }
}

/// The current identity plus the backend it is persisted in.
///
/// Pass a `Session` to every operation that needs to know who is acting;
/// several sessions can coexist (e.g. in tests).
pub struct Session<B = Database> {
    backend: B,
    identity: Option<Identity>,
}

impl<B: SessionBackend> Session<B> {
    /// Unauthenticated session over `backend`. Call [`Session::restore`] to
    /// pick up a previously persisted identity.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            identity: None,
        }
    }

    /// Build a session and immediately restore it.
    pub fn restored(backend: B) -> Self {
        let mut session = Self::new(backend);
        session.restore();
        session
    }

    pub fn current(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// The current identity, or `NotFound` when nobody is logged in.
    pub fn require(&self) -> Result<&Identity> {
        self.identity
            .as_ref()
            .ok_or_else(|| CoreError::not_found("session", "current"))
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Read the persisted session. Any failure is treated as "absent".
    pub fn restore(&mut self) -> Option<&Identity> {
        self.identity = match self.read_persisted() {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(error = %e, "session restore failed; treating as logged out");
                None
            }
        };
        self.identity.as_ref()
    }

    fn read_persisted(&self) -> Result<Option<Identity>, PersistenceError> {
        let token = self.backend.read(TOKEN_KEY)?;
        let data = self.backend.read(USER_KEY)?;
        match (token, data) {
            (Some(_), Some(data)) => serde_json::from_str(&data)
                .map(Some)
                .map_err(|source| PersistenceError::Corrupt {
                    key: USER_KEY.to_string(),
                    source,
                }),
            _ => Ok(None),
        }
    }

    /// Persist `identity` and mark the session authenticated.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` if the write fails; the previous session, in
    /// memory and in storage, is then left as it was.
    pub fn establish(&mut self, identity: Identity) -> Result<()> {
        let data = serde_json::to_string(&identity).map_err(|source| {
            PersistenceError::Corrupt {
                key: USER_KEY.to_string(),
                source,
            }
        })?;
        self.backend
            .write_all(&[(TOKEN_KEY, SESSION_MARKER), (USER_KEY, data.as_str())])?;

        tracing::info!(user_id = %identity.id, "session established");
        self.identity = Some(identity);
        Ok(())
    }

    /// Drop the session from memory and storage.
    ///
    /// The in-memory session is cleared even if removing the stored copy
    /// fails; the error is still returned so it can be reported.
    pub fn clear(&mut self) -> Result<()> {
        if let Some(identity) = self.identity.take() {
            tracing::info!(user_id = %identity.id, "session cleared");
        }
        self.backend.remove_all(&[TOKEN_KEY, USER_KEY])?;
        Ok(())
    }

    /// Swap the in-memory identity (profile edits). Storage is untouched.
    pub fn replace(&mut self, identity: Identity) -> Result<()> {
        match self.identity.as_mut() {
            Some(current) => {
                *current = identity;
                Ok(())
            }
            None => Err(CoreError::not_found("session", "current")),
        }
    }

    /// Best-effort: failures are logged and swallowed.
    pub fn remember_email(&mut self, email: &str) {
        if let Err(e) = self.backend.write(REMEMBERED_EMAIL_KEY, email) {
            tracing::warn!(error = %e, "could not save remembered email");
        }
    }

    /// Best-effort: failures are logged and read as "none".
    pub fn remembered_email(&self) -> Option<String> {
        match self.backend.read(REMEMBERED_EMAIL_KEY) {
            Ok(email) => email.filter(|e| !e.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "could not load remembered email");
                None
            }
        }
    }
}
