//! Session Credential Storage
//!
//! Persists the bearer token and refresh token under two fixed keys of the
//! host's [`SecureStore`].
//!
//! ## Security
//!
//! - Token values are never logged or exposed in error messages
//! - [`SessionCredential`]'s `Debug` output is redacted
//!
//! ## Example
//!
//! ```no_run
//! use core_session::{CredentialStore, SessionCredential};
//! use core_runtime::events::{ClearReason, EventBus};
//! use std::sync::Arc;
//! # use bridge_traits::storage::SecureStore;
//! # async fn example(secure_store: Arc<dyn SecureStore>) -> core_session::Result<()> {
//! let credentials = CredentialStore::new(secure_store, EventBus::default());
//!
//! credentials
//!     .store(&SessionCredential::new("token-value", Some("refresh-value".to_string())))
//!     .await?;
//! assert!(credentials.has_credential().await?);
//!
//! credentials.clear(ClearReason::SignedOut).await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{Result, SessionError};
use bridge_traits::storage::SecureStore;
use core_runtime::events::{ClearReason, CoreEvent, EventBus, SessionEvent};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Storage key of the bearer token.
pub const TOKEN_KEY: &str = "token";
/// Storage key of the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Bearer token plus optional refresh token
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredential {
    token: String,
    refresh_token: Option<String>,
}

impl SessionCredential {
    pub fn new(token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            token: token.into(),
            refresh_token,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }
}

impl fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredential")
            .field("token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Durable credential storage
///
/// Cheap to clone; all clones share the underlying store.
#[derive(Clone)]
pub struct CredentialStore {
    secure_store: Arc<dyn SecureStore>,
    events: EventBus,
}

impl CredentialStore {
    pub fn new(secure_store: Arc<dyn SecureStore>, events: EventBus) -> Self {
        Self {
            secure_store,
            events,
        }
    }

    /// Persist a credential, replacing any previous one
    ///
    /// A credential without refresh token removes a stale `refreshToken` entry.
    pub async fn store(&self, credential: &SessionCredential) -> Result<()> {
        self.secure_store
            .set_secret(TOKEN_KEY, credential.token.as_bytes())
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to store token");
                SessionError::Storage(e.to_string())
            })?;

        let refresh_result = match &credential.refresh_token {
            Some(refresh) => {
                self.secure_store
                    .set_secret(REFRESH_TOKEN_KEY, refresh.as_bytes())
                    .await
            }
            None => self.secure_store.delete_secret(REFRESH_TOKEN_KEY).await,
        };
        refresh_result.map_err(|e| {
            warn!(error = %e, "Failed to store refresh token");
            SessionError::Storage(e.to_string())
        })?;

        info!(
            has_refresh_token = credential.refresh_token.is_some(),
            "Session credential stored"
        );
        self.events
            .publish(CoreEvent::Session(SessionEvent::CredentialStored));

        Ok(())
    }

    /// Load the stored credential; `None` when no token is stored
    pub async fn load(&self) -> Result<Option<SessionCredential>> {
        let Some(token) = self.token().await? else {
            return Ok(None);
        };
        let refresh_token = self.refresh_token().await?;

        Ok(Some(SessionCredential {
            token,
            refresh_token,
        }))
    }

    pub async fn token(&self) -> Result<Option<String>> {
        self.read(TOKEN_KEY).await
    }

    pub async fn refresh_token(&self) -> Result<Option<String>> {
        self.read(REFRESH_TOKEN_KEY).await
    }

    /// Whether a usable bearer token is stored.
    ///
    /// An empty or non-UTF-8 entry does not count.
    pub async fn has_credential(&self) -> Result<bool> {
        Ok(self.token().await?.is_some())
    }

    /// Remove both keys
    ///
    /// Both deletions are attempted even if the first fails; the first error
    /// is returned.
    pub async fn clear(&self, reason: ClearReason) -> Result<()> {
        let token_result = self.secure_store.delete_secret(TOKEN_KEY).await;
        let refresh_result = self.secure_store.delete_secret(REFRESH_TOKEN_KEY).await;

        token_result
            .and(refresh_result)
            .map_err(|e| {
                warn!(error = %e, ?reason, "Failed to clear session credential");
                SessionError::Storage(e.to_string())
            })?;

        info!(?reason, "Session credential cleared");
        self.events
            .publish(CoreEvent::Session(SessionEvent::CredentialCleared { reason }));

        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Option<String>> {
        let Some(bytes) = self
            .secure_store
            .get_secret(key)
            .await
            .map_err(|e| SessionError::Storage(e.to_string()))?
        else {
            debug!(key, "No stored value");
            return Ok(None);
        };

        match String::from_utf8(bytes) {
            Ok(value) if value.is_empty() => {
                debug!(key, "Stored value is empty");
                Ok(None)
            }
            Ok(value) => Ok(Some(value)),
            Err(_) => {
                warn!(key, "Stored value is not valid UTF-8, ignoring it");
                Ok(None)
            }
        }
    }
}
