//! Core service façade and bootstrap helpers.
//!
//! This crate wires the host-provided bridges (HTTP transport, credential
//! store) and the session components into a single [`AdminCore`] handle.
//! Desktop apps typically enable the `desktop-shims` feature, which makes
//! [`AdminCore::from_env`] fall back to the reqwest transport and the
//! file/keychain credential stores from `bridge-desktop`.
//!
//! ```no_run
//! # async fn example() -> core_service::Result<()> {
//! use core_service::AdminCore;
//!
//! let core = AdminCore::from_env()?;
//! let screen = core.start("/home").await?;
//! println!("showing {}", screen);
//! # Ok(())
//! # }
//! ```

pub mod error;

pub use error::{CoreError, Result};

use core_runtime::config::ClientConfig;
use core_runtime::events::{ClearReason, EventBus, EventStream};
use core_session::{
    ApiClient, ConnectivityState, CredentialStore, HealthProbe, SessionContext, SessionCredential,
    ToastCenter,
};
use std::sync::Arc;
use tracing::{info, instrument};

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct AdminCore {
    config: Arc<ClientConfig>,
    session: SessionContext,
    events: EventBus,
}

impl AdminCore {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_events(config, EventBus::default())
    }

    /// Build on an existing event bus, e.g. one already observed by the host.
    pub fn with_events(config: ClientConfig, events: EventBus) -> Self {
        let session = SessionContext::new(&config, events.clone());
        Self {
            config: Arc::new(config),
            session,
            events,
        }
    }

    /// Configuration from `API_BASE_URL`, `API_TIMEOUT_MS` and
    /// `APP_ENVIRONMENT`, with the platform default bridges.
    pub fn from_env() -> Result<Self> {
        let config = ClientConfig::from_env()?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Open the client at the URL path it was launched with.
    #[instrument(skip(self))]
    pub async fn start(&self, initial_path: &str) -> Result<String> {
        let shown = self.session.router().navigate_to_path(initial_path).await?;
        info!(route = %shown, "Client started");
        Ok(shown)
    }

    pub async fn navigate(&self, route: &str) -> Result<String> {
        Ok(self.session.router().navigate(route).await?)
    }

    pub async fn navigate_to_path(&self, path: &str) -> Result<String> {
        Ok(self.session.router().navigate_to_path(path).await?)
    }

    pub fn current_route(&self) -> Option<String> {
        self.session.router().current_route()
    }

    /// Persist the credential returned by a successful login and open the home screen.
    pub async fn sign_in(&self, credential: SessionCredential) -> Result<String> {
        self.session.credentials().store(&credential).await?;
        self.navigate(&self.config.home_route).await
    }

    /// Forget the stored credential and return to the login screen.
    pub async fn sign_out(&self) -> Result<String> {
        self.session
            .credentials()
            .clear(ClearReason::SignedOut)
            .await?;
        self.navigate(&self.config.login_route).await
    }

    pub fn api(&self) -> &ApiClient {
        self.session.api()
    }

    pub fn health(&self) -> &HealthProbe {
        self.session.probe()
    }

    pub fn connectivity(&self) -> &ConnectivityState {
        self.session.connectivity()
    }

    pub fn credentials(&self) -> &CredentialStore {
        self.session.credentials()
    }

    pub fn toasts(&self) -> &ToastCenter {
        self.session.toasts()
    }

    /// Host hard reloads so far; rebuild the UI root whenever it changes.
    pub fn reload_generation(&self) -> u64 {
        self.session.router().state().reload_generation()
    }

    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.events.subscribe())
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
    use bridge_traits::storage::SecureStore;
    use core_runtime::events::{CoreEvent, SessionEvent};
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct Backend;

    #[async_trait]
    impl HttpClient for Backend {
        async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
            Ok(HttpResponse::new(200, "{}"))
        }
    }

    #[derive(Default)]
    struct MemoryStore(Mutex<HashMap<String, Vec<u8>>>);

    #[async_trait]
    impl SecureStore for MemoryStore {
        async fn set_secret(&self, key: &str, value: &[u8]) -> BridgeResult<()> {
            self.0.lock().unwrap().insert(key.to_string(), value.to_vec());
            Ok(())
        }

        async fn get_secret(&self, key: &str) -> BridgeResult<Option<Vec<u8>>> {
            Ok(self.0.lock().unwrap().get(key).cloned())
        }

        async fn delete_secret(&self, key: &str) -> BridgeResult<()> {
            self.0.lock().unwrap().remove(key);
            Ok(())
        }
    }

    fn core() -> AdminCore {
        let config = ClientConfig::builder()
            .base_url("http://localhost:8080/api")
            .http_client(Arc::new(Backend))
            .secure_store(Arc::new(MemoryStore::default()))
            .build()
            .unwrap();
        AdminCore::new(config)
    }

    #[tokio::test]
    async fn test_start_without_credential_lands_on_login() {
        let core = core();
        assert_eq!(core.start("/home").await.unwrap(), "login");
        assert_eq!(core.current_route().as_deref(), Some("login"));
    }

    #[tokio::test]
    async fn test_sign_in_and_out() {
        let core = core();
        let mut stream = core
            .subscribe()
            .filter(|event| matches!(event, CoreEvent::Session(_)));

        let shown = core
            .sign_in(SessionCredential::new("tok", Some("ref".to_string())))
            .await
            .unwrap();
        assert_eq!(shown, "home");
        assert!(core.credentials().has_credential().await.unwrap());

        let shown = core.sign_out().await.unwrap();
        assert_eq!(shown, "login");
        assert!(!core.credentials().has_credential().await.unwrap());

        assert_eq!(
            stream.drain(),
            vec![
                CoreEvent::Session(SessionEvent::CredentialStored),
                CoreEvent::Session(SessionEvent::CredentialCleared {
                    reason: ClearReason::SignedOut
                }),
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_start_path_is_a_session_error() {
        let core = core();
        let err = core.start("/nope").await.unwrap_err();
        assert!(matches!(err, CoreError::Session(_)));
    }

    #[test]
    fn test_missing_capability_maps_through() {
        let err: CoreError = core_runtime::Error::CapabilityMissing {
            capability: "HttpClient".to_string(),
            message: "inject one".to_string(),
        }
        .into();
        assert!(matches!(err, CoreError::CapabilityMissing { .. }));
    }
}
