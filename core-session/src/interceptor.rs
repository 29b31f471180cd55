//! Request and response interceptors
//!
//! Every call made through [`ApiClient`](crate::ApiClient) passes through both:
//!
//! ```text
//! HttpRequest ──> RequestInterceptor ──> HttpClient::execute ──> ResponseInterceptor ──> Result
//!                 (bearer header,                               (connectivity flags,
//!                  in-flight = true)                             toasts, 401 restart)
//! ```
//!
//! Neither interceptor retries or blocks.

use crate::connectivity::ConnectivityState;
use crate::credentials::CredentialStore;
use crate::error::{Result, SessionError};
use crate::paths::PublicPaths;
use bridge_traits::error::BridgeError;
use bridge_traits::http::{HttpRequest, HttpResponse};
use bridge_traits::navigation::Navigator;
use bridge_traits::notify::{NotificationSink, Severity};
use core_runtime::events::{ClearReason, CoreEvent, EventBus, SessionEvent};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const MSG_SERVER_UNAVAILABLE: &str = "Server unavailable. Check your connection.";
pub const MSG_SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";
pub const MSG_FORBIDDEN: &str = "You do not have permission to access this resource.";
pub const MSG_SERVER_ERROR: &str = "Server error. Please try again later.";
pub const MSG_UNEXPECTED: &str = "An unexpected error occurred.";

/// Attaches the bearer credential and marks a request as in flight
pub struct RequestInterceptor {
    credentials: CredentialStore,
    public_paths: Arc<PublicPaths>,
    connectivity: ConnectivityState,
}

impl RequestInterceptor {
    pub fn new(
        credentials: CredentialStore,
        public_paths: Arc<PublicPaths>,
        connectivity: ConnectivityState,
    ) -> Self {
        Self {
            credentials,
            public_paths,
            connectivity,
        }
    }

    /// Prepare an outgoing request.
    ///
    /// A credential that cannot be read is treated as absent.
    pub async fn intercept(&self, mut request: HttpRequest) -> HttpRequest {
        let path = request.path();

        if self.public_paths.is_public(&path) {
            debug!(path = %path, "Public path, sending without credential");
        } else {
            match self.credentials.token().await {
                Ok(Some(token)) => request = request.bearer_token(token),
                Ok(None) => debug!(path = %path, "No stored credential"),
                Err(e) => warn!(path = %path, error = %e, "Credential unreadable, sending without it"),
            }
        }

        self.connectivity.set_request_in_progress(true);
        request
    }

    /// A request could not be constructed; nothing is in flight.
    pub fn on_request_error(&self, error: SessionError) -> SessionError {
        self.connectivity.set_request_in_progress(false);
        debug!(error = %error, "Request construction failed");
        error
    }
}

/// Classifies outcomes and applies the global side effects
pub struct ResponseInterceptor {
    credentials: CredentialStore,
    public_paths: Arc<PublicPaths>,
    connectivity: ConnectivityState,
    notifier: Arc<dyn NotificationSink>,
    navigator: Arc<dyn Navigator>,
    events: EventBus,
    login_route: String,
    login_redirect_path: String,
}

impl ResponseInterceptor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        credentials: CredentialStore,
        public_paths: Arc<PublicPaths>,
        connectivity: ConnectivityState,
        notifier: Arc<dyn NotificationSink>,
        navigator: Arc<dyn Navigator>,
        events: EventBus,
        login_route: impl Into<String>,
        login_redirect_path: impl Into<String>,
    ) -> Self {
        Self {
            credentials,
            public_paths,
            connectivity,
            notifier,
            navigator,
            events,
            login_route: login_route.into(),
            login_redirect_path: login_redirect_path.into(),
        }
    }

    /// Decide the final outcome of the request sent to `path`.
    pub async fn intercept(
        &self,
        path: &str,
        outcome: std::result::Result<HttpResponse, BridgeError>,
    ) -> Result<HttpResponse> {
        self.connectivity.set_request_in_progress(false);

        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                warn!(path, error = %e, "No response received");
                self.connectivity.set_offline(true);
                self.notifier.notify(Severity::Error, MSG_SERVER_UNAVAILABLE);
                return Err(SessionError::Connectivity);
            }
        };

        // Any HTTP response proves the backend is reachable.
        self.connectivity.set_offline(false);

        if response.is_success() {
            debug!(path, status = response.status, "Request succeeded");
            return Ok(response);
        }

        let error = SessionError::from_response(&response);

        if self.public_paths.is_public(path) {
            debug!(path, status = response.status, "Public path failed, propagating as-is");
            return Err(error);
        }

        match &error {
            SessionError::Validation { message, .. } => {
                self.notifier.notify(Severity::Error, message);
            }
            SessionError::Unauthorized { .. } => self.handle_unauthorized(path).await,
            SessionError::Forbidden { .. } => {
                self.notifier.notify(Severity::Error, MSG_FORBIDDEN);
            }
            SessionError::Server { .. } => {
                self.notifier.notify(Severity::Error, MSG_SERVER_ERROR);
            }
            SessionError::Unclassified { response } => {
                let message = response
                    .message()
                    .unwrap_or_else(|| MSG_UNEXPECTED.to_string());
                self.notifier.notify(Severity::Error, &message);
            }
            _ => {}
        }

        debug!(path, status = response.status, error = %error, "Request failed");
        Err(error)
    }

    async fn handle_unauthorized(&self, path: &str) {
        let current = self.navigator.current_route();

        if current.as_deref() == Some(self.login_route.as_str()) {
            debug!(path, "401 on the login screen, absorbed");
            return;
        }

        info!(path, route = ?current, "Session expired, restarting at login");
        self.notifier.notify(Severity::Error, MSG_SESSION_EXPIRED);
        self.events
            .publish(CoreEvent::Session(SessionEvent::Expired { route: current }));

        if let Err(e) = self.credentials.clear(ClearReason::Unauthorized).await {
            error!(error = %e, "Failed to wipe expired credential");
        }

        self.navigator.hard_redirect(&self.login_redirect_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{SessionCredential, REFRESH_TOKEN_KEY, TOKEN_KEY};
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::http::HttpMethod;
    use bridge_traits::storage::SecureStore;
    use core_runtime::config::PathMatch;
    use mockall::mock;
    use mockall::predicate::eq;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    mock! {
        Sink {}

        impl NotificationSink for Sink {
            fn notify(&self, severity: Severity, message: &str);
        }
    }

    mock! {
        Nav {}

        impl Navigator for Nav {
            fn current_route(&self) -> Option<String>;
            fn hard_redirect(&self, path: &str);
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        storage: Mutex<HashMap<String, Vec<u8>>>,
    }

    #[async_trait]
    impl SecureStore for MemoryStore {
        async fn set_secret(&self, key: &str, value: &[u8]) -> BridgeResult<()> {
            self.storage
                .lock()
                .await
                .insert(key.to_string(), value.to_vec());
            Ok(())
        }

        async fn get_secret(&self, key: &str) -> BridgeResult<Option<Vec<u8>>> {
            Ok(self.storage.lock().await.get(key).cloned())
        }

        async fn delete_secret(&self, key: &str) -> BridgeResult<()> {
            self.storage.lock().await.remove(key);
            Ok(())
        }
    }

    fn public_paths() -> Arc<PublicPaths> {
        Arc::new(PublicPaths::new(
            ["/password/send-reset-code", "/password/update-password"],
            PathMatch::Substring,
        ))
    }

    async fn signed_in_store() -> (Arc<MemoryStore>, CredentialStore) {
        let store = Arc::new(MemoryStore::default());
        let credentials = CredentialStore::new(store.clone(), EventBus::default());
        credentials
            .store(&SessionCredential::new("t-1", Some("r-1".to_string())))
            .await
            .unwrap();
        (store, credentials)
    }

    fn response_interceptor(
        credentials: CredentialStore,
        connectivity: ConnectivityState,
        sink: MockSink,
        nav: MockNav,
    ) -> ResponseInterceptor {
        ResponseInterceptor::new(
            credentials,
            public_paths(),
            connectivity,
            Arc::new(sink),
            Arc::new(nav),
            EventBus::default(),
            "login",
            "/login",
        )
    }

    #[tokio::test]
    async fn test_request_gets_bearer_token() {
        let (_, credentials) = signed_in_store().await;
        let connectivity = ConnectivityState::new(EventBus::default());
        let interceptor = RequestInterceptor::new(credentials, public_paths(), connectivity.clone());

        let request = interceptor
            .intercept(HttpRequest::new(HttpMethod::Get, "http://api.test/api/clientes"))
            .await;

        assert_eq!(request.authorization(), Some("Bearer t-1"));
        assert!(connectivity.is_request_in_progress());
    }

    #[tokio::test]
    async fn test_public_request_has_no_authorization() {
        let (_, credentials) = signed_in_store().await;
        let connectivity = ConnectivityState::new(EventBus::default());
        let interceptor = RequestInterceptor::new(credentials, public_paths(), connectivity.clone());

        let request = interceptor
            .intercept(HttpRequest::new(
                HttpMethod::Post,
                "http://api.test/api/password/send-reset-code?email=a",
            ))
            .await;

        assert_eq!(request.authorization(), None);
        assert!(connectivity.is_request_in_progress());
    }

    #[tokio::test]
    async fn test_on_request_error_clears_in_flight() {
        let credentials = CredentialStore::new(Arc::new(MemoryStore::default()), EventBus::default());
        let connectivity = ConnectivityState::new(EventBus::default());
        let interceptor = RequestInterceptor::new(credentials, public_paths(), connectivity.clone());
        connectivity.set_request_in_progress(true);

        let err = interceptor.on_request_error(SessionError::RequestBuild("bad url".to_string()));

        assert!(matches!(err, SessionError::RequestBuild(_)));
        assert!(!connectivity.is_request_in_progress());
    }

    #[tokio::test]
    async fn test_transport_failure_goes_offline_with_one_toast() {
        let (_, credentials) = signed_in_store().await;
        let connectivity = ConnectivityState::new(EventBus::default());
        connectivity.set_request_in_progress(true);

        let mut sink = MockSink::new();
        sink.expect_notify()
            .with(eq(Severity::Error), eq(MSG_SERVER_UNAVAILABLE))
            .times(1)
            .return_const(());
        let nav = MockNav::new();

        let interceptor = response_interceptor(credentials, connectivity.clone(), sink, nav);
        let err = interceptor
            .intercept("/clientes", Err(BridgeError::Timeout(5000)))
            .await
            .unwrap_err();

        assert!(err.is_connectivity());
        assert_eq!(err.to_string(), "Server unavailable.");
        assert!(connectivity.is_offline());
        assert!(!connectivity.is_request_in_progress());
    }

    #[tokio::test]
    async fn test_success_resets_offline() {
        let (_, credentials) = signed_in_store().await;
        let connectivity = ConnectivityState::new(EventBus::default());
        connectivity.set_offline(true);

        let interceptor =
            response_interceptor(credentials, connectivity.clone(), MockSink::new(), MockNav::new());
        let response = interceptor
            .intercept("/health", Ok(HttpResponse::new(200, "ok")))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert!(!connectivity.is_offline());
    }

    #[tokio::test]
    async fn test_unauthorized_off_login_wipes_and_restarts() {
        let (store, credentials) = signed_in_store().await;
        let connectivity = ConnectivityState::new(EventBus::default());

        let mut sink = MockSink::new();
        sink.expect_notify()
            .with(eq(Severity::Error), eq(MSG_SESSION_EXPIRED))
            .times(1)
            .return_const(());
        let mut nav = MockNav::new();
        nav.expect_current_route()
            .return_const(Some("clientes".to_string()));
        nav.expect_hard_redirect()
            .with(eq("/login"))
            .times(1)
            .return_const(());

        let interceptor = response_interceptor(credentials, connectivity, sink, nav);
        let err = interceptor
            .intercept("/clientes", Ok(HttpResponse::new(401, "")))
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::Unauthorized { .. }));
        let raw = store.storage.lock().await;
        assert!(!raw.contains_key(TOKEN_KEY));
        assert!(!raw.contains_key(REFRESH_TOKEN_KEY));
    }

    #[tokio::test]
    async fn test_unauthorized_on_login_is_absorbed() {
        let (store, credentials) = signed_in_store().await;
        let connectivity = ConnectivityState::new(EventBus::default());

        let mut sink = MockSink::new();
        sink.expect_notify().times(0);
        let mut nav = MockNav::new();
        nav.expect_current_route()
            .return_const(Some("login".to_string()));
        nav.expect_hard_redirect().times(0);

        let interceptor = response_interceptor(credentials, connectivity, sink, nav);
        let err = interceptor
            .intercept("/auth/login", Ok(HttpResponse::new(401, "")))
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::Unauthorized { .. }));
        assert!(store.storage.lock().await.contains_key(TOKEN_KEY));
    }

    #[tokio::test]
    async fn test_public_path_error_has_no_side_effects() {
        let (store, credentials) = signed_in_store().await;
        let connectivity = ConnectivityState::new(EventBus::default());

        let mut sink = MockSink::new();
        sink.expect_notify().times(0);
        let mut nav = MockNav::new();
        nav.expect_current_route().times(0);
        nav.expect_hard_redirect().times(0);

        let interceptor = response_interceptor(credentials, connectivity, sink, nav);
        let err = interceptor
            .intercept(
                "/password/update-password",
                Ok(HttpResponse::new(401, r#"{"message":"code expired"}"#)),
            )
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(401));
        assert_eq!(
            err.response().and_then(|r| r.message()).as_deref(),
            Some("code expired")
        );
        assert!(store.storage.lock().await.contains_key(TOKEN_KEY));
    }

    #[tokio::test]
    async fn test_validation_toast_joins_messages() {
        let (_, credentials) = signed_in_store().await;
        let mut sink = MockSink::new();
        sink.expect_notify()
            .with(eq(Severity::Error), eq("A\nB"))
            .times(1)
            .return_const(());

        let interceptor = response_interceptor(
            credentials,
            ConnectivityState::new(EventBus::default()),
            sink,
            MockNav::new(),
        );
        let err = interceptor
            .intercept("/clientes", Ok(HttpResponse::new(400, r#"{"errors":["A","B"]}"#)))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "A\nB");
    }

    #[tokio::test]
    async fn test_status_specific_toasts() {
        let cases = [
            (403, "", MSG_FORBIDDEN.to_string()),
            (500, "", MSG_SERVER_ERROR.to_string()),
            (502, "", MSG_SERVER_ERROR.to_string()),
            (404, r#"{"message":"Cliente not found"}"#, "Cliente not found".to_string()),
            (409, "conflict", MSG_UNEXPECTED.to_string()),
        ];

        for (status, body, expected) in cases {
            let (_, credentials) = signed_in_store().await;
            let mut sink = MockSink::new();
            sink.expect_notify()
                .with(eq(Severity::Error), eq(expected.clone()))
                .times(1)
                .return_const(());

            let interceptor = response_interceptor(
                credentials,
                ConnectivityState::new(EventBus::default()),
                sink,
                MockNav::new(),
            );
            let err = interceptor
                .intercept("/fornecedores", Ok(HttpResponse::new(status, body.to_string())))
                .await
                .unwrap_err();
            assert_eq!(err.status(), Some(status));
        }
    }

    #[tokio::test]
    async fn test_error_status_means_backend_reachable() {
        let (_, credentials) = signed_in_store().await;
        let connectivity = ConnectivityState::new(EventBus::default());
        connectivity.set_offline(true);

        let mut sink = MockSink::new();
        sink.expect_notify().return_const(());
        let interceptor =
            response_interceptor(credentials, connectivity.clone(), sink, MockNav::new());

        let _ = interceptor
            .intercept("/health", Ok(HttpResponse::new(503, "")))
            .await;

        assert!(!connectivity.is_offline());
    }
}
