use crate::client::ApiClient;
use crate::connectivity::ConnectivityState;
use crate::credentials::CredentialStore;
use crate::guard::{GuardPolicy, NavigationGuard};
use crate::interceptor::{RequestInterceptor, ResponseInterceptor};
use crate::notifications::ToastCenter;
use crate::paths::PublicPaths;
use crate::probe::HealthProbe;
use crate::router::Router;
use crate::routes::{RouteTable, RouterState};
use core_runtime::config::ClientConfig;
use core_runtime::events::EventBus;
use std::sync::Arc;
use tracing::info;

/// One running client: every session component wired to a single
/// connectivity state, credential store and toast center.
#[derive(Clone)]
pub struct SessionContext {
    connectivity: ConnectivityState,
    credentials: CredentialStore,
    api: ApiClient,
    probe: HealthProbe,
    router: Router,
    toasts: ToastCenter,
    events: EventBus,
}

impl SessionContext {
    pub fn new(config: &ClientConfig, events: EventBus) -> Self {
        let connectivity = ConnectivityState::new(events.clone());
        let credentials = CredentialStore::new(config.secure_store.clone(), events.clone());
        let public_paths = Arc::new(PublicPaths::from_config(config));
        let toasts = ToastCenter::new(config.toast_duration, events.clone());
        let router_state = Arc::new(RouterState::new(
            RouteTable::standard(&config.public_routes),
            config.login_route.clone(),
            events.clone(),
        ));

        let request_interceptor = Arc::new(RequestInterceptor::new(
            credentials.clone(),
            public_paths.clone(),
            connectivity.clone(),
        ));
        let response_interceptor = Arc::new(ResponseInterceptor::new(
            credentials.clone(),
            public_paths,
            connectivity.clone(),
            Arc::new(toasts.clone()),
            router_state.clone(),
            events.clone(),
            config.login_route.clone(),
            config.login_redirect_path.clone(),
        ));

        let api = ApiClient::new(
            config.http_client.clone(),
            config.base_url.clone(),
            config.timeout,
            request_interceptor,
            response_interceptor,
        );
        let probe = HealthProbe::new(api.clone(), connectivity.clone(), config.health_path.clone());

        let guard = Arc::new(NavigationGuard::new(
            probe.clone(),
            api.clone(),
            credentials.clone(),
            connectivity.clone(),
            GuardPolicy::from_config(config),
            config.validate_token_path.clone(),
        ));
        let router = Router::new(guard, router_state, events.clone());

        info!(
            base_url = %config.base_url,
            environment = %config.environment,
            path_match = ?config.path_match,
            "Session context ready"
        );

        Self {
            connectivity,
            credentials,
            api,
            probe,
            router,
            toasts,
            events,
        }
    }

    pub fn connectivity(&self) -> &ConnectivityState {
        &self.connectivity
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn probe(&self) -> &HealthProbe {
        &self.probe
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn toasts(&self) -> &ToastCenter {
        &self.toasts
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }
}
