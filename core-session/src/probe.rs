use crate::client::ApiClient;
use crate::connectivity::ConnectivityState;
use tracing::{debug, warn};

/// Liveness check against the health endpoint
///
/// Screens may call [`check`](HealthProbe::check) on mount; the navigation
/// guard calls it before every transition.
#[derive(Clone)]
pub struct HealthProbe {
    api: ApiClient,
    connectivity: ConnectivityState,
    path: String,
}

impl HealthProbe {
    pub fn new(api: ApiClient, connectivity: ConnectivityState, path: impl Into<String>) -> Self {
        Self {
            api,
            connectivity,
            path: path.into(),
        }
    }

    /// Probe the backend and report whether it is online.
    ///
    /// Failures are logged, never returned; the response interceptor has
    /// already updated the connectivity flags by the time this returns.
    pub async fn check(&self) -> bool {
        match self.api.get(&self.path).await {
            Ok(_) => debug!(path = %self.path, "Health probe succeeded"),
            Err(e) => warn!(path = %self.path, error = %e, "Health probe failed"),
        }

        !self.connectivity.is_offline()
    }
}
