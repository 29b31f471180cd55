//! Navigation guard
//!
//! Runs before every route transition and decides whether it may proceed.
//! The checks run in a fixed order; the first one that matches decides.
//!
//! | # | Condition                                   | Decision            |
//! |---|---------------------------------------------|---------------------|
//! | 1 | health probe (never aborts the guard)       |                     |
//! | 2 | offline, target is not the error screen     | redirect to error   |
//! | 3 | target is a public route                    | proceed             |
//! | 4 | online, target is the error screen          | redirect to home    |
//! | 5 | no credential, target is not login or error | redirect to login   |
//! | 6 | credential present                          | validate the token  |
//! | 7 | otherwise                                   | proceed             |

use crate::client::ApiClient;
use crate::connectivity::ConnectivityState;
use crate::credentials::CredentialStore;
use crate::probe::HealthProbe;
use core_runtime::config::ClientConfig;
use core_runtime::events::ClearReason;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    /// Abandon the transition and navigate to the named route instead
    Redirect(String),
}

impl GuardDecision {
    fn redirect(route: &str) -> Self {
        GuardDecision::Redirect(route.to_string())
    }
}

/// Route names the guard treats specially
#[derive(Debug, Clone)]
pub struct GuardPolicy {
    pub public_routes: Vec<String>,
    pub login_route: String,
    pub home_route: String,
    pub error_route: String,
}

impl GuardPolicy {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            public_routes: config.public_routes.clone(),
            login_route: config.login_route.clone(),
            home_route: config.home_route.clone(),
            error_route: config.error_route.clone(),
        }
    }

    pub fn is_public(&self, route: &str) -> bool {
        self.public_routes.iter().any(|r| r == route)
    }
}

pub struct NavigationGuard {
    probe: HealthProbe,
    api: ApiClient,
    credentials: CredentialStore,
    connectivity: ConnectivityState,
    policy: GuardPolicy,
    validate_token_path: String,
}

impl NavigationGuard {
    pub fn new(
        probe: HealthProbe,
        api: ApiClient,
        credentials: CredentialStore,
        connectivity: ConnectivityState,
        policy: GuardPolicy,
        validate_token_path: impl Into<String>,
    ) -> Self {
        Self {
            probe,
            api,
            credentials,
            connectivity,
            policy,
            validate_token_path: validate_token_path.into(),
        }
    }

    pub fn policy(&self) -> &GuardPolicy {
        &self.policy
    }

    /// Decide the transition from `from` to `to`.
    ///
    /// The health probe and the token validation run one after the other.
    /// A credential that cannot be read is treated as absent.
    #[instrument(skip(self))]
    pub async fn before_each(&self, to: &str, from: Option<&str>) -> GuardDecision {
        let policy = &self.policy;
        let is_error_screen = to == policy.error_route;

        self.probe.check().await;
        let offline = self.connectivity.is_offline();

        if offline && !is_error_screen {
            info!(to, "Backend offline, showing error screen");
            return GuardDecision::redirect(&policy.error_route);
        }

        if policy.is_public(to) {
            debug!(to, "Public route");
            return GuardDecision::Proceed;
        }

        if !offline && is_error_screen {
            info!("Backend reachable again, leaving error screen");
            return GuardDecision::redirect(&policy.home_route);
        }

        let has_credential = self.credentials.has_credential().await.unwrap_or_else(|e| {
            warn!(error = %e, "Credential store unreadable, treating as signed out");
            false
        });

        if !has_credential {
            if to != policy.login_route && !is_error_screen {
                debug!(to, "No credential, redirecting to login");
                return GuardDecision::redirect(&policy.login_route);
            }
            return GuardDecision::Proceed;
        }

        match self.api.get(&self.validate_token_path).await {
            Ok(_) => {
                debug!(to, "Credential valid");
                GuardDecision::Proceed
            }
            Err(e) => {
                warn!(to, error = %e, "Credential rejected, signing out");
                if let Err(e) = self.credentials.clear(ClearReason::ValidationFailed).await {
                    warn!(error = %e, "Failed to clear rejected credential");
                }
                GuardDecision::redirect(&policy.login_route)
            }
        }
    }
}
