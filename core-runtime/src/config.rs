//! # Client Configuration Module
//!
//! Provides configuration management for the admin client core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `ClientConfig`
//! instance that holds the backend address, the session/guard policy (public
//! paths, public routes, special route names) and the host bridges. It enforces
//! fail-fast validation so a misconfigured client never starts.
//!
//! ## Required Settings
//!
//! - `base_url` - Backend root, e.g. `http://localhost:8080/api`
//!
//! ## Bridges (with platform defaults)
//!
//! - `HttpClient` - HTTP transport (desktop default: reqwest)
//! - `SecureStore` - Credential persistence (desktop default: OS keychain with
//!   the `secure-store` feature, a JSON file in the data directory otherwise)
//!
//! Without the `desktop-shims` feature both bridges must be injected.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::ClientConfig;
//! use std::sync::Arc;
//!
//! let config = ClientConfig::builder()
//!     .base_url("http://localhost:8080/api")
//!     .http_client(Arc::new(MyHttpClient))
//!     .secure_store(Arc::new(MySecureStore))
//!     .build()
//!     .expect("Failed to build config");
//! ```
//!
//! Or from the process environment (`API_BASE_URL`, `API_TIMEOUT_MS`,
//! `APP_ENVIRONMENT`):
//!
//! ```ignore
//! let config = ClientConfig::from_env()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{HttpClient, SecureStore};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Environment variable holding the backend root URL.
pub const ENV_BASE_URL: &str = "API_BASE_URL";
/// Environment variable overriding the transport timeout, in milliseconds.
pub const ENV_TIMEOUT_MS: &str = "API_TIMEOUT_MS";
/// Environment variable naming the deployment environment.
pub const ENV_ENVIRONMENT: &str = "APP_ENVIRONMENT";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);
pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(5000);
pub const DEFAULT_HEALTH_PATH: &str = "/health";
pub const DEFAULT_VALIDATE_TOKEN_PATH: &str = "/usuarios/validate-token";
pub const DEFAULT_PUBLIC_PATHS: &[&str] = &[
    "/password/send-reset-code",
    "/password/validate-reset-code",
    "/password/update-password",
];
pub const DEFAULT_PUBLIC_ROUTES: &[&str] = &[
    "recover-password-email",
    "recover-password-code",
    "recover-password-reset",
];
pub const DEFAULT_LOGIN_ROUTE: &str = "login";
pub const DEFAULT_HOME_ROUTE: &str = "home";
pub const DEFAULT_ERROR_ROUTE: &str = "server-error";
pub const DEFAULT_LOGIN_REDIRECT_PATH: &str = "/login";

/// How request paths are compared against the public path list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathMatch {
    /// A path is public when it contains any listed fragment anywhere.
    #[default]
    Substring,
    /// A path is public when a listed fragment matches whole path segments.
    Segment,
}

/// Deployment environment, informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(Self::Development),
            "staging" | "homolog" => Ok(Self::Staging),
            "production" | "prod" => Ok(Self::Production),
            other => Err(Error::Config(format!(
                "Unknown environment '{}'. Expected development, staging or production.",
                other
            ))),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        })
    }
}

/// Configuration for the admin client core.
///
/// Use [`ClientConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct ClientConfig {
    /// Backend root; endpoint paths are appended to its path
    pub base_url: Url,

    /// Per-request transport timeout
    pub timeout: Duration,

    /// Liveness endpoint
    pub health_path: String,

    /// Endpoint that answers 2xx while the stored token is valid
    pub validate_token_path: String,

    /// Path fragments exempt from credential attachment and auth handling
    pub public_paths: Vec<String>,

    /// Matching rule for `public_paths`
    pub path_match: PathMatch,

    /// Route names that bypass authentication in the navigation guard
    pub public_routes: Vec<String>,

    pub login_route: String,
    pub home_route: String,
    pub error_route: String,

    /// Entry path used when a 401 forces a client restart
    pub login_redirect_path: String,

    /// How long a toast stays visible
    pub toast_duration: Duration,

    pub environment: Environment,

    /// HTTP transport
    pub http_client: Arc<dyn HttpClient>,

    /// Durable storage for the session credential
    pub secure_store: Arc<dyn SecureStore>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("health_path", &self.health_path)
            .field("validate_token_path", &self.validate_token_path)
            .field("public_paths", &self.public_paths)
            .field("path_match", &self.path_match)
            .field("public_routes", &self.public_routes)
            .field("login_route", &self.login_route)
            .field("home_route", &self.home_route)
            .field("error_route", &self.error_route)
            .field("login_redirect_path", &self.login_redirect_path)
            .field("toast_duration", &self.toast_duration)
            .field("environment", &self.environment)
            .field("http_client", &"HttpClient { ... }")
            .field("secure_store", &"SecureStore { ... }")
            .finish()
    }
}

impl ClientConfig {
    /// Creates a new builder for constructing a `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Builds a configuration from the process environment.
    ///
    /// Bridges come from the desktop defaults; use
    /// [`ClientConfigBuilder::from_env`] to inject custom ones.
    pub fn from_env() -> Result<Self> {
        ClientConfigBuilder::from_env()?.build()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.base_url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "Base URL must use http or https, got '{}'",
                self.base_url.scheme()
            )));
        }

        if self.timeout.is_zero() {
            return Err(Error::Config(
                "Timeout must be greater than zero".to_string(),
            ));
        }

        for (name, path) in [
            ("Health path", &self.health_path),
            ("Token validation path", &self.validate_token_path),
            ("Login redirect path", &self.login_redirect_path),
        ] {
            if !path.starts_with('/') {
                return Err(Error::Config(format!(
                    "{} must start with '/', got '{}'",
                    name, path
                )));
            }
        }

        if self.public_paths.iter().any(|p| p.trim().is_empty()) {
            return Err(Error::Config(
                "Public paths cannot contain empty fragments; an empty fragment matches every request"
                    .to_string(),
            ));
        }

        for (name, route) in [
            ("Login route", &self.login_route),
            ("Home route", &self.home_route),
            ("Error route", &self.error_route),
        ] {
            if route.is_empty() {
                return Err(Error::Config(format!("{} name cannot be empty", name)));
            }
        }

        if self.error_route == self.login_route || self.error_route == self.home_route {
            return Err(Error::Config(
                "Error route must differ from the login and home routes".to_string(),
            ));
        }

        if self.toast_duration.is_zero() {
            return Err(Error::Config(
                "Toast duration must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::with_timeout(timeout)
        .map_err(|e| Error::Internal(format!("Failed to initialize default HttpClient: {}", e)))?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(_timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    Err(Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required to reach the backend. \
                 Desktop: enable the 'desktop-shims' feature to use the default ReqwestHttpClient. \
                 Web: inject a fetch-based client."
            .to_string(),
    })
}

#[cfg(feature = "secure-store")]
fn provide_default_secure_store() -> Result<Arc<dyn SecureStore>> {
    use bridge_desktop::KeyringSecureStore;

    let store: Arc<dyn SecureStore> = Arc::new(KeyringSecureStore::new());
    Ok(store)
}

#[cfg(all(feature = "desktop-shims", not(feature = "secure-store")))]
fn provide_default_secure_store() -> Result<Arc<dyn SecureStore>> {
    use bridge_desktop::JsonFileStore;
    use std::thread;
    use tokio::runtime::{Builder, Handle};

    let open_store = || -> Result<JsonFileStore> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                Error::Internal(format!(
                    "Failed to create Tokio runtime for default SecureStore: {}",
                    e
                ))
            })?;

        runtime
            .block_on(JsonFileStore::open_default())
            .map_err(|e| Error::Internal(format!("Failed to initialize default SecureStore: {}", e)))
    };

    // block_on panics inside a runtime, so open the file from a plain thread.
    let store = match Handle::try_current() {
        Ok(_) => thread::spawn(open_store).join().map_err(|_| {
            Error::Internal("Thread panicked while creating default SecureStore".to_string())
        })??,
        Err(_) => open_store()?,
    };

    let store: Arc<dyn SecureStore> = Arc::new(store);
    Ok(store)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_secure_store() -> Result<Arc<dyn SecureStore>> {
    Err(Error::CapabilityMissing {
        capability: "SecureStore".to_string(),
        message: "SecureStore implementation is required for credential persistence. \
                 Desktop: enable the 'desktop-shims' feature to use the default store. \
                 Web: inject a localStorage-backed store."
            .to_string(),
    })
}

/// Builder for constructing [`ClientConfig`] instances.
///
/// Every setting except `base_url` has a default matching the production
/// backend; call [`build()`](ClientConfigBuilder::build) to validate.
#[derive(Default)]
pub struct ClientConfigBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    health_path: Option<String>,
    validate_token_path: Option<String>,
    public_paths: Option<Vec<String>>,
    path_match: PathMatch,
    public_routes: Option<Vec<String>>,
    login_route: Option<String>,
    home_route: Option<String>,
    error_route: Option<String>,
    login_redirect_path: Option<String>,
    toast_duration: Option<Duration>,
    environment: Environment,
    http_client: Option<Arc<dyn HttpClient>>,
    secure_store: Option<Arc<dyn SecureStore>>,
}

impl ClientConfigBuilder {
    /// Starts a builder pre-filled from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Starts a builder pre-filled from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(ENV_BASE_URL).ok_or_else(|| {
            Error::Config(format!(
                "{} is not set. Point it at the backend root, e.g. http://localhost:8080/api",
                ENV_BASE_URL
            ))
        })?;

        let mut builder = Self::default().base_url(base_url);

        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            let millis: u64 = raw.trim().parse().map_err(|_| {
                Error::Config(format!(
                    "{} must be a whole number of milliseconds, got '{}'",
                    ENV_TIMEOUT_MS, raw
                ))
            })?;
            builder = builder.timeout(Duration::from_millis(millis));
        }

        if let Some(raw) = lookup(ENV_ENVIRONMENT) {
            builder = builder.environment(raw.parse()?);
        }

        Ok(builder)
    }

    /// Sets the backend root URL (required).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the transport timeout (default: 5000 ms).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn health_path(mut self, path: impl Into<String>) -> Self {
        self.health_path = Some(path.into());
        self
    }

    pub fn validate_token_path(mut self, path: impl Into<String>) -> Self {
        self.validate_token_path = Some(path.into());
        self
    }

    /// Replaces the public path fragments.
    pub fn public_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.public_paths = Some(paths.into_iter().map(Into::into).collect());
        self
    }

    /// Selects how public path fragments are matched (default: substring).
    pub fn path_match(mut self, path_match: PathMatch) -> Self {
        self.path_match = path_match;
        self
    }

    /// Replaces the public route names.
    pub fn public_routes<I, S>(mut self, routes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.public_routes = Some(routes.into_iter().map(Into::into).collect());
        self
    }

    pub fn login_route(mut self, name: impl Into<String>) -> Self {
        self.login_route = Some(name.into());
        self
    }

    pub fn home_route(mut self, name: impl Into<String>) -> Self {
        self.home_route = Some(name.into());
        self
    }

    pub fn error_route(mut self, name: impl Into<String>) -> Self {
        self.error_route = Some(name.into());
        self
    }

    pub fn login_redirect_path(mut self, path: impl Into<String>) -> Self {
        self.login_redirect_path = Some(path.into());
        self
    }

    pub fn toast_duration(mut self, duration: Duration) -> Self {
        self.toast_duration = Some(duration);
        self
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Injects the HTTP transport.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Injects the credential store.
    pub fn secure_store(mut self, store: Arc<dyn SecureStore>) -> Self {
        self.secure_store = Some(store);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] when `base_url` is missing or malformed, or a
    ///   setting fails validation
    /// - [`Error::CapabilityMissing`] when a bridge is not injected and no
    ///   platform default is compiled in
    pub fn build(self) -> Result<ClientConfig> {
        let raw_url = self.base_url.ok_or_else(|| {
            Error::Config("Base URL is required. Use .base_url() to set it.".to_string())
        })?;
        let base_url = Url::parse(&raw_url)
            .map_err(|e| Error::Config(format!("Invalid base URL '{}': {}", raw_url, e)))?;

        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client(timeout)?,
        };

        let secure_store = match self.secure_store {
            Some(store) => store,
            None => provide_default_secure_store()?,
        };

        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        let config = ClientConfig {
            base_url,
            timeout,
            health_path: self
                .health_path
                .unwrap_or_else(|| DEFAULT_HEALTH_PATH.to_string()),
            validate_token_path: self
                .validate_token_path
                .unwrap_or_else(|| DEFAULT_VALIDATE_TOKEN_PATH.to_string()),
            public_paths: self
                .public_paths
                .unwrap_or_else(|| owned(DEFAULT_PUBLIC_PATHS)),
            path_match: self.path_match,
            public_routes: self
                .public_routes
                .unwrap_or_else(|| owned(DEFAULT_PUBLIC_ROUTES)),
            login_route: self
                .login_route
                .unwrap_or_else(|| DEFAULT_LOGIN_ROUTE.to_string()),
            home_route: self
                .home_route
                .unwrap_or_else(|| DEFAULT_HOME_ROUTE.to_string()),
            error_route: self
                .error_route
                .unwrap_or_else(|| DEFAULT_ERROR_ROUTE.to_string()),
            login_redirect_path: self
                .login_redirect_path
                .unwrap_or_else(|| DEFAULT_LOGIN_REDIRECT_PATH.to_string()),
            toast_duration: self.toast_duration.unwrap_or(DEFAULT_TOAST_DURATION),
            environment: self.environment,
            http_client,
            secure_store,
        };

        config.validate()?;

        Ok(config)
    }
}
