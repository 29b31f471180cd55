//! # Session Module
//!
//! Session and connectivity guard for the admin client.
//!
//! ## Overview
//!
//! Every backend call goes through [`ApiClient`], which wraps the host
//! transport with two interceptors:
//!
//! - the request interceptor attaches `Authorization: Bearer <token>` unless
//!   the path is public, and marks a request as in flight
//! - the response interceptor classifies the outcome, keeps
//!   [`ConnectivityState`] current, shows toasts and restarts the client at
//!   the login screen when the session has expired
//!
//! Before every route transition the [`NavigationGuard`] probes the health
//! endpoint, lets public screens through, sends the user to the error screen
//! while the backend is down and validates the stored credential.
//!
//! ## Features
//!
//! - Opaque connectivity errors; HTTP errors keep the server response
//! - Offline/online transitions and credential changes on the event bus
//! - Auto-dismissing toasts via [`ToastCenter`]
//! - Route table with path resolution and a redirect-following [`Router`]

pub mod client;
pub mod connectivity;
pub mod credentials;
pub mod error;
pub mod guard;
pub mod interceptor;
pub mod notifications;
pub mod paths;
pub mod probe;
pub mod router;
pub mod routes;
pub mod session;

pub use client::ApiClient;
pub use connectivity::ConnectivityState;
pub use credentials::{CredentialStore, SessionCredential, REFRESH_TOKEN_KEY, TOKEN_KEY};
pub use error::{ErrorResponse, Result, SessionError};
pub use guard::{GuardDecision, GuardPolicy, NavigationGuard};
pub use interceptor::{RequestInterceptor, ResponseInterceptor};
pub use notifications::{Toast, ToastCenter, MAX_ACTIVE_TOASTS};
pub use paths::PublicPaths;
pub use probe::HealthProbe;
pub use router::Router;
pub use routes::{Layout, RouteDescriptor, RouteTable, RouterState};
pub use session::SessionContext;
