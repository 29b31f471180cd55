//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest` (fixed 5 s timeout, no retries)
//! - `SecureStore` using the `keyring` crate (OS keychain)
//! - `SecureStore` using a JSON file in the user's data directory, for hosts
//!   without a keychain
//!
//! ## Feature Flags
//!
//! - `secure-store`: Enable OS keychain integration (default)
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{JsonFileStore, ReqwestHttpClient};
//!
//! #[tokio::main]
//! async fn main() -> bridge_traits::error::Result<()> {
//!     let http_client = ReqwestHttpClient::new()?;
//!     let store = JsonFileStore::open_default().await?;
//!
//!     // Hand both to `ClientConfig::builder()`
//!     Ok(())
//! }
//! ```

mod file_store;
mod http;

#[cfg(feature = "secure-store")]
mod secure_store;

pub use file_store::JsonFileStore;
pub use http::{ReqwestHttpClient, DEFAULT_TIMEOUT};

#[cfg(feature = "secure-store")]
pub use secure_store::KeyringSecureStore;
