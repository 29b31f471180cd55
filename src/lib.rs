//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (`core-service`, `core-session`). Host applications can
//! depend on `admin-client-workspace` and enable the documented features
//! without needing to wire each crate individually.

#[cfg(feature = "desktop-shims")]
pub use core_service::{AdminCore, CoreError};

#[cfg(feature = "desktop-shims")]
pub use core_session::{GuardDecision, SessionError};
