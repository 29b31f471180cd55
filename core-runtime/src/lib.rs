//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the admin client core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that the session crate and the
//! service façade depend on. It establishes the logging conventions, the
//! client configuration and the event broadcasting used throughout the system.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{ClientConfig, ClientConfigBuilder, Environment, PathMatch};
pub use error::{Error, Result};
pub use events::{CoreEvent, EventBus, EventStream};
