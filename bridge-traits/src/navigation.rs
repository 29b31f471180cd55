//! Navigation Abstraction
//!
//! Lets the transport layer learn which screen is active and force a full
//! client restart at a given entry point.

/// Navigation control trait
///
/// # Hard redirects
///
/// [`hard_redirect`](Navigator::hard_redirect) is not an in-app transition:
/// the host must discard all in-memory UI state and restart its root at the
/// given path (a page reload on the web, rebuilding the root view on native).
pub trait Navigator: Send + Sync {
    /// Name of the route currently displayed, if any
    fn current_route(&self) -> Option<String>;

    /// Discard in-memory state and restart the client at `path`
    fn hard_redirect(&self, path: &str);
}
