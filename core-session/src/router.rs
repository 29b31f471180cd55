use crate::error::{Result, SessionError};
use crate::guard::{GuardDecision, NavigationGuard};
use crate::routes::RouterState;
use bridge_traits::navigation::Navigator;
use core_runtime::events::{CoreEvent, EventBus, NavigationEvent};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Redirects followed before a navigation is abandoned
pub const MAX_REDIRECTS: usize = 8;

/// In-app navigation through the [`NavigationGuard`]
///
/// A redirect decided by the guard is itself guarded, so the route finally
/// displayed has passed every check. A hard redirect issued while the guard
/// is running (a 401 during token validation) wins over the transition in
/// progress.
#[derive(Clone)]
pub struct Router {
    guard: Arc<NavigationGuard>,
    state: Arc<RouterState>,
    events: EventBus,
}

impl Router {
    pub fn new(guard: Arc<NavigationGuard>, state: Arc<RouterState>, events: EventBus) -> Self {
        Self {
            guard,
            state,
            events,
        }
    }

    pub fn state(&self) -> &Arc<RouterState> {
        &self.state
    }

    pub fn guard(&self) -> &Arc<NavigationGuard> {
        &self.guard
    }

    pub fn current_route(&self) -> Option<String> {
        self.state.current_route()
    }

    /// Navigate to the route called `name` and return the route displayed.
    #[instrument(skip(self))]
    pub async fn navigate(&self, name: &str) -> Result<String> {
        if !self.state.routes().contains(name) {
            return Err(SessionError::UnknownRoute(name.to_string()));
        }

        let generation = self.state.reload_generation();
        let from = self.state.current_route();
        let mut target = name.to_string();

        for _ in 0..=MAX_REDIRECTS {
            let decision = self.guard.before_each(&target, from.as_deref()).await;

            if self.state.reload_generation() != generation {
                let current = self
                    .state
                    .current_route()
                    .unwrap_or_else(|| self.state.login_route().to_string());
                info!(requested = name, route = %current, "Navigation superseded by client restart");
                return Ok(current);
            }

            match decision {
                GuardDecision::Proceed => {
                    self.state.set_current(&target);
                    debug!(from = ?from, to = %target, "Navigation completed");
                    self.events
                        .publish(CoreEvent::Navigation(NavigationEvent::Completed {
                            from,
                            to: target.clone(),
                        }));
                    return Ok(target);
                }
                GuardDecision::Redirect(next) => {
                    if !self.state.routes().contains(&next) {
                        return Err(SessionError::UnknownRoute(next));
                    }
                    debug!(requested = %target, to = %next, "Guard redirect");
                    self.events
                        .publish(CoreEvent::Navigation(NavigationEvent::Redirected {
                            requested: target,
                            to: next.clone(),
                        }));
                    target = next;
                }
            }
        }

        Err(SessionError::RedirectLoop {
            requested: name.to_string(),
        })
    }

    /// Navigate to the route matching a URL path such as `/clientes/fisico/3`.
    pub async fn navigate_to_path(&self, path: &str) -> Result<String> {
        let name = self
            .state
            .routes()
            .resolve_path(path)
            .map(|matched| matched.route.name.clone())
            .ok_or_else(|| SessionError::UnknownRoute(path.to_string()))?;

        self.navigate(&name).await
    }
}
