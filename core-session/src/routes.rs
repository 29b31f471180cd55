//! Route table and router state
//!
//! The table lists every screen of the admin client. [`RouterState`] tracks the
//! route on display and implements [`Navigator`] so the response interceptor
//! can ask where the user is and force a restart at the login entry point.

use bridge_traits::navigation::Navigator;
use core_runtime::events::{CoreEvent, EventBus, NavigationEvent};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use tracing::{info, warn};

/// Page chrome a screen is rendered in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Bare page: login, error and password recovery screens
    Simple,
    /// Navigation menu and header
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDescriptor {
    pub name: String,
    /// Pattern; `:param` matches one segment, `:param?` an optional trailing one
    pub path: String,
    pub layout: Layout,
    pub requires_auth: bool,
}

impl RouteDescriptor {
    fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let mut params = HashMap::new();
        let mut actual = path.split('/').filter(|s| !s.is_empty());

        for pattern in self.path.split('/').filter(|s| !s.is_empty()) {
            match pattern.strip_prefix(':') {
                Some(param) => match param.strip_suffix('?') {
                    Some(optional) => {
                        if let Some(value) = actual.next() {
                            params.insert(optional.to_string(), value.to_string());
                        }
                    }
                    None => {
                        params.insert(param.to_string(), actual.next()?.to_string());
                    }
                },
                None => {
                    if actual.next()? != pattern {
                        return None;
                    }
                }
            }
        }

        actual.next().is_none().then_some(params)
    }
}

/// A route resolved from a URL path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    pub route: &'a RouteDescriptor,
    pub params: HashMap<String, String>,
}

const SCREENS: &[(&str, &str, Layout)] = &[
    ("login", "/", Layout::Simple),
    ("home", "/home", Layout::Default),
    ("clientes", "/clientes", Layout::Default),
    ("cliente-fisico", "/clientes/fisico/:fisicoId?", Layout::Default),
    ("cliente-juridico", "/clientes/juridico/:juridicoId?", Layout::Default),
    ("fornecedores", "/fornecedores", Layout::Default),
    ("fornecedor-fisico", "/fornecedores/fisico/:fisicoId?", Layout::Default),
    ("forncedor-juridico", "/fornecedores/juridico/:juridicoId?", Layout::Default),
    ("parceiros", "/parceiros", Layout::Default),
    ("parceiro-fisico", "/parceiros/fisico/:fisicoId?", Layout::Default),
    ("parceiro-juridico", "/parceiros/juridico/:juridicoId?", Layout::Default),
    ("colaboradores", "/colaboradores", Layout::Default),
    ("colaborador", "/colaborador/:colaboradorId?", Layout::Default),
    ("usuarios", "/usuarios", Layout::Default),
    ("usuario", "/usuario/:usuarioId?", Layout::Default),
    ("server-error", "/server-error", Layout::Simple),
    ("recover-password-email", "/recover-password", Layout::Simple),
    ("recover-password-code", "/recover-password/code", Layout::Simple),
    ("recover-password-reset", "/recover-password/reset", Layout::Simple),
];

#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<RouteDescriptor>,
    aliases: HashMap<String, String>,
}

impl RouteTable {
    pub fn new(routes: Vec<RouteDescriptor>) -> Self {
        Self {
            routes,
            aliases: HashMap::new(),
        }
    }

    /// Every screen of the admin client. Routes named in `public_routes` do
    /// not require authentication; `/login` is an alias of the login screen.
    pub fn standard(public_routes: &[String]) -> Self {
        let routes = SCREENS
            .iter()
            .map(|(name, path, layout)| RouteDescriptor {
                name: name.to_string(),
                path: path.to_string(),
                layout: *layout,
                requires_auth: !public_routes.iter().any(|r| r == name),
            })
            .collect();

        Self::new(routes).with_alias("/login", "login")
    }

    /// Resolve `path` to route `name` in addition to the route's own pattern.
    pub fn with_alias(mut self, path: impl Into<String>, name: impl Into<String>) -> Self {
        self.aliases.insert(path.into(), name.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&RouteDescriptor> {
        self.routes.iter().find(|r| r.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn resolve_path(&self, path: &str) -> Option<RouteMatch<'_>> {
        let path = path.split(['?', '#']).next().unwrap_or_default();

        if let Some(route) = self.aliases.get(path).and_then(|name| self.get(name)) {
            return Some(RouteMatch {
                route,
                params: HashMap::new(),
            });
        }

        self.routes.iter().find_map(|route| {
            route
                .matches(path)
                .map(|params| RouteMatch { route, params })
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteDescriptor> {
        self.routes.iter()
    }
}

/// The route on display, shared by the router and the response interceptor
pub struct RouterState {
    table: RouteTable,
    current: RwLock<Option<String>>,
    reload_generation: AtomicU64,
    login_route: String,
    events: EventBus,
}

impl RouterState {
    pub fn new(table: RouteTable, login_route: impl Into<String>, events: EventBus) -> Self {
        Self {
            table,
            current: RwLock::new(None),
            reload_generation: AtomicU64::new(0),
            login_route: login_route.into(),
            events,
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.table
    }

    pub fn login_route(&self) -> &str {
        &self.login_route
    }

    /// Bumped on every hard redirect; the host rebuilds its UI root when it changes.
    pub fn reload_generation(&self) -> u64 {
        self.reload_generation.load(Ordering::SeqCst)
    }

    pub(crate) fn set_current(&self, name: &str) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Some(name.to_string());
    }
}

impl Navigator for RouterState {
    fn current_route(&self) -> Option<String> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn hard_redirect(&self, path: &str) {
        let target = match self.table.resolve_path(path) {
            Some(matched) => matched.route.name.clone(),
            None => {
                warn!(path, "Hard redirect to unknown path, restarting at login");
                self.login_route.clone()
            }
        };

        self.set_current(&target);
        let generation = self.reload_generation.fetch_add(1, Ordering::SeqCst) + 1;
        info!(path, route = %target, generation, "Client restart");

        self.events
            .publish(CoreEvent::Navigation(NavigationEvent::HardReload {
                path: path.to_string(),
            }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_runtime::config::DEFAULT_PUBLIC_ROUTES;

    fn table() -> RouteTable {
        let public: Vec<String> = DEFAULT_PUBLIC_ROUTES.iter().map(|s| s.to_string()).collect();
        RouteTable::standard(&public)
    }

    #[test]
    fn test_standard_table_auth_requirements() {
        let table = table();
        assert_eq!(table.iter().count(), 19);
        assert!(table.get("home").unwrap().requires_auth);
        assert!(!table.get("recover-password-code").unwrap().requires_auth);
        assert_eq!(table.get("server-error").unwrap().layout, Layout::Simple);
        assert_eq!(table.get("usuarios").unwrap().layout, Layout::Default);
    }

    #[test]
    fn test_resolve_path_with_params() {
        let table = table();

        let matched = table.resolve_path("/clientes/fisico/42").unwrap();
        assert_eq!(matched.route.name, "cliente-fisico");
        assert_eq!(matched.params.get("fisicoId").map(String::as_str), Some("42"));

        let matched = table.resolve_path("/clientes/fisico").unwrap();
        assert_eq!(matched.route.name, "cliente-fisico");
        assert!(matched.params.is_empty());

        assert_eq!(
            table.resolve_path("/recover-password/code").unwrap().route.name,
            "recover-password-code"
        );
        assert!(table.resolve_path("/clientes/fisico/42/extra").is_none());
        assert!(table.resolve_path("/nowhere").is_none());
    }

    #[test]
    fn test_login_alias_and_root() {
        let table = table();
        assert_eq!(table.resolve_path("/login").unwrap().route.name, "login");
        assert_eq!(table.resolve_path("/").unwrap().route.name, "login");
        assert_eq!(table.resolve_path("/login?next=home").unwrap().route.name, "login");
    }

    #[test]
    fn test_hard_redirect_resets_to_login() {
        let events = EventBus::default();
        let mut rx = events.subscribe();
        let state = RouterState::new(table(), "login", events);
        state.set_current("clientes");

        state.hard_redirect("/login");

        assert_eq!(state.current_route().as_deref(), Some("login"));
        assert_eq!(state.reload_generation(), 1);
        assert_eq!(
            rx.try_recv().unwrap(),
            CoreEvent::Navigation(NavigationEvent::HardReload {
                path: "/login".to_string()
            })
        );
    }

    #[test]
    fn test_hard_redirect_to_unknown_path_falls_back_to_login() {
        let state = RouterState::new(table(), "login", EventBus::default());
        state.hard_redirect("/gone");
        assert_eq!(state.current_route().as_deref(), Some("login"));
    }
}
