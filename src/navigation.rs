//! Navigation guard, route table and navigator
//!
//! The guard decides per transition whether to allow it, send the user to
//! the login entry point, or bounce an authenticated user away from
//! login/register. It keeps no state: it reads the session and the target
//! route's `requires_auth` flag.

use crate::session::Session;
use std::sync::{Arc, Mutex};

pub const LOGIN_PATH: &str = "/login";
pub const REGISTER_PATH: &str = "/register";
/// Where authenticated users land when they open login/register
pub const LANDING_PATH: &str = "/";

/// Route redirects followed before giving up on a navigation
const MAX_REDIRECTS: usize = 8;

/// Strip query, fragment and trailing slash (root stays `/`)
pub fn normalize_path(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// True for the unauthenticated entry points (login, register)
pub fn is_entry_point(path: &str) -> bool {
    let path = normalize_path(path);
    path == LOGIN_PATH || path == REGISTER_PATH
}

/// Outcome of evaluating one transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(String),
}

/// Evaluate the guard table
///
/// An unresolved `requires_auth` flag is treated as `true`.
pub fn evaluate(requires_auth: Option<bool>, has_session: bool, target_path: &str) -> GuardDecision {
    let requires_auth = requires_auth.unwrap_or(true);
    match (requires_auth, has_session, is_entry_point(target_path)) {
        (true, false, _) => GuardDecision::Redirect(LOGIN_PATH.to_string()),
        (true, true, _) => GuardDecision::Allow,
        (false, true, true) => GuardDecision::Redirect(LANDING_PATH.to_string()),
        (false, _, _) => GuardDecision::Allow,
    }
}

/// Route declaration; children inherit `requires_auth` when they leave it unset
#[derive(Debug, Clone, Default)]
pub struct Route {
    pub path: String,
    pub name: Option<String>,
    pub requires_auth: Option<bool>,
    pub redirect: Option<String>,
    pub children: Vec<Route>,
}

impl Route {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn requires_auth(mut self, requires_auth: bool) -> Self {
        self.requires_auth = Some(requires_auth);
        self
    }

    pub fn redirect(mut self, target: impl Into<String>) -> Self {
        self.redirect = Some(target.into());
        self
    }

    pub fn child(mut self, child: Route) -> Self {
        self.children.push(child);
        self
    }
}

/// Flattened route with its effective auth requirement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    /// Full path pattern (e.g. `/model/info/:id`)
    pub pattern: String,
    pub name: Option<String>,
    pub requires_auth: Option<bool>,
    pub redirect: Option<String>,
}

impl ResolvedRoute {
    fn matches(&self, path: &str) -> bool {
        let pattern: Vec<&str> = self.pattern.split('/').filter(|s| !s.is_empty()).collect();
        let target: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        pattern.len() == target.len()
            && pattern
                .iter()
                .zip(&target)
                .all(|(p, t)| p.starts_with(':') || p == t)
    }
}

/// Immutable route table built once at startup
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<ResolvedRoute>,
}

impl RouteTable {
    pub fn new(routes: Vec<Route>) -> Self {
        let mut flat = Vec::new();
        for route in &routes {
            flatten(route, "", None, &mut flat);
        }
        Self { routes: flat }
    }

    /// Routes of the helmet-detection web client
    pub fn helmet_default() -> Self {
        Self::new(vec![
            Route::new(LOGIN_PATH).name("Login").requires_auth(false),
            Route::new(REGISTER_PATH).name("Register").requires_auth(false),
            Route::new("/")
                .requires_auth(true)
                .redirect("/home")
                .child(Route::new("home").name("Home"))
                .child(Route::new("detect/image").name("ImageDetect"))
                .child(Route::new("detect/video").name("VideoDetect"))
                .child(Route::new("detect/realtime").name("RealtimeDetect"))
                .child(Route::new("model/manager").name("ModelManager"))
                .child(Route::new("model/info/:id").name("ModelInfo"))
                .child(Route::new("dataset/manager").name("DatasetManager"))
                .child(Route::new("user/manager").name("UserManager"))
                .child(Route::new("console").name("Console")),
        ])
    }

    /// First route matching the path
    pub fn resolve(&self, path: &str) -> Option<&ResolvedRoute> {
        let path = normalize_path(path);
        self.routes.iter().find(|r| r.matches(&path))
    }

    pub fn routes(&self) -> &[ResolvedRoute] {
        &self.routes
    }
}

fn flatten(route: &Route, prefix: &str, inherited: Option<bool>, out: &mut Vec<ResolvedRoute>) {
    let pattern = if route.path.starts_with('/') {
        normalize_path(&route.path)
    } else {
        normalize_path(&format!("{}/{}", prefix.trim_end_matches('/'), route.path))
    };
    let requires_auth = route.requires_auth.or(inherited);

    out.push(ResolvedRoute {
        pattern: pattern.clone(),
        name: route.name.clone(),
        requires_auth,
        redirect: route.redirect.clone(),
    });
    for child in &route.children {
        flatten(child, &pattern, requires_auth, out);
    }
}

/// Guard bound to a route table
#[derive(Debug, Clone)]
pub struct NavigationGuard {
    table: RouteTable,
}

impl NavigationGuard {
    pub fn new(table: RouteTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Decide the transition to `target_path`
    pub fn check(&self, target_path: &str, has_session: bool) -> GuardDecision {
        let requires_auth = self.table.resolve(target_path).and_then(|r| r.requires_auth);
        evaluate(requires_auth, has_session, target_path)
    }
}

impl Default for NavigationGuard {
    fn default() -> Self {
        Self::new(RouteTable::helmet_default())
    }
}

/// Where the client currently is, and how to move it
pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;

    /// Move to `path` without consulting the guard
    fn redirect(&self, path: &str);
}

/// Navigator that only records locations
#[derive(Debug)]
pub struct MemoryNavigator {
    history: Mutex<Vec<String>>,
}

impl MemoryNavigator {
    pub fn new(initial_path: impl Into<String>) -> Self {
        Self {
            history: Mutex::new(vec![initial_path.into()]),
        }
    }

    /// Every location visited, oldest first
    pub fn history(&self) -> Vec<String> {
        self.history.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self::new(LOGIN_PATH)
    }
}

impl Navigator for MemoryNavigator {
    fn current_path(&self) -> String {
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .cloned()
            .unwrap_or_else(|| LANDING_PATH.to_string())
    }

    fn redirect(&self, path: &str) {
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(path.to_string());
    }
}

/// Guarded navigation: applies the guard, follows route redirects, and moves
/// the navigator to the final location
pub struct Router {
    guard: NavigationGuard,
    session: Arc<Session>,
    navigator: Arc<dyn Navigator>,
}

impl Router {
    pub fn new(guard: NavigationGuard, session: Arc<Session>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            guard,
            session,
            navigator,
        }
    }

    pub fn guard(&self) -> &NavigationGuard {
        &self.guard
    }

    /// Navigate to `path`, returning where the client ended up
    pub fn navigate(&self, path: &str) -> String {
        let mut target = normalize_path(path);

        for _ in 0..MAX_REDIRECTS {
            match self.guard.check(&target, self.session.is_present()) {
                GuardDecision::Redirect(next) => {
                    tracing::debug!(from = %target, to = %next, "Navigation redirected by guard");
                    target = next;
                }
                GuardDecision::Allow => {
                    match self.guard.table().resolve(&target).and_then(|r| r.redirect.clone()) {
                        Some(next) if normalize_path(&next) != target => target = normalize_path(&next),
                        _ => {
                            self.navigator.redirect(&target);
                            return target;
                        }
                    }
                }
            }
        }

        tracing::warn!(path = %path, "Too many navigation redirects, falling back to login");
        self.navigator.redirect(LOGIN_PATH);
        LOGIN_PATH.to_string()
    }
}
