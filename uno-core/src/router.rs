//! Exact-path routing with nested group prefixes
//!
//! Routes are stored under the full path built from the active group
//! prefixes plus the route's own uri. Lookup is an exact string match
//! unless a different [`Dispatcher`] is registered under `router`.
//!
//! # Examples
//!
//! ```
//! use uno_core::router::PrefixStack;
//!
//! let stack = PrefixStack::new();
//! {
//!     let _api = stack.push("/api/");
//!     let _v1 = stack.push("v1");
//!     assert_eq!(stack.build_path("/users/"), "/api/v1/users");
//! }
//! assert_eq!(stack.depth(), 0);
//! ```

use crate::{Application, Deps, Response, Result};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

/// Route handler. Runs with the application as context and receives the
/// dependencies the route declared.
pub type Handler = Arc<dyn Fn(&Application, &Deps) -> Result<Response> + Send + Sync>;

const TRIMMED: &[char] = &['/', ' ', '\t', '\n', '\r', '\0', '\x0B'];

/// Strip surrounding slashes and whitespace from a path segment.
pub fn normalize_segment(segment: &str) -> &str {
    segment.trim_matches(TRIMMED)
}

/// A registered route.
pub struct Route {
    path: String,
    dependencies: Vec<String>,
    handler: Handler,
}

impl Route {
    pub fn new<F>(path: impl Into<String>, dependencies: &[&str], handler: F) -> Self
    where
        F: Fn(&Application, &Deps) -> Result<Response> + Send + Sync + 'static,
    {
        Self {
            path: path.into(),
            dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
            handler: Arc::new(handler),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Resolve the declared dependencies through the application's
    /// container and run the handler.
    pub fn invoke(&self, app: &Application) -> Result<Response> {
        let names: Vec<&str> = self.dependencies.iter().map(String::as_str).collect();
        app.container().call(&names, |deps| (self.handler)(app, deps))
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("path", &self.path)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

/// Stack of active group prefixes.
#[derive(Debug, Default)]
pub struct PrefixStack {
    segments: Mutex<Vec<String>>,
}

impl PrefixStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a normalized prefix. It is popped when the guard drops, so a
    /// body that fails or panics never leaves it behind.
    #[must_use = "the prefix is popped as soon as the guard is dropped"]
    pub fn push(&self, prefix: &str) -> GroupGuard<'_> {
        self.segments.lock().push(normalize_segment(prefix).to_string());
        GroupGuard { stack: self }
    }

    /// Full route key for `uri` under the current prefixes.
    pub fn build_path(&self, uri: &str) -> String {
        let segments = self.segments.lock();
        let mut parts: Vec<&str> = segments
            .iter()
            .map(String::as_str)
            .filter(|s| !s.is_empty())
            .collect();
        let tail = normalize_segment(uri);
        if !tail.is_empty() {
            parts.push(tail);
        }
        format!("/{}", parts.join("/"))
    }

    pub fn depth(&self) -> usize {
        self.segments.lock().len()
    }

    pub fn segments(&self) -> Vec<String> {
        self.segments.lock().clone()
    }
}

/// Pops its prefix on drop.
pub struct GroupGuard<'a> {
    stack: &'a PrefixStack,
}

impl Drop for GroupGuard<'_> {
    fn drop(&mut self) {
        self.stack.segments.lock().pop();
    }
}

/// Path → route table with exact-string keys.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: RwLock<HashMap<String, Arc<Route>>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `route` under its path, returning the route it replaced.
    pub fn insert(&self, route: Route) -> Option<Arc<Route>> {
        let route = Arc::new(route);
        self.routes.write().insert(route.path.clone(), route)
    }

    pub fn get(&self, path: &str) -> Option<Arc<Route>> {
        self.routes.read().get(path).cloned()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.routes.read().contains_key(path)
    }

    /// Registered paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.routes.read().keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn len(&self) -> usize {
        self.routes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.read().is_empty()
    }
}

type DispatchFn = dyn Fn(&RouteTable, &str) -> Option<Arc<Route>> + Send + Sync;

/// Finds the route for a path. Registered as the `router` capability and
/// replaceable like any other dependency.
#[derive(Clone)]
pub struct Dispatcher {
    dispatch: Arc<DispatchFn>,
}

impl Dispatcher {
    pub fn new<F>(dispatch: F) -> Self
    where
        F: Fn(&RouteTable, &str) -> Option<Arc<Route>> + Send + Sync + 'static,
    {
        Self {
            dispatch: Arc::new(dispatch),
        }
    }

    /// Exact-match lookup.
    pub fn exact() -> Self {
        Self::new(|table, path| table.get(path))
    }

    pub fn dispatch(&self, table: &RouteTable, path: &str) -> Option<Arc<Route>> {
        (self.dispatch)(table, path)
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::exact()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_route(path: &str) -> Route {
        Route::new(path, &[], |_, _| Ok(Response::text("ok")))
    }

    #[test]
    fn test_normalize_segment() {
        assert_eq!(normalize_segment("/api/"), "api");
        assert_eq!(normalize_segment(" \t/v1/\n"), "v1");
        assert_eq!(normalize_segment("a/b"), "a/b");
        assert_eq!(normalize_segment("///"), "");
    }

    #[test]
    fn test_build_path_without_groups() {
        let stack = PrefixStack::new();
        assert_eq!(stack.build_path("users"), "/users");
        assert_eq!(stack.build_path("/users/"), "/users");
        assert_eq!(stack.build_path(""), "/");
        assert_eq!(stack.build_path("/"), "/");
    }

    #[test]
    fn test_empty_group_prefix_is_skipped() {
        let stack = PrefixStack::new();
        let _outer = stack.push("a");
        let _empty = stack.push("/");
        assert_eq!(stack.build_path("c"), "/a/c");
        assert_eq!(stack.build_path(""), "/a");
    }

    #[test]
    fn test_guard_pops_in_lifo_order() {
        let stack = PrefixStack::new();
        let outer = stack.push("a");
        {
            let _inner = stack.push("b");
            assert_eq!(stack.segments(), vec!["a", "b"]);
        }
        assert_eq!(stack.segments(), vec!["a"]);
        drop(outer);
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn test_guard_pops_on_panic() {
        let stack = PrefixStack::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = stack.push("boom");
            panic!("body failed");
        }));
        assert!(result.is_err());
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn test_route_table_overwrites() {
        let table = RouteTable::new();
        assert!(table.insert(ok_route("/a")).is_none());
        assert!(table.insert(ok_route("/a")).is_some());
        table.insert(ok_route("/b"));
        assert_eq!(table.paths(), vec!["/a", "/b"]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_exact_dispatch() {
        let table = RouteTable::new();
        table.insert(ok_route("/users"));
        let dispatcher = Dispatcher::exact();
        assert!(dispatcher.dispatch(&table, "/users").is_some());
        assert!(dispatcher.dispatch(&table, "/users/").is_none());
        assert!(dispatcher.dispatch(&table, "/USERS").is_none());
    }

    #[test]
    fn test_custom_dispatch() {
        let table = RouteTable::new();
        table.insert(ok_route("/fallback"));
        let dispatcher = Dispatcher::new(|table, path| {
            table.get(path).or_else(|| table.get("/fallback"))
        });
        let route = dispatcher.dispatch(&table, "/anything").unwrap();
        assert_eq!(route.path(), "/fallback");
    }
}
