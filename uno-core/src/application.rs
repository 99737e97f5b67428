// Application: container, routes, group prefixes and events in one place

use crate::capabilities::{self, names, Callable, Redirect, RequestScope, ViewRenderer};
use crate::container::{Container, Deps, Instance, Scope};
use crate::error_handler::{DefaultErrorHandler, ErrorHandler, ErrorHandlerRef};
use crate::http::{Cookies, Form, Query, RawBody, Request, Response, Session};
use crate::model::Loader;
use crate::router::{Dispatcher, PrefixStack, Route, RouteTable};
use crate::{AppConfig, Error, Result};
use http::header::SET_COOKIE;
use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;
use uno_events::{EventArgs, EventBus, ListenerResult};
use uno_log::{debug, trace};

/// Emitted before a route handler runs, with `(Arc<Route>, String)`.
pub const ROUTE_BEFORE: &str = "route.before";

/// Emitted after a route handler returned successfully, with
/// `(Arc<Route>, String)`.
pub const ROUTE_AFTER: &str = "route.after";

/// The application.
///
/// Handlers receive `&Application` plus the dependencies they declared,
/// so they can reach any other registered name on demand.
///
/// ```
/// use uno_core::{Application, Response};
///
/// struct Greeter;
/// impl Greeter {
///     fn greet(&self) -> String { "hello".into() }
/// }
///
/// let app = Application::new();
/// app.register("greeter", &[], |_| Ok(Greeter));
/// app.group("api", &[], |app, _| {
///     app.route("hello", &["greeter"], |_, deps| {
///         Ok(Response::text(deps.get::<Greeter>(0)?.greet()))
///     });
///     Ok(())
/// })
/// .unwrap();
///
/// let response = app.run("/api/hello").unwrap();
/// assert_eq!(response.body, "hello");
/// ```
pub struct Application {
    container: Container,
    events: EventBus,
    routes: RouteTable,
    prefixes: PrefixStack,
    error_handler: Arc<dyn ErrorHandler>,
    config: AppConfig,
}

impl Application {
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let error_handler: Arc<dyn ErrorHandler> =
            Arc::new(DefaultErrorHandler::new(config.debug_errors));
        let container = Container::new();
        capabilities::register_core(&container, &config, ErrorHandlerRef(error_handler.clone()));

        debug!(target: "uno::app", "application created with {:?}", config);
        Self {
            container,
            events: EventBus::new(),
            routes: RouteTable::new(),
            prefixes: PrefixStack::new(),
            error_handler,
            config,
        }
    }

    /// Replace the handler [`handle`](Self::handle) reports errors through.
    pub fn with_error_handler<H: ErrorHandler + 'static>(mut self, handler: H) -> Self {
        self.error_handler = Arc::new(handler);
        self.container
            .instance(names::ONERROR, ErrorHandlerRef(self.error_handler.clone()));
        self
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn prefixes(&self) -> &PrefixStack {
        &self.prefixes
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    // Dependencies

    /// See [`Container::register`].
    pub fn register<T, F>(&self, name: &str, dependencies: &[&str], factory: F)
    where
        T: Any + Send + Sync,
        F: Fn(&Deps) -> Result<T> + Send + Sync + 'static,
    {
        self.container.register(name, dependencies, factory);
    }

    pub fn register_scoped<T, F>(&self, name: &str, dependencies: &[&str], scope: Scope, factory: F)
    where
        T: Any + Send + Sync,
        F: Fn(&Deps) -> Result<T> + Send + Sync + 'static,
    {
        self.container.register_scoped(name, dependencies, scope, factory);
    }

    pub fn instance<T: Any + Send + Sync>(&self, name: &str, value: T) {
        self.container.instance(name, value);
    }

    pub fn resolve<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        self.container.resolve(name)
    }

    pub fn try_resolve<T: Any + Send + Sync>(&self, name: &str) -> Result<Option<Arc<T>>> {
        self.container.try_resolve(name)
    }

    /// Resolve a name without knowing its type.
    pub fn dependency(&self, name: &str) -> Result<Instance> {
        self.container.resolve_any(name)
    }

    pub fn call<R, F>(&self, dependencies: &[&str], f: F) -> Result<R>
    where
        F: FnOnce(&Deps) -> Result<R>,
    {
        self.container.call(dependencies, f)
    }

    // Events

    pub fn on<F>(&self, event: &str, listener: F)
    where
        F: Fn(&EventArgs<'_>) -> ListenerResult + Send + Sync + 'static,
    {
        self.events.on(event, listener);
    }

    pub fn emit(&self, event: &str, args: &[&dyn Any]) -> Result<()> {
        Ok(self.events.emit(event, args)?)
    }

    // Routing

    /// Run `body` with `prefix` pushed onto the group stack. The prefix is
    /// popped when `body` returns, fails or panics.
    pub fn group<F>(&self, prefix: &str, dependencies: &[&str], body: F) -> Result<()>
    where
        F: FnOnce(&Application, &Deps) -> Result<()>,
    {
        let _guard = self.prefixes.push(prefix);
        trace!(target: "uno::router", "entering group {:?}", self.prefixes.segments());
        self.container.call(dependencies, |deps| body(self, deps))
    }

    /// Register `handler` under the current group prefixes plus `uri`,
    /// replacing any route already stored at that path.
    pub fn route<F>(&self, uri: &str, dependencies: &[&str], handler: F) -> String
    where
        F: Fn(&Application, &Deps) -> Result<Response> + Send + Sync + 'static,
    {
        let path = self.prefixes.build_path(uri);
        let replaced = self
            .routes
            .insert(Route::new(path.clone(), dependencies, handler))
            .is_some();
        debug!(
            target: "uno::router",
            "route {} -> {:?}{}",
            path,
            dependencies,
            if replaced { " (replaced)" } else { "" }
        );
        path
    }

    /// Dispatch `uri` and run its handler.
    ///
    /// Fails with [`Error::RouteNotFound`] before any event is emitted when
    /// no route matches. A failing handler or listener aborts the run, so
    /// `route.after` is only emitted for a handler that succeeded.
    pub fn run(&self, uri: &str) -> Result<Response> {
        let path = self.prefixes.build_path(uri);
        let dispatcher = self.container.resolve::<Dispatcher>(names::ROUTER)?;
        let route = dispatcher
            .dispatch(&self.routes, &path)
            .ok_or_else(|| Error::RouteNotFound(path.clone()))?;
        debug!(target: "uno::router", "dispatching {} to {}", path, route.path());

        let args: [&dyn Any; 2] = [&route, &path];
        self.events.emit(ROUTE_BEFORE, &args)?;
        let response = route.invoke(self)?;
        self.events.emit(ROUTE_AFTER, &args)?;
        Ok(response)
    }

    /// Serve one request: make it the `request` seen by this call, run its
    /// path, and turn any error into a response through the error handler.
    /// Cookies queued during the request are appended as `Set-Cookie`
    /// headers.
    ///
    /// The request is scoped to the calling thread, so concurrent calls on
    /// one application each see their own request.
    pub fn handle(&self, request: Request) -> Response {
        let path = request.path.clone();
        let cookies = request.cookies.clone();

        let mut response = {
            let _scope = RequestScope::enter(&self.container, request);
            match self.run(&path) {
                Ok(response) => response,
                Err(err) => self.error_handler.handle(&err),
            }
        };
        for value in cookies.take_headers() {
            response.headers.append(SET_COOKIE, value);
        }
        response
    }

    /// Call a method by name.
    ///
    /// A registered [`Callable`] named `name` is invoked with `args`.
    /// Otherwise `isXxx` compares `Xxx` with the request method,
    /// case-insensitively. Anything else is [`Error::NoSuchMethod`].
    pub fn invoke(&self, name: &str, args: &[Value]) -> Result<Value> {
        match self.container.try_resolve::<Callable>(name) {
            Ok(Some(callable)) => return callable.call(args),
            Ok(None) | Err(Error::DependencyType { .. }) => {}
            Err(err) => return Err(err),
        }

        if let Some(method) = method_check(name) {
            return self.is_method(method).map(Value::Bool);
        }
        Err(Error::NoSuchMethod(name.to_string()))
    }

    /// Whether the current request uses `method` (case-insensitive).
    pub fn is_method(&self, method: &str) -> Result<bool> {
        Ok(self.request()?.is_method(method))
    }

    // Typed accessors for the built-in capabilities

    pub fn request(&self) -> Result<Arc<Request>> {
        self.resolve(names::REQUEST)
    }

    pub fn query(&self) -> Result<Arc<Query>> {
        self.resolve(names::QUERY)
    }

    pub fn form(&self) -> Result<Arc<Form>> {
        self.resolve(names::FORM)
    }

    pub fn cookies(&self) -> Result<Arc<Cookies>> {
        self.resolve(names::COOKIE)
    }

    pub fn session(&self) -> Result<Arc<Session>> {
        self.resolve(names::SESSION)
    }

    pub fn raw_body(&self) -> Result<Arc<RawBody>> {
        self.resolve(names::RAWPOST)
    }

    pub fn view(&self) -> Result<Arc<ViewRenderer>> {
        self.resolve(names::VIEW)
    }

    /// Render a view as an HTML response.
    pub fn render(&self, file: &str, data: &[Value]) -> Result<Response> {
        self.view()?.response(file, data)
    }

    pub fn loader(&self) -> Result<Arc<Loader>> {
        self.resolve(names::LOAD)
    }

    pub fn json<T: Serialize + ?Sized>(&self, value: &T) -> Result<Response> {
        Response::json(value)
    }

    pub fn redirect(&self, location: &str) -> Result<Response> {
        self.resolve::<Redirect>(names::REDIRECT)?.to(location)
    }

    /// Write `message` through the `log` capability.
    pub fn log(&self, message: &str) -> Result<()> {
        self.invoke(names::LOG, &[Value::String(message.to_string())])
            .map(|_| ())
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("config", &self.config)
            .field("routes", &self.routes.paths())
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

/// `isPost` → `Post`.
fn method_check(name: &str) -> Option<&str> {
    let prefix = name.get(..2)?;
    let method = &name[2..];
    (prefix.eq_ignore_ascii_case("is") && !method.is_empty()).then_some(method)
}
