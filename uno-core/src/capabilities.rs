//! Capabilities every application registers at construction

use crate::container::{Container, Scope};
use crate::error_handler::ErrorHandlerRef;
use crate::http::{Form, Query, RawBody, Request, Response};
use crate::model::Loader;
use crate::router::Dispatcher;
use crate::{AppConfig, Result};
use serde_json::Value;
use std::cell::RefCell;
use std::path::Path;
use std::sync::Arc;
use uno_handlebars::{merge_data, HandlebarsConfig, HandlebarsEngine};
use uno_log::info;

/// Reserved dependency names.
pub mod names {
    pub const CONTAINER: &str = crate::container::CONTAINER;
    pub const ROUTER: &str = "router";
    pub const VIEW: &str = "view";
    pub const JSON: &str = "json";
    pub const REDIRECT: &str = "redirect";
    pub const LOAD: &str = "load";
    pub const QUERY: &str = "query";
    pub const FORM: &str = "form";
    pub const COOKIE: &str = "cookie";
    pub const SESSION: &str = "session";
    pub const RAWPOST: &str = "rawpost";
    pub const LOG: &str = "log";
    pub const ONERROR: &str = "onerror";
    pub const REQUEST: &str = "request";
}

type CallableFn = dyn Fn(&[Value]) -> Result<Value> + Send + Sync;

/// A dependency that can be invoked by name through
/// [`Application::invoke`](crate::Application::invoke).
#[derive(Clone)]
pub struct Callable(Arc<CallableFn>);

impl Callable {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, args: &[Value]) -> Result<Value> {
        (self.0)(args)
    }
}

impl std::fmt::Debug for Callable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Callable").finish()
    }
}

/// The `redirect` capability.
#[derive(Debug, Clone, Copy, Default)]
pub struct Redirect;

impl Redirect {
    pub fn to(&self, location: &str) -> Result<Response> {
        Response::redirect(location)
    }
}

/// The `view` capability: HTML templates under the view directory.
#[derive(Debug, Clone)]
pub struct ViewRenderer {
    engine: HandlebarsEngine,
}

impl ViewRenderer {
    pub fn new(view_dir: impl AsRef<Path>) -> Self {
        Self::with_config(HandlebarsConfig::new(view_dir.as_ref()))
    }

    pub fn with_config(config: HandlebarsConfig) -> Self {
        Self {
            engine: HandlebarsEngine::new(config),
        }
    }

    /// Render `file` with the data maps merged left to right.
    pub fn render(&self, file: &str, data: &[Value]) -> Result<String> {
        let data = merge_data(data)?;
        Ok(self.engine.render_file(file, &data)?)
    }

    pub fn response(&self, file: &str, data: &[Value]) -> Result<Response> {
        self.render(file, data).map(Response::html)
    }

    pub fn engine(&self) -> &HandlebarsEngine {
        &self.engine
    }
}

fn encode_json(args: &[Value]) -> Result<Value> {
    let value = args.first().unwrap_or(&Value::Null);
    Ok(Value::String(serde_json::to_string(value)?))
}

fn write_log(args: &[Value]) -> Result<Value> {
    let message = args
        .iter()
        .map(|arg| match arg {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ");
    info!(target: "uno::app", "{}", message);
    Ok(Value::Null)
}

/// Register the built-in capabilities on `container`.
pub(crate) fn register_core(container: &Container, config: &AppConfig, on_error: ErrorHandlerRef) {
    use names::*;

    let view_dir = config.view_dir.clone();
    container.register(ROUTER, &[], |_| Ok(Dispatcher::exact()));
    container.register(VIEW, &[], move |_| Ok(ViewRenderer::new(&view_dir)));
    container.register(JSON, &[], |_| Ok(Callable::new(encode_json)));
    container.register(REDIRECT, &[], |_| Ok(Redirect));
    container.register(LOAD, &[], |_| Ok(Loader));
    container.register(LOG, &[], |_| Ok(Callable::new(write_log)));
    container.instance(ONERROR, on_error);

    let id = container.id();
    container.register_scoped(REQUEST, &[], Scope::Transient, move |_| Ok(current_request(id)));
    container.register_scoped(QUERY, &[REQUEST], Scope::Transient, |deps| {
        Ok(Query(deps.get::<Request>(0)?.query.clone()))
    });
    container.register_scoped(FORM, &[REQUEST], Scope::Transient, |deps| {
        Ok(Form(deps.get::<Request>(0)?.form.clone()))
    });
    container.register_scoped(COOKIE, &[REQUEST], Scope::Transient, |deps| {
        Ok(deps.get::<Request>(0)?.cookies.clone())
    });
    container.register_scoped(SESSION, &[REQUEST], Scope::Transient, |deps| {
        Ok(deps.get::<Request>(0)?.session.clone())
    });
    container.register_scoped(RAWPOST, &[REQUEST], Scope::Transient, |deps| {
        Ok(RawBody(deps.get::<Request>(0)?.body.clone()))
    });
}

thread_local! {
    // Requests being served on this thread, innermost last, keyed by container id.
    static CURRENT_REQUEST: RefCell<Vec<(usize, Arc<Request>)>> = const { RefCell::new(Vec::new()) };
}

/// Makes `request` the container's `request` on this thread until dropped.
///
/// Other threads serving the same container keep seeing their own request.
pub(crate) struct RequestScope;

impl RequestScope {
    pub(crate) fn enter(container: &Container, request: Request) -> Self {
        CURRENT_REQUEST.with(|stack| {
            stack.borrow_mut().push((container.id(), Arc::new(request)));
        });
        RequestScope
    }
}

impl Drop for RequestScope {
    fn drop(&mut self) {
        CURRENT_REQUEST.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

fn current_request(container: usize) -> Request {
    CURRENT_REQUEST.with(|stack| {
        stack
            .borrow()
            .iter()
            .rev()
            .find(|(id, _)| *id == container)
            .map(|(_, request)| Request::clone(request))
            .unwrap_or_default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use serde_json::json;

    #[test]
    fn test_json_callable() {
        let out = encode_json(&[json!({"path": "/a/b", "name": "Zoë"})]).unwrap();
        assert_eq!(out, json!(r#"{"name":"Zoë","path":"/a/b"}"#));
        assert_eq!(encode_json(&[]).unwrap(), json!("null"));
    }

    #[test]
    fn test_view_renderer() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("page.html"), "<p>{{title}} {{user}}</p>").unwrap();
        let view = ViewRenderer::new(dir.path());
        let html = view
            .render("page.html", &[json!({"title": "Hi", "user": "a"}), json!({"user": "<b>"})])
            .unwrap();
        assert_eq!(html, "<p>Hi &lt;b&gt;</p>");

        assert!(matches!(
            view.render("../page.html", &[]),
            Err(Error::InsecureFileAccess(_))
        ));
    }

    #[test]
    fn test_request_derived_capabilities_follow_scope() {
        let container = Container::new();
        register_core(
            &container,
            &AppConfig::default(),
            ErrorHandlerRef(Arc::new(crate::DefaultErrorHandler::default())),
        );
        assert!(container.resolve::<Query>(names::QUERY).unwrap().all().is_empty());

        {
            let _scope = RequestScope::enter(&container, Request::get("/x?id=4").unwrap());
            assert_eq!(container.resolve::<Query>("QUERY").unwrap().get("id"), Some("4"));

            {
                let _inner = RequestScope::enter(&container, Request::get("/y?id=5").unwrap());
                assert_eq!(container.resolve::<Query>("query").unwrap().get("id"), Some("5"));
            }
            assert_eq!(container.resolve::<Request>("request").unwrap().path, "/x");
        }
        assert_eq!(container.resolve::<Request>("request").unwrap().path, "/");
    }

    #[test]
    fn test_request_scope_is_per_container() {
        let first = Container::new();
        let second = Container::new();
        for container in [&first, &second] {
            register_core(
                container,
                &AppConfig::default(),
                ErrorHandlerRef(Arc::new(crate::DefaultErrorHandler::default())),
            );
        }

        let _scope = RequestScope::enter(&first, Request::get("/a?id=1").unwrap());
        assert_eq!(first.resolve::<Query>(names::QUERY).unwrap().get("id"), Some("1"));
        assert_eq!(second.resolve::<Query>(names::QUERY).unwrap().get("id"), None);
    }
}
