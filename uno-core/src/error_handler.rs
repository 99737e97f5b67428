//! Converting unhandled errors into responses

use crate::{Error, Response};
use std::error::Error as _;
use std::fmt::Write;
use std::sync::Arc;
use uno_handlebars::handlebars::html_escape;
use uno_log::error;

/// Turns an error that escaped a request into the response sent back.
///
/// Injected into the [`Application`](crate::Application) and invoked only
/// by [`Application::handle`](crate::Application::handle).
pub trait ErrorHandler: Send + Sync {
    fn handle(&self, error: &Error) -> Response;
}

impl<F> ErrorHandler for F
where
    F: Fn(&Error) -> Response + Send + Sync,
{
    fn handle(&self, error: &Error) -> Response {
        self(error)
    }
}

/// The `onerror` capability.
#[derive(Clone)]
pub struct ErrorHandlerRef(pub Arc<dyn ErrorHandler>);

impl ErrorHandlerRef {
    pub fn handle(&self, error: &Error) -> Response {
        self.0.handle(error)
    }
}

impl std::fmt::Debug for ErrorHandlerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ErrorHandlerRef").finish()
    }
}

/// Logs the error and renders a `<pre>` report. The status comes from
/// [`Error::status`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorHandler {
    debug: bool,
}

impl DefaultErrorHandler {
    /// With `debug` on, the report also lists the source chain.
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }

    pub fn report(&self, err: &Error) -> String {
        let mut out = String::from("<pre>\n");
        let _ = writeln!(out, "{}: {}", err.kind(), html_escape(&err.to_string()));

        if self.debug {
            let mut source = err.source();
            while let Some(cause) = source {
                let _ = writeln!(out, "caused by: {}", html_escape(&cause.to_string()));
                source = cause.source();
            }
        }

        out.push_str("</pre>");
        out
    }
}

impl ErrorHandler for DefaultErrorHandler {
    fn handle(&self, err: &Error) -> Response {
        error!(target: "uno::error", "{} ({}): {}", err.kind(), err.status_code(), err);
        Response::html(self.report(err)).with_status(err.status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn test_report_escapes_and_sets_status() {
        let response = DefaultErrorHandler::new(false).handle(&Error::RouteNotFound("/<x>".into()));
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.body, "<pre>\nRouteNotFound: route not found: /&lt;x&gt;\n</pre>");
    }

    #[test]
    fn test_debug_report_lists_sources() {
        let io = std::io::Error::other("disk gone");
        let err = Error::Database(Box::new(io));
        let quiet = DefaultErrorHandler::new(false).report(&err);
        let loud = DefaultErrorHandler::new(true).report(&err);
        assert!(!quiet.contains("caused by"));
        assert!(loud.contains("caused by: disk gone"));
    }

    #[test]
    fn test_closure_handler() {
        let handler = |err: &Error| Response::text(err.kind()).with_status(StatusCode::IM_A_TEAPOT);
        let response = ErrorHandlerRef(Arc::new(handler)).handle(&Error::handler("x"));
        assert_eq!(response.body, "Handler");
        assert_eq!(response.status_code(), 418);
    }
}
