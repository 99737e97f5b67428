// Core library for the uno micro-framework
// Dependency container, exact-path router with group prefixes, and the
// application that ties them to the event bus

pub mod application;
pub mod capabilities;
pub mod config;
pub mod container;
pub mod error;
pub mod error_handler;
pub mod http;
pub mod model;
pub mod router;

// Re-export commonly used types
pub use application::{Application, ROUTE_AFTER, ROUTE_BEFORE};
pub use capabilities::{names, Callable, Redirect, ViewRenderer};
pub use config::AppConfig;
pub use container::{normalize_name, Container, Deps, Instance, Scope, TRANSIENT_SIGIL};
pub use error::{BoxError, Error, Result};
pub use error_handler::{DefaultErrorHandler, ErrorHandler, ErrorHandlerRef};
pub use crate::http::{Cookies, Fields, Form, Query, RawBody, Request, Response, Session};
pub use model::{snake_to_camel, Loader, Model};
pub use router::{normalize_segment, Dispatcher, GroupGuard, PrefixStack, Route, RouteTable};

pub use uno_events::{EventArgs, EventBus, EventBusError, ListenerError, ListenerResult};
