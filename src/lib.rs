// uno - a synchronous micro-framework for Rust
//
// This library ties a name-based dependency container, exact-path routing
// with group prefixes and an event bus to a hand-written SQL builder.

// Re-export core functionality
pub use uno_core::*;

// Re-export member crates
pub use uno_events;
pub use uno_handlebars;
pub use uno_log;

pub use uno_log::{debug, error, info, trace, warn};

#[cfg(feature = "dao")]
pub use uno_dao;

#[cfg(feature = "dao")]
pub use uno_dao::{Dao, DaoConfig, DaoError, DaoResult, Row, SqlValue, Statement};

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        AppConfig,
        Application,
        Container,
        Deps,
        Error,
        Form,
        Model,
        Query,
        Request,
        Response,
        Route,
        Scope,
        ROUTE_AFTER,
        ROUTE_BEFORE,
    };

    #[cfg(feature = "dao")]
    pub use crate::{Dao, DaoConfig, Row, SqlValue, Statement};
}
