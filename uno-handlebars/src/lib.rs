//! Handlebars rendering for uno.
//!
//! One engine type serves two jobs: HTML views (escaping on) and SQL
//! template files (escaping off). Both resolve file names against a root
//! directory and refuse anything that lands outside it.
//!
//! ```no_run
//! use uno_handlebars::{HandlebarsConfig, HandlebarsEngine, merge_data};
//! use serde_json::json;
//!
//! # fn main() -> uno_handlebars::Result<()> {
//! let sql = HandlebarsEngine::new(HandlebarsConfig::sql("sql"));
//! let data = merge_data(&[json!({"table": "users"}), json!({"active": true})])?;
//! let text = sql.render_file("users/list", &data)?;
//! # let _ = text;
//! # Ok(())
//! # }
//! ```
//!
//! Built-in helpers: `eq`, `ne`, `and`, `or`, `not`, `upper`, `lower`,
//! `len`, `join`, `json`.

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod helpers;
pub mod root;

pub use config::{Escape, HandlebarsConfig};
pub use context::merge_data;
pub use engine::HandlebarsEngine;
pub use error::{HandlebarsError, Result};
pub use root::TemplateRoot;

pub use handlebars;
