//! # uno Dao
//!
//! A small SQL access layer for the uno micro-framework.
//!
//! Statements are written by hand, either inline or as handlebars SQL files
//! under a root directory, and values are bound positionally. Identifiers
//! are quoted through a replaceable escaper that rejects quote and comment
//! characters.
//!
//! ## Features
//!
//! - **Statement builder**: one statement per [`Statement`], reset after
//!   every execution
//! - **List binding**: `bind(vec![1, 2, 3])` yields `?,?,?`
//! - **SQL files**: `<sql_root>/<name>.sql`, rendered with merged data maps
//! - **Named binders**: pluggable value transforms such as `json`
//! - **Materialization**: one row, lists, keyed maps, a scalar column, or a
//!   streaming callback
//! - **SQLite backend** through `rusqlite`, behind the [`Connection`] trait
//!
//! ## Quick Start
//!
//! ```rust
//! use uno_dao::{Dao, DaoConfig};
//!
//! # fn main() -> uno_dao::DaoResult<()> {
//! let dao = Dao::open(&DaoConfig::memory())?;
//! dao.batch("CREATE TABLE tags (name TEXT); INSERT INTO tags VALUES ('a'), ('b')")?;
//!
//! let mut stmt = dao.statement();
//! let table = stmt.escape("tags")?;
//! stmt.sql(&format!("SELECT COUNT(*) FROM {table}"))?;
//! assert_eq!(stmt.column(0)?.and_then(|v| v.as_i64()), Some(2));
//! assert!(!stmt.is_pending());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod binder;
mod config;
mod connection;
mod dao;
mod error;
mod escaper;
mod row;
mod sqlite;
mod statement;
mod value;

pub use binder::*;
pub use config::*;
pub use connection::*;
pub use dao::*;
pub use error::*;
pub use escaper::*;
pub use row::*;
pub use sqlite::*;
pub use statement::*;
pub use value::*;

// Re-export rusqlite for callers that need the raw connection
pub use rusqlite;
