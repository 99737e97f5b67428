//! The Dao: shared connection, SQL file root, escaper and binders.

use crate::binder::{BinderRegistry, Bound};
use crate::connection::Connection;
use crate::escaper::{Escaper, MysqlEscaper};
use crate::sqlite::SqliteConnection;
use crate::statement::Statement;
use crate::{DaoConfig, DaoResult};
use parking_lot::ReentrantMutex;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uno_core::Container;
use uno_handlebars::{merge_data, HandlebarsConfig, HandlebarsEngine};
use uno_log::debug;

/// Container name a [`Dao`] is registered under by [`Dao::register`].
pub const DAO: &str = "dao";

/// Entry point of the SQL layer.
///
/// A `Dao` hands out [`Statement`] builders, one per statement. Cloning a
/// `Dao` is cheap: clones share the connection, the compiled SQL files and
/// the binder registry.
///
/// ```
/// use uno_dao::{Dao, DaoConfig};
///
/// # fn main() -> uno_dao::DaoResult<()> {
/// let dao = Dao::open(&DaoConfig::memory())?;
/// dao.batch("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)")?;
///
/// let mut insert = dao.statement();
/// let name = insert.bind("ann");
/// insert.sql(&format!("INSERT INTO users (name) VALUES ({name})"))?;
/// assert_eq!(insert.execute()?, 1);
///
/// let mut query = dao.statement();
/// let ids = query.bind(vec![1, 2, 3]);
/// query.sql(&format!("SELECT name FROM users WHERE id IN ({ids})"))?;
/// let names = query.list()?;
/// assert_eq!(names.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Dao {
    pub(crate) connection: Arc<ReentrantMutex<Box<dyn Connection>>>,
    templates: HandlebarsEngine,
    escaper: Arc<dyn Escaper>,
    pub(crate) binders: BinderRegistry,
}

impl Dao {
    /// Create a Dao over `connection`, reading SQL files from `sql_root`.
    pub fn new(connection: impl Connection + 'static, sql_root: impl Into<PathBuf>) -> Self {
        let sql_root = sql_root.into();
        debug!(
            target: "uno::dao",
            "Dao on {} with SQL root {}",
            connection.backend(),
            sql_root.display()
        );
        let connection: Box<dyn Connection> = Box::new(connection);
        Self {
            connection: Arc::new(ReentrantMutex::new(connection)),
            templates: HandlebarsEngine::new(HandlebarsConfig::sql(sql_root)),
            escaper: Arc::new(MysqlEscaper),
            binders: BinderRegistry::new(),
        }
    }

    /// Open the SQLite database named by `config`.
    pub fn open(config: &DaoConfig) -> DaoResult<Self> {
        let connection = match config.sqlite_path()? {
            Some(path) => SqliteConnection::open(path)?,
            None => SqliteConnection::open_in_memory()?,
        };
        let connection = connection.busy_timeout(config.busy_timeout)?;
        Ok(Self::new(connection, config.sql_dir.clone()))
    }

    /// A fresh, empty statement.
    pub fn statement(&self) -> Statement {
        Statement::new(self.clone())
    }

    /// A statement with `text` as its SQL.
    pub fn sql(&self, text: &str) -> Statement {
        Statement::with_sql(self.clone(), text.to_string())
    }

    /// A statement whose SQL is the file `name` rendered with `data`.
    ///
    /// `name` is relative to the SQL directory and gets `.sql` appended
    /// unconditionally: `users/find` reads `users/find.sql`.
    pub fn file(&self, name: &str, data: &[Value]) -> DaoResult<Statement> {
        let text = self.render(name, data)?;
        Ok(Statement::with_sql(self.clone(), text))
    }

    pub(crate) fn render(&self, name: &str, data: &[Value]) -> DaoResult<String> {
        let data = merge_data(data)?;
        let text = self.templates.render_file(name, &data)?;
        debug!(target: "uno::dao", "rendered SQL file {}", name);
        Ok(text)
    }

    /// Quote an identifier with the configured escaper.
    pub fn escape(&self, identifier: &str) -> DaoResult<String> {
        self.escaper.escape(identifier)
    }

    /// Replace the escaper for this Dao and the statements it creates
    /// afterwards.
    pub fn set_escaper(&mut self, escaper: impl Escaper + 'static) {
        self.escaper = Arc::new(escaper);
    }

    /// Builder form of [`set_escaper`](Self::set_escaper).
    pub fn with_escaper(mut self, escaper: impl Escaper + 'static) -> Self {
        self.set_escaper(escaper);
        self
    }

    /// Register the binder `name`, shared with every clone.
    pub fn register_binder<F>(&self, name: &str, binder: F)
    where
        F: Fn(&Value) -> DaoResult<Bound> + Send + Sync + 'static,
    {
        self.binders.register(name, binder);
    }

    /// The binder registry.
    pub fn binders(&self) -> &BinderRegistry {
        &self.binders
    }

    /// Run `;`-separated statements without parameters.
    pub fn batch(&self, sql: &str) -> DaoResult<()> {
        debug!(target: "uno::dao", "SQL batch: {}", sql);
        self.connection.lock().batch(sql)
    }

    /// Row id generated by the last insert on this connection.
    pub fn last_insert_id(&self) -> i64 {
        self.connection.lock().last_insert_id()
    }

    /// Root directory of SQL files.
    pub fn sql_root(&self) -> &Path {
        self.templates.root()
    }

    /// The SQL template engine, for registering partials or helpers.
    pub fn templates(&self) -> &HandlebarsEngine {
        &self.templates
    }

    /// Register this Dao in `container` as the `dao` singleton, so routes
    /// can declare it as a dependency.
    pub fn register(self, container: &Container) {
        container.instance(DAO, self);
    }

    /// Run `f` with the underlying connection.
    pub fn with_connection<R>(&self, f: impl FnOnce(&dyn Connection) -> R) -> R {
        let guard = self.connection.lock();
        f(&**guard)
    }
}

impl std::fmt::Debug for Dao {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dao")
            .field("sql_root", &self.sql_root())
            .field("binders", &self.binders)
            .finish_non_exhaustive()
    }
}
