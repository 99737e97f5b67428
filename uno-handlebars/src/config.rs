//! Configuration for a template engine instance

use std::path::PathBuf;

/// How rendered values are escaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escape {
    /// HTML entity escaping, for views
    Html,
    /// Raw output, for SQL and other non-HTML text
    None,
}

/// Configuration for a [`crate::HandlebarsEngine`]
#[derive(Debug, Clone)]
pub struct HandlebarsConfig {
    /// Directory every template file must live under
    pub root: PathBuf,

    /// Extension appended to every template name (e.g. `.sql`)
    pub extension: Option<String>,

    pub escape: Escape,

    /// Fail on missing variables instead of rendering them empty
    pub strict_mode: bool,

    /// Re-read template files on every render instead of caching them
    pub dev_mode: bool,
}

impl HandlebarsConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: None,
            escape: Escape::Html,
            strict_mode: false,
            dev_mode: false,
        }
    }

    /// Raw-output configuration for `.sql` files under `root`.
    pub fn sql(root: impl Into<PathBuf>) -> Self {
        Self::new(root)
            .with_extension(".sql")
            .with_escape(Escape::None)
    }

    pub fn with_extension(mut self, ext: impl Into<String>) -> Self {
        let ext = ext.into();
        self.extension = if ext.is_empty() {
            None
        } else if ext.starts_with('.') {
            Some(ext)
        } else {
            Some(format!(".{ext}"))
        };
        self
    }

    pub fn with_escape(mut self, escape: Escape) -> Self {
        self.escape = escape;
        self
    }

    pub fn with_strict_mode(mut self, enable: bool) -> Self {
        self.strict_mode = enable;
        self
    }

    pub fn with_dev_mode(mut self, enable: bool) -> Self {
        self.dev_mode = enable;
        self
    }
}

impl Default for HandlebarsConfig {
    fn default() -> Self {
        Self::new("views")
    }
}
