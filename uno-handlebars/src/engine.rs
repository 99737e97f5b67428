//! Handlebars engine bound to a template root

use crate::{
    config::{Escape, HandlebarsConfig},
    helpers,
    root::TemplateRoot,
    Result,
};
use handlebars::Handlebars;
use parking_lot::RwLock;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use uno_log::{debug, trace};

/// Renders template files found under one root directory.
///
/// Compiled templates are cached by file path unless `dev_mode` is on.
#[derive(Clone)]
pub struct HandlebarsEngine {
    registry: Arc<RwLock<Handlebars<'static>>>,
    root: TemplateRoot,
    config: HandlebarsConfig,
}

impl HandlebarsEngine {
    pub fn new(config: HandlebarsConfig) -> Self {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(config.strict_mode);
        if config.escape == Escape::None {
            registry.register_escape_fn(handlebars::no_escape);
        }
        helpers::register_builtin_helpers(&mut registry);

        Self {
            registry: Arc::new(RwLock::new(registry)),
            root: TemplateRoot::new(config.root.clone(), config.extension.clone()),
            config,
        }
    }

    /// Render the file `name` (relative to the root) with `data`.
    pub fn render_file<T: Serialize>(&self, name: &str, data: &T) -> Result<String> {
        let path = self.root.resolve(name)?;
        let key = path.to_string_lossy().into_owned();

        if self.config.dev_mode || !self.registry.read().has_template(&key) {
            self.load(&key, &path)?;
        }

        trace!(target: "uno::templates", "rendering {}", key);
        Ok(self.registry.read().render(&key, data)?)
    }

    /// Render a template given as a string.
    pub fn render_str<T: Serialize>(&self, template: &str, data: &T) -> Result<String> {
        Ok(self.registry.read().render_template(template, data)?)
    }

    pub fn register_partial(&self, name: &str, template: &str) -> Result<()> {
        self.registry.write().register_partial(name, template)?;
        Ok(())
    }

    pub fn register_helper<H>(&self, name: &str, helper: H)
    where
        H: handlebars::HelperDef + Send + Sync + 'static,
    {
        self.registry.write().register_helper(name, Box::new(helper));
    }

    /// Drop every cached template.
    pub fn clear_cache(&self) {
        self.registry.write().clear_templates();
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn config(&self) -> &HandlebarsConfig {
        &self.config
    }

    fn load(&self, key: &str, path: &Path) -> Result<()> {
        let source = std::fs::read_to_string(path)?;
        self.registry.write().register_template_string(key, source)?;
        debug!(target: "uno::templates", "compiled {}", key);
        Ok(())
    }
}

impl std::fmt::Debug for HandlebarsEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlebarsEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HandlebarsError;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn views() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("hello.hbs"), "<h1>Hello {{name}}!</h1>").unwrap();
        fs::write(
            dir.path().join("find.sql"),
            "SELECT * FROM users WHERE name = '{{name}}'",
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_render_file_escapes_html() {
        let dir = views();
        let engine = HandlebarsEngine::new(HandlebarsConfig::new(dir.path()).with_extension(".hbs"));
        let out = engine.render_file("hello", &json!({"name": "<b>"})).unwrap();
        assert_eq!(out, "<h1>Hello &lt;b&gt;!</h1>");
    }

    #[test]
    fn test_sql_mode_keeps_text_raw() {
        let dir = views();
        let engine = HandlebarsEngine::new(HandlebarsConfig::sql(dir.path()));
        let out = engine.render_file("find", &json!({"name": "o'neil & co"})).unwrap();
        assert_eq!(out, "SELECT * FROM users WHERE name = 'o'neil & co'");
    }

    #[test]
    fn test_cache_and_dev_mode() {
        let dir = views();
        let cached = HandlebarsEngine::new(HandlebarsConfig::new(dir.path()).with_extension("hbs"));
        let live = HandlebarsEngine::new(
            HandlebarsConfig::new(dir.path())
                .with_extension("hbs")
                .with_dev_mode(true),
        );
        let data = json!({"name": "x"});
        cached.render_file("hello", &data).unwrap();
        live.render_file("hello", &data).unwrap();

        fs::write(dir.path().join("hello.hbs"), "bye {{name}}").unwrap();
        assert_eq!(cached.render_file("hello", &data).unwrap(), "<h1>Hello x!</h1>");
        assert_eq!(live.render_file("hello", &data).unwrap(), "bye x");

        cached.clear_cache();
        assert_eq!(cached.render_file("hello", &data).unwrap(), "bye x");
    }

    #[test]
    fn test_strict_mode_rejects_missing_variables() {
        let dir = views();
        let engine = HandlebarsEngine::new(HandlebarsConfig::new(dir.path()).with_strict_mode(true));
        assert!(matches!(
            engine.render_str("{{missing}}", &json!({})),
            Err(HandlebarsError::Render(_))
        ));
    }

    #[test]
    fn test_escape_attempt() {
        let dir = views();
        let engine = HandlebarsEngine::new(HandlebarsConfig::new(dir.path().join("nested")));
        fs::create_dir(dir.path().join("nested")).unwrap();
        assert!(matches!(
            engine.render_file("../hello.hbs", &json!({})),
            Err(HandlebarsError::InsecurePath(_))
        ));
    }

    #[test]
    fn test_partials() {
        let dir = views();
        let engine = HandlebarsEngine::new(HandlebarsConfig::new(dir.path()));
        engine.register_partial("cols", "id, name").unwrap();
        let out = engine.render_str("SELECT {{> cols}} FROM t", &json!({})).unwrap();
        assert_eq!(out, "SELECT id, name FROM t");
    }
}
