//! Path containment for template directories

use crate::error::{HandlebarsError, Result};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// A directory that template names are resolved against.
///
/// Resolution fails with [`HandlebarsError::InsecurePath`] whenever the
/// resulting file would live outside the directory, whether through `..`,
/// an absolute name, or a symlink.
#[derive(Debug, Clone)]
pub struct TemplateRoot {
    root: PathBuf,
    extension: Option<String>,
}

impl TemplateRoot {
    pub fn new(root: impl Into<PathBuf>, extension: Option<String>) -> Self {
        Self {
            root: root.into(),
            extension,
        }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Resolve `name` to an existing, canonical file under the root.
    ///
    /// The extension is always appended, so `users/find.sql` looks for
    /// `users/find.sql.sql`.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        let file_name = match &self.extension {
            Some(ext) => format!("{name}{ext}"),
            None => name.to_string(),
        };
        let relative = Path::new(&file_name);
        let candidate = self.root.join(relative);

        if !stays_inside(relative) {
            return Err(HandlebarsError::InsecurePath(candidate));
        }

        let root = self.root.canonicalize()?;
        let file = match candidate.canonicalize() {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(HandlebarsError::TemplateNotFound(candidate));
            }
            Err(err) => return Err(err.into()),
        };

        if !file.starts_with(&root) {
            return Err(HandlebarsError::InsecurePath(file));
        }
        if !file.is_file() {
            return Err(HandlebarsError::TemplateNotFound(file));
        }
        Ok(file)
    }
}

/// Lexical check: relative, and never climbs above its starting directory.
fn stays_inside(path: &Path) -> bool {
    let mut depth: usize = 0;
    for component in path.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    depth > 0
}
