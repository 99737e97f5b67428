//! Error types for template rendering

use std::path::PathBuf;
use thiserror::Error;

/// Result type for template operations
pub type Result<T> = std::result::Result<T, HandlebarsError>;

/// Errors that can occur while locating or rendering templates
#[derive(Error, Debug)]
pub enum HandlebarsError {
    /// The requested file resolves outside the template root
    #[error("insecure file access: {}", .0.display())]
    InsecurePath(PathBuf),

    /// No file exists for the requested template
    #[error("template not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    #[error("template rendering error: {0}")]
    Render(String),

    #[error("template parsing error: {0}")]
    Parse(String),

    /// Data handed to a template was not a JSON object
    #[error("template data must be an object, got {0}")]
    InvalidData(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<handlebars::RenderError> for HandlebarsError {
    fn from(err: handlebars::RenderError) -> Self {
        HandlebarsError::Render(err.to_string())
    }
}

impl From<handlebars::TemplateError> for HandlebarsError {
    fn from(err: handlebars::TemplateError) -> Self {
        HandlebarsError::Parse(err.to_string())
    }
}
