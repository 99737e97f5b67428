//! Identifier quoting.
//!
//! Values never go through an escaper; they are always bound. Escapers are
//! for the identifiers (tables, columns) that cannot be bound.

use crate::{DaoError, DaoResult};

/// Quotes an identifier for direct inclusion in SQL text.
pub trait Escaper: Send + Sync {
    /// Quote `identifier`, or fail with [`DaoError::UnsafeIdentifier`].
    fn escape(&self, identifier: &str) -> DaoResult<String>;
}

impl<F> Escaper for F
where
    F: Fn(&str) -> DaoResult<String> + Send + Sync,
{
    fn escape(&self, identifier: &str) -> DaoResult<String> {
        self(identifier)
    }
}

const FORBIDDEN: &[&str] = &["'", "\"", "`", "--", "/*"];

/// Reject identifiers carrying quotes, comment openers or empty
/// dot-separated segments.
pub fn check_identifier(identifier: &str) -> DaoResult<()> {
    let unsafe_chars = FORBIDDEN.iter().any(|bad| identifier.contains(bad));
    let empty_segment = identifier.split('.').any(|segment| segment.trim().is_empty());
    if unsafe_chars || empty_segment {
        return Err(DaoError::UnsafeIdentifier(identifier.to_string()));
    }
    Ok(())
}

fn quote_segments(identifier: &str, quote: char) -> DaoResult<String> {
    check_identifier(identifier)?;
    Ok(identifier
        .split('.')
        .map(|segment| format!("{quote}{segment}{quote}"))
        .collect::<Vec<_>>()
        .join("."))
}

/// Back-tick quoting: `` a.b `` → `` `a`.`b` ``. The default.
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlEscaper;

impl Escaper for MysqlEscaper {
    fn escape(&self, identifier: &str) -> DaoResult<String> {
        quote_segments(identifier, '`')
    }
}

/// Standard double-quote quoting: `a.b` → `"a"."b"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnsiEscaper;

impl Escaper for AnsiEscaper {
    fn escape(&self, identifier: &str) -> DaoResult<String> {
        quote_segments(identifier, '"')
    }
}
