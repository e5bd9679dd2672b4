use std::fmt;

use crate::{error::Error, token::Spanned};

/// The alternate form (`{:#}`) prefixes the message with the span.
impl<T> fmt::Display for Spanned<T>
where
    T: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Spanned { span, inner } = self;
        if f.alternate() {
            write!(f, "{span}: ")?;
        }
        write!(f, "{inner}")
    }
}

/// A compilation error rendered against its source: position, message and
/// the offending line with a caret marker.
pub struct Diagnostic<'a> {
    pub path: &'a str,
    pub src: &'a str,
    pub error: &'a Error,
}

impl fmt::Display for Diagnostic<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Diagnostic { path, src, error } = self;
        let span = error.span();
        let pos = span.position(src);
        writeln!(f, "{path}:{pos}: error[{}]: {error}", error.category())?;

        let line = src.lines().nth(pos.line - 1).unwrap_or_default();
        let width = span.substr(src).chars().count().max(1);
        writeln!(f, "{:>4} | {line}", pos.line)?;
        write!(f, "     | {:pad$}{:^<width$}", "", "", pad = pos.column - 1)
    }
}
