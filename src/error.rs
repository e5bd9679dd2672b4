use std::fmt;

use crate::{
    codegen, lexer, parser,
    token::{Span, Spanned},
};

/// Any failure of the compilation pipeline. Every error is fatal: the
/// pipeline stops at the first one and produces no output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    Lex(Spanned<lexer::Error>),
    Syntax(Spanned<parser::Error>),
    Generate(Spanned<codegen::Error>),
}

impl Error {
    pub fn span(&self) -> Span {
        match self {
            Error::Lex(e) => e.span,
            Error::Syntax(e) => e.span,
            Error::Generate(e) => e.span,
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Error::Lex(_) => Category::Lex,
            Error::Syntax(Spanned {
                inner: parser::Error::AllocationExhausted { .. },
                ..
            }) => Category::AllocationExhausted,
            Error::Syntax(_) => Category::Syntax,
            Error::Generate(Spanned {
                inner: codegen::Error::UndeclaredIdentifier { .. },
                ..
            }) => Category::UndeclaredIdentifier,
            Error::Generate(Spanned {
                inner: codegen::Error::DuplicateIdentifier { .. },
                ..
            }) => Category::DuplicateIdentifier,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Forward the alternate flag, which controls span printing.
        match (self, f.alternate()) {
            (Error::Lex(e), false) => write!(f, "{e}"),
            (Error::Lex(e), true) => write!(f, "{e:#}"),
            (Error::Syntax(e), false) => write!(f, "{e}"),
            (Error::Syntax(e), true) => write!(f, "{e:#}"),
            (Error::Generate(e), false) => write!(f, "{e}"),
            (Error::Generate(e), true) => write!(f, "{e:#}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<Spanned<lexer::Error>> for Error {
    fn from(value: Spanned<lexer::Error>) -> Self {
        Error::Lex(value)
    }
}

impl From<Spanned<parser::Error>> for Error {
    fn from(value: Spanned<parser::Error>) -> Self {
        Error::Syntax(value)
    }
}

impl From<Spanned<codegen::Error>> for Error {
    fn from(value: Spanned<codegen::Error>) -> Self {
        Error::Generate(value)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Category {
    Lex,
    Syntax,
    AllocationExhausted,
    UndeclaredIdentifier,
    DuplicateIdentifier,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Category::Lex => "lex",
            Category::Syntax => "syntax",
            Category::AllocationExhausted => "allocation-exhausted",
            Category::UndeclaredIdentifier => "undeclared-identifier",
            Category::DuplicateIdentifier => "duplicate-identifier",
        };
        f.write_str(s)
    }
}
