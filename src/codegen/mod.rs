use std::fmt;

use crate::{
    arena::Arena,
    ast::Program,
    codegen::x86_64::Generator,
    token::{Span, Spanned},
};

pub mod stack;
pub mod x86_64;
pub mod x86_64_dialect;

pub type GenResult<T> = Result<T, Spanned<Error>>;

/// Lowers `program`, whose nodes live in `arena`, to assembly text for the
/// given assembler.
pub fn generate(program: &Program, arena: &Arena, syntax: Syntax) -> GenResult<String> {
    type NasmGenerator<'a> = Generator<'a, x86_64_dialect::Nasm>;
    type GasGenerator<'a> = Generator<'a, x86_64_dialect::Gas>;

    match syntax {
        Syntax::Nasm => NasmGenerator::new(arena).generate(program),
        Syntax::Gas => GasGenerator::new(arena).generate(program),
    }
}

/// The assembler the generated text is written for.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Syntax {
    #[default]
    Nasm,
    Gas,
}

impl Syntax {
    pub const ALL: &[Syntax] = &[Syntax::Nasm, Syntax::Gas];

    /// Conventional file extension of assembly sources for this assembler.
    pub const fn extension(&self) -> &'static str {
        match self {
            Syntax::Nasm => "asm",
            Syntax::Gas => "s",
        }
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Syntax::Nasm => f.write_str("nasm"),
            Syntax::Gas => f.write_str("gas"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// An identifier was referenced before any `let` bound it.
    UndeclaredIdentifier { name: Box<str> },
    /// A `let` tried to bind a name which is already bound.
    DuplicateIdentifier { name: Box<str>, previous: Span },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UndeclaredIdentifier { name } => write!(f, "undeclared identifier `{name}`"),
            Error::DuplicateIdentifier { name, previous } => {
                write!(f, "identifier `{name}` already declared at {previous}")
            }
        }
    }
}
