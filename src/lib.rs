/// The lexer takes the source input, mapping it into a sequence of tokens.
pub mod lexer;

/// The parser takes a sequence of tokens, mapping it into a syntax tree whose
/// nodes live in an [`arena::Arena`].
pub mod parser;

/// The code generator lowers a syntax tree into x86-64 assembly text.
pub mod codegen;

pub mod arena;
pub mod ast;
pub mod error;
pub mod token;

pub mod util {
    pub mod fmt;
    #[cfg(test)]
    pub(crate) mod test_utils;
}

use crate::{arena::Arena, codegen::Syntax};

pub use crate::error::Error;

#[derive(Clone, Debug)]
pub struct Options {
    /// The assembler the output is written for.
    pub syntax: Syntax,
    /// Byte budget of the syntax-tree arena.
    pub arena_capacity: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            syntax: Syntax::default(),
            arena_capacity: arena::DEFAULT_CAPACITY,
        }
    }
}

/// Compiles a source string into assembly text, with default [`Options`].
pub fn compile(src: &str) -> Result<String, Error> {
    compile_with(src, &Options::default())
}

/// Runs the whole pipeline: lex, parse, then generate. Stops at the first
/// error.
pub fn compile_with(src: &str, options: &Options) -> Result<String, Error> {
    let _span = tracing::debug_span!("compile", syntax = %options.syntax).entered();

    let tokens = lexer::lex(src)?;
    tracing::debug!(tokens = tokens.len(), "lexed");

    let mut arena = Arena::with_capacity(options.arena_capacity);
    let program = parser::parse(&tokens, &mut arena)?;
    tracing::debug!(
        statements = program.stmts.len(),
        nodes = arena.len(),
        bytes = arena.used(),
        "parsed"
    );

    let code = codegen::generate(&program, &arena, options.syntax)?;
    tracing::debug!(bytes = code.len(), "generated");
    Ok(code)
}
