use std::{fmt, iter::Peekable};

use crate::token::{Span, Spanned, Token, TokenKind, KEYWORDS};

pub const SUGGESTED_TOKENS_CAPACITY: usize = 1_024;

pub type LexResult<T> = Result<T, Spanned<Error>>;

/// Lexes the provided string, producing the tokens into the provided buffer.
///
/// On error the buffer is left empty; no partial token stream is exposed.
pub fn lex_into(src: &str, tokens: &mut Vec<Token>) -> LexResult<()> {
    let result = Lexer::new(src, tokens).lex();
    if result.is_err() {
        tokens.clear();
    }
    result
}

/// A convenience function that allocates a new buffer per lexed input and
/// returns it.
pub fn lex(src: &str) -> LexResult<Vec<Token>> {
    let mut tokens = Vec::with_capacity(SUGGESTED_TOKENS_CAPACITY);
    lex_into(src, &mut tokens)?;
    Ok(tokens)
}

/// The hydro lexer
struct Lexer<'src, 'tok> {
    src: &'src str,
    iter: Peekable<std::str::Chars<'src>>,
    cursor: usize,
    current_lo: usize,
    tokens: &'tok mut Vec<Token>,
}

impl Lexer<'_, '_> {
    /// Scans the source string until the input is exhausted.
    ///
    /// Tokens are written into the provided tokens buffer.
    fn lex(mut self) -> LexResult<()> {
        assert_eq!(self.tokens.len(), 0, "must pass clean tokens buffer");
        while let Some(kind) = self.scan_token_kind()? {
            self.produce(kind);
        }
        Ok(())
    }

    /// Scans up to the next token, skipping whitespace. Returns `None` once
    /// the input is exhausted.
    fn scan_token_kind(&mut self) -> LexResult<Option<TokenKind>> {
        use TokenKind::*;
        loop {
            let Some(c) = self.mark_advance() else {
                return Ok(None);
            };
            let kind = match c {
                '(' => LParen,
                ')' => RParen,
                ';' => Semicolon,
                '=' => Eq,
                '+' => Plus,
                c if c.is_ascii_alphabetic() => self.identifier_or_keyword(),
                c if c.is_ascii_digit() => self.int_lit(),
                c if c.is_ascii_whitespace() => continue,
                c => return Err(self.span().wrap(Error::UnexpectedChar(c))),
            };
            return Ok(Some(kind));
        }
    }

    fn identifier_or_keyword(&mut self) -> TokenKind {
        while self.peek().is_some_and(|c| c.is_ascii_alphanumeric()) {
            self.advance();
        }
        KEYWORDS
            .get(self.substr())
            .copied()
            .unwrap_or(TokenKind::Identifier)
    }

    fn int_lit(&mut self) -> TokenKind {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        TokenKind::IntLit
    }
}

impl Lexer<'_, '_> {
    /// Constructs a new lexer with the default state.
    fn new<'src, 'tok>(src: &'src str, tokens: &'tok mut Vec<Token>) -> Lexer<'src, 'tok> {
        Lexer {
            src,
            iter: src.chars().peekable(),
            cursor: 0,
            current_lo: 0,
            tokens,
        }
    }

    /// Starts a new token "mark" and advances the iterator.
    fn mark_advance(&mut self) -> Option<char> {
        self.current_lo = self.cursor;
        self.advance()
    }

    /// Returns the next character and advances the iterator.
    fn advance(&mut self) -> Option<char> {
        self.iter
            .next()
            .inspect(|c| self.cursor += c.len_utf8())
    }

    /// Returns the next character without advancing the iterator.
    fn peek(&mut self) -> Option<char> {
        self.iter.peek().copied()
    }

    /// Returns the current span.
    fn span(&self) -> Span {
        Span::new_of_bounds(self.current_lo..self.cursor)
    }

    /// Returns the substring of the current marked bounds.
    fn substr(&self) -> &str {
        self.span().substr(self.src)
    }

    /// Produces a token using the marked bounds. Literals and identifiers
    /// keep their source text verbatim.
    fn produce(&mut self, kind: TokenKind) {
        let value = kind.has_payload().then(|| Box::from(self.substr()));
        self.tokens.push(Token::new(kind, self.span(), value));
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    UnexpectedChar(char),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnexpectedChar(c) => write!(f, "unexpected character {c:?}"),
        }
    }
}
