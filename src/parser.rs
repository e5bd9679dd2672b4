use std::fmt;

use crate::{
    arena::{Arena, Exhausted, Id, Node},
    ast::{Expr, Program, Stmt, Term},
    token::{Span, Spanned, Token, TokenKind},
};

type Result<T, E = Spanned<Error>> = std::result::Result<T, E>;

pub type ParseResult<T> = Result<T>;

/// Parses the whole token sequence into a [`Program`], allocating every node
/// in the provided arena.
///
/// Parsing stops at the first error; nothing is recovered.
pub fn parse(tokens: &[Token], arena: &mut Arena) -> ParseResult<Program> {
    Parser::new(tokens, arena).parse_program()
}

/// Parses a single expression, which must span the whole token sequence.
pub fn parse_expr(tokens: &[Token], arena: &mut Arena) -> ParseResult<Id<Expr>> {
    let mut p = Parser::new(tokens, arena);
    let expr = p.parse_expr()?;
    match p.peek() {
        Some(token) => Err(token.span().wrap(Error::TrailingToken { actual: token.kind })),
        None => Ok(expr),
    }
}

struct Parser<'tok, 'ast> {
    tokens: &'tok [Token],
    arena: &'ast mut Arena,
    cursor: usize,
}

impl<'tok> Parser<'tok, '_> {
    fn parse_program(&mut self) -> Result<Program> {
        let mut stmts = Vec::with_capacity(16);
        while let Some(first) = self.peek() {
            stmts.push(self.parse_stmt(first)?);
        }
        Ok(Program { stmts })
    }

    fn parse_stmt(&mut self, first: &'tok Token) -> Result<Id<Stmt>> {
        let stmt = match (first.kind, self.peek_kind(1)) {
            // exit '(' expr ')' ';'
            (TokenKind::Exit, Some(TokenKind::LParen)) => {
                self.advance();
                self.advance();
                let expr = self.parse_expr()?;
                self.consume(TokenKind::RParen)?;
                self.consume(TokenKind::Semicolon)?;
                Stmt::Exit { expr }
            }
            // let ID '=' expr ';'
            (TokenKind::Let, Some(TokenKind::Identifier)) => {
                self.advance();
                let ident = self.consume(TokenKind::Identifier)?.clone();
                self.consume(TokenKind::Eq)?;
                let expr = self.parse_expr()?;
                self.consume(TokenKind::Semicolon)?;
                Stmt::Let { ident, expr }
            }
            // The keyword is right, but the statement's second token is not.
            (TokenKind::Exit, _) => return Err(self.unexpected(1, TokenKind::LParen)),
            (TokenKind::Let, _) => return Err(self.unexpected(1, TokenKind::Identifier)),
            (actual, _) => {
                return Err(first.span().wrap(Error::InvalidStatement { actual }));
            }
        };
        self.alloc(stmt)
    }

    fn parse_expr(&mut self) -> Result<Id<Expr>> {
        let term = self.parse_term()?;
        let mut rhs = self.alloc(Expr::Term(term))?;
        let mut pending = Vec::new();
        while self.take(TokenKind::Plus).is_some() {
            pending.push(rhs);
            let term = self.parse_term()?;
            rhs = self.alloc(Expr::Term(term))?;
        }
        // Each operand takes everything after it as its right operand, so
        // `a + b + c` is `a + (b + c)`. Folding from the right allocates
        // the innermost addition first.
        while let Some(lhs) = pending.pop() {
            rhs = self.alloc(Expr::Add { lhs, rhs })?;
        }
        Ok(rhs)
    }

    fn parse_term(&mut self) -> Result<Id<Term>> {
        let term = match self.peek() {
            Some(token) if token.kind == TokenKind::IntLit => Term::IntLit(token.clone()),
            Some(token) if token.kind == TokenKind::Identifier => Term::Ident(token.clone()),
            Some(token) => {
                let error = Error::ExpectedTerm { actual: token.kind };
                return Err(token.span().wrap(error));
            }
            None => return Err(self.eof_span().wrap(Error::UnexpectedEofInExpr)),
        };
        self.advance();
        self.alloc(term)
    }
}

impl<'tok> Parser<'tok, '_> {
    fn new<'ast>(tokens: &'tok [Token], arena: &'ast mut Arena) -> Parser<'tok, 'ast> {
        Parser {
            tokens,
            arena,
            cursor: 0,
        }
    }

    /// Returns the current token, if any.
    fn peek(&self) -> Option<&'tok Token> {
        self.tokens.get(self.cursor)
    }

    /// Returns the kind of the token `ahead` positions past the current one.
    fn peek_kind(&self, ahead: usize) -> Option<TokenKind> {
        self.tokens.get(self.cursor + ahead).map(|t| t.kind)
    }

    /// Returns the current token and advances.
    fn advance(&mut self) -> Option<&'tok Token> {
        let c = self.peek();
        if c.is_some() {
            self.cursor += 1;
        }
        c
    }

    /// Advances if the current token matches the provided one, returning it.
    /// If not, returns `None` and doesn't advance.
    fn take(&mut self, expect: TokenKind) -> Option<&'tok Token> {
        if self.peek_kind(0) == Some(expect) {
            self.advance()
        } else {
            None
        }
    }

    /// Advances if the current token matches the provided one, returning it.
    /// If not, fails.
    fn consume(&mut self, expect: TokenKind) -> Result<&'tok Token> {
        match self.take(expect) {
            Some(token) => Ok(token),
            None => Err(self.unexpected(0, expect)),
        }
    }

    /// Builds the error for a token `ahead` positions past the current one
    /// not being `expected`.
    fn unexpected(&self, ahead: usize, expected: TokenKind) -> Spanned<Error> {
        match self.tokens.get(self.cursor + ahead) {
            Some(token) => token.span().wrap(Error::Unexpected {
                expected,
                actual: token.kind,
            }),
            None => self.eof_span().wrap(Error::UnexpectedEof { expected }),
        }
    }

    /// An empty span just past the last token.
    fn eof_span(&self) -> Span {
        let hi = self.tokens.last().map_or(0, |t| t.span().hi());
        Span::new_of_length(hi, 0)
    }

    fn alloc<T: Node>(&mut self, node: T) -> Result<Id<T>> {
        self.arena.alloc(node).map_err(|_: Exhausted| {
            let span = self.peek().map_or_else(|| self.eof_span(), Token::span);
            span.wrap(Error::AllocationExhausted {
                capacity: self.arena.capacity(),
            })
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    Unexpected {
        expected: TokenKind,
        actual: TokenKind,
    },
    UnexpectedEof {
        expected: TokenKind,
    },
    UnexpectedEofInExpr,
    ExpectedTerm {
        actual: TokenKind,
    },
    InvalidStatement {
        actual: TokenKind,
    },
    TrailingToken {
        actual: TokenKind,
    },
    /// The syntax tree outgrew the arena's byte budget.
    AllocationExhausted {
        capacity: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Error::*;
        match self {
            Unexpected { expected, actual } => {
                write!(f, "expected {expected}, but got {actual}")
            }
            UnexpectedEof { expected } => {
                write!(f, "expected {expected}, but reached end of input")
            }
            UnexpectedEofInExpr => write!(f, "expected expression, but reached end of input"),
            ExpectedTerm { actual } => write!(f, "expected expression, but got {actual}"),
            InvalidStatement { actual } => write!(f, "invalid statement starting with {actual}"),
            TrailingToken { actual } => write!(f, "unexpected {actual} after expression"),
            AllocationExhausted { capacity } => {
                write!(f, "syntax tree exceeds arena capacity of {capacity} bytes")
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use std::mem;

    use super::*;
    use crate::{lexer, util::test_utils::pipeline_tests};

    pipeline_tests!(
        use parser;

        fn test_exit_int() {
            let program = "exit(42);";
            let output_ok = "
                exit
                  int 42 (5..7)
            ";
        }

        fn test_let_and_exit() {
            let program = "let x = 5; exit(x);";
            let output_ok = "
                let x (4..5)
                  int 5 (8..9)
                exit
                  ident x (16..17)
            ";
        }

        fn test_single_addition() {
            let program = "exit(a+b);";
            let output_ok = "
                exit
                  add
                    ident a (5..6)
                    ident b (7..8)
            ";
        }

        fn test_addition_groups_to_the_right() {
            let program = "exit(1 + 2 + 3 + x);";
            let output_ok = "
                exit
                  add
                    int 1 (5..6)
                    add
                      int 2 (9..10)
                      add
                        int 3 (13..14)
                        ident x (17..18)
            ";
        }

        fn test_many_statements() {
            let program = "let a = 1;\nlet b = a + 2;\nexit(b);\nexit(0);";
            let output_ok = "
                let a (4..5)
                  int 1 (8..9)
                let b (15..16)
                  add
                    ident a (19..20)
                    int 2 (23..24)
                exit
                  ident b (31..32)
                exit
                  int 0 (40..41)
            ";
        }

        fn test_empty_program() {
            let program = " \n ";
            let output_ok = "";
        }

        fn test_missing_rparen_and_semicolon() {
            let program = "exit(1";
            let expected_error = "6..6: expected `)`, but reached end of input";
        }

        fn test_missing_semicolon() {
            let program = "exit(1) let x = 2;";
            let expected_error = "8..11: expected `;`, but got `let`";
        }

        fn test_missing_semicolon_after_let() {
            let program = "let x = 2";
            let expected_error = "9..9: expected `;`, but reached end of input";
        }

        fn test_dangling_plus() {
            let program = "exit(1 +);";
            let expected_error = "8..9: expected expression, but got `)`";
        }

        fn test_unterminated_expression() {
            let program = "let x = 1 +";
            let expected_error = "11..11: expected expression, but reached end of input";
        }

        fn test_empty_exit() {
            let program = "exit();";
            let expected_error = "5..6: expected expression, but got `)`";
        }

        fn test_exit_without_paren() {
            let program = "exit 1;";
            let expected_error = "5..6: expected `(`, but got integer literal";
        }

        fn test_let_without_name() {
            let program = "let = 1;";
            let expected_error = "4..5: expected identifier, but got `=`";
        }

        fn test_let_without_eq() {
            let program = "let x 1;";
            let expected_error = "6..7: expected `=`, but got integer literal";
        }

        fn test_bare_keyword_at_end() {
            let program = "exit";
            let expected_error = "4..4: expected `(`, but reached end of input";
        }

        fn test_statement_starting_with_expression() {
            let program = "x + 1;";
            let expected_error = "0..1: invalid statement starting with identifier";
        }

        fn test_statement_starting_with_punctuation() {
            let program = "exit(0); ;";
            let expected_error = "9..10: invalid statement starting with `;`";
        }

        fn test_lex_error_is_reported_first() {
            let program = "exit(1 * 2);";
            let expected_error = "7..8: unexpected character '*'";
        }
    );

    #[test]
    fn test_parse_expr() {
        let tokens = lexer::lex("a + 1").unwrap();
        let mut arena = Arena::new();
        let expr = parse_expr(&tokens, &mut arena).unwrap();
        let Expr::Add { lhs, rhs } = arena.get(expr) else {
            panic!("expected addition");
        };
        assert!(matches!(arena.get(*lhs), Expr::Term(_)));
        assert!(matches!(arena.get(*rhs), Expr::Term(_)));

        let tokens = lexer::lex("a + 1;").unwrap();
        let error = parse_expr(&tokens, &mut Arena::new()).unwrap_err();
        assert_eq!(
            error,
            Span::new_of_bounds(5..6).wrap(Error::TrailingToken {
                actual: TokenKind::Semicolon
            })
        );
    }

    #[test]
    fn test_children_are_allocated_before_parents() {
        let (arena, program) = test_utils::parse_program("let a = 1 + 2 + 3; exit(a);");
        let mut parents = 0;
        for &stmt in &program.stmts {
            let (Stmt::Exit { expr } | Stmt::Let { expr, .. }) = arena.get(stmt);
            assert_built_bottom_up(&arena, *expr, &mut parents);
        }
        assert_eq!(parents, 2);
        assert_eq!(arena.len(), 2 + 6 + 4);
    }

    fn assert_built_bottom_up(arena: &Arena, expr: Id<Expr>, parents: &mut usize) {
        if let Expr::Add { lhs, rhs } = arena.get(expr) {
            *parents += 1;
            assert!(lhs < &expr && rhs < &expr, "{expr:?} built before its children");
            assert_built_bottom_up(arena, *lhs, parents);
            assert_built_bottom_up(arena, *rhs, parents);
        }
    }

    #[test]
    fn test_long_chain_groups_to_the_right() {
        let terms = 50_000;
        let src = format!("exit({});", vec!["1"; terms].join(" + "));
        let (arena, program) = test_utils::parse_program(&src);
        let Stmt::Exit { expr } = arena.get(program.stmts[0]) else {
            panic!("expected exit");
        };

        let mut spine = *expr;
        let mut adds = 0;
        while let Expr::Add { lhs, rhs } = arena.get(spine) {
            assert!(matches!(arena.get(*lhs), Expr::Term(_)));
            assert!(lhs < &spine && rhs < &spine);
            adds += 1;
            spine = *rhs;
        }
        assert!(matches!(arena.get(spine), Expr::Term(_)));
        assert_eq!(adds, terms - 1);
    }

    #[test]
    fn test_chain_beyond_arena_capacity() {
        let src = format!("exit({});", vec!["1"; 200_000].join(" + "));
        let tokens = lexer::lex(&src).unwrap();
        let error = parse(&tokens, &mut Arena::new()).unwrap_err();
        assert_eq!(
            error.inner,
            Error::AllocationExhausted {
                capacity: crate::arena::DEFAULT_CAPACITY
            }
        );
    }

    #[test]
    fn test_arena_exhausted() {
        let tokens = lexer::lex("let a = 1; let b = 2; exit(a + b);").unwrap();
        let mut arena = Arena::with_capacity(4 * mem::size_of::<Term>());
        let error = parse(&tokens, &mut arena).unwrap_err();
        assert!(matches!(error.inner, Error::AllocationExhausted { .. }));
    }
}
