// program ::= stmt*
// stmt ::= 'exit' '(' expr ')' ';'
//        | 'let' ID '=' expr ';'
// expr ::= term ['+' expr]
// term ::= integer
//        | ID

// Addition is parsed right-associatively: `a + b + c` is `a + (b + c)`.

use crate::{arena::Id, token::Token};

/// The root of a syntax tree. Statements live in the [`Arena`] that was
/// passed to the parser.
///
/// [`Arena`]: crate::arena::Arena
#[derive(Debug, PartialEq, Default)]
pub struct Program {
    pub stmts: Vec<Id<Stmt>>,
}

#[derive(Debug, PartialEq)]
pub enum Stmt {
    Exit {
        expr: Id<Expr>,
    },
    Let {
        /// Always a [`TokenKind::Identifier`](crate::token::TokenKind) token.
        ident: Token,
        expr: Id<Expr>,
    },
}

#[derive(Debug, PartialEq)]
pub enum Expr {
    Term(Id<Term>),
    Add { lhs: Id<Expr>, rhs: Id<Expr> },
}

#[derive(Debug, PartialEq)]
pub enum Term {
    IntLit(Token),
    Ident(Token),
}

impl Term {
    pub fn token(&self) -> &Token {
        match self {
            Term::IntLit(token) | Term::Ident(token) => token,
        }
    }
}
