use std::io::Write;

use crate::{
    arena::{Arena, Id},
    ast::{Expr, Program, Stmt, Term},
};

const INDENT_WIDTH: usize = 2;

pub fn print_program_string(arena: &Arena, program: &Program) -> String {
    let mut buf = Vec::with_capacity(1024);
    print_program(&mut buf, arena, program).unwrap();
    String::from_utf8(buf).unwrap()
}

pub fn print_expr_string(arena: &Arena, expr: Id<Expr>) -> String {
    let mut buf = Vec::with_capacity(512);
    print_expr(&mut buf, arena, 0, expr).unwrap();
    String::from_utf8(buf).unwrap()
}

pub fn print_program(
    w: &mut impl Write,
    arena: &Arena,
    program: &Program,
) -> std::io::Result<()> {
    for &stmt in &program.stmts {
        print_stmt(w, arena, 0, stmt)?;
    }
    Ok(())
}

fn print_stmt(w: &mut impl Write, arena: &Arena, i: usize, stmt: Id<Stmt>) -> std::io::Result<()> {
    sp(w, i)?;
    match arena.get(stmt) {
        Stmt::Exit { expr } => {
            writeln!(w, "exit")?;
            print_expr(w, arena, i + 1, *expr)?;
        }
        Stmt::Let { ident, expr } => {
            writeln!(w, "let {} ({})", ident.text(), ident.span())?;
            print_expr(w, arena, i + 1, *expr)?;
        }
    }
    Ok(())
}

pub fn print_expr(
    w: &mut impl Write,
    arena: &Arena,
    i: usize,
    expr: Id<Expr>,
) -> std::io::Result<()> {
    // Pre-order, with an explicit stack of (indent, node) pairs.
    let mut pending = vec![(i, expr)];
    while let Some((i, expr)) = pending.pop() {
        match arena.get(expr) {
            Expr::Term(term) => print_term(w, arena, i, *term)?,
            Expr::Add { lhs, rhs } => {
                sp(w, i)?;
                writeln!(w, "add")?;
                pending.push((i + 1, *rhs));
                pending.push((i + 1, *lhs));
            }
        }
    }
    Ok(())
}

fn print_term(w: &mut impl Write, arena: &Arena, i: usize, term: Id<Term>) -> std::io::Result<()> {
    sp(w, i)?;
    let term = arena.get(term);
    let token = term.token();
    let span = token.span();
    match term {
        Term::IntLit(_) => writeln!(w, "int {} ({span})", token.text()),
        Term::Ident(_) => writeln!(w, "ident {} ({span})", token.text()),
    }
}

fn sp(w: &mut impl Write, i: usize) -> std::io::Result<()> {
    write!(w, "{:width$}", "", width = i * INDENT_WIDTH)
}
