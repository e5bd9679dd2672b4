use std::{
    fmt::{self, Write},
    format_args as f,
    marker::PhantomData,
};

use crate::{
    arena::{Arena, Id},
    ast::{Expr, Program, Stmt, Term},
    codegen::{
        stack::{StackModel, Var},
        x86_64_dialect::Dialect,
        Error, GenResult,
    },
    token::Token,
};

/// Linux `exit` system call number.
const SYS_EXIT: u32 = 60;

const DEFAULT_CODE_CAPACITY: usize = 4 * 1024; // 4 KiB

/// A stack machine generator: every expression leaves exactly one value on
/// the machine stack, and variables are the values left by their `let`.
pub struct Generator<'ast, D> {
    arena: &'ast Arena,
    code: String,
    stack: StackModel,
    indent: bool,
    _dialect: PhantomData<D>,
}

impl<D> Generator<'_, D>
where
    D: Dialect,
{
    pub fn new(arena: &Arena) -> Generator<'_, D> {
        Generator {
            arena,
            code: String::with_capacity(DEFAULT_CODE_CAPACITY),
            stack: StackModel::new(),
            indent: false,
            _dialect: PhantomData,
        }
    }

    pub fn generate(mut self, program: &Program) -> GenResult<String> {
        self.g_program_prologue();
        self.indented(|this| {
            for &stmt in &program.stmts {
                this.g_stmt(stmt)?;
            }
            this.g_program_epilogue();
            Ok(())
        })?;
        Ok(self.code)
    }
}

impl<D> Generator<'_, D>
where
    D: Dialect,
{
    fn g_program_prologue(&mut self) {
        self.out(D::GLOBAL_PROLOGUE);
        self.out(f!("{}:", D::ENTRY_POINT));
    }

    /// Falls through to `exit(0)` after the last statement.
    fn g_program_epilogue(&mut self) {
        self.out(f!("mov rax, {SYS_EXIT}"));
        self.out("mov rdi, 0");
        self.out("syscall");
    }

    fn g_stmt(&mut self, stmt: Id<Stmt>) -> GenResult<()> {
        let arena = self.arena;
        match arena.get(stmt) {
            Stmt::Exit { expr } => {
                self.g_expr(*expr)?;
                self.out(f!("mov rax, {SYS_EXIT}"));
                self.pop("rdi");
                self.out("syscall");
            }
            Stmt::Let { ident, expr } => self.g_let(ident, *expr)?,
        }
        Ok(())
    }

    /// The value pushed by the initializer *is* the variable's storage.
    fn g_let(&mut self, ident: &Token, expr: Id<Expr>) -> GenResult<()> {
        let name = ident.text();
        let duplicate = |previous: Var| {
            ident.span().wrap(Error::DuplicateIdentifier {
                name: Box::from(name),
                previous: previous.span,
            })
        };
        if let Some(previous) = self.stack.get(name) {
            return Err(duplicate(previous));
        }

        let slot = self.stack.depth();
        self.g_expr(expr)?;
        debug_assert_eq!(self.stack.depth(), slot + 1);

        // Bound only now, so the initializer can't observe its own slot.
        self.stack.declare(name, slot, ident.span()).map_err(duplicate)?;
        tracing::trace!(name, slot, "declared variable");
        Ok(())
    }

    /// Walks the tree with an explicit work list, so long `+` chains don't
    /// grow the native stack.
    fn g_expr(&mut self, expr: Id<Expr>) -> GenResult<()> {
        enum Work {
            Eval(Id<Expr>),
            Add,
        }

        let arena = self.arena;
        let mut work = vec![Work::Eval(expr)];
        while let Some(item) = work.pop() {
            match item {
                Work::Eval(expr) => match arena.get(expr) {
                    Expr::Term(term) => self.g_term(*term)?,
                    Expr::Add { lhs, rhs } => {
                        work.push(Work::Add);
                        work.push(Work::Eval(*rhs));
                        work.push(Work::Eval(*lhs));
                    }
                },
                Work::Add => {
                    self.pop("rax");
                    self.pop("rbx");
                    self.out("add rax, rbx");
                    self.push("rax");
                }
            }
        }
        Ok(())
    }

    fn g_term(&mut self, term: Id<Term>) -> GenResult<()> {
        let arena = self.arena;
        match arena.get(term) {
            Term::IntLit(token) => {
                self.out(f!("mov rax, {}", D::int_lit(token.text())));
                self.push("rax");
            }
            Term::Ident(token) => {
                let name = token.text();
                let Some(var) = self.stack.get(name) else {
                    let error = Error::UndeclaredIdentifier {
                        name: Box::from(name),
                    };
                    return Err(token.span().wrap(error));
                };
                let offset = self.stack.offset_of(var);
                self.push(f!("{} [rsp + {offset}]", D::QWORD));
            }
        }
        Ok(())
    }
}

/// Utility functions.
impl<D> Generator<'_, D>
where
    D: Dialect,
{
    fn push(&mut self, operand: impl fmt::Display) {
        self.out(f!("push {operand}"));
        self.stack.push();
    }

    fn pop(&mut self, register: &str) {
        self.out(f!("pop {register}"));
        self.stack.pop();
    }

    /// Prints a line.
    fn out(&mut self, f: impl fmt::Display) {
        let indent = if self.indent { "    " } else { "" };
        writeln!(self.code, "{indent}{f}").expect("code emit should be infallible");
    }

    /// Writes in an indented block.
    fn indented<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.indent = true;
        let res = f(self);
        self.indent = false;
        res
    }
}
