use std::collections::{hash_map::Entry, HashMap};

use crate::token::Span;

/// Width in bytes of one machine-stack slot.
pub const SLOT_WIDTH: usize = 8;

/// Compile-time model of the runtime stack: how many values are pushed at
/// the current point of the program, and where each variable lives.
#[derive(Debug, Default)]
pub struct StackModel {
    depth: usize,
    vars: HashMap<Box<str>, Var>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Var {
    /// Index of the slot holding the value, counted from the bottom of the
    /// stack.
    pub slot: usize,
    /// Where the variable was declared.
    pub span: Span,
}

impl StackModel {
    pub fn new() -> StackModel {
        StackModel::default()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn push(&mut self) {
        self.depth += 1;
    }

    pub fn pop(&mut self) {
        self.depth = self
            .depth
            .checked_sub(1)
            .expect("popped more values than were pushed");
    }

    /// Binds `name` to `slot`. Returns the existing variable, untouched, if
    /// the name is already bound.
    pub fn declare(&mut self, name: &str, slot: usize, span: Span) -> Result<(), Var> {
        match self.vars.entry(Box::from(name)) {
            Entry::Occupied(entry) => Err(*entry.get()),
            Entry::Vacant(entry) => {
                entry.insert(Var { slot, span });
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Var> {
        self.vars.get(name).copied()
    }

    /// Byte offset from the current stack pointer to the slot of `var`.
    ///
    /// Must be recomputed on every reference, since the depth changes as
    /// temporaries are pushed and popped.
    pub fn offset_of(&self, var: Var) -> usize {
        debug_assert!(var.slot < self.depth, "variable slot above stack top");
        (self.depth - var.slot - 1) * SLOT_WIDTH
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_follow_depth() {
        let mut stack = StackModel::new();
        let span = Span::default();

        stack.declare("a", stack.depth(), span).unwrap();
        stack.push();
        stack.declare("b", stack.depth(), span).unwrap();
        stack.push();

        let a = stack.get("a").unwrap();
        let b = stack.get("b").unwrap();
        assert_eq!((a.slot, b.slot), (0, 1));
        assert_eq!(stack.offset_of(a), 8);
        assert_eq!(stack.offset_of(b), 0);

        // A temporary shifts every variable one slot further away.
        stack.push();
        assert_eq!(stack.offset_of(a), 16);
        assert_eq!(stack.offset_of(b), 8);
        stack.pop();
        assert_eq!(stack.offset_of(a), 8);
    }

    #[test]
    fn test_redeclaration_keeps_first_binding() {
        let mut stack = StackModel::new();
        let first = Span::new_of_bounds(4..5);
        stack.declare("x", 0, first).unwrap();
        stack.push();

        let existing = stack.declare("x", 1, Span::new_of_bounds(15..16)).unwrap_err();
        assert_eq!(existing, Var { slot: 0, span: first });
        assert_eq!(stack.get("x"), Some(existing));
    }

    #[test]
    #[should_panic(expected = "popped more values than were pushed")]
    fn test_pop_underflow() {
        StackModel::new().pop();
    }
}
