use std::{fmt, hash::Hash, marker::PhantomData, mem, num::NonZeroU32};

use crate::ast::{Expr, Stmt, Term};

/// Default byte budget of a syntax-tree arena (4 MiB).
pub const DEFAULT_CAPACITY: usize = 4 * 1024 * 1024;

/// A handle to some node of type `T` allocated in an [`Arena`]. To retrieve a
/// `&T`, use [`Arena::get`].
pub struct Id<T> {
    // Here we use a NonZeroU32 to leverage niche layout optimization.
    handle: NonZeroU32,
    _ty: PhantomData<T>,
}

impl<T> Id<T> {
    fn new(index: usize) -> Id<T> {
        let handle = u32::try_from(index + 1)
            .ok()
            .and_then(NonZeroU32::new)
            .expect("arena index out of handle range");
        Id {
            handle,
            _ty: PhantomData,
        }
    }

    fn index(self) -> usize {
        self.handle.get() as usize - 1
    }
}

impl<T> Copy for Id<T> {}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Handles of one kind are ordered by allocation time.
impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.handle.cmp(&other.handle)
    }
}

impl<T> Hash for Id<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.handle.hash(state);
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let full_type_name = std::any::type_name::<T>();
        let type_name = full_type_name.rsplit("::").next().unwrap_or("?");
        write!(f, "Id<{type_name}>({})", self.handle)
    }
}

/// Append-only storage for every node of one syntax tree.
///
/// Nodes are never freed individually; the whole tree is released when the
/// arena is dropped. The arena enforces a byte budget: each allocation is
/// charged `size_of::<T>()` and fails with [`Exhausted`] once the budget
/// would be exceeded.
pub struct Arena {
    capacity: usize,
    used: usize,
    terms: Vec<Term>,
    exprs: Vec<Expr>,
    stmts: Vec<Stmt>,
}

impl Arena {
    pub fn new() -> Arena {
        Arena::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates an arena that may hold at most `capacity` bytes of nodes.
    pub fn with_capacity(capacity: usize) -> Arena {
        Arena {
            capacity,
            used: 0,
            terms: Vec::new(),
            exprs: Vec::new(),
            stmts: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of bytes charged so far.
    pub fn used(&self) -> usize {
        self.used
    }

    /// Number of nodes allocated so far, of every kind.
    pub fn len(&self) -> usize {
        self.terms.len() + self.exprs.len() + self.stmts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Moves `node` into the arena, returning its handle.
    pub fn alloc<T: Node>(&mut self, node: T) -> Result<Id<T>, Exhausted> {
        let size = mem::size_of::<T>();
        let remaining = self.capacity - self.used;
        if size > remaining {
            return Err(Exhausted {
                capacity: self.capacity,
                requested: size,
            });
        }
        self.used += size;
        let store = T::store_mut(self);
        let id = Id::new(store.len());
        store.push(node);
        Ok(id)
    }

    /// Returns the node for the provided handle. Panics if the handle was
    /// produced by another arena holding fewer nodes.
    pub fn get<T: Node>(&self, id: Id<T>) -> &T {
        &T::store(self)[id.index()]
    }
}

impl Default for Arena {
    fn default() -> Self {
        Arena::new()
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("capacity", &self.capacity)
            .field("used", &self.used)
            .field("nodes", &self.len())
            .finish()
    }
}

/// A syntax-tree node kind which may be allocated in an [`Arena`].
pub trait Node: Sized + private::Sealed {
    #[doc(hidden)]
    fn store(arena: &Arena) -> &Vec<Self>;

    #[doc(hidden)]
    fn store_mut(arena: &mut Arena) -> &mut Vec<Self>;
}

mod private {
    pub trait Sealed {}

    impl Sealed for super::Term {}
    impl Sealed for super::Expr {}
    impl Sealed for super::Stmt {}
}

macro_rules! impl_node {
    ($($ty:ty => $field:ident),* $(,)?) => {
        $(
            impl Node for $ty {
                fn store(arena: &Arena) -> &Vec<Self> {
                    &arena.$field
                }

                fn store_mut(arena: &mut Arena) -> &mut Vec<Self> {
                    &mut arena.$field
                }
            }
        )*
    };
}

impl_node! {
    Term => terms,
    Expr => exprs,
    Stmt => stmts,
}

/// The arena budget would be exceeded by an allocation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Exhausted {
    pub capacity: usize,
    pub requested: usize,
}
