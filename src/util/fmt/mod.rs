pub mod error;
pub mod tree;

pub use error::Diagnostic;
pub use tree::{print_expr_string, print_program, print_program_string};
