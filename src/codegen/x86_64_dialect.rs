/// Assembler-specific spelling of the x86-64 Linux output.
pub trait Dialect {
    const ENTRY_POINT: &'static str = "_start";

    /// Emitted before the entry point label.
    const GLOBAL_PROLOGUE: &'static str;

    /// Size qualifier of a 64-bit memory operand.
    const QWORD: &'static str;

    /// Spells a decimal integer literal (`[0-9]+`) so the assembler reads it
    /// as decimal.
    fn int_lit(text: &str) -> &str {
        text
    }
}

impl Dialect for Nasm {
    const GLOBAL_PROLOGUE: &'static str = "global _start";

    const QWORD: &'static str = "QWORD";
}

impl Dialect for Gas {
    const GLOBAL_PROLOGUE: &'static str = concat!(
        ".intel_syntax noprefix\n",
        ".section .note.GNU-stack,\"\",@progbits\n",
        ".text\n",
        ".globl _start",
    );

    const QWORD: &'static str = "QWORD PTR";

    /// `as` reads a leading zero as an octal prefix.
    fn int_lit(text: &str) -> &str {
        match text.trim_start_matches('0') {
            "" => "0",
            digits => digits,
        }
    }
}

/// `nasm -felf64`
pub struct Nasm;

/// GNU `as`, in Intel syntax.
pub struct Gas;
