use std::fmt::Write;

const INFALLIBLE: &str = "writing to a String should be infallible";

/// Builds a program of `lets` bindings, each summing a literal and a few of
/// the previous bindings, ending with an `exit` over the last one.
pub fn big_program(lets: usize) -> String {
    let mut src = String::with_capacity(lets * 48);
    src.push_str("let v0 = 1;\n");
    for i in 1..lets {
        write!(src, "let v{i} = {i}").expect(INFALLIBLE);
        for back in [1, 2, 7] {
            if let Some(j) = i.checked_sub(back) {
                write!(src, " + v{j}").expect(INFALLIBLE);
            }
        }
        src.push_str(";\n");
    }
    writeln!(src, "exit(v{});", lets.saturating_sub(1)).expect(INFALLIBLE);
    src
}
