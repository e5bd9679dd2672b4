use crate::{arena::Arena, compile, lexer, parser, util::fmt::tree, Error};

/// Each variant contains the input.
pub enum Test {
    Parser(&'static str),
    Codegen(&'static str),
}

pub enum Assertion {
    OutputOk(&'static str),
    ExpectedError(&'static str),
}

/// Runs the pipeline up to the tested stage, returning its formatted output
/// and its formatted error (with span), if any.
#[track_caller]
pub fn run_pipeline(test: Test) -> (String, Option<String>) {
    let result = match test {
        Test::Parser(input) => parse_and_print(input),
        Test::Codegen(input) => compile(input),
    };
    match result {
        Ok(output) => (output, None),
        Err(error) => (String::new(), Some(format!("{error:#}"))),
    }
}

fn parse_and_print(input: &str) -> Result<String, Error> {
    let tokens = lexer::lex(input)?;
    let mut arena = Arena::new();
    let program = parser::parse(&tokens, &mut arena)?;
    Ok(tree::print_program_string(&arena, &program))
}

#[track_caller]
pub fn run_assertion(
    assertion: Assertion,
    formatted_actual_output: &str,
    formatted_actual_error: Option<&str>,
) {
    match assertion {
        Assertion::OutputOk(expected_output) => {
            ::pretty_assertions::assert_eq!(formatted_actual_error, None);
            ::pretty_assertions::assert_eq!(
                formatted_actual_output.trim(),
                expected_output.trim()
            );
        }
        Assertion::ExpectedError(expected_error) => {
            ::pretty_assertions::assert_eq!(formatted_actual_error, Some(expected_error));
        }
    }
}

macro_rules! pipeline_tests {
    (
        use $test_kind:ident;

        $(
            fn $test_name:ident() {
                let program = $source:expr;
                $($assertions_tt:tt)*
            }
        )*
    ) => {
        $(
            #[test]
            fn $test_name() {
                let test: crate::util::test_utils::Test =
                    pipeline_tests!(@@get_test($test_kind), $source);
                let (formatted_actual_output, formatted_actual_error) =
                    crate::util::test_utils::run_pipeline(test);
                let ctx = (&formatted_actual_output, formatted_actual_error.as_deref());
                pipeline_tests!(@@expand_assertions, ctx, [$($assertions_tt)*]);
            }
        )*
    };

    (@@expand_assertions, $ctx:expr, []) => {};
    (@@expand_assertions, $ctx:expr, [
        let $assertion:ident = $assertion_expected:expr;
        $($rest_assertions_tt:tt)*
    ]) => {
        crate::util::test_utils::run_assertion(
            pipeline_tests!(@@assertion, $assertion, $assertion_expected),
            $ctx.0,
            $ctx.1,
        );
        pipeline_tests!(@@expand_assertions, $ctx, [$($rest_assertions_tt)*]);
    };

    (@@assertion, output_ok, $expected:expr) => {
        crate::util::test_utils::Assertion::OutputOk(::indoc::indoc! { $expected })
    };
    (@@assertion, expected_error, $expected:expr) => {
        crate::util::test_utils::Assertion::ExpectedError($expected)
    };

    (@@get_test(parser), $source:expr) => {
        crate::util::test_utils::Test::Parser($source)
    };
    (@@get_test(codegen), $source:expr) => {
        crate::util::test_utils::Test::Codegen($source)
    };
}
pub(crate) use pipeline_tests;
