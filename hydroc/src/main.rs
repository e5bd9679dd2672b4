use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::Parser;
use hydro::{arena::Arena, lexer, parser, util::fmt as hfmt, Error, Options};
use tracing::level_filters::LevelFilter;

use crate::syntax::Syntax;

mod link;
mod syntax;

/// Compiles a hydro program into an x86-64 Linux executable.
#[derive(Parser, Debug)]
#[command(version)]
struct Cli {
    /// Source file to compile.
    file: PathBuf,

    /// Path of the executable. Intermediate files share its name, with an
    /// extension appended.
    #[arg(short, long, default_value = "out")]
    output: PathBuf,

    /// Assembler syntax of the generated code.
    #[arg(long, value_enum, default_value_t = Syntax::Nasm)]
    syntax: Syntax,

    /// Only write the assembly; don't assemble or link.
    #[arg(short = 'S')]
    asm_only: bool,

    /// Print the token sequence to stdout.
    #[arg(long)]
    dump_tokens: bool,

    /// Print the syntax tree to stdout.
    #[arg(long)]
    dump_ast: bool,

    /// Log more; may be repeated.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match run(&cli) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let src = fs::read_to_string(&cli.file)
        .with_context(|| format!("failed to read {}", cli.file.display()))?;

    let code = match compile(cli, &src) {
        Ok(code) => code,
        Err(error) => {
            let path = cli.file.display().to_string();
            let diagnostic = hfmt::Diagnostic {
                path: &path,
                src: &src,
                error: &error,
            };
            eprintln!("{diagnostic}");
            return Ok(ExitCode::FAILURE);
        }
    };

    let syntax = hydro::codegen::Syntax::from(cli.syntax);
    let asm = with_suffix(&cli.output, syntax.extension());
    fs::write(&asm, code).with_context(|| format!("failed to write {}", asm.display()))?;
    tracing::info!("wrote {}", asm.display());
    if cli.asm_only {
        return Ok(ExitCode::SUCCESS);
    }

    let obj = with_suffix(&cli.output, "o");
    link::assemble(syntax, &asm, &obj)?;
    link::link(&obj, &cli.output)?;
    tracing::info!("built {}", cli.output.display());
    Ok(ExitCode::SUCCESS)
}

/// Runs the pipeline, printing the requested intermediate stages on the way.
fn compile(cli: &Cli, src: &str) -> Result<String, Error> {
    if cli.dump_tokens || cli.dump_ast {
        let tokens = lexer::lex(src)?;
        if cli.dump_tokens {
            for token in &tokens {
                println!("{token:?}");
            }
        }
        if cli.dump_ast {
            let mut arena = Arena::new();
            let program = parser::parse(&tokens, &mut arena)?;
            print!("{}", hfmt::print_program_string(&arena, &program));
        }
    }

    let options = Options {
        syntax: cli.syntax.into(),
        ..Options::default()
    };
    hydro::compile_with(src, &options)
}

/// Appends `.{ext}` to the whole path, keeping any extension it already has.
fn with_suffix(path: &Path, ext: &str) -> PathBuf {
    let mut name = OsString::from(path);
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["hydroc", "main.hy"]).unwrap();
        assert_eq!(cli.output, Path::new("out"));
        assert_eq!(cli.syntax, Syntax::Nasm);
        assert!(!cli.asm_only && !cli.dump_tokens && !cli.dump_ast);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "hydroc", "main.hy", "-o", "bin/prog", "--syntax", "gas", "-S", "-vv",
        ])
        .unwrap();
        assert_eq!(cli.output, Path::new("bin/prog"));
        assert_eq!(cli.syntax, Syntax::Gas);
        assert!(cli.asm_only);
        assert_eq!(cli.verbose, 2);

        assert!(Cli::try_parse_from(["hydroc", "main.hy", "--syntax", "att"]).is_err());
        assert!(Cli::try_parse_from(["hydroc"]).is_err());
    }

    #[test]
    fn test_with_suffix() {
        assert_eq!(with_suffix(Path::new("out"), "asm"), Path::new("out.asm"));
        assert_eq!(with_suffix(Path::new("a/b.x"), "o"), Path::new("a/b.x.o"));
    }

    fn cli_for(file: &Path, output: &Path, extra: &[&str]) -> Cli {
        let mut args: Vec<OsString> =
            vec!["hydroc".into(), file.into(), "-o".into(), output.into()];
        args.extend(extra.iter().map(|arg| OsString::from(*arg)));
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_failed_compile_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("main.hy");
        let output = dir.path().join("out");

        let sources = [
            "exit(1",
            "exit(y);",
            "let a = 1; let a = 2;",
            "exit(1 - 2);",
        ];
        let extras: [&[&str]; 3] = [&[], &["-S"], &["--syntax", "gas"]];
        for src in sources {
            fs::write(&file, src).unwrap();
            for extra in extras {
                let code = run(&cli_for(&file, &output, extra)).unwrap();
                assert_eq!(code, ExitCode::FAILURE, "{src:?} {extra:?}");
            }
        }

        let written: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(written, ["main.hy"]);
    }

    #[test]
    fn test_missing_source_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("missing.hy");
        let error = run(&cli_for(&file, &dir.path().join("out"), &[])).unwrap_err();
        assert!(error.to_string().starts_with("failed to read "));
    }

    #[test]
    fn test_asm_only() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("main.hy");
        let output = dir.path().join("out");
        fs::write(&file, "exit(42);").unwrap();

        let code = run(&cli_for(&file, &output, &["-S"])).unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
        let asm = fs::read_to_string(dir.path().join("out.asm")).unwrap();
        assert_eq!(asm, hydro::compile("exit(42);").unwrap());

        let code = run(&cli_for(&file, &output, &["-S", "--syntax", "gas"])).unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
        let asm = fs::read_to_string(dir.path().join("out.s")).unwrap();
        assert!(asm.starts_with(".intel_syntax noprefix\n"));

        assert!(!dir.path().join("out.o").exists());
        assert!(!output.exists());
    }

    /// Assembles, links and runs programs with every assembler found on the
    /// host, checking their exit status.
    #[test]
    #[cfg(all(target_arch = "x86_64", target_os = "linux"))]
    fn test_built_programs_exit_with_their_value() {
        if which::which("ld").is_err() {
            eprintln!("`ld` not found, skipping");
            return;
        }
        let syntaxes: Vec<_> = [("nasm", "nasm"), ("gas", "as")]
            .into_iter()
            .filter(|(_, tool)| which::which(tool).is_ok())
            .map(|(syntax, _)| syntax)
            .collect();
        if syntaxes.is_empty() {
            eprintln!("no assembler found, skipping");
            return;
        }

        let cases = [
            ("exit(42);", 42),
            ("let a = 1; let b = 2; exit(a+b);", 3),
            ("let x = 010; exit(x + 09);", 19),
            ("let a = 7; exit(1 + a + a);", 15),
            ("let a = 5;", 0),
        ];
        let dir = tempfile::tempdir().unwrap();
        for syntax in syntaxes {
            for (i, (src, status)) in cases.into_iter().enumerate() {
                let file = dir.path().join(format!("{syntax}{i}.hy"));
                let output = dir.path().join(format!("{syntax}{i}"));
                fs::write(&file, src).unwrap();

                let code = run(&cli_for(&file, &output, &["--syntax", syntax])).unwrap();
                assert_eq!(code, ExitCode::SUCCESS, "{syntax}: {src:?}");
                let exit = std::process::Command::new(&output).status().unwrap();
                assert_eq!(exit.code(), Some(status), "{syntax}: {src:?}");
            }
        }
    }
}
