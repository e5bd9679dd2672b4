use std::fmt;

/// Command-line mirror of [`hydro::codegen::Syntax`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
#[clap(rename_all = "snake_case")]
pub enum Syntax {
    Nasm,
    Gas,
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        hydro::codegen::Syntax::from(*self).fmt(f)
    }
}

impl From<Syntax> for hydro::codegen::Syntax {
    fn from(value: Syntax) -> Self {
        match value {
            Syntax::Nasm => hydro::codegen::Syntax::Nasm,
            Syntax::Gas => hydro::codegen::Syntax::Gas,
        }
    }
}
