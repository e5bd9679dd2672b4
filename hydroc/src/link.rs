use std::{
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::{bail, Context, Result};
use hydro::codegen::Syntax;

/// Assembles `asm` into the ELF64 object `obj`.
pub fn assemble(syntax: Syntax, asm: &Path, obj: &Path) -> Result<()> {
    let mut cmd = match syntax {
        Syntax::Nasm => {
            let mut cmd = Command::new(locate("nasm")?);
            cmd.arg("-felf64");
            cmd
        }
        Syntax::Gas => Command::new(locate("as")?),
    };
    cmd.arg(asm).arg("-o").arg(obj);
    run(cmd)
}

/// Links `obj` into a static executable. There is no runtime to link
/// against: the program enters at `_start` and leaves through `exit`.
pub fn link(obj: &Path, exe: &Path) -> Result<()> {
    let mut cmd = Command::new(locate("ld")?);
    cmd.arg(obj).arg("-o").arg(exe);
    run(cmd)
}

fn locate(tool: &str) -> Result<PathBuf> {
    which::which(tool).with_context(|| format!("`{tool}` not found in PATH"))
}

fn run(mut cmd: Command) -> Result<()> {
    let program = Path::new(cmd.get_program()).display().to_string();
    tracing::debug!(?cmd, "running {program}");

    let out = cmd
        .output()
        .with_context(|| format!("failed to run {program}"))?;
    if !out.status.success() {
        let stderr = String::from_utf8_lossy(&out.stderr);
        bail!("{program} failed ({}):\n{}", out.status, stderr.trim_end());
    }
    Ok(())
}
