use std::fmt;
use std::process::Command;

use crate::args::ArgumentBuckets;
use crate::config::InvocationConfig;
use crate::types::{Language, Mode};

/// The command line that replaces the wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl FinalCommand {
    /// Run `program` with `args` exactly as given.
    pub fn passthrough(program: &str, args: &[String]) -> Self {
        Self {
            program: program.to_string(),
            args: args.to_vec(),
        }
    }

    /// Rebuild the command line from classified buckets.
    ///
    /// Layout: default flags, `-I` dirs, the untouched arguments, `-L` dirs,
    /// `-l` libs, then rpaths spelled for the mode.
    pub fn assemble(
        program: &str,
        language: Option<Language>,
        mode: Mode,
        cfg: &InvocationConfig,
        buckets: &ArgumentBuckets,
    ) -> Self {
        let mut args = default_flags(cfg, mode, language);

        args.extend(buckets.includes.iter().map(|dir| format!("-I{dir}")));
        args.extend(buckets.other.iter().cloned());
        args.extend(buckets.lib_dirs.iter().map(|dir| format!("-L{dir}")));
        args.extend(buckets.libs.iter().map(|lib| format!("-l{lib}")));

        match mode {
            Mode::Ccld => {
                let rpath_arg = cfg.rpath_arg(language.unwrap_or(Language::C));
                args.extend(buckets.rpaths.iter().map(|dir| format!("{rpath_arg}{dir}")));
            }
            Mode::Ld => {
                for dir in buckets.rpaths.iter() {
                    args.push("-rpath".to_string());
                    args.push(dir.to_string());
                }
            }
            Mode::Vcheck | Mode::Cpp | Mode::Cc | Mode::As => {}
        }

        Self {
            program: program.to_string(),
            args,
        }
    }

    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl fmt::Display for FinalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Flags the build environment wants on every invocation of this mode.
fn default_flags(cfg: &InvocationConfig, mode: Mode, language: Option<Language>) -> Vec<String> {
    let mut flags = Vec::new();

    if mode.links() {
        flags.extend(cfg.ldflags.iter().cloned());
    }
    if let Some(lang) = language.filter(|_| mode.compiles()) {
        flags.extend(cfg.language_flags(lang).iter().cloned());
    }
    if mode.preprocesses() {
        flags.extend(cfg.cppflags.iter().cloned());
    }
    if language.is_some_and(Language::is_fortran) && mode.compiles() {
        flags.extend(cfg.fflags.iter().cloned());
    }

    flags
}
