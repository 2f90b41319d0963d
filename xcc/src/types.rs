use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Source language handled by a compiler alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    C,
    Cxx,
    Fortran77,
    Fortran90,
}

impl Language {
    /// Human-readable name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Language::C => "C",
            Language::Cxx => "C++",
            Language::Fortran77 => "Fortran 77",
            Language::Fortran90 => "Fortran 90",
        }
    }

    pub fn is_fortran(self) -> bool {
        matches!(self, Language::Fortran77 | Language::Fortran90)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Name the wrapper was invoked under, without its directory.
pub fn alias_basename(alias: &str) -> &str {
    alias.rsplit('/').next().unwrap_or(alias)
}

/// The tool a wrapper alias stands in for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    /// A language compiler driver; the real command comes from configuration.
    Compiler(Language),
    /// `cpp`, always run in preprocess mode.
    Preprocessor,
    /// `ld`, always run in link mode unless a version flag is present.
    Linker,
}

impl Tool {
    /// Map the name the wrapper was invoked under to the tool it replaces.
    ///
    /// Only the basename is considered, so `/path/to/env/gcc` and `gcc` are
    /// the same alias.
    pub fn from_alias(alias: &str) -> Result<Tool> {
        let name = alias_basename(alias);
        let tool = match name {
            "cpp" => Tool::Preprocessor,
            "ld" => Tool::Linker,
            "cc" | "c89" | "c99" | "gcc" | "clang" | "icc" | "pgcc" | "xlc" | "xlc_r" => {
                Tool::Compiler(Language::C)
            }
            "c++" | "CC" | "g++" | "clang++" | "icpc" | "pgc++" | "xlc++" | "xlc++_r" => {
                Tool::Compiler(Language::Cxx)
            }
            "ftn" | "f90" | "fc" | "f95" | "gfortran" | "flang" | "ifort" | "pgfortran"
            | "xlf90" | "xlf90_r" | "nagfor" => Tool::Compiler(Language::Fortran90),
            "f77" | "xlf" | "xlf_r" | "pgf77" => Tool::Compiler(Language::Fortran77),
            _ => {
                return Err(Error::UnknownCompiler {
                    alias: name.to_string(),
                });
            }
        };
        Ok(tool)
    }

    pub fn language(self) -> Option<Language> {
        match self {
            Tool::Compiler(lang) => Some(lang),
            Tool::Preprocessor | Tool::Linker => None,
        }
    }
}

/// The compilation stage an invocation performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Version query; the original arguments pass through untouched.
    Vcheck,
    /// Preprocess only (`-E` or the `cpp` alias).
    Cpp,
    /// Compile to object (`-c`).
    Cc,
    /// Compile to assembly (`-S`).
    As,
    /// Direct linker invocation.
    Ld,
    /// Compile and link.
    Ccld,
}

const VERSION_FLAGS: [&str; 4] = ["-v", "-V", "--version", "-dumpversion"];

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Vcheck => "vcheck",
            Mode::Cpp => "cpp",
            Mode::Cc => "cc",
            Mode::As => "as",
            Mode::Ld => "ld",
            Mode::Ccld => "ccld",
        }
    }

    /// Work out the mode for `tool` given the raw argument list.
    ///
    /// Version flags win over everything except the `cpp` alias. Among
    /// `-E`, `-S` and `-c` the first one on the command line decides.
    pub fn detect(tool: Tool, args: &[String]) -> Mode {
        let forced = match tool {
            Tool::Preprocessor => return Mode::Cpp,
            Tool::Linker => Some(Mode::Ld),
            Tool::Compiler(_) => None,
        };

        if args.iter().any(|a| VERSION_FLAGS.contains(&a.as_str())) {
            return Mode::Vcheck;
        }
        if let Some(mode) = forced {
            return mode;
        }

        args.iter()
            .find_map(|a| match a.as_str() {
                "-E" => Some(Mode::Cpp),
                "-S" => Some(Mode::As),
                "-c" => Some(Mode::Cc),
                _ => None,
            })
            .unwrap_or(Mode::Ccld)
    }

    /// Modes that run the link step.
    pub fn links(self) -> bool {
        matches!(self, Mode::Ld | Mode::Ccld)
    }

    /// Modes that compile source, and so take language flags.
    pub fn compiles(self) -> bool {
        matches!(self, Mode::Cc | Mode::Ccld)
    }

    /// Modes that run the preprocessor and so see include directories.
    pub fn preprocesses(self) -> bool {
        matches!(self, Mode::Cpp | Mode::Cc | Mode::As | Mode::Ccld)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Introspection directives used by the build system's own test suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestCommand {
    /// Print the resolved mode and stop.
    DumpMode,
    /// Print the final command line and stop.
    DumpArgs,
}

impl FromStr for TestCommand {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "dump-mode" => Ok(TestCommand::DumpMode),
            "dump-args" => Ok(TestCommand::DumpArgs),
            other => Err(Error::UnknownTestCommand {
                value: other.to_string(),
            }),
        }
    }
}
