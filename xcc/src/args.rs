//! Classification of a compiler command line into reorderable buckets.
//!
//! Include directories, library directories and rpaths carry no positional
//! meaning, so they are pulled out of the command line and re-emitted at
//! fixed places by the assembler. Everything else, including `-l` flags,
//! stays in `other` in its original order because the linker cares about
//! position (archive groups, `--as-needed` and friends).

use std::ffi::OsString;

use crate::error::{Error, Result};

/// An ordered list of directories with set-like demotion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathList {
    entries: Vec<String>,
}

impl PathList {
    pub fn push(&mut self, entry: impl Into<String>) {
        self.entries.push(entry.into());
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.entries.iter().any(|e| e == entry)
    }

    /// Move `dir` to the end of the list.
    ///
    /// Every occurrence is removed and a single copy appended, so duplicates
    /// collapse. Lists that do not contain `dir` are left alone.
    pub fn demote(&mut self, dir: &str) {
        if !self.contains(dir) {
            return;
        }
        self.entries.retain(|e| e != dir);
        self.entries.push(dir.to_string());
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for PathList {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Decode a raw command line.
///
/// Arguments that are not valid UTF-8 are rejected with the offending
/// argument in the error, shown lossily.
pub fn decode_argv<I>(argv: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = OsString>,
{
    argv.into_iter()
        .map(|arg| {
            arg.into_string().map_err(|raw| Error::NonUnicodeArgument {
                arg: raw.to_string_lossy().into_owned(),
            })
        })
        .collect()
}

/// A command line split by meaning.
#[derive(Debug, Clone, Default)]
pub struct ArgumentBuckets {
    /// `-I` directories.
    pub includes: PathList,
    /// `-L` directories.
    pub lib_dirs: PathList,
    /// Library names added by the wrapper itself, emitted as `-l<name>`.
    pub libs: Vec<String>,
    /// Runtime search paths.
    pub rpaths: PathList,
    /// Everything else, in command-line order.
    pub other: Vec<String>,
}

/// One of the two comma-escaped ways of handing an argument to the linker.
struct LinkerEscape {
    prefix: &'static str,
    rpath_flag: &'static str,
    expected: &'static str,
}

const WL: LinkerEscape = LinkerEscape {
    prefix: "-Wl,",
    rpath_flag: "-Wl,-rpath",
    expected: "-Wl,*",
};

const XLINKER: LinkerEscape = LinkerEscape {
    prefix: "-Xlinker,",
    rpath_flag: "-Xlinker,-rpath",
    expected: "-Xlinker,*",
};

/// Operand of a flag given either attached (`-Ifoo`) or split (`-I foo`).
fn operand(attached: &str, args: &[String], i: &mut usize) -> Option<String> {
    if !attached.is_empty() {
        return Some(attached.to_string());
    }
    let next = args.get(*i)?;
    *i += 1;
    Some(next.clone())
}

impl ArgumentBuckets {
    /// Sort `args` into buckets.
    ///
    /// Fails when an rpath flag is split across tokens but the follow-up
    /// token has the wrong form.
    pub fn classify(args: &[String]) -> Result<Self> {
        let mut buckets = Self::default();
        let mut i = 0;

        while i < args.len() {
            let arg = args[i].as_str();
            i += 1;

            if let Some(attached) = arg.strip_prefix("-I") {
                match operand(attached, args, &mut i) {
                    Some(dir) => buckets.includes.push(dir),
                    None => buckets.other.push(arg.to_string()),
                }
            } else if let Some(attached) = arg.strip_prefix("-L") {
                match operand(attached, args, &mut i) {
                    Some(dir) => buckets.lib_dirs.push(dir),
                    None => buckets.other.push(arg.to_string()),
                }
            } else if let Some(attached) = arg.strip_prefix("-l") {
                match operand(attached, args, &mut i) {
                    Some(lib) => buckets.other.push(format!("-l{lib}")),
                    None => buckets.other.push(arg.to_string()),
                }
            } else if let Some(rest) = arg.strip_prefix(WL.prefix) {
                buckets.linker_arg(&WL, arg, rest, args, &mut i)?;
            } else if let Some(rest) = arg.strip_prefix(XLINKER.prefix) {
                buckets.linker_arg(&XLINKER, arg, rest, args, &mut i)?;
            } else if arg == "-Xlinker" {
                buckets.bare_xlinker(args, &mut i)?;
            } else {
                buckets.other.push(arg.to_string());
            }
        }

        Ok(buckets)
    }

    fn linker_arg(
        &mut self,
        escape: &LinkerEscape,
        arg: &str,
        rest: &str,
        args: &[String],
        i: &mut usize,
    ) -> Result<()> {
        let inline = rest
            .strip_prefix("-rpath=")
            .or_else(|| rest.strip_prefix("-rpath,"));

        match inline {
            Some("") => self.other.push(arg.to_string()),
            Some(dir) => self.rpaths.push(dir),
            None if rest == "-rpath" => {
                let dir = args
                    .get(*i)
                    .and_then(|next| next.strip_prefix(escape.prefix))
                    .ok_or(Error::MalformedRpath {
                        flag: escape.rpath_flag,
                        expected: escape.expected,
                    })?;
                *i += 1;
                self.rpaths.push(dir);
            }
            None => self.other.push(arg.to_string()),
        }
        Ok(())
    }

    /// `-Xlinker -rpath -Xlinker <dir>`. Any other bare `-Xlinker` is kept
    /// on its own and the next token is classified normally.
    fn bare_xlinker(&mut self, args: &[String], i: &mut usize) -> Result<()> {
        match args.get(*i).map(String::as_str) {
            Some("-rpath") => {
                if args.get(*i + 1).map(String::as_str) != Some("-Xlinker") {
                    return Err(Error::MalformedRpath {
                        flag: "-Xlinker -rpath",
                        expected: "-Xlinker",
                    });
                }
                let dir = args.get(*i + 2).ok_or(Error::MalformedRpath {
                    flag: "-Xlinker -rpath -Xlinker",
                    expected: "a directory",
                })?;
                self.rpaths.push(dir.clone());
                *i += 3;
            }
            _ => self.other.push("-Xlinker".to_string()),
        }
        Ok(())
    }
}
