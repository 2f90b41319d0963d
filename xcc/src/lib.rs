//! Compiler wrapper for dependency-aware builds.
//!
//! `xcc` is installed under the names of the compilers a build system
//! expects (`cc`, `g++`, `gfortran`, `ld`, ...). When invoked it:
//! - loads the build environment from `XCC_*` variables
//! - works out which real tool to run and what stage it performs
//! - moves `-I`, `-L` and rpath arguments out of the command line
//! - adds the include, library and rpath directories of the package's
//!   dependencies, pushing system directories to the back
//! - replaces itself with the real tool
//!
//! # Example
//!
//! ```text
//! $ XCC_TEST_COMMAND=dump-args gcc -c foo.c -I/usr/include
//! /usr/bin/gcc -I/opt/zlib/include -I/usr/include -c foo.c
//! ```

pub mod args;
pub mod assemble;
pub mod config;
pub mod env;
mod error;
pub mod inject;
pub mod types;
pub mod wrapper;

pub use args::{ArgumentBuckets, PathList};
pub use assemble::FinalCommand;
pub use config::InvocationConfig;
pub use error::{Error, Result};
pub use types::{Language, Mode, TestCommand, Tool};
