//! Error types for the compiler wrapper.

use std::io;
use std::path::PathBuf;

/// Result type alias for wrapper operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Every way an invocation can fail before the real command takes over.
///
/// None of these are recoverable: the wrapper reports the message and exits
/// with status 1 without running the wrapped tool.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required `XCC_*` variable is absent or empty.
    #[error("compiler wrapper must be run from the build environment: input '{name}' is missing")]
    MissingConfiguration { name: &'static str },

    /// A configuration value could not be interpreted.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The wrapper was invoked under a name it does not know.
    #[error("unknown compiler: '{alias}'")]
    UnknownCompiler { alias: String },

    /// The alias is known but no real compiler is configured for its language.
    #[error("compiler '{spec}' does not support compiling {language} programs")]
    UnsupportedLanguage { spec: String, language: &'static str },

    /// An rpath argument was not followed by the token it requires.
    #[error("{flag} was not followed by {expected}")]
    MalformedRpath {
        flag: &'static str,
        expected: &'static str,
    },

    /// A command-line argument is not valid UTF-8.
    #[error("argument '{arg}' is not valid UTF-8")]
    NonUnicodeArgument { arg: String },

    /// `XCC_TEST_COMMAND` holds something other than a known directive.
    #[error("unknown test command: '{value}'")]
    UnknownTestCommand { value: String },

    /// Appending to one of the debug log files failed.
    #[error("failed to write debug log '{}'", path.display())]
    DebugLog {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The real command could not be started.
    #[error("failed to execute '{command}'")]
    Exec {
        command: String,
        #[source]
        source: io::Error,
    },
}
