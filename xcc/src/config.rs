use serde::de::value::{Error as ValueError, MapDeserializer};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::types::Language;

/// Variables the build environment must always provide.
pub const REQUIRED_VARS: [&str; 11] = [
    "XCC_PREFIX",
    "XCC_ENV_PATH",
    "XCC_DEBUG_LOG_DIR",
    "XCC_DEBUG_LOG_ID",
    "XCC_COMPILER_SPEC",
    "XCC_CC_RPATH_ARG",
    "XCC_CXX_RPATH_ARG",
    "XCC_F77_RPATH_ARG",
    "XCC_FC_RPATH_ARG",
    "XCC_SHORT_SPEC",
    "XCC_SYSTEM_DIRS",
];

const EXPORT_VALUE_PREFIX: &str = "XCC_ENV_SET_";

/// Snapshot of everything the build environment told this invocation.
///
/// Built once from the process environment and then only ever borrowed.
#[derive(Debug, Clone, Deserialize)]
pub struct InvocationConfig {
    /// Install prefix of the package being built.
    #[serde(rename = "XCC_PREFIX")]
    pub prefix: String,

    /// Wrapper directories that must not be searched for the real tools.
    #[serde(rename = "XCC_ENV_PATH", deserialize_with = "colon_list")]
    pub env_path: Vec<String>,

    #[serde(rename = "XCC_DEBUG_LOG_DIR")]
    pub debug_log_dir: PathBuf,

    #[serde(rename = "XCC_DEBUG_LOG_ID")]
    pub debug_log_id: String,

    /// Compiler spec, only used to name the compiler in diagnostics.
    #[serde(rename = "XCC_COMPILER_SPEC")]
    pub compiler_spec: String,

    #[serde(rename = "XCC_CC_RPATH_ARG")]
    pub cc_rpath_arg: String,
    #[serde(rename = "XCC_CXX_RPATH_ARG")]
    pub cxx_rpath_arg: String,
    #[serde(rename = "XCC_F77_RPATH_ARG")]
    pub f77_rpath_arg: String,
    #[serde(rename = "XCC_FC_RPATH_ARG")]
    pub fc_rpath_arg: String,

    /// Short spec of the package; platform detection looks for `darwin` here.
    #[serde(rename = "XCC_SHORT_SPEC")]
    pub short_spec: String,

    #[serde(rename = "XCC_SYSTEM_DIRS", deserialize_with = "colon_list")]
    pub system_dirs: Vec<String>,

    // Real compilers. A missing entry means the compiler spec has no
    // compiler for that language.
    #[serde(rename = "XCC_CC", default, deserialize_with = "present")]
    pub cc: Option<String>,
    #[serde(rename = "XCC_CXX", default, deserialize_with = "present")]
    pub cxx: Option<String>,
    #[serde(rename = "XCC_F77", default, deserialize_with = "present")]
    pub f77: Option<String>,
    #[serde(rename = "XCC_FC", default, deserialize_with = "present")]
    pub fc: Option<String>,

    #[serde(rename = "XCC_CPPFLAGS", default, deserialize_with = "flag_list")]
    pub cppflags: Vec<String>,
    #[serde(rename = "XCC_CFLAGS", default, deserialize_with = "flag_list")]
    pub cflags: Vec<String>,
    #[serde(rename = "XCC_CXXFLAGS", default, deserialize_with = "flag_list")]
    pub cxxflags: Vec<String>,
    #[serde(rename = "XCC_FCFLAGS", default, deserialize_with = "flag_list")]
    pub fcflags: Vec<String>,
    #[serde(rename = "XCC_F77FLAGS", default, deserialize_with = "flag_list")]
    pub f77flags: Vec<String>,
    #[serde(rename = "XCC_FFLAGS", default, deserialize_with = "flag_list")]
    pub fflags: Vec<String>,
    #[serde(rename = "XCC_LDFLAGS", default, deserialize_with = "flag_list")]
    pub ldflags: Vec<String>,
    #[serde(rename = "XCC_LDLIBS", default, deserialize_with = "flag_list")]
    pub ldlibs: Vec<String>,

    #[serde(rename = "XCC_DEBUG", default, deserialize_with = "truthy")]
    pub debug: bool,

    /// Raw test directive; parsed by the wrapper so a bad value is reported
    /// as its own error.
    #[serde(rename = "XCC_TEST_COMMAND", default, deserialize_with = "present")]
    pub test_command: Option<String>,

    #[serde(rename = "XCC_DEPENDENCIES", default, deserialize_with = "colon_list")]
    pub dependencies: Vec<String>,
    #[serde(rename = "XCC_RPATH_DEPS", default, deserialize_with = "colon_list")]
    pub rpath_deps: Vec<String>,
    #[serde(rename = "XCC_LINK_DEPS", default, deserialize_with = "colon_list")]
    pub link_deps: Vec<String>,
    #[serde(rename = "XCC_COMPILER_EXTRA_RPATHS", default, deserialize_with = "colon_list")]
    pub extra_rpaths: Vec<String>,

    #[serde(rename = "XCC_ENV_TO_SET", default, deserialize_with = "colon_list")]
    pub env_to_set: Vec<String>,

    /// Inherited executable search path, unfiltered.
    #[serde(rename = "PATH", default)]
    pub search_path: String,

    /// `(name, value)` pairs to export into the real command's environment.
    #[serde(skip)]
    pub exports: Vec<(String, String)>,
}

fn colon_list<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Vec<String>, D::Error> {
    let raw = String::deserialize(d)?;
    Ok(split_colon_list(&raw))
}

fn present<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<String>, D::Error> {
    String::deserialize(d).map(Some)
}

fn flag_list<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Vec<String>, D::Error> {
    let raw = String::deserialize(d)?;
    Ok(raw.split_whitespace().map(str::to_string).collect())
}

fn truthy<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<bool, D::Error> {
    let raw = String::deserialize(d)?;
    Ok(raw.eq_ignore_ascii_case("true"))
}

fn is_config_var(name: &str) -> bool {
    name.starts_with("XCC_") || name == "PATH"
}

/// Split a colon-delimited list, skipping empty segments.
pub fn split_colon_list(s: &str) -> Vec<String> {
    s.split(':')
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

impl InvocationConfig {
    /// Load the configuration from the current process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_os_vars(std::env::vars_os())
    }

    /// Load the configuration from raw `(name, value)` pairs.
    ///
    /// A variable the wrapper reads must hold valid UTF-8; anything else is
    /// rejected rather than skipped. Other variables are not decoded.
    pub fn from_os_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        let mut decoded = Vec::new();
        for (name, value) in vars {
            let Some(name) = name.to_str().filter(|n| is_config_var(n)) else {
                continue;
            };
            let value = value.into_string().map_err(|raw| {
                Error::InvalidConfiguration(format!(
                    "{name} is not valid UTF-8: '{}'",
                    raw.to_string_lossy()
                ))
            })?;
            decoded.push((name.to_string(), value));
        }
        Self::from_vars(decoded)
    }

    /// Load the configuration from explicit `(name, value)` pairs.
    ///
    /// Only `XCC_*` variables and `PATH` are looked at. Empty values are
    /// treated as unset.
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let map: BTreeMap<String, String> = vars
            .into_iter()
            .filter(|(k, v)| !v.is_empty() && is_config_var(k))
            .collect();

        for name in REQUIRED_VARS {
            if !map.contains_key(name) {
                return Err(Error::MissingConfiguration { name });
            }
        }

        let de: MapDeserializer<'_, _, ValueError> = MapDeserializer::new(map.clone().into_iter());
        let mut config = InvocationConfig::deserialize(de)
            .map_err(|e| Error::InvalidConfiguration(e.to_string()))?;

        config.exports = config
            .env_to_set
            .iter()
            .map(|name| {
                let holder = format!("{EXPORT_VALUE_PREFIX}{name}");
                let value = map.get(&holder).cloned().unwrap_or_else(|| {
                    log::warn!("{name} is listed in XCC_ENV_TO_SET but {holder} is unset; exporting it empty");
                    String::new()
                });
                (name.clone(), value)
            })
            .collect();

        Ok(config)
    }

    /// Real compiler configured for `lang`, if any.
    pub fn compiler(&self, lang: Language) -> Option<&str> {
        match lang {
            Language::C => self.cc.as_deref(),
            Language::Cxx => self.cxx.as_deref(),
            Language::Fortran77 => self.f77.as_deref(),
            Language::Fortran90 => self.fc.as_deref(),
        }
    }

    /// Flag prefix the compiler driver for `lang` uses to pass an rpath.
    pub fn rpath_arg(&self, lang: Language) -> &str {
        match lang {
            Language::C => &self.cc_rpath_arg,
            Language::Cxx => &self.cxx_rpath_arg,
            Language::Fortran77 => &self.f77_rpath_arg,
            Language::Fortran90 => &self.fc_rpath_arg,
        }
    }

    /// Language-specific compile flags.
    pub fn language_flags(&self, lang: Language) -> &[String] {
        match lang {
            Language::C => &self.cflags,
            Language::Cxx => &self.cxxflags,
            Language::Fortran77 => &self.f77flags,
            Language::Fortran90 => &self.fcflags,
        }
    }

    /// Whether the target uses a Darwin-style linker.
    pub fn is_darwin(&self) -> bool {
        self.short_spec.contains("darwin")
    }

    /// Paths of the input and output debug logs for this build.
    pub fn debug_log_paths(&self) -> (PathBuf, PathBuf) {
        let stem = format!("xcc-{}", self.debug_log_id);
        (
            self.debug_log_dir.join(format!("{stem}.in.log")),
            self.debug_log_dir.join(format!("{stem}.out.log")),
        )
    }
}
