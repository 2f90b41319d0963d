//! Search paths contributed by the build environment rather than the
//! command line.

use std::path::Path;

use crate::args::ArgumentBuckets;
use crate::config::InvocationConfig;
use crate::types::Mode;

/// Whether rpaths may be added at all for this invocation.
///
/// Darwin's linker refuses `-rpath` together with `-r` (merge relocatable
/// objects), so rpaths are dropped for such links.
pub fn rpaths_enabled(cfg: &InvocationConfig, mode: Mode, args: &[String]) -> bool {
    if !mode.links() || !cfg.is_darwin() {
        return true;
    }
    !args
        .iter()
        .any(|a| a == "-r" || (mode == Mode::Ccld && a == "-Wl,-r"))
}

/// Add directories from dependency roots, the install prefix, extra rpaths
/// and default libraries.
///
/// Dependency subdirectories are only added if they exist right now.
pub fn inject_dependencies(
    buckets: &mut ArgumentBuckets,
    cfg: &InvocationConfig,
    mode: Mode,
    add_rpaths: bool,
) {
    for dep in &cfg.dependencies {
        let root = dep.trim_end_matches('/');

        let include = format!("{root}/include");
        if mode.preprocesses() && Path::new(&include).is_dir() {
            buckets.includes.push(include);
        }

        let want_rpath = add_rpaths && cfg.rpath_deps.contains(dep);
        let want_link = cfg.link_deps.contains(dep);
        for sub in ["lib", "lib64"] {
            let dir = format!("{root}/{sub}");
            if !Path::new(&dir).is_dir() {
                continue;
            }
            if want_rpath {
                buckets.rpaths.push(dir.clone());
            }
            if want_link {
                buckets.lib_dirs.push(dir);
            }
        }
    }

    if add_rpaths {
        let prefix = cfg.prefix.trim_end_matches('/');
        buckets.rpaths.push(format!("{prefix}/lib"));
        buckets.rpaths.push(format!("{prefix}/lib64"));
    }

    for extra in &cfg.extra_rpaths {
        if add_rpaths {
            buckets.rpaths.push(extra.clone());
        }
        buckets.lib_dirs.push(extra.clone());
    }

    if mode.links() {
        for lib in &cfg.ldlibs {
            let name = lib.strip_prefix("-l").unwrap_or(lib);
            if !name.is_empty() {
                buckets.libs.push(name.to_string());
            }
        }
    }

    log::debug!(
        "injected: includes={:?} lib_dirs={:?} rpaths={:?} libs={:?}",
        buckets.includes,
        buckets.lib_dirs,
        buckets.rpaths,
        buckets.libs
    );
}

/// Push system directories behind everything else in each search-path
/// bucket.
pub fn demote_system_dirs(buckets: &mut ArgumentBuckets, system_dirs: &[String]) {
    for dir in system_dirs {
        buckets.includes.demote(dir);
        buckets.lib_dirs.demote(dir);
        buckets.rpaths.demote(dir);
    }
}
