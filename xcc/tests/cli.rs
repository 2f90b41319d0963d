#![cfg(unix)]

//! End-to-end tests for the `xcc` binary.
//!
//! Each test builds a throwaway wrapper directory holding alias symlinks to
//! the built binary, then runs the alias with a controlled environment.

use assert_cmd::Command;
use predicates::prelude::*;
use std::ffi::OsStr;
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Sandbox {
    root: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("env")).unwrap();
        fs::create_dir_all(root.path().join("logs")).unwrap();
        Self { root }
    }

    fn env_dir(&self) -> PathBuf {
        self.root.path().join("env")
    }

    fn log_dir(&self) -> PathBuf {
        self.root.path().join("logs")
    }

    fn path_str(path: &Path) -> String {
        path.to_str().unwrap().to_string()
    }

    /// A dependency prefix with the given subdirectories.
    fn dependency(&self, name: &str, subdirs: &[&str]) -> String {
        let root = self.root.path().join("deps").join(name);
        fs::create_dir_all(&root).unwrap();
        for sub in subdirs {
            fs::create_dir_all(root.join(sub)).unwrap();
        }
        Self::path_str(&root)
    }

    /// Command for the wrapper invoked as `alias`, with a minimal complete
    /// build environment.
    fn wrapper(&self, alias: &str) -> Command {
        let link = self.env_dir().join(alias);
        if !link.exists() {
            std::os::unix::fs::symlink(env!("CARGO_BIN_EXE_xcc"), &link).unwrap();
        }

        let inherited = std::env::var("PATH").unwrap_or_default();
        let env_dir = Self::path_str(&self.env_dir());

        let mut cmd = Command::new(&link);
        cmd.env_clear();
        cmd.env("PATH", format!("{env_dir}:{inherited}"));
        cmd.env("XCC_PREFIX", "/opt/pkg");
        cmd.env("XCC_ENV_PATH", &env_dir);
        cmd.env("XCC_DEBUG_LOG_DIR", Self::path_str(&self.log_dir()));
        cmd.env("XCC_DEBUG_LOG_ID", "pkg-abc123");
        cmd.env("XCC_COMPILER_SPEC", "gcc@4.9.3");
        cmd.env("XCC_CC_RPATH_ARG", "-Wl,-rpath,");
        cmd.env("XCC_CXX_RPATH_ARG", "-Wl,-rpath,");
        cmd.env("XCC_F77_RPATH_ARG", "-Wl,-rpath,");
        cmd.env("XCC_FC_RPATH_ARG", "-Wl,-rpath,");
        cmd.env("XCC_SHORT_SPEC", "pkg@1.0%gcc@4.9.3 arch=linux-x86_64");
        cmd.env("XCC_SYSTEM_DIRS", "/usr/include:/usr/lib:/usr/lib64");
        cmd.env("XCC_CC", "/usr/bin/gcc-real");
        cmd.env("XCC_CXX", "/usr/bin/g++-real");
        cmd
    }
}

// ============================================================================
// Test directives
// ============================================================================

mod directives {
    use super::*;

    #[test]
    fn dump_mode_reports_stage() {
        let sb = Sandbox::new();
        for (args, mode) in [
            (&["-c", "x.c"][..], "cc"),
            (&["-S", "-c", "x.c"][..], "as"),
            (&["-E", "x.c"][..], "cpp"),
            (&["x.c", "-o", "x"][..], "ccld"),
            (&["--version"][..], "vcheck"),
        ] {
            sb.wrapper("gcc")
                .env("XCC_TEST_COMMAND", "dump-mode")
                .args(args)
                .assert()
                .success()
                .stdout(format!("{mode}\n"));
        }
    }

    #[test]
    fn version_check_is_untouched() {
        let sb = Sandbox::new();
        let dep = sb.dependency("zlib", &["include", "lib"]);
        sb.wrapper("gcc")
            .env("XCC_TEST_COMMAND", "dump-args")
            .env("XCC_DEPENDENCIES", &dep)
            .env("XCC_LINK_DEPS", &dep)
            .env("XCC_CPPFLAGS", "-DNDEBUG")
            .arg("-dumpversion")
            .assert()
            .success()
            .stdout("/usr/bin/gcc-real -dumpversion\n");
    }

    #[test]
    fn linker_version_check() {
        let sb = Sandbox::new();
        sb.wrapper("ld")
            .env("XCC_TEST_COMMAND", "dump-args")
            .args(["-v"])
            .assert()
            .success()
            .stdout("ld -v\n");
    }

    #[test]
    fn unknown_directive_fails() {
        let sb = Sandbox::new();
        sb.wrapper("gcc")
            .env("XCC_TEST_COMMAND", "dump-everything")
            .args(["-c", "x.c"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("unknown test command"));
    }
}

// ============================================================================
// Rewriting
// ============================================================================

mod rewriting {
    use super::*;

    #[test]
    fn dependencies_are_injected_for_compile_and_link() {
        let sb = Sandbox::new();
        let dep = sb.dependency("dep1", &["include", "lib"]);
        sb.wrapper("g++")
            .env("XCC_TEST_COMMAND", "dump-args")
            .env("XCC_DEPENDENCIES", &dep)
            .env("XCC_RPATH_DEPS", &dep)
            .env("XCC_LINK_DEPS", &dep)
            .args(["main.cc", "-o", "main"])
            .assert()
            .success()
            .stdout(format!(
                "/usr/bin/g++-real -I{dep}/include main.cc -o main -L{dep}/lib \
                 -Wl,-rpath,{dep}/lib -Wl,-rpath,/opt/pkg/lib -Wl,-rpath,/opt/pkg/lib64\n"
            ));
    }

    #[test]
    fn darwin_merge_objects_get_no_rpaths() {
        let sb = Sandbox::new();
        let dep = sb.dependency("dep1", &["lib"]);
        sb.wrapper("ld")
            .env("XCC_TEST_COMMAND", "dump-args")
            .env("XCC_SHORT_SPEC", "pkg@1.0 arch=darwin-x86_64")
            .env("XCC_DEPENDENCIES", &dep)
            .env("XCC_RPATH_DEPS", &dep)
            .env("XCC_LINK_DEPS", &dep)
            .args(["-r", "a.o", "b.o", "-o", "ab.o"])
            .assert()
            .success()
            .stdout(format!("ld -r a.o b.o -o ab.o -L{dep}/lib\n"));
    }

    #[test]
    fn system_directories_go_last() {
        let sb = Sandbox::new();
        sb.wrapper("cc")
            .env("XCC_TEST_COMMAND", "dump-args")
            .args(["-I/usr/include", "-I/opt/a", "-I/opt/b", "-c", "x.c"])
            .assert()
            .success()
            .stdout("/usr/bin/gcc-real -I/opt/a -I/opt/b -I/usr/include -c x.c\n");
    }

    #[test]
    fn bare_xlinker_operand_is_still_classified() {
        let sb = Sandbox::new();
        sb.wrapper("gcc")
            .env("XCC_TEST_COMMAND", "dump-args")
            .args(["x.o", "-Xlinker", "-L/opt/x", "-o", "x"])
            .assert()
            .success()
            .stdout(
                "/usr/bin/gcc-real x.o -Xlinker -o x -L/opt/x \
                 -Wl,-rpath,/opt/pkg/lib -Wl,-rpath,/opt/pkg/lib64\n",
            );
    }

    #[test]
    fn default_libraries_follow_command_line_libraries() {
        let sb = Sandbox::new();
        sb.wrapper("gcc")
            .env("XCC_TEST_COMMAND", "dump-args")
            .env("XCC_LDLIBS", "-lm")
            .env("XCC_LDFLAGS", "-Wl,--as-needed")
            .args(["x.o", "-lz", "-o", "x"])
            .assert()
            .success()
            .stdout(
                "/usr/bin/gcc-real -Wl,--as-needed x.o -lz -o x -lm \
                 -Wl,-rpath,/opt/pkg/lib -Wl,-rpath,/opt/pkg/lib64\n",
            );
    }
}

// ============================================================================
// Errors
// ============================================================================

mod errors {
    use super::*;

    #[test]
    fn missing_configuration() {
        let sb = Sandbox::new();
        sb.wrapper("gcc")
            .env_remove("XCC_PREFIX")
            .args(["-c", "x.c"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("'XCC_PREFIX' is missing"));
    }

    #[test]
    fn unknown_alias() {
        let sb = Sandbox::new();
        sb.wrapper("javac")
            .arg("Main.java")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("unknown compiler: 'javac'"));
    }

    #[test]
    fn unsupported_language() {
        let sb = Sandbox::new();
        sb.wrapper("gfortran")
            .args(["-c", "x.f90"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains(
                "compiler 'gcc@4.9.3' does not support compiling Fortran 90 programs",
            ));
    }

    #[test]
    fn malformed_rpath() {
        let sb = Sandbox::new();
        sb.wrapper("gcc")
            .env("XCC_TEST_COMMAND", "dump-args")
            .args(["x.o", "-Wl,-rpath", "/x/y"])
            .assert()
            .code(1)
            .stdout("")
            .stderr(predicate::str::contains("-Wl,-rpath was not followed by -Wl,*"));
    }

    #[test]
    fn non_unicode_argument_is_reported() {
        let sb = Sandbox::new();
        sb.wrapper("gcc")
            .env("XCC_CC", "true")
            .arg("-c")
            .arg(OsStr::from_bytes(b"caf\xe9.c"))
            .assert()
            .code(1)
            .stderr(predicate::str::contains("is not valid UTF-8"));
    }

    #[test]
    fn non_unicode_configuration_is_reported() {
        let sb = Sandbox::new();
        sb.wrapper("gcc")
            .env("XCC_PREFIX", OsStr::from_bytes(b"/opt/caf\xe9"))
            .args(["-c", "x.c"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("XCC_PREFIX is not valid UTF-8"));
    }

    #[test]
    fn missing_real_command() {
        let sb = Sandbox::new();
        sb.wrapper("gcc")
            .env("XCC_CC", "/nonexistent/bin/gcc")
            .args(["-c", "x.c"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("failed to execute '/nonexistent/bin/gcc'"));
    }
}

// ============================================================================
// Execution
// ============================================================================

mod execution {
    use super::*;

    #[test]
    fn replaces_itself_with_real_command() {
        let sb = Sandbox::new();
        sb.wrapper("gcc")
            .env("XCC_CC", "echo")
            .args(["-c", "hello.c", "-I/opt/inc"])
            .assert()
            .success()
            .stdout("-I/opt/inc -c hello.c\n");
    }

    #[test]
    fn child_environment_is_prepared() {
        let sb = Sandbox::new();
        let env_dir = Sandbox::path_str(&sb.env_dir());
        let output = sb
            .wrapper("cc")
            .env("XCC_CC", "sh")
            .env("XCC_ENV_TO_SET", "FOO")
            .env("XCC_ENV_SET_FOO", "bar")
            .args([
                "-c",
                "echo \"$FOO ${XCC_ENV_SET_FOO-unset}\"; echo \"$PATH\"",
            ])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();

        let stdout = String::from_utf8(output).unwrap();
        let mut lines = stdout.lines();
        assert_eq!(lines.next(), Some("bar unset"));
        let path = lines.next().unwrap();
        assert!(!path.split(':').any(|p| p == env_dir));
    }

    #[test]
    fn debug_logs_record_both_command_lines() {
        let sb = Sandbox::new();
        sb.wrapper("gcc")
            .env("XCC_CC", "true")
            .env("XCC_DEBUG", "TRUE")
            .env("XCC_CPPFLAGS", "-DNDEBUG")
            .args(["-c", "x.c"])
            .assert()
            .success();

        let input = fs::read_to_string(sb.log_dir().join("xcc-pkg-abc123.in.log")).unwrap();
        let output = fs::read_to_string(sb.log_dir().join("xcc-pkg-abc123.out.log")).unwrap();
        assert_eq!(input, "[cc] gcc -c x.c\n");
        assert_eq!(output, "[cc] true -DNDEBUG -c x.c\n");
    }

    #[test]
    fn unwritable_debug_log_does_not_stop_the_build() {
        let sb = Sandbox::new();
        let missing = sb.log_dir().join("missing");
        sb.wrapper("gcc")
            .env("XCC_CC", "echo")
            .env("XCC_DEBUG", "TRUE")
            .env("XCC_DEBUG_LOG_DIR", &missing)
            .args(["-c", "x.c"])
            .assert()
            .success()
            .stdout("-c x.c\n")
            .stderr(predicate::str::contains("failed to write debug log"));
        assert!(!missing.exists());
    }
}
