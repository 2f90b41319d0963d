use std::convert::Infallible;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::args::ArgumentBuckets;
use crate::assemble::FinalCommand;
use crate::config::InvocationConfig;
use crate::env::apply_environment;
use crate::error::{Error, Result};
use crate::inject::{demote_system_dirs, inject_dependencies, rpaths_enabled};
use crate::types::{Mode, TestCommand, Tool, alias_basename};

/// What an invocation ends in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Print a line for the build system's tests and exit successfully.
    Print(String),
    /// Hand over to the real command.
    Run { mode: Mode, command: FinalCommand },
}

/// Entry point when invoked as a compiler: `alias` is `argv[0]`, `args` the
/// rest of the command line.
///
/// Only returns when there is something to report: a test directive was
/// served, or the invocation failed. Debug logs that cannot be written are
/// reported as a warning and the real command still runs.
pub fn wrapper_main(alias: &str, args: &[String], cfg: &InvocationConfig) -> Result<()> {
    match plan(alias, args, cfg)? {
        Outcome::Print(line) => {
            println!("{line}");
            Ok(())
        }
        Outcome::Run { mode, command } => {
            if cfg.debug {
                if let Err(Error::DebugLog { path, source }) =
                    write_debug_logs(cfg, mode, alias, args, &command)
                {
                    log::warn!("failed to write debug log '{}': {source}", path.display());
                }
            }
            match exec(&command, cfg)? {}
        }
    }
}

/// Resolve the mode and the final command line without side effects.
pub fn plan(alias: &str, args: &[String], cfg: &InvocationConfig) -> Result<Outcome> {
    let test_command = cfg
        .test_command
        .as_deref()
        .map(str::parse::<TestCommand>)
        .transpose()?;

    let tool = Tool::from_alias(alias)?;
    let mode = Mode::detect(tool, args);
    log::debug!("{alias}: {tool:?} in mode {mode}");

    if test_command == Some(TestCommand::DumpMode) {
        return Ok(Outcome::Print(mode.to_string()));
    }

    let program = match tool {
        Tool::Compiler(lang) => cfg.compiler(lang).ok_or_else(|| Error::UnsupportedLanguage {
            spec: cfg.compiler_spec.clone(),
            language: lang.name(),
        })?,
        Tool::Preprocessor => "cpp",
        Tool::Linker => "ld",
    };

    let command = if mode == Mode::Vcheck {
        FinalCommand::passthrough(program, args)
    } else {
        rewrite(program, tool, mode, args, cfg)?
    };
    log::debug!("final command: {command}");

    if test_command == Some(TestCommand::DumpArgs) {
        return Ok(Outcome::Print(command.to_string()));
    }
    Ok(Outcome::Run { mode, command })
}

fn rewrite(
    program: &str,
    tool: Tool,
    mode: Mode,
    args: &[String],
    cfg: &InvocationConfig,
) -> Result<FinalCommand> {
    let mut buckets = ArgumentBuckets::classify(args)?;

    let add_rpaths = rpaths_enabled(cfg, mode, args);
    if !add_rpaths {
        log::debug!("merging relocatable objects on darwin, not adding rpaths");
    }
    inject_dependencies(&mut buckets, cfg, mode, add_rpaths);
    demote_system_dirs(&mut buckets, &cfg.system_dirs);

    Ok(FinalCommand::assemble(
        program,
        tool.language(),
        mode,
        cfg,
        &buckets,
    ))
}

fn append_line(path: &Path, line: &str) -> Result<()> {
    let log_err = |source| Error::DebugLog {
        path: path.to_path_buf(),
        source,
    };
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(log_err)?;
    writeln!(file, "{line}").map_err(log_err)
}

/// Record the command as received and as rewritten, one line each.
///
/// The received command is logged under its alias name, not the path the
/// wrapper was run through.
pub fn write_debug_logs(
    cfg: &InvocationConfig,
    mode: Mode,
    alias: &str,
    args: &[String],
    command: &FinalCommand,
) -> Result<()> {
    let (input_log, output_log) = cfg.debug_log_paths();
    let original = FinalCommand::passthrough(alias_basename(alias), args);
    append_line(&input_log, &format!("[{mode}] {original}"))?;
    append_line(&output_log, &format!("[{mode}] {command}"))
}

/// Replace this process with `command`. Never returns on success.
#[cfg(unix)]
pub fn exec(command: &FinalCommand, cfg: &InvocationConfig) -> Result<Infallible> {
    use std::os::unix::process::CommandExt;

    let mut cmd = command.to_command();
    apply_environment(&mut cmd, cfg);
    let source = cmd.exec();
    Err(Error::Exec {
        command: command.program.clone(),
        source,
    })
}

/// Run `command` to completion and exit with its status.
#[cfg(not(unix))]
pub fn exec(command: &FinalCommand, cfg: &InvocationConfig) -> Result<Infallible> {
    let mut cmd = command.to_command();
    apply_environment(&mut cmd, cfg);
    let status = cmd.status().map_err(|source| Error::Exec {
        command: command.program.clone(),
        source,
    })?;
    std::process::exit(status.code().unwrap_or(1));
}
