use anyhow::{Context, Result};
use std::process::ExitCode;

use xcc::InvocationConfig;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("XCC_LOG", "warn"))
        .format_timestamp(None)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("xcc: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let argv = xcc::args::decode_argv(std::env::args_os())?;
    let (alias, args) = argv
        .split_first()
        .context("could not obtain the name xcc was invoked as")?;

    let cfg = InvocationConfig::from_env()?;
    xcc::wrapper::wrapper_main(alias, args, &cfg)?;
    Ok(())
}
