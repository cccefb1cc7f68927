use std::process::ExitCode;

use clap::Parser;
use tracing::error;

mod args;
mod cmd;
mod golang;
mod io;
mod logging;
mod output;

fn main() -> ExitCode {
    let cli = args::Cli::parse();
    logging::init(cli.log);

    match cmd::dispatch(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
