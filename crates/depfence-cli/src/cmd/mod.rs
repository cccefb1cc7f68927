use std::process::ExitCode;

use anyhow::Result;

use crate::args::{Cli, Command, DepsCommand, PolicyCommand};

mod enforce;
mod graph;
mod show;

pub fn dispatch(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Policy {
            command: PolicyCommand::Enforce(args),
        } => enforce::run(&args),
        Command::Policy {
            command: PolicyCommand::Show(args),
        } => show::run(&args),
        Command::Deps {
            command: DepsCommand::Graph(args),
        } => graph::run(&args),
    }
}
