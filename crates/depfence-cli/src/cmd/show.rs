use std::process::ExitCode;

use anyhow::Result;

use crate::args::ShowArgs;
use crate::io::input;
use crate::output;

pub fn run(args: &ShowArgs) -> Result<ExitCode> {
    let policy = input::load_policy(&args.policy)?;
    output::print(&policy.to_canonical_document())?;
    Ok(ExitCode::SUCCESS)
}
