use std::io::Write;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::info;

use depfence_core::prelude::*;

use crate::args::GraphArgs;
use crate::golang::{GoListEnumerator, GoListResolver};
use crate::io::input;
use crate::output;

pub fn run(args: &GraphArgs) -> Result<ExitCode> {
    let cfg = RunConfig {
        selector: args.selector.clone(),
        max_depth: args.maxdepth,
        skip: parse_skip_list(&args.skip),
        ..RunConfig::default()
    };
    validate_config(&cfg)?;

    let policy = input::load_policy(&args.policy)?;

    let packages = GoListEnumerator
        .enumerate(&cfg.selector)
        .with_context(|| format!("Unable to list packages matching {}", cfg.selector))?;

    let mut out = output::sink(args.outfile.as_deref())?;
    let stats = emit_graph(&policy, &GoListResolver, &packages, &cfg.skip, cfg.max_depth, &mut out)
        .context("Unable to write graph")?;
    out.flush().context("Unable to write graph")?;

    info!(
        "graph of {} package(s): {} edge(s), {} unresolved",
        stats.packages, stats.edges, stats.unresolved
    );
    Ok(ExitCode::SUCCESS)
}
