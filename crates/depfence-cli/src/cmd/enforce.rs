use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{error, info, warn};

use depfence_core::prelude::*;

use crate::args::EnforceArgs;
use crate::golang::{GoListEnumerator, GoListResolver};
use crate::io::input;
use crate::output;

#[derive(Debug, Serialize)]
pub struct EnforceOut {
    pub ok: bool,
    pub summary: CheckSummary,
    pub results: Vec<CheckResult>,
}

pub fn run(args: &EnforceArgs) -> Result<ExitCode> {
    let cfg = RunConfig {
        selector: args.selector.clone(),
        // Only direct dependencies are checked.
        max_depth: 1,
        workers: args.jobs.unwrap_or_else(depfence_core::config::default_workers),
        ..RunConfig::default()
    };
    validate_config(&cfg)?;

    let policy = Arc::new(input::load_policy(&args.policy)?);

    let packages = GoListEnumerator
        .enumerate(&cfg.selector)
        .with_context(|| format!("Unable to list packages matching {}", cfg.selector))?;
    info!(
        "checking {} package(s) against {} constraint(s) with {} worker(s)",
        packages.len(),
        policy.constraints().len(),
        cfg.workers
    );

    let checker = Arc::new(Checker::new(policy, Arc::new(GoListResolver)).with_max_depth(cfg.max_depth));

    let pb = ProgressBar::new(packages.len() as u64);
    pb.set_style(ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")?);

    let mut results = Vec::new();
    let summary = check_packages(checker, &packages, cfg.workers, |result| {
        pb.suspend(|| report(&result));
        pb.set_message(result.package.clone());
        pb.inc(1);
        if args.json {
            results.push(result);
        }
    })?;
    pb.finish_and_clear();

    if args.json {
        results.sort_by(|a, b| a.package.cmp(&b.package));
        output::print(&EnforceOut {
            ok: summary.is_success(),
            summary,
            results,
        })?;
    }

    if summary.is_success() {
        info!(
            "checked {} package(s), {} warning(s)",
            summary.packages, summary.warnings
        );
        Ok(ExitCode::SUCCESS)
    } else {
        error!("found {} error(s)", summary.errors);
        Ok(ExitCode::FAILURE)
    }
}

fn report(result: &CheckResult) {
    for w in &result.warns {
        warn!("{w}");
    }
    for e in &result.errs {
        error!("{e}");
    }
}
