//! Policy checking.
//!
//! [`Checker`] validates the direct dependencies of one package against the
//! constraints that apply to it and produces a [`CheckResult`].
//! [`check_packages`] fans the packages of a run out over a worker pool and
//! collects exactly one result per package from a bounded channel, in
//! completion order.
//!
//! Within one result the order is deterministic: constraints in policy
//! order, and for each constraint the dependencies in resolver order.

use std::fmt;
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::deps::{DependencyResolver, PkgNode};
use crate::errors::{FenceError, FenceResult};
use crate::policy::{CanonicalConstraint, Policy, Severity};

/// One finding about a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub message: String,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependency: Option<String>,
    /// Index of the broken constraint in the policy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraint: Option<usize>,
}

impl Diagnostic {
    fn about(subject: &str, message: String) -> Self {
        Self {
            message,
            subject: subject.to_string(),
            dependency: None,
            constraint: None,
        }
    }

    fn violation(subject: &str, dependency: &str, constraint: usize) -> Self {
        Self {
            message: format!("{subject} depends on {dependency}"),
            subject: subject.to_string(),
            dependency: Some(dependency.to_string()),
            constraint: Some(constraint),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Findings for one package, bucketed by severity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub package: String,
    pub warns: Vec<Diagnostic>,
    pub errs: Vec<Diagnostic>,
}

impl CheckResult {
    fn new(package: &str) -> Self {
        Self {
            package: package.to_string(),
            ..Self::default()
        }
    }

    fn push(&mut self, severity: Severity, d: Diagnostic) {
        match severity {
            Severity::Warn => self.warns.push(d),
            Severity::Error => self.errs.push(d),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.warns.is_empty() && self.errs.is_empty()
    }
}

/// Checks packages against one policy.
pub struct Checker {
    policy: Arc<Policy>,
    resolver: Arc<dyn DependencyResolver>,
    max_depth: usize,
}

impl Checker {
    pub fn new(policy: Arc<Policy>, resolver: Arc<dyn DependencyResolver>) -> Self {
        Self {
            policy,
            resolver,
            max_depth: 0,
        }
    }

    /// Depth passed to the resolver (0 = unbounded). Only the root's direct
    /// dependencies are checked, so a depth of 1 is enough.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Check one package.
    pub fn check(&self, pkg: &str) -> CheckResult {
        let mut result = CheckResult::new(pkg);

        let constraints = self.policy.applicable_constraint_indices(pkg);
        debug!("checking ({} constraints) package {pkg}", constraints.len());
        if constraints.is_empty() {
            result
                .warns
                .push(Diagnostic::about(pkg, format!("{pkg} does not have constraints")));
            return result;
        }

        let root = match self.resolver.resolve(pkg, self.max_depth) {
            Ok(root) => root,
            Err(e) => {
                result.errs.push(Diagnostic::about(
                    pkg,
                    format!("unable to get dependencies of {pkg}: {e:#}"),
                ));
                return result;
            }
        };

        for (idx, constraint) in constraints {
            self.check_constraint(idx, constraint, &root, &mut result);
        }
        result
    }

    fn check_constraint(&self, idx: usize, constraint: &CanonicalConstraint, root: &PkgNode, result: &mut CheckResult) {
        for dep in root.deps.iter().filter(|d| !d.stdlib) {
            debug!(kind = %constraint.kind, dep = %dep.name, "testing dependency against constraint {idx}");
            if constraint.is_broken_by(&dep.name) {
                result.push(constraint.on_break, Diagnostic::violation(&root.name, &dep.name, idx));
            }
        }
    }

    /// Check one package and publish its result on `out`.
    ///
    /// The send never blocks; the channel is expected to have room for every
    /// package of the run.
    pub fn check_pkg(&self, pkg: &str, out: &SyncSender<CheckResult>) {
        let result = self.check(pkg);
        match out.try_send(result) {
            Ok(()) => {}
            Err(TrySendError::Full(r)) => {
                warn!("result channel full, blocking to deliver {}", r.package);
                if out.send(r).is_err() {
                    warn!("result receiver dropped before {pkg} was delivered");
                }
            }
            Err(TrySendError::Disconnected(_)) => {
                warn!("result receiver dropped before {pkg} was delivered");
            }
        }
    }
}

/// Totals of a checking run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CheckSummary {
    pub packages: usize,
    pub warnings: usize,
    pub errors: usize,
}

impl CheckSummary {
    pub fn record(&mut self, result: &CheckResult) {
        self.packages += 1;
        self.warnings += result.warns.len();
        self.errors += result.errs.len();
    }

    /// Warnings never fail a run.
    pub fn is_success(&self) -> bool {
        self.errors == 0
    }
}

/// Check every package on a pool of `workers` threads.
///
/// All tasks are submitted before any result is read. `on_result` sees each
/// result as it arrives, in completion order.
pub fn check_packages<F>(
    checker: Arc<Checker>,
    packages: &[String],
    workers: usize,
    mut on_result: F,
) -> FenceResult<CheckSummary>
where
    F: FnMut(CheckResult),
{
    let total = packages.len();
    let (tx, rx) = mpsc::sync_channel(total.max(1));

    submit(checker, packages, workers, tx)?;

    let mut summary = CheckSummary::default();
    for _ in 0..total {
        let result = rx
            .recv()
            .map_err(|_| FenceError::invariant(format!("expected {total} results, got {}", summary.packages)))?;
        summary.record(&result);
        on_result(result);
    }
    Ok(summary)
}

#[cfg(feature = "parallel")]
fn submit(checker: Arc<Checker>, packages: &[String], workers: usize, tx: SyncSender<CheckResult>) -> FenceResult<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(|i| format!("depfence-check-{i}"))
        .build()
        .map_err(|e| FenceError::invariant(format!("unable to start worker pool: {e}")))?;

    for pkg in packages {
        let checker = Arc::clone(&checker);
        let tx = tx.clone();
        let pkg = pkg.clone();
        pool.spawn(move || checker.check_pkg(&pkg, &tx));
    }
    Ok(())
}

#[cfg(not(feature = "parallel"))]
fn submit(checker: Arc<Checker>, packages: &[String], _workers: usize, tx: SyncSender<CheckResult>) -> FenceResult<()> {
    for pkg in packages {
        checker.check_pkg(pkg, &tx);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deps::StaticResolver;

    const POLICY: &str = r#"{
        "components": { "web": "acme/web/*", "db": "acme/db/*", "util": "acme/util/*" },
        "constraints": [
            { "scope": "web", "forbid": ["db"] },
            { "scope": "web", "allow": ["web", "util"], "onBreak": "warn" }
        ]
    }"#;

    fn checker(resolver: StaticResolver) -> Checker {
        Checker::new(Arc::new(Policy::from_json_str(POLICY).unwrap()), Arc::new(resolver))
    }

    fn messages(ds: &[Diagnostic]) -> Vec<&str> {
        ds.iter().map(|d| d.message.as_str()).collect()
    }

    #[test]
    fn overlapping_rules_report_the_same_edge_twice() {
        let r = StaticResolver::new().package("acme/web/http", ["acme/db/pg", "acme/util/log"]);
        let result = checker(r).check("acme/web/http");
        assert_eq!(messages(&result.errs), vec!["acme/web/http depends on acme/db/pg"]);
        assert_eq!(messages(&result.warns), vec!["acme/web/http depends on acme/db/pg"]);
        assert_eq!(result.errs[0].constraint, Some(0));
        assert_eq!(result.warns[0].constraint, Some(1));
        assert_eq!(result.errs[0].dependency.as_deref(), Some("acme/db/pg"));
    }

    #[test]
    fn stdlib_dependencies_are_invisible() {
        let r = StaticResolver::new()
            .package("acme/web/http", ["fmt", "net/http"])
            .stdlib_package("fmt")
            .stdlib_package("net/http");
        let result = checker(r).check("acme/web/http");
        assert!(result.is_clean());
    }

    #[test]
    fn only_direct_dependencies_are_checked() {
        let r = StaticResolver::new()
            .package("acme/web/http", ["acme/util/log"])
            .package("acme/util/log", ["acme/db/pg"]);
        assert!(checker(r).check("acme/web/http").is_clean());
    }

    #[test]
    fn unconstrained_package_gets_one_warning() {
        let result = checker(StaticResolver::new()).check("acme/other");
        assert_eq!(messages(&result.warns), vec!["acme/other does not have constraints"]);
        assert!(result.errs.is_empty());
    }

    #[test]
    fn resolution_failure_becomes_an_error() {
        let r = StaticResolver::new().failing("acme/web/http", "no Go files");
        let result = checker(r).check("acme/web/http");
        assert_eq!(result.errs.len(), 1);
        assert!(result.errs[0]
            .message
            .starts_with("unable to get dependencies of acme/web/http: "));
        assert!(result.errs[0].message.contains("no Go files"));
        assert!(result.warns.is_empty());
    }

    #[test]
    fn check_pkg_publishes_once() {
        let r = StaticResolver::new().package("acme/web/http", ["acme/db/pg"]);
        let c = checker(r);
        let (tx, rx) = mpsc::sync_channel(1);
        c.check_pkg("acme/web/http", &tx);
        drop(tx);
        let results: Vec<CheckResult> = rx.iter().collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].package, "acme/web/http");
    }

    #[test]
    fn parallel_run_collects_every_result() {
        let mut r = StaticResolver::new();
        let mut pkgs = Vec::new();
        for i in 0..32 {
            let name = format!("acme/web/h{i}");
            r = r.package(&name, ["acme/db/pg"]);
            pkgs.push(name);
        }
        pkgs.push("acme/lonely".to_string());

        let mut seen = Vec::new();
        let summary = check_packages(Arc::new(checker(r)), &pkgs, 4, |res| seen.push(res.package)).unwrap();

        assert_eq!(summary.packages, 33);
        assert_eq!(summary.errors, 32);
        assert_eq!(summary.warnings, 33);
        assert!(!summary.is_success());
        seen.sort();
        let mut expected = pkgs.clone();
        expected.sort();
        assert_eq!(seen, expected);
    }

    #[test]
    fn empty_run_succeeds() {
        let summary = check_packages(Arc::new(checker(StaticResolver::new())), &[], 2, |_| {}).unwrap();
        assert_eq!(summary, CheckSummary::default());
        assert!(summary.is_success());
    }

    #[test]
    fn repeated_runs_are_identical() {
        let r = StaticResolver::new().package("acme/web/http", ["acme/db/pg", "acme/x/y", "acme/util/a"]);
        let c = checker(r);
        assert_eq!(c.check("acme/web/http"), c.check("acme/web/http"));
    }
}
