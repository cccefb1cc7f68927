//! Component-level dependency graphs.
//!
//! Packages are projected onto the first component they belong to (or
//! `UNDEFINED`), edges inside a component are collapsed, and components in
//! the skip set are dropped together with everything reachable only through
//! them. The result is written as a strict DOT digraph:
//!
//! ```text
//! strict digraph deps {
//! "web" -> "db"
//! }
//! ```

use std::collections::{BTreeSet, HashSet};
use std::io::{self, Write};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::deps::{DependencyResolver, PkgNode};
use crate::policy::Policy;

/// Builds the deduplicated edge set of a component graph.
pub struct GraphBuilder<'a> {
    policy: &'a Policy,
    skip: &'a BTreeSet<String>,
    edges: BTreeSet<(String, String)>,
    /// Nodes of the tree being added whose subtree was already walked.
    walked: HashSet<*const PkgNode>,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(policy: &'a Policy, skip: &'a BTreeSet<String>) -> Self {
        Self {
            policy,
            skip,
            edges: BTreeSet::new(),
            walked: HashSet::new(),
        }
    }

    fn must_skip(&self, from: &str, to: &str) -> bool {
        from == to || self.skip.contains(from) || self.skip.contains(to)
    }

    /// Add every edge reachable from `root`.
    pub fn add_tree(&mut self, root: &PkgNode) {
        self.walked.clear();
        self.walk(root);
    }

    fn walk(&mut self, node: &PkgNode) {
        let policy = self.policy;
        let from = policy.label_for(&node.name);
        if self.skip.contains(from) {
            return;
        }

        for dep in &node.deps {
            let to = policy.label_for(&dep.name);
            if self.must_skip(from, to) {
                continue;
            }

            self.edges.insert((from.to_string(), to.to_string()));

            // Shared subtrees produce the same edges every time.
            if self.walked.insert(Arc::as_ptr(dep)) {
                self.walk(dep);
            }
        }
    }

    pub fn edges(&self) -> &BTreeSet<(String, String)> {
        &self.edges
    }

    pub fn write_dot<W: Write>(&self, out: W) -> io::Result<()> {
        write_dot(&self.edges, out)
    }

    pub fn to_dot(&self) -> String {
        let mut buf = Vec::new();
        // Writing to a Vec cannot fail.
        let _ = self.write_dot(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

/// Write `edges` as a strict DOT digraph, one edge per line.
pub fn write_dot<W: Write>(edges: &BTreeSet<(String, String)>, mut out: W) -> io::Result<()> {
    writeln!(out, "strict digraph deps {{")?;
    for (from, to) in edges {
        writeln!(out, "{} -> {}", quote(from), quote(to))?;
    }
    writeln!(out, "}}")?;
    out.flush()
}

fn quote(label: &str) -> String {
    format!("\"{}\"", label.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Counters reported after a graph run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphStats {
    pub packages: usize,
    pub unresolved: usize,
    pub edges: usize,
}

/// Resolve every package, build the component graph and write it as DOT.
///
/// Packages that cannot be resolved are logged and left out.
pub fn emit_graph<W: Write>(
    policy: &Policy,
    resolver: &dyn DependencyResolver,
    packages: &[String],
    skip: &BTreeSet<String>,
    max_depth: usize,
    out: W,
) -> io::Result<GraphStats> {
    let mut builder = GraphBuilder::new(policy, skip);
    let mut stats = GraphStats::default();

    for pkg in packages {
        stats.packages += 1;
        match resolver.resolve(pkg, max_depth) {
            Ok(root) => {
                debug!("adding dependency tree of {pkg} ({} nodes)", root.size());
                builder.add_tree(&root);
            }
            Err(e) => {
                warn!("unable to analyze package '{pkg}': {e:#}");
                stats.unresolved += 1;
            }
        }
    }

    stats.edges = builder.edges().len();
    builder.write_dot(out)?;
    Ok(stats)
}
