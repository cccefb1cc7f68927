//! Package dependency trees and the adapters that produce them.
//!
//! The core crate performs no I/O. Listing packages and resolving their
//! imports is delegated to [`PackageEnumerator`] and [`DependencyResolver`]
//! implementations supplied by the caller (the CLI ships `go list` based
//! ones). [`StaticResolver`] is an in-memory implementation for tests and
//! embedders that already hold an import graph.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use anyhow::Result;

use crate::errors::FenceError;

/// One package in a resolved dependency tree.
///
/// Subtrees are reference-counted so a resolver can share the subtree of a
/// package imported from several places.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkgNode {
    pub name: String,
    /// Part of the language standard library.
    pub stdlib: bool,
    /// Direct dependencies in resolver order.
    pub deps: Vec<Arc<PkgNode>>,
}

impl PkgNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stdlib: false,
            deps: Vec::new(),
        }
    }

    pub fn stdlib(name: impl Into<String>) -> Self {
        Self {
            stdlib: true,
            ..Self::new(name)
        }
    }

    pub fn with_dep(mut self, dep: PkgNode) -> Self {
        self.deps.push(Arc::new(dep));
        self
    }

    /// Number of nodes in the tree, counting shared subtrees once per reference.
    pub fn size(&self) -> usize {
        1 + self.deps.iter().map(|d| d.size()).sum::<usize>()
    }
}

/// Lists the packages selected by a selector such as `./...`.
pub trait PackageEnumerator {
    fn enumerate(&self, selector: &str) -> Result<Vec<String>>;
}

/// Resolves the dependency tree of one package.
///
/// `max_depth == 0` means unbounded; otherwise the returned tree has at most
/// `max_depth` levels below the root. Implementations are shared across
/// worker threads.
pub trait DependencyResolver: Send + Sync {
    fn resolve(&self, pkg: &str, max_depth: usize) -> Result<PkgNode>;
}

/// In-memory import graph.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    imports: BTreeMap<String, Vec<String>>,
    stdlib: BTreeMap<String, bool>,
    failures: HashMap<String, String>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `pkg` with its direct imports, in order.
    pub fn package<I, S>(mut self, pkg: &str, imports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.imports
            .insert(pkg.to_string(), imports.into_iter().map(Into::into).collect());
        self.stdlib.entry(pkg.to_string()).or_insert(false);
        self
    }

    /// Declare a standard-library package.
    pub fn stdlib_package(mut self, pkg: &str) -> Self {
        self.imports.entry(pkg.to_string()).or_default();
        self.stdlib.insert(pkg.to_string(), true);
        self
    }

    /// Make resolution of `pkg` fail with `cause`.
    pub fn failing(mut self, pkg: &str, cause: &str) -> Self {
        self.failures.insert(pkg.to_string(), cause.to_string());
        self
    }

    fn build(
        &self,
        pkg: &str,
        remaining: Option<usize>,
        stack: &mut Vec<String>,
        memo: &mut HashMap<(String, Option<usize>), Arc<PkgNode>>,
    ) -> Arc<PkgNode> {
        let key = (pkg.to_string(), remaining);
        if let Some(node) = memo.get(&key) {
            return Arc::clone(node);
        }

        let mut node = PkgNode {
            name: pkg.to_string(),
            stdlib: self.stdlib.get(pkg).copied().unwrap_or(false),
            deps: Vec::new(),
        };

        let expand = remaining.map_or(true, |r| r > 0) && !stack.iter().any(|p| p == pkg);
        if expand {
            stack.push(pkg.to_string());
            let next = remaining.map(|r| r - 1);
            for dep in self.imports.get(pkg).into_iter().flatten() {
                node.deps.push(self.build(dep, next, stack, memo));
            }
            stack.pop();
        }

        let node = Arc::new(node);
        memo.insert(key, Arc::clone(&node));
        node
    }
}

impl DependencyResolver for StaticResolver {
    fn resolve(&self, pkg: &str, max_depth: usize) -> Result<PkgNode> {
        if let Some(cause) = self.failures.get(pkg) {
            return Err(FenceError::resolve(cause.clone()).into());
        }
        if !self.imports.contains_key(pkg) {
            return Err(FenceError::resolve(format!("cannot find package \"{pkg}\"")).into());
        }

        let remaining = (max_depth > 0).then_some(max_depth);
        let mut memo = HashMap::new();
        let root = self.build(pkg, remaining, &mut Vec::new(), &mut memo);
        drop(memo);
        Ok(Arc::try_unwrap(root).unwrap_or_else(|shared| (*shared).clone()))
    }
}

impl PackageEnumerator for StaticResolver {
    /// `./...` and `...` select every non-stdlib package, `prefix/...` those
    /// under a prefix, anything else exactly one package.
    fn enumerate(&self, selector: &str) -> Result<Vec<String>> {
        let user = self.imports.keys().filter(|p| !self.stdlib.get(*p).copied().unwrap_or(false));
        let selected: Vec<String> = match selector.strip_suffix("...") {
            Some("" | "./") => user.cloned().collect(),
            Some(prefix) => {
                let base = prefix.trim_end_matches('/');
                user.filter(|p| *p == base || p.starts_with(prefix)).cloned().collect()
            }
            None => user.filter(|p| *p == selector).cloned().collect(),
        };
        Ok(selected)
    }
}
