//! Dependency trees from `go list -e -json -deps`.
//!
//! `go list` prints one JSON object per package. The listing is indexed by
//! import path and the tree is built from it, sharing the subtree of a package
//! for each remaining depth. The root additionally depends on its test and
//! external test imports, which `-deps` does not list; those are fetched with
//! one more `go list` call.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use anyhow::Result;
use serde::Deserialize;
use tracing::debug;

use depfence_core::deps::{DependencyResolver, PkgNode};

use super::{go_list, GoError};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GoPackage {
    import_path: String,
    #[serde(default)]
    standard: bool,
    #[serde(default)]
    imports: Vec<String>,
    #[serde(default)]
    test_imports: Vec<String>,
    #[serde(default, rename = "XTestImports")]
    x_test_imports: Vec<String>,
    #[serde(default)]
    error: Option<GoPackageError>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct GoPackageError {
    #[serde(rename = "Err", default)]
    err: String,
}

type Listing = HashMap<String, GoPackage>;

/// Resolves dependency trees by running `go list` in the current directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoListResolver;

impl DependencyResolver for GoListResolver {
    fn resolve(&self, pkg: &str, max_depth: usize) -> Result<PkgNode> {
        // Direct dependencies only need the packages themselves, not their closure.
        let with_deps = max_depth != 1;

        let mut listing = parse_listing(&go_list(&list_args(with_deps, &[pkg]))?)?;
        let missing = missing_imports(&listing, pkg);
        if !missing.is_empty() {
            debug!("fetching {} package(s) missing from the listing of {pkg}", missing.len());
            let names: Vec<&str> = missing.iter().map(String::as_str).collect();
            listing.extend(parse_listing(&go_list(&list_args(with_deps, &names))?)?);
        }

        Ok(build_tree(&listing, pkg, max_depth)?)
    }
}

fn list_args<'a>(with_deps: bool, pkgs: &[&'a str]) -> Vec<&'a str> {
    let mut args = vec!["-e", "-json"];
    if with_deps {
        args.push("-deps");
    }
    args.extend_from_slice(pkgs);
    args
}

fn parse_listing(bytes: &[u8]) -> Result<Listing, GoError> {
    let mut listing = Listing::new();
    for pkg in serde_json::Deserializer::from_slice(bytes).into_iter::<GoPackage>() {
        let pkg = pkg?;
        listing.insert(pkg.import_path.clone(), pkg);
    }
    Ok(listing)
}

/// Direct dependencies of a root package: imports, then test and external
/// test imports, without duplicates or the package itself.
fn root_imports(pkg: &GoPackage) -> Vec<&str> {
    let mut seen = HashSet::new();
    pkg.imports
        .iter()
        .chain(&pkg.test_imports)
        .chain(&pkg.x_test_imports)
        .map(String::as_str)
        .filter(|d| *d != pkg.import_path && seen.insert(*d))
        .collect()
}

/// Packages referenced from the listing but absent from it.
fn missing_imports(listing: &Listing, root: &str) -> BTreeSet<String> {
    let referenced = listing.values().flat_map(|p| p.imports.iter().map(String::as_str));
    let from_root = listing.get(root).map(root_imports).unwrap_or_default();

    referenced
        .chain(from_root)
        .filter(|name| !listing.contains_key(*name))
        .map(str::to_string)
        .collect()
}

fn build_tree(listing: &Listing, root: &str, max_depth: usize) -> Result<PkgNode, GoError> {
    let pkg = listing.get(root).ok_or_else(|| GoError::Missing(root.to_string()))?;
    if let Some(e) = &pkg.error {
        return Err(GoError::Package {
            pkg: root.to_string(),
            message: e.err.trim().to_string(),
        });
    }

    let remaining = if max_depth == 0 { None } else { Some(max_depth - 1) };
    let mut builder = TreeBuilder::new(listing);
    builder.visiting.insert(root.to_string());
    let deps = root_imports(pkg)
        .into_iter()
        .map(|d| builder.node(d, remaining))
        .collect();

    Ok(PkgNode {
        name: root.to_string(),
        stdlib: pkg.standard,
        deps,
    })
}

struct TreeBuilder<'a> {
    listing: &'a Listing,
    /// Keyed by package and levels left below it (`None` = unbounded).
    memo: HashMap<(String, Option<usize>), Arc<PkgNode>>,
    visiting: HashSet<String>,
}

impl<'a> TreeBuilder<'a> {
    fn new(listing: &'a Listing) -> Self {
        Self {
            listing,
            memo: HashMap::new(),
            visiting: HashSet::new(),
        }
    }

    fn node(&mut self, name: &str, remaining: Option<usize>) -> Arc<PkgNode> {
        let key = (name.to_string(), remaining);
        if let Some(n) = self.memo.get(&key) {
            return Arc::clone(n);
        }

        let listing = self.listing;
        let pkg = listing.get(name);
        let mut node = PkgNode {
            name: name.to_string(),
            stdlib: pkg.is_some_and(|p| p.standard),
            deps: Vec::new(),
        };

        let below = match remaining {
            None => Some(None),
            Some(0) => None,
            Some(n) => Some(Some(n - 1)),
        };
        if let (Some(pkg), Some(below)) = (pkg, below) {
            // Go rejects import cycles; a cycle here means a malformed listing.
            if self.visiting.insert(name.to_string()) {
                node.deps = pkg.imports.iter().map(|d| self.node(d, below)).collect();
                self.visiting.remove(name);
            }
        }

        let node = Arc::new(node);
        self.memo.insert(key, Arc::clone(&node));
        node
    }
}
