//! depfence-core
//!
//! Core primitives for depfence:
//! - Anchored `*` patterns over package names
//! - Dependency policies: components, rules and their canonical constraints
//! - Resolver and enumerator interfaces with an in-memory implementation
//! - Parallel constraint checking with severity bucketing
//! - Component-level DOT graphs

pub mod check;
pub mod config;
pub mod deps;
pub mod errors;
pub mod graph;
pub mod pattern;
pub mod policy;

pub use crate::errors::{FenceError, FenceResult};

/// Convenience re-exports.
pub mod prelude {
    pub use crate::check::{check_packages, CheckResult, CheckSummary, Checker, Diagnostic};
    pub use crate::config::{parse_skip_list, validate_config, RunConfig};
    pub use crate::deps::{DependencyResolver, PackageEnumerator, PkgNode, StaticResolver};
    pub use crate::graph::{emit_graph, GraphBuilder, GraphStats};
    pub use crate::pattern::Pattern;
    pub use crate::policy::{
        CanonicalConstraint, ConstraintKind, Policy, PolicyDocument, RuleDocument, Severity, UNDEFINED_COMPONENT,
    };
    pub use crate::{FenceError, FenceResult};
}
