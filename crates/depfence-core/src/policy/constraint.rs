//! Canonical constraints: the form the checker evaluates.

use std::fmt;

use serde::Serialize;

use crate::errors::{FenceError, FenceResult};
use crate::pattern::{any_matches, Pattern};
use crate::policy::document::RuleDocument;

/// What a constraint says about the dependencies of its subjects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintKind {
    /// Subjects may depend only on packages matching the dep patterns.
    Allow,
    /// Subjects must not depend on packages matching the dep patterns.
    Forbid,
}

impl ConstraintKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Forbid => "forbid",
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a broken constraint is reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warn,
    #[default]
    Error,
}

impl Severity {
    /// Parse an `onBreak` value (`"warn"` or `"error"`).
    pub fn parse(s: &str) -> FenceResult<Self> {
        match s {
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(FenceError::invalid_argument(format!(
                "unknown severity `{s}` (expected `warn` or `error`)"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully expanded rule. Component references are already replaced by
/// their include-patterns, so evaluation only needs pattern matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalConstraint {
    pub kind: ConstraintKind,
    pub subject_patterns: Vec<Pattern>,
    pub dep_patterns: Vec<Pattern>,
    pub on_break: Severity,
}

impl CanonicalConstraint {
    /// Build a constraint, rejecting empty pattern lists.
    pub fn new(
        kind: ConstraintKind,
        subject_patterns: Vec<Pattern>,
        dep_patterns: Vec<Pattern>,
        on_break: Severity,
    ) -> FenceResult<Self> {
        if subject_patterns.is_empty() {
            return Err(FenceError::invalid_argument(format!(
                "{kind} constraint has no subject patterns"
            )));
        }
        if dep_patterns.is_empty() {
            return Err(FenceError::invalid_argument(format!(
                "{kind} constraint has no dependency patterns"
            )));
        }
        Ok(Self {
            kind,
            subject_patterns,
            dep_patterns,
            on_break,
        })
    }

    /// Whether this constraint governs `pkg`.
    pub fn applies_to(&self, pkg: &str) -> bool {
        any_matches(&self.subject_patterns, pkg)
    }

    /// Whether `dep` is one of the targets named by this constraint.
    pub fn targets(&self, dep: &str) -> bool {
        any_matches(&self.dep_patterns, dep)
    }

    /// Whether depending on `dep` breaks this constraint.
    pub fn is_broken_by(&self, dep: &str) -> bool {
        match self.kind {
            ConstraintKind::Allow => !self.targets(dep),
            ConstraintKind::Forbid => self.targets(dep),
        }
    }

    /// Write this constraint back in source form. Pattern lists become
    /// raw pattern references, so expanding the result yields `self` again.
    ///
    /// `is_component` tells which words name a component; patterns whose
    /// text is such a word are respelled so they are not resolved as one.
    pub fn to_rule(&self, is_component: impl Fn(&str) -> bool) -> RuleDocument {
        let word = |p: &Pattern| p.unambiguous_text(&is_component);
        let scope = self.subject_patterns.iter().map(word).collect::<Vec<_>>().join(" ");
        let targets = self.dep_patterns.iter().map(word).collect::<Vec<_>>();

        let (allow, forbid) = match self.kind {
            ConstraintKind::Allow => (Some(targets), None),
            ConstraintKind::Forbid => (None, Some(targets)),
        };

        RuleDocument {
            scope,
            allow,
            forbid,
            on_break: Some(self.on_break.as_str().to_string()),
        }
    }
}

impl fmt::Display for CanonicalConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |ps: &[Pattern]| ps.iter().map(Pattern::as_str).collect::<Vec<_>>().join(" ");
        write!(
            f,
            "[{}] {} {} {}",
            self.on_break,
            join(&self.subject_patterns),
            self.kind,
            join(&self.dep_patterns)
        )
    }
}
