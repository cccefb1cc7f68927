//! Expansion of source rules into canonical constraints.
//!
//! A reference is split on whitespace. Each word names a component (exact
//! name lookup) or, failing that, is compiled as a raw pattern. Component
//! words are replaced by the component's include-patterns.

use indexmap::IndexMap;

use crate::errors::{FenceError, FenceResult};
use crate::pattern::Pattern;
use crate::policy::constraint::{CanonicalConstraint, ConstraintKind, Severity};
use crate::policy::document::RuleDocument;

pub struct Expander<'a> {
    components: &'a IndexMap<String, Vec<Pattern>>,
}

impl<'a> Expander<'a> {
    pub fn new(components: &'a IndexMap<String, Vec<Pattern>>) -> Self {
        Self { components }
    }

    /// Resolve one reference, appending patterns not already in `out`.
    pub fn resolve_ref(&self, reference: &str, out: &mut Vec<Pattern>) -> FenceResult<()> {
        let mut words = reference.split_whitespace().peekable();
        if words.peek().is_none() {
            return Err(FenceError::invalid_argument("empty reference"));
        }

        for word in words {
            match self.components.get(word) {
                Some(patterns) => {
                    for p in patterns {
                        push_unique(out, p.clone());
                    }
                }
                None => push_unique(out, Pattern::compile(word)?),
            }
        }
        Ok(())
    }

    fn resolve_refs(&self, refs: &[String]) -> FenceResult<Vec<Pattern>> {
        let mut out = Vec::new();
        for r in refs {
            self.resolve_ref(r, &mut out)?;
        }
        Ok(out)
    }

    /// Expand one rule into its constraints: Allow first, then Forbid.
    pub fn expand_rule(&self, rule: &RuleDocument) -> FenceResult<Vec<CanonicalConstraint>> {
        if rule.scope.trim().is_empty() {
            return Err(FenceError::invalid_argument("constraint with empty scope"));
        }
        if rule.allow.is_none() && rule.forbid.is_none() {
            return Err(FenceError::invalid_argument(format!(
                "constraint on `{}` declares neither allow nor forbid",
                rule.scope
            )));
        }

        let on_break = match rule.on_break.as_deref() {
            Some(s) => Severity::parse(s)?,
            None => Severity::default(),
        };

        let mut subjects = Vec::new();
        self.resolve_ref(&rule.scope, &mut subjects)?;

        let mut out = Vec::with_capacity(2);
        for (kind, refs) in [
            (ConstraintKind::Allow, &rule.allow),
            (ConstraintKind::Forbid, &rule.forbid),
        ] {
            let Some(refs) = refs else { continue };
            let deps = self.resolve_refs(refs)?;
            let constraint = CanonicalConstraint::new(kind, subjects.clone(), deps, on_break)
                .map_err(|e| FenceError::invalid_argument(format!("constraint on `{}`: {e}", rule.scope)))?;
            out.push(constraint);
        }
        Ok(out)
    }

    /// Expand every rule in declared order.
    pub fn expand_all(&self, rules: &[RuleDocument]) -> FenceResult<Vec<CanonicalConstraint>> {
        let mut out = Vec::new();
        for rule in rules {
            out.extend(self.expand_rule(rule)?);
        }
        Ok(out)
    }
}

fn push_unique(out: &mut Vec<Pattern>, p: Pattern) {
    if !out.contains(&p) {
        out.push(p);
    }
}
