//! Dependency policies.
//!
//! A [`Policy`] is loaded once from its JSON source form
//! ([`PolicyDocument`]) and is read-only afterwards. Loading:
//! - compiles every component's include-patterns
//! - expands every rule into [`CanonicalConstraint`]s (see [`expand`])
//! - rejects anything that would produce an empty constraint
//!
//! All queries preserve declaration order.

use std::io::Read;

use indexmap::IndexMap;

use crate::errors::{FenceError, FenceResult};
use crate::pattern::{any_matches, Pattern};

pub mod constraint;
pub mod document;
pub mod expand;

pub use constraint::{CanonicalConstraint, ConstraintKind, Severity};
pub use document::{PolicyDocument, RuleDocument};
pub use expand::Expander;

/// Label used for packages that belong to no component.
pub const UNDEFINED_COMPONENT: &str = "UNDEFINED";

#[derive(Debug, Clone)]
pub struct Policy {
    components: IndexMap<String, Vec<Pattern>>,
    constraints: Vec<CanonicalConstraint>,
}

impl Policy {
    /// Validate and expand a parsed policy document.
    pub fn from_document(doc: &PolicyDocument) -> FenceResult<Self> {
        let mut components = IndexMap::with_capacity(doc.components.len());
        for (name, spec) in &doc.components {
            if name.trim().is_empty() {
                return Err(FenceError::invalid_argument("component with empty name"));
            }
            if name.contains('\\') {
                return Err(FenceError::invalid_argument(format!(
                    "component name `{name}` must not contain a backslash"
                )));
            }
            let patterns = spec
                .split_whitespace()
                .map(Pattern::compile)
                .collect::<FenceResult<Vec<_>>>()?;
            components.insert(name.clone(), patterns);
        }

        let constraints = Expander::new(&components).expand_all(&doc.constraints)?;

        Ok(Self {
            components,
            constraints,
        })
    }

    pub fn from_json_bytes(bytes: &[u8]) -> FenceResult<Self> {
        let doc = PolicyDocument::from_json_slice(bytes)
            .map_err(|e| FenceError::serialization(format!("failed to parse policy: {e}")))?;
        Self::from_document(&doc)
    }

    pub fn from_json_str(s: &str) -> FenceResult<Self> {
        Self::from_json_bytes(s.as_bytes())
    }

    pub fn from_reader<R: Read>(mut reader: R) -> FenceResult<Self> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Self::from_json_bytes(&buf)
    }

    /// Component names in declared order.
    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }

    pub fn component_patterns(&self, name: &str) -> Option<&[Pattern]> {
        self.components.get(name).map(Vec::as_slice)
    }

    pub fn constraints(&self) -> &[CanonicalConstraint] {
        &self.constraints
    }

    /// Names of every component whose patterns match `pkg`, in declared order.
    pub fn components_for_package(&self, pkg: &str) -> Vec<&str> {
        self.components
            .iter()
            .filter(|(_, patterns)| any_matches(patterns, pkg))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Graph label of `pkg`: its first component, or [`UNDEFINED_COMPONENT`].
    pub fn label_for(&self, pkg: &str) -> &str {
        self.components
            .iter()
            .find(|(_, patterns)| any_matches(patterns, pkg))
            .map(|(name, _)| name.as_str())
            .unwrap_or(UNDEFINED_COMPONENT)
    }

    /// Constraints whose subject patterns match `pkg`, in declared order.
    pub fn applicable_constraints(&self, pkg: &str) -> Vec<&CanonicalConstraint> {
        self.constraints.iter().filter(|c| c.applies_to(pkg)).collect()
    }

    /// Like [`Self::applicable_constraints`], paired with each constraint's index.
    pub fn applicable_constraint_indices(&self, pkg: &str) -> Vec<(usize, &CanonicalConstraint)> {
        self.constraints
            .iter()
            .enumerate()
            .filter(|(_, c)| c.applies_to(pkg))
            .collect()
    }

    /// Source form of this policy with every rule already expanded.
    ///
    /// Loading the returned document yields the same constraint list.
    pub fn to_canonical_document(&self) -> PolicyDocument {
        let components = self
            .components
            .iter()
            .map(|(name, patterns)| {
                let spec = patterns.iter().map(Pattern::as_str).collect::<Vec<_>>().join(" ");
                (name.clone(), spec)
            })
            .collect();

        PolicyDocument {
            components,
            constraints: self
                .constraints
                .iter()
                .map(|c| c.to_rule(|w| self.components.contains_key(w)))
                .collect(),
        }
    }

    pub fn to_canonical_json(&self) -> FenceResult<String> {
        self.to_canonical_document().to_json_pretty()
    }
}
