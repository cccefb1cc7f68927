//! Serialized (source) form of a policy file.
//!
//! ```json
//! {
//!   "components": { "web": "acme/web/*", "db": "acme/db/* acme/sql/*" },
//!   "constraints": [
//!     { "scope": "web", "forbid": ["db"], "onBreak": "error" }
//!   ]
//! }
//! ```
//!
//! The document is plain data. Validation and expansion happen when it is
//! turned into a [`crate::policy::Policy`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::FenceResult;

/// Top-level policy file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDocument {
    /// Component name to whitespace-separated include-patterns, in declared order.
    #[serde(default)]
    pub components: IndexMap<String, String>,

    #[serde(default)]
    pub constraints: Vec<RuleDocument>,
}

/// One declared rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDocument {
    /// Component name or pattern (whitespace-separated for several).
    pub scope: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forbid: Option<Vec<String>>,

    /// `"warn"` or `"error"`; absent means error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_break: Option<String>,
}

impl PolicyDocument {
    pub fn from_json_slice(bytes: &[u8]) -> FenceResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn to_json_pretty(&self) -> FenceResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
