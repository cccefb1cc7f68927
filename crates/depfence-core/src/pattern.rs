//! Package-name patterns.
//!
//! A pattern is an anchored glob whose only metacharacter is `*`, matching
//! any run of characters (including none). Everything else is literal,
//! including `?`, `[`, `]` and `/`. A backslash escapes the next character so
//! `\*` matches a literal star.
//!
//! Matching splits the pattern on unescaped stars: the first literal must be a
//! prefix of the name, the last literal a suffix, and the literals in between
//! must occur in order in the remaining middle.
//!
//! Two patterns are equal when they compile to the same literals, so `b` and
//! `\b`, or `a*b` and `a**b`, are the same pattern.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{FenceError, FenceResult};

/// A compiled package pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    text: String,
    /// Literal runs between stars. A pattern without stars has exactly one.
    literals: Vec<String>,
}

impl Pattern {
    /// Compile a textual pattern.
    pub fn compile(text: &str) -> FenceResult<Self> {
        let mut literals = Vec::new();
        let mut current = String::new();
        let mut chars = text.chars();

        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some(escaped) => current.push(escaped),
                    None => return Err(FenceError::pattern(text, "unmatched escape")),
                },
                '*' => literals.push(std::mem::take(&mut current)),
                other => current.push(other),
            }
        }
        literals.push(current);

        // An empty literal between two stars matches at any position.
        if literals.len() > 2 {
            let last = literals.len() - 1;
            let mut i = 0;
            literals.retain(|lit| {
                let keep = i == 0 || i == last || !lit.is_empty();
                i += 1;
                keep
            });
        }

        Ok(Self {
            text: text.to_string(),
            literals,
        })
    }

    /// Whether the whole `name` matches this pattern.
    pub fn matches(&self, name: &str) -> bool {
        let (first, rest) = match self.literals.split_first() {
            Some(split) => split,
            None => return name.is_empty(),
        };

        let (last, middles) = match rest.split_last() {
            Some(split) => split,
            None => return name == first,
        };

        if name.len() < first.len() + last.len() {
            return false;
        }
        if !name.starts_with(first.as_str()) || !name.ends_with(last.as_str()) {
            return false;
        }

        let mut remaining = &name[first.len()..name.len() - last.len()];
        for lit in middles {
            match remaining.find(lit.as_str()) {
                Some(pos) => remaining = &remaining[pos + lit.len()..],
                None => return false,
            }
        }
        true
    }

    /// The original pattern text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// True when the pattern contains at least one wildcard.
    pub fn is_wildcard(&self) -> bool {
        self.literals.len() > 1
    }

    /// A text that compiles to this pattern and for which `taken` is false.
    ///
    /// When the own text is taken, the first literal character is written
    /// escaped, so the result contains a backslash; `taken` must accept such
    /// texts (component names never contain one). A pattern made only of
    /// stars gets more stars instead.
    pub fn unambiguous_text(&self, taken: impl Fn(&str) -> bool) -> String {
        if !taken(&self.text) {
            return self.text.clone();
        }

        if self.is_wildcard() && self.literals.iter().all(String::is_empty) {
            let mut text = String::from("*");
            while taken(&text) {
                text.push('*');
            }
            return text;
        }

        let mut out = String::with_capacity(self.text.len() + 1);
        let mut escape_next = true;
        for (i, lit) in self.literals.iter().enumerate() {
            if i > 0 {
                out.push('*');
            }
            for c in lit.chars() {
                if escape_next || c == '*' || c == '\\' {
                    out.push('\\');
                    escape_next = false;
                }
                out.push(c);
            }
        }
        out
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.literals == other.literals
    }
}

impl Eq for Pattern {}

impl Hash for Pattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.literals.hash(state);
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for Pattern {
    type Err = FenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::compile(&text).map_err(serde::de::Error::custom)
    }
}

/// True when any of `patterns` matches `name`.
pub fn any_matches(patterns: &[Pattern], name: &str) -> bool {
    patterns.iter().any(|p| p.matches(name))
}
