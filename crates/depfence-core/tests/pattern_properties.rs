//! Property tests for pattern matching and policy expansion.

use depfence_core::pattern::Pattern;
use depfence_core::policy::Policy;
use proptest::prelude::*;

/// Pattern text made of literal chunks joined by stars.
fn chunks() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-c/]{0,3}", 1..5)
}

proptest! {
    #[test]
    fn substituting_every_star_matches(parts in chunks(), fills in prop::collection::vec("[a-d/*]{0,4}", 4)) {
        let pattern = Pattern::compile(&parts.join("*")).unwrap();
        let mut name = String::new();
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                name.push_str(&fills[i - 1]);
            }
            name.push_str(part);
        }
        prop_assert!(pattern.matches(&name), "{} should match {}", pattern, name);
    }

    #[test]
    fn star_free_patterns_are_equality(a in "[a-c/]{0,6}", b in "[a-c/]{0,6}") {
        let pattern = Pattern::compile(&a).unwrap();
        prop_assert_eq!(pattern.matches(&b), a == b);
    }

    #[test]
    fn matching_agrees_with_reference(parts in chunks(), name in "[a-c/]{0,8}") {
        let text = parts.join("*");
        let pattern = Pattern::compile(&text).unwrap();
        prop_assert_eq!(pattern.matches(&name), reference_match(text.as_bytes(), name.as_bytes()));
    }

    #[test]
    fn canonical_form_reloads_to_same_constraints(
        subject in "[a-c]{1,3}/\\*",
        targets in prop::collection::vec("[a-c]{1,3}(/\\*)?", 1..4),
        warn in any::<bool>(),
        forbid in any::<bool>(),
    ) {
        let kind = if forbid { "forbid" } else { "allow" };
        let severity = if warn { "warn" } else { "error" };
        let mut rule = serde_json::Map::new();
        rule.insert("scope".to_string(), "comp".into());
        rule.insert(kind.to_string(), serde_json::json!(targets));
        rule.insert("onBreak".to_string(), severity.into());
        let json = serde_json::json!({
            "components": { "comp": subject },
            "constraints": [ rule ]
        });
        let policy = Policy::from_json_str(&json.to_string()).unwrap();
        let reloaded = Policy::from_json_str(&policy.to_canonical_json().unwrap()).unwrap();
        prop_assert_eq!(policy.constraints(), reloaded.constraints());
    }
}

/// Straightforward recursive glob over bytes, `*` only.
fn reference_match(p: &[u8], s: &[u8]) -> bool {
    match p.split_first() {
        None => s.is_empty(),
        Some((b'*', rest)) => (0..=s.len()).any(|i| reference_match(rest, &s[i..])),
        Some((c, rest)) => s.first() == Some(c) && reference_match(rest, &s[1..]),
    }
}
