use anyhow::Result;

use depfence_core::deps::PackageEnumerator;

use super::go_list;

/// Lists packages with `go list <selector>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoListEnumerator;

impl PackageEnumerator for GoListEnumerator {
    fn enumerate(&self, selector: &str) -> Result<Vec<String>> {
        let stdout = go_list(&[selector])?;
        Ok(package_lines(&String::from_utf8_lossy(&stdout)))
    }
}

/// One package per line; blank lines are dropped.
fn package_lines(s: &str) -> Vec<String> {
    s.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_lines_and_drops_blanks() {
        let out = "example.com/m/a\nexample.com/m/b\n\nexample.com/m/c\n";
        assert_eq!(
            package_lines(out),
            vec!["example.com/m/a", "example.com/m/b", "example.com/m/c"]
        );
    }

    #[test]
    fn empty_output_lists_nothing() {
        assert!(package_lines("").is_empty());
        assert!(package_lines("\n").is_empty());
    }
}
