// ABOUTME: Extracts values from the deploy tool's stdout.
// ABOUTME: The only place that knows the textual shape of deploy output.

use crate::types::DistributionId;

/// Find the distribution ID printed under `key`.
///
/// Accepts `key: value`, `key = value` and `"key": "value",` shapes, with the
/// key optionally indented or prefixed by a resource path. The last match
/// wins since deploy tools print outputs at the end.
pub fn extract_distribution_id(stdout: &str, key: &str) -> Option<DistributionId> {
    stdout
        .lines()
        .filter_map(|line| value_for_key(line, key))
        .filter(|value| is_distribution_id(value))
        .last()
        .map(DistributionId::new)
}

fn value_for_key<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let line = line.trim();
    let (left, right) = line.split_once([':', '='])?;
    let left = left.trim().trim_matches('"');
    let matches = left == key || left.ends_with(&format!(".{key}"));
    if !matches {
        return None;
    }
    let value = right
        .trim()
        .trim_end_matches(',')
        .trim()
        .trim_matches(|c| c == '"' || c == '\'');
    (!value.is_empty()).then_some(value)
}

fn is_distribution_id(value: &str) -> bool {
    value.len() >= 8
        && value
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}
