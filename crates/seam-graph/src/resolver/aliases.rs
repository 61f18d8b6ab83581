//! Alias and fallback substitution.
//!
//! Both tables are searched the same way: an exact match anywhere in the
//! table beats a prefix match, and a prefix only matches on a path-segment
//! boundary (`alias/`), so `@` never captures `@scope/pkg`.

use indexmap::IndexMap;

/// Substitute the first matching alias into `specifier`.
///
/// Returns `None` when no alias applies.
pub fn substitute_alias(specifier: &str, aliases: &IndexMap<String, String>) -> Option<String> {
    let (alias, target) = find_entry(specifier, aliases)?;
    Some(substitute(specifier, alias, target))
}

/// Find the table entry that applies to `specifier`.
pub fn find_entry<'a, V>(
    specifier: &str,
    table: &'a IndexMap<String, V>,
) -> Option<(&'a str, &'a V)> {
    if let Some((key, value)) = table.get_key_value(specifier) {
        return Some((key.as_str(), value));
    }
    table
        .iter()
        .find(|(key, _)| matches_prefix(specifier, key))
        .map(|(key, value)| (key.as_str(), value))
}

/// Replace the matched `prefix` of `specifier` with `target`.
pub fn substitute(specifier: &str, prefix: &str, target: &str) -> String {
    let prefix = if specifier == prefix {
        prefix
    } else {
        prefix.trim_end_matches('/')
    };
    let rest = &specifier[prefix.len()..];
    if rest.is_empty() {
        return target.to_string();
    }
    let target = target.trim_end_matches('/');
    format!("{target}{rest}")
}

fn matches_prefix(specifier: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return false;
    }
    specifier
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.starts_with('/'))
}
