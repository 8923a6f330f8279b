//! Label selector matching
//!
//! Supports the flat `key=value[,key=value]` form taken from configuration.
//! This is deliberately simpler than Kubernetes selector syntax: equality
//! only, evaluated in-process against whatever labels the object carries.

use std::collections::BTreeMap;

/// Evaluates `selector` against `labels`.
///
/// An empty selector matches unconditionally, including against an absent
/// label map. Empty clauses (stray commas) are skipped. A clause without `=`
/// rejects the whole selector. The value is everything after the first `=`,
/// so values containing `=` are legal. Whitespace around commas, keys, and
/// values is insignificant; matching is otherwise case-sensitive and exact.
pub fn matches_selector(labels: Option<&BTreeMap<String, String>>, selector: &str) -> bool {
    for clause in selector.split(',') {
        let clause = clause.trim();
        if clause.is_empty() {
            continue;
        }
        let Some((key, value)) = clause.split_once('=') else {
            return false;
        };
        let (key, value) = (key.trim_end(), value.trim_start());
        match labels.and_then(|l| l.get(key)) {
            Some(found) if found == value => {}
            _ => return false,
        }
    }
    true
}
