//! Track selection for a single source during a sync run.

use std::collections::HashSet;

/// Pick up to `cap` track ids from `source` that are not in `existing`.
///
/// Walks `source` in listing order and stops as soon as the cap is reached.
/// An id repeated inside `source` is taken at most once.
pub fn select_new_tracks<S>(source: &[String], existing: &HashSet<String, S>, cap: usize) -> Vec<String>
where
    S: std::hash::BuildHasher,
{
    let mut picked: Vec<String> = Vec::with_capacity(cap.min(source.len()));
    if cap == 0 {
        return picked;
    }
    let mut seen: HashSet<&str> = HashSet::new();
    for id in source {
        if existing.contains(id) || !seen.insert(id.as_str()) {
            continue;
        }
        picked.push(id.clone());
        if picked.len() == cap {
            break;
        }
    }
    picked
}
