use super::{ResultMap, TaskKey};

/// Entry with the largest coefficient, by a single linear scan.
///
/// Ties go to the first key in iteration order. `NaN` never wins; `None` when
/// no entry has a comparable value.
pub fn best_pair(results: &ResultMap) -> Option<(&TaskKey, f64)> {
    let mut best: Option<(&TaskKey, f64)> = None;
    for (key, &value) in results {
        if value.is_nan() {
            continue;
        }
        match best {
            Some((_, current)) if value <= current => {}
            _ => best = Some((key, value)),
        }
    }
    best
}

/// Top `n` entries by coefficient, highest first. `NaN` entries are left out;
/// ties keep key order.
pub fn ranked(results: &ResultMap, n: usize) -> Vec<(&TaskKey, f64)> {
    let mut entries: Vec<(&TaskKey, f64)> = results
        .iter()
        .filter(|(_, v)| !v.is_nan())
        .map(|(k, &v)| (k, v))
        .collect();
    // Stable sort: equal values stay in key order.
    entries.sort_by(|a, b| b.1.total_cmp(&a.1));
    entries.truncate(n);
    entries
}
