use std::collections::{BTreeMap, HashMap};

/// Deterministic cache key for `(endpoint, params)`.
///
/// Params are sorted by name before concatenation; insertion order of the
/// caller's map never affects the key.
pub fn derive_key(endpoint: &str, params: &HashMap<String, String>) -> String {
    let sorted: BTreeMap<&str, &str> = params
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();

    let mut key = String::from(endpoint);
    for (name, value) in sorted {
        key.push('|');
        key.push_str(name);
        key.push('=');
        key.push_str(value);
    }
    key
}

/// Sorted-key JSON rendering of the param map, stored alongside the entry
/// for display and delete-by-key round trips.
pub fn params_json(params: &HashMap<String, String>) -> String {
    let sorted: BTreeMap<&str, &str> = params
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    serde_json::to_string(&sorted).unwrap_or_else(|_| "{}".to_string())
}
