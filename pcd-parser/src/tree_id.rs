//! Resolution of the attribute that carries tree-instance ids.
//!
//! Segmentation tools store tree ids under different names. Field names are compared
//! after lowercasing and dropping `_` and `-`, so `treeID`, `tree_id`, `TreeID` and
//! `tree_ID` are the same field.

/// Candidate fields in lookup order.
pub const TREE_ID_FIELDS: [&str; 6] = [
    "treeID",
    "tree_id",
    "TreeID",
    "tree_ID",
    "user_data",
    "point_source_id",
];

pub fn normalize_field_name(name: &str) -> String {
    name.trim().to_lowercase().replace(['_', '-'], "")
}

/// Normalized candidates without duplicates, keeping lookup order.
pub fn normalized_candidates() -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();
    for field in TREE_ID_FIELDS {
        let normalized = normalize_field_name(field);
        if !candidates.contains(&normalized) {
            candidates.push(normalized);
        }
    }
    candidates
}

/// Returns the first candidate (or the forced field) accepted by `is_present`.
///
/// With a forced field, only that field is considered.
pub fn resolve_tree_id_field<F>(forced: Option<&str>, is_present: F) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    match forced {
        Some(field) => {
            let normalized = normalize_field_name(field);
            is_present(&normalized).then_some(normalized)
        }
        None => normalized_candidates()
            .into_iter()
            .find(|candidate| is_present(candidate)),
    }
}

/// Parses an integer id that may have been written as a float (`"3.0"`).
pub fn parse_tree_id(value: &str) -> Option<i64> {
    let value = value.trim();
    if value.is_empty() {
        return Some(0);
    }
    if let Ok(id) = value.parse::<i64>() {
        return Some(id);
    }
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && v.fract() == 0.0)
        .map(|v| v as i64)
}
