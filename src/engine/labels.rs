use std::collections::HashSet;

use crate::model::card::BoardLabel;

/// Board label ids for every name in `names` that exists on the board.
/// Matching is by exact name. Unknown names are dropped without error. Ids come
/// back in catalog order, without duplicates.
pub fn resolve_labels<'a>(
    names: impl IntoIterator<Item = &'a str>,
    catalog: &[BoardLabel],
) -> Vec<String> {
    let wanted: HashSet<&str> = names.into_iter().filter(|n| !n.is_empty()).collect();
    let mut ids: Vec<String> = Vec::new();
    for label in catalog {
        if wanted.contains(label.name.as_str()) && !ids.contains(&label.id) {
            ids.push(label.id.clone());
        }
    }
    ids
}
