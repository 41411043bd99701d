//! Entity category filter
//!
//! Restricts a set of extracted relations to those that mention one of the
//! entity categories a user selected. Matching is plain substring search on
//! the subject and object; there is no entity linking behind it.

use biorex_core::RelationTriple;

/// Normalize a category label for matching
///
/// Drops one trailing lower-case `s` and lower-cases the rest, so
/// `"Genes"` becomes `"gene"`. This is a naive singularization: `"Tissues"`
/// turns into `"tissue"` as hoped, but `"Class"` becomes `"clas"` and an
/// upper-case trailing `S` is kept.
pub fn normalize_category(label: &str) -> String {
    label.strip_suffix('s').unwrap_or(label).to_lowercase()
}

/// Check a triple against already-normalized categories
///
/// The predicate is never inspected.
pub fn matches_any(triple: &RelationTriple, normalized: &[String]) -> bool {
    let subject = triple.subject.to_lowercase();
    let object = triple.object.to_lowercase();

    normalized
        .iter()
        .any(|category| subject.contains(category.as_str()) || object.contains(category.as_str()))
}

/// Keep the relations that involve any of the selected categories
///
/// An empty selection means "no filter" and returns every triple. Input
/// order is preserved and duplicates in the input stay duplicated; a triple
/// matching several categories is still emitted once.
pub fn filter_relations<C: AsRef<str>>(
    relations: &[RelationTriple],
    categories: &[C],
) -> Vec<RelationTriple> {
    if categories.is_empty() {
        return relations.to_vec();
    }

    let normalized: Vec<String> = categories
        .iter()
        .map(|c| normalize_category(c.as_ref()))
        .collect();

    relations
        .iter()
        .filter(|triple| matches_any(triple, &normalized))
        .cloned()
        .collect()
}
