//! DNF property filters: OR-of-AND comparator lists, their combination,
//! and their rendering into the store's filter syntax.
//!
//! An empty filter means "no constraint" and renders to `None`, which is
//! distinct from `[[Has(pred)]]` (an existence constraint). Keeping the
//! two apart avoids spurious cascade failures on optional predicates.

use indexmap::IndexMap;

use crate::cmp::Cmp;

/// A per-property predicate in disjunctive normal form: the outer list is
/// OR of clauses, each inner list is AND of comparators.
pub type PropertyFilter = Vec<Vec<Cmp>>;

/// ANDs two DNF filters by distributing clauses (cross product).
///
/// An empty operand acts as the identity, so freshly built filters can be
/// folded in without special cases.
pub fn and_combine(left: PropertyFilter, right: PropertyFilter) -> PropertyFilter {
    if left.is_empty() {
        return right;
    }
    if right.is_empty() {
        return left;
    }
    let mut out = Vec::with_capacity(left.len() * right.len());
    for l in &left {
        for r in &right {
            let mut clause = l.clone();
            clause.extend(r.iter().cloned());
            out.push(clause);
        }
    }
    out
}

/// Renders a DNF filter to `(clause) OR (clause) ...`, eliding `Has`
/// comparators in any AND clause that carries a stricter test on the same
/// predicate. Returns `None` for an empty filter.
pub fn render_filter(filter: &PropertyFilter) -> Option<String> {
    if filter.is_empty() {
        return None;
    }
    let clauses: Vec<String> = filter
        .iter()
        .map(|clause| {
            let strict: Vec<&str> = clause
                .iter()
                .filter(|c| !c.is_has())
                .map(|c| c.pred())
                .collect();
            let parts: Vec<String> = clause
                .iter()
                .filter(|c| !(c.is_has() && strict.contains(&c.pred())))
                .map(Cmp::render)
                .collect();
            parts.join(" AND ")
        })
        .collect();
    if clauses.len() == 1 {
        Some(clauses.into_iter().next().unwrap_or_default())
    } else {
        Some(format!("({})", clauses.join(") OR (")))
    }
}

/// Renders a whole node's filter map: the AND over all its property
/// filters. Empty per-property filters contribute nothing; an entirely
/// unconstrained node renders to `None`.
pub fn render_node_filter(filters: &IndexMap<String, PropertyFilter>) -> Option<String> {
    let parts: Vec<String> = filters
        .values()
        .filter_map(render_filter)
        .collect();
    match parts.len() {
        0 => None,
        1 => Some(parts.into_iter().next().unwrap_or_default()),
        _ => Some(
            parts
                .into_iter()
                .map(|p| format!("({p})"))
                .collect::<Vec<_>>()
                .join(" AND "),
        ),
    }
}
