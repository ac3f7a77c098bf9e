//! Parent links of the category tree and the cycle check applied before a
//! batch of reassignments is saved.
//!
//! Edits are checked against the post-edit graph as a whole: every proposed
//! parent is applied at once, so swaps such as `A -> B` plus `B -> None`
//! are accepted even though applying them one by one would not be.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Arena of categories keyed by id, each holding its parent id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryForest {
    parents: HashMap<Uuid, Option<Uuid>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// The category was made its own parent
    SelfParent,
    /// The category lies on a longer parent cycle
    Cycle,
    /// The proposed parent does not exist
    UnknownParent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
pub struct HierarchyViolation {
    pub category_id: Uuid,
    pub kind: ViolationKind,
}

impl ViolationKind {
    pub fn message(&self) -> &'static str {
        match self {
            ViolationKind::SelfParent => "A category cannot be its own parent.",
            ViolationKind::Cycle => "This parent would create a cycle in the category tree.",
            ViolationKind::UnknownParent => "Select a valid parent category.",
        }
    }
}

impl CategoryForest {
    pub fn from_links(links: impl IntoIterator<Item = (Uuid, Option<Uuid>)>) -> Self {
        Self {
            parents: links.into_iter().collect(),
        }
    }

    fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.parents.contains_key(&id)
    }

    pub fn parent(&self, id: Uuid) -> Option<Uuid> {
        self.parents.get(&id).copied().flatten()
    }

    /// The forest after applying `proposed` and removing `deleted`.
    ///
    /// Proposals for unknown or deleted categories are ignored; any parent
    /// link pointing at a deleted category becomes `None`.
    pub fn overlay(
        &self,
        proposed: &HashMap<Uuid, Option<Uuid>>,
        deleted: &HashSet<Uuid>,
    ) -> CategoryForest {
        let parents = self
            .parents
            .iter()
            .filter(|(id, _)| !deleted.contains(id))
            .map(|(&id, &parent)| {
                let parent = proposed.get(&id).copied().unwrap_or(parent);
                (id, parent.filter(|p| !deleted.contains(p)))
            })
            .collect();

        CategoryForest { parents }
    }

    /// Parent chain of `id`, nearest first.
    ///
    /// The walk takes at most `len()` steps and stops at the first repeated
    /// id, so it terminates on cyclic input.
    pub fn ancestors(&self, id: Uuid) -> Vec<Uuid> {
        let mut chain = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut current = self.parent(id);

        for _ in 0..self.len() {
            let Some(next) = current else { break };
            chain.push(next);
            if !seen.insert(next) {
                break;
            }
            current = self.parent(next);
        }

        chain
    }

    pub fn is_on_cycle(&self, id: Uuid) -> bool {
        self.ancestors(id).contains(&id)
    }

    /// Every id lying on a cycle, sorted.
    pub fn find_cycles(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self
            .parents
            .keys()
            .copied()
            .filter(|&id| self.is_on_cycle(id))
            .collect();
        ids.sort();
        ids
    }
}

/// Check a batch of parent reassignments against the existing tree.
///
/// Returns the post-edit forest, or every violation found. Violations are
/// sorted by category id and each category appears at most once.
pub fn validate_reassignments(
    existing: &CategoryForest,
    proposed: &HashMap<Uuid, Option<Uuid>>,
    deleted: &HashSet<Uuid>,
) -> Result<CategoryForest, Vec<HierarchyViolation>> {
    let mut violations: HashMap<Uuid, ViolationKind> = HashMap::new();

    for (&id, &parent) in proposed {
        if deleted.contains(&id) || !existing.contains(id) {
            continue;
        }
        match parent {
            Some(p) if p == id => {
                violations.insert(id, ViolationKind::SelfParent);
            }
            Some(p) if !existing.contains(p) => {
                violations.insert(id, ViolationKind::UnknownParent);
            }
            _ => {}
        }
    }

    let candidate = existing.overlay(proposed, deleted);

    for id in candidate.find_cycles() {
        violations.entry(id).or_insert(ViolationKind::Cycle);
    }

    if violations.is_empty() {
        return Ok(candidate);
    }

    let mut violations: Vec<HierarchyViolation> = violations
        .into_iter()
        .map(|(category_id, kind)| HierarchyViolation { category_id, kind })
        .collect();
    violations.sort_by_key(|v| v.category_id);
    Err(violations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn id(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    /// 1 <- 2 <- 3, 4 standalone
    fn sample() -> CategoryForest {
        CategoryForest::from_links([
            (id(1), None),
            (id(2), Some(id(1))),
            (id(3), Some(id(2))),
            (id(4), None),
        ])
    }

    fn proposed(pairs: &[(u128, Option<u128>)]) -> HashMap<Uuid, Option<Uuid>> {
        pairs
            .iter()
            .map(|&(c, p)| (id(c), p.map(id)))
            .collect()
    }

    #[test]
    fn test_ancestors_nearest_first() {
        assert_eq!(sample().ancestors(id(3)), vec![id(2), id(1)]);
        assert!(sample().ancestors(id(4)).is_empty());
    }

    #[test]
    fn test_ancestors_terminate_on_cycle() {
        let forest = CategoryForest::from_links([(id(1), Some(id(2))), (id(2), Some(id(1)))]);
        assert_eq!(forest.ancestors(id(1)), vec![id(2), id(1)]);
        assert_eq!(forest.find_cycles(), vec![id(1), id(2)]);
    }

    #[test]
    fn test_self_parent_rejected() {
        let err = validate_reassignments(&sample(), &proposed(&[(4, Some(4))]), &HashSet::new())
            .unwrap_err();

        assert_eq!(
            err,
            vec![HierarchyViolation {
                category_id: id(4),
                kind: ViolationKind::SelfParent
            }]
        );
    }

    #[test]
    fn test_cycle_across_rows_rejected() {
        // 1 -> 3 closes 1 <- 2 <- 3
        let err = validate_reassignments(&sample(), &proposed(&[(1, Some(3))]), &HashSet::new())
            .unwrap_err();

        let ids: Vec<Uuid> = err.iter().map(|v| v.category_id).collect();
        assert_eq!(ids, vec![id(1), id(2), id(3)]);
        assert!(err.iter().all(|v| v.kind == ViolationKind::Cycle));
    }

    #[test]
    fn test_simultaneous_swap_accepted() {
        // 2 becomes a root while 1 moves under 2
        let result = validate_reassignments(
            &sample(),
            &proposed(&[(1, Some(2)), (2, None)]),
            &HashSet::new(),
        )
        .unwrap();

        assert_eq!(result.parent(id(1)), Some(id(2)));
        assert_eq!(result.parent(id(2)), None);
        assert_eq!(result.parent(id(3)), Some(id(2)));
    }

    #[test]
    fn test_unknown_parent_rejected() {
        let err = validate_reassignments(&sample(), &proposed(&[(4, Some(99))]), &HashSet::new())
            .unwrap_err();
        assert_eq!(err[0].kind, ViolationKind::UnknownParent);
    }

    #[test]
    fn test_deleting_parent_orphans_children() {
        let deleted = HashSet::from([id(2)]);
        let result = validate_reassignments(&sample(), &HashMap::new(), &deleted).unwrap();

        assert!(!result.contains(id(2)));
        assert_eq!(result.parent(id(3)), None);
    }

    #[test]
    fn test_deleting_breaks_would_be_cycle() {
        // 1 -> 3 would cycle through 2, but 2 is deleted in the same batch
        let deleted = HashSet::from([id(2)]);
        let result =
            validate_reassignments(&sample(), &proposed(&[(1, Some(3))]), &deleted).unwrap();

        assert_eq!(result.parent(id(1)), Some(id(3)));
        assert_eq!(result.parent(id(3)), None);
    }

    /// An acyclic forest over `n` ids: position `p` in `order` may only pick a
    /// parent from earlier positions.
    fn acyclic(n: usize) -> impl Strategy<Value = Vec<(u128, Option<u128>)>> {
        (
            Just((1..=n as u128).collect::<Vec<_>>()).prop_shuffle(),
            prop::collection::vec(any::<usize>(), n),
        )
            .prop_map(|(order, choices)| {
                order
                    .iter()
                    .enumerate()
                    .map(|(pos, &node)| {
                        let pick = choices[pos] % (pos + 1);
                        let parent = (pick < pos).then(|| order[pick]);
                        (node, parent)
                    })
                    .collect()
            })
    }

    fn forest_of(links: &[(u128, Option<u128>)]) -> CategoryForest {
        CategoryForest::from_links(links.iter().map(|&(c, p)| (id(c), p.map(id))))
    }

    proptest! {
        #[test]
        fn prop_acyclic_batches_apply_exactly(
            (before, after) in (2usize..12).prop_flat_map(|n| (acyclic(n), acyclic(n)))
        ) {
            let existing = forest_of(&before);
            let batch = proposed(&after);

            let result = validate_reassignments(&existing, &batch, &HashSet::new());

            prop_assert_eq!(result, Ok(forest_of(&after)));
        }

        #[test]
        fn prop_self_parent_always_rejected(
            (links, pick) in (2usize..12).prop_flat_map(|n| (acyclic(n), 0..n))
        ) {
            let existing = forest_of(&links);
            let target = links[pick].0;

            let result = validate_reassignments(&existing, &proposed(&[(target, Some(target))]), &HashSet::new());

            let violations = result.unwrap_err();
            let expected = HierarchyViolation {
                category_id: id(target),
                kind: ViolationKind::SelfParent,
            };
            prop_assert!(violations.contains(&expected));
            // nothing else was touched
            prop_assert_eq!(existing, forest_of(&links));
        }

        #[test]
        fn prop_three_cycles_rejected(
            (links, picks) in (3usize..12).prop_flat_map(|n| {
                (acyclic(n), Just((0..n).collect::<Vec<_>>()).prop_shuffle())
            })
        ) {
            let existing = forest_of(&links);
            let (a, b, c) = (links[picks[0]].0, links[picks[1]].0, links[picks[2]].0);

            let violations = validate_reassignments(
                &existing,
                &proposed(&[(a, Some(b)), (b, Some(c)), (c, Some(a))]),
                &HashSet::new(),
            )
            .unwrap_err();

            let flagged: HashSet<Uuid> = violations.iter().map(|v| v.category_id).collect();
            prop_assert!(flagged.contains(&id(a)));
            prop_assert!(flagged.contains(&id(b)));
            prop_assert!(flagged.contains(&id(c)));
        }
    }
}
