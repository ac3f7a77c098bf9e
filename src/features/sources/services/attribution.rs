//! Auto-attribution of a source's videos.
//!
//! When a source's auto categories (or authors) change, its videos that still
//! carry exactly the old auto set follow the change. Videos an admin edited by
//! hand keep their own set.

use std::collections::BTreeSet;

use uuid::Uuid;

/// Ids of the videos whose current set equals `old` and should become `new`.
pub fn videos_to_reattribute(
    videos: &[(Uuid, Vec<Uuid>)],
    old: &BTreeSet<Uuid>,
    new: &BTreeSet<Uuid>,
) -> Vec<Uuid> {
    if old == new {
        return Vec::new();
    }

    videos
        .iter()
        .filter(|(_, current)| current.iter().copied().collect::<BTreeSet<_>>() == *old)
        .map(|(id, _)| *id)
        .collect()
}

/// `current` plus every id of `added`, keeping first-seen order.
pub fn union(current: &[Uuid], added: &[Uuid]) -> Vec<Uuid> {
    let mut merged = current.to_vec();
    for id in added {
        if !merged.contains(id) {
            merged.push(*id);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn id(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    fn set(ids: &[u128]) -> BTreeSet<Uuid> {
        ids.iter().map(|&n| id(n)).collect()
    }

    #[test]
    fn test_only_videos_matching_old_set_follow() {
        let videos = vec![
            (id(100), vec![id(1), id(2)]),
            (id(101), vec![id(2), id(1)]),
            (id(102), vec![id(1)]),
            (id(103), vec![id(1), id(2), id(3)]),
        ];

        let changed = videos_to_reattribute(&videos, &set(&[1, 2]), &set(&[1, 2, 3]));

        assert_eq!(changed, vec![id(100), id(101)]);
    }

    #[test]
    fn test_empty_old_set_matches_unattributed_videos() {
        let videos = vec![(id(100), vec![]), (id(101), vec![id(9)])];

        let changed = videos_to_reattribute(&videos, &set(&[]), &set(&[4]));

        assert_eq!(changed, vec![id(100)]);
    }

    #[test]
    fn test_unchanged_set_touches_nothing() {
        let videos = vec![(id(100), vec![id(1)])];
        assert!(videos_to_reattribute(&videos, &set(&[1]), &set(&[1])).is_empty());
    }

    #[test]
    fn test_union_keeps_order_without_duplicates() {
        assert_eq!(
            union(&[id(2), id(1)], &[id(1), id(3)]),
            vec![id(2), id(1), id(3)]
        );
    }
}
