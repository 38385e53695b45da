//! Baseline comparator.
//!
//! Compares the full set of named commits for one service in one
//! environment against the baseline environment's set. A single
//! sub-component divergence anywhere makes the whole service a
//! mismatch; partial matching is never reported as a match.

use serde::{Deserialize, Serialize};

use drift_core::CommitEntry;

/// Baseline comparison outcome for one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Match,
    Mismatch,
    /// Either side has no valid commits; no verdict is possible.
    Indeterminate,
}

/// Compare a cell's commit set against the baseline's.
///
/// Invalid entries were already excluded by the normalizer, so an
/// empty set here means "no usable data" and yields `Indeterminate` —
/// never a silent match. Differing set sizes are a `Mismatch`.
/// Otherwise the check is bijective by name: every baseline entry must
/// have a current entry with the same name and the same hash.
pub fn compare(current: &[CommitEntry], baseline: &[CommitEntry]) -> MatchStatus {
    if current.is_empty() || baseline.is_empty() {
        return MatchStatus::Indeterminate;
    }
    if current.len() != baseline.len() {
        return MatchStatus::Mismatch;
    }
    let all_match = baseline.iter().all(|b| {
        current
            .iter()
            .find(|c| c.name == b.name)
            .is_some_and(|c| c.commit == b.commit)
    });
    if all_match {
        MatchStatus::Match
    } else {
        MatchStatus::Mismatch
    }
}

/// One diverging sub-component, for mismatch detail rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MismatchDetail {
    pub name: String,
    pub baseline: String,
    /// `None` when the current environment has no entry of this name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<String>,
}

/// List the baseline entries the current set diverges from.
pub fn mismatched_entries(
    baseline: &[CommitEntry],
    current: &[CommitEntry],
) -> Vec<MismatchDetail> {
    baseline
        .iter()
        .filter_map(|b| {
            let matching = current.iter().find(|c| c.name == b.name);
            match matching {
                Some(c) if c.commit == b.commit => None,
                other => Some(MismatchDetail {
                    name: b.name.clone(),
                    baseline: b.commit.clone(),
                    current: other.map(|c| c.commit.clone()),
                }),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(pairs: &[(&str, &str)]) -> Vec<CommitEntry> {
        pairs
            .iter()
            .map(|(name, commit)| CommitEntry::new(*name, *commit))
            .collect()
    }

    #[test]
    fn equal_sets_match_symmetrically() {
        let a = entries(&[("main", "abc1234"), ("base", "def5678")]);
        let b = entries(&[("main", "abc1234"), ("base", "def5678")]);
        assert_eq!(compare(&a, &b), MatchStatus::Match);
        assert_eq!(compare(&b, &a), MatchStatus::Match);
    }

    #[test]
    fn entry_order_does_not_matter() {
        let a = entries(&[("base", "def5678"), ("main", "abc1234")]);
        let b = entries(&[("main", "abc1234"), ("base", "def5678")]);
        assert_eq!(compare(&a, &b), MatchStatus::Match);
    }

    #[test]
    fn any_hash_divergence_is_a_mismatch() {
        let baseline = entries(&[("main", "abc1234")]);
        let current = entries(&[("main", "def5678")]);
        assert_eq!(compare(&current, &baseline), MatchStatus::Mismatch);
    }

    #[test]
    fn one_diverging_subcomponent_fails_the_whole_service() {
        let baseline = entries(&[("main", "abc1234"), ("base", "def5678")]);
        let current = entries(&[("main", "abc1234"), ("base", "0000000")]);
        assert_eq!(compare(&current, &baseline), MatchStatus::Mismatch);
    }

    #[test]
    fn size_divergence_is_a_mismatch_not_indeterminate() {
        let baseline = entries(&[("a", "111"), ("b", "222")]);
        let current = entries(&[("a", "111")]);
        assert_eq!(compare(&current, &baseline), MatchStatus::Mismatch);
    }

    #[test]
    fn name_divergence_with_equal_sizes_is_a_mismatch() {
        let baseline = entries(&[("a", "111")]);
        let current = entries(&[("b", "111")]);
        assert_eq!(compare(&current, &baseline), MatchStatus::Mismatch);
    }

    #[test]
    fn empty_side_is_indeterminate() {
        let some = entries(&[("main", "abc1234")]);
        assert_eq!(compare(&[], &some), MatchStatus::Indeterminate);
        assert_eq!(compare(&some, &[]), MatchStatus::Indeterminate);
        assert_eq!(compare(&[], &[]), MatchStatus::Indeterminate);
    }

    #[test]
    fn mismatched_entries_reports_divergence_and_absence() {
        let baseline = entries(&[("main", "abc1234"), ("base", "def5678")]);
        let current = entries(&[("main", "0000000")]);
        let details = mismatched_entries(&baseline, &current);
        assert_eq!(
            details,
            vec![
                MismatchDetail {
                    name: "main".to_string(),
                    baseline: "abc1234".to_string(),
                    current: Some("0000000".to_string()),
                },
                MismatchDetail {
                    name: "base".to_string(),
                    baseline: "def5678".to_string(),
                    current: None,
                },
            ]
        );
    }

    #[test]
    fn mismatched_entries_empty_on_full_match() {
        let baseline = entries(&[("main", "abc1234")]);
        let current = entries(&[("main", "abc1234")]);
        assert!(mismatched_entries(&baseline, &current).is_empty());
    }
}
