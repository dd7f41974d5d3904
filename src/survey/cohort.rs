//! Cohort tiers and the regional benchmark table.
//!
//! A partition is compared against a fixed reference vector chosen from the
//! grade levels it contains. Primary and middle-school responses are not
//! comparable with a single reference, so a mix of both yields zeros.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Coarse grade-level classification used to pick a benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CohortTier {
    MixedIncompatible,
    MiddleAll,
    Middle1,
    Middle2,
    Middle3,
    PrimaryAll,
    Primary4,
    Primary5,
    Primary6,
    Unknown,
}

impl fmt::Display for CohortTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CohortTier::MixedIncompatible => "초·중 혼합 (비교 불가)",
            CohortTier::MiddleAll => "중학교",
            CohortTier::Middle1 => "중1",
            CohortTier::Middle2 => "중2",
            CohortTier::Middle3 => "중3",
            CohortTier::PrimaryAll => "초등학교",
            CohortTier::Primary4 => "초4",
            CohortTier::Primary5 => "초5",
            CohortTier::Primary6 => "초6",
            CohortTier::Unknown => "알 수 없음",
        };
        write!(f, "{}", label)
    }
}

const PRIMARY_LEVELS: [(&str, CohortTier); 3] = [
    ("초4", CohortTier::Primary4),
    ("초5", CohortTier::Primary5),
    ("초6", CohortTier::Primary6),
];

const MIDDLE_LEVELS: [(&str, CohortTier); 3] = [
    ("중1", CohortTier::Middle1),
    ("중2", CohortTier::Middle2),
    ("중3", CohortTier::Middle3),
];

/// Classify a set of grade labels.
///
/// A level is present when any label contains its marker (`초4`, `중2`, ...).
/// A single present level resolves to its own tier, several levels of one
/// school stage to that stage's `-All` tier.
pub fn classify<'a, I>(grades: I) -> CohortTier
where
    I: IntoIterator<Item = &'a str>,
{
    let labels: BTreeSet<&str> = grades.into_iter().collect();
    let present = |levels: &[(&str, CohortTier)]| -> Vec<CohortTier> {
        levels
            .iter()
            .filter(|(marker, _)| labels.iter().any(|label| label.contains(marker)))
            .map(|(_, tier)| *tier)
            .collect()
    };

    let primary = present(&PRIMARY_LEVELS[..]);
    let middle = present(&MIDDLE_LEVELS[..]);

    match (primary.as_slice(), middle.as_slice()) {
        ([_, ..], [_, ..]) => CohortTier::MixedIncompatible,
        ([], [single]) => *single,
        ([], [_, ..]) => CohortTier::MiddleAll,
        ([single], []) => *single,
        ([_, ..], []) => CohortTier::PrimaryAll,
        ([], []) => CohortTier::Unknown,
    }
}

/// Daegu regional averages per tier, keyed by competency group name.
fn reference_scores(tier: CohortTier) -> &'static [(&'static str, f64)] {
    match tier {
        CohortTier::MiddleAll => &[
            ("공감소통역량", 4.45),
            ("창의융합적사고역량", 4.21),
            ("자기관리역량", 4.28),
            ("공동체역량", 4.35),
        ],
        CohortTier::Middle1 => &[
            ("공감소통역량", 4.42),
            ("창의융합적사고역량", 4.17),
            ("자기관리역량", 4.25),
            ("공동체역량", 4.34),
        ],
        CohortTier::Middle2 => &[
            ("공감소통역량", 4.46),
            ("창의융합적사고역량", 4.21),
            ("자기관리역량", 4.27),
            ("공동체역량", 4.33),
        ],
        CohortTier::Middle3 => &[
            ("공감소통역량", 4.49),
            ("창의융합적사고역량", 4.26),
            ("자기관리역량", 4.31),
            ("공동체역량", 4.37),
        ],
        CohortTier::PrimaryAll => &[
            ("공감소통역량", 4.41),
            ("창의융합적사고역량", 4.19),
            ("자기관리역량", 4.28),
            ("공동체역량", 4.38),
        ],
        CohortTier::Primary4 => &[
            ("공감소통역량", 4.38),
            ("창의융합적사고역량", 4.19),
            ("자기관리역량", 4.31),
            ("공동체역량", 4.40),
        ],
        CohortTier::Primary5 => &[
            ("공감소통역량", 4.42),
            ("창의융합적사고역량", 4.18),
            ("자기관리역량", 4.26),
            ("공동체역량", 4.38),
        ],
        CohortTier::Primary6 => &[
            ("공감소통역량", 4.43),
            ("창의융합적사고역량", 4.21),
            ("자기관리역량", 4.27),
            ("공동체역량", 4.37),
        ],
        CohortTier::MixedIncompatible | CohortTier::Unknown => &[],
    }
}

/// Benchmark vector for `tier`, aligned with `groups`.
///
/// Groups without a reference value get 0.
pub fn benchmark_for(tier: CohortTier, groups: &[String]) -> Vec<f64> {
    let table = reference_scores(tier);
    groups
        .iter()
        .map(|group| {
            table
                .iter()
                .find(|(name, _)| *name == group.as_str())
                .map(|(_, value)| *value)
                .unwrap_or(0.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::schema::Schema;

    #[test]
    fn test_single_grade_resolves_to_specific_tier() {
        assert_eq!(classify(["중1"]), CohortTier::Middle1);
        assert_eq!(classify(["중2"]), CohortTier::Middle2);
        assert_eq!(classify(["중3"]), CohortTier::Middle3);
        assert_eq!(classify(["초4"]), CohortTier::Primary4);
        assert_eq!(classify(["초5"]), CohortTier::Primary5);
        assert_eq!(classify(["초6"]), CohortTier::Primary6);
    }

    #[test]
    fn test_labels_are_matched_by_substring() {
        assert_eq!(classify(["중1", "2024 중1"]), CohortTier::Middle1);
        assert_eq!(classify(["중학교 중3반"]), CohortTier::Middle3);
    }

    #[test]
    fn test_multiple_levels_fall_back_to_stage() {
        assert_eq!(classify(["중1", "중3"]), CohortTier::MiddleAll);
        assert_eq!(classify(["초4", "초5", "초6"]), CohortTier::PrimaryAll);
    }

    #[test]
    fn test_mixed_and_unknown() {
        assert_eq!(classify(["초4", "중1"]), CohortTier::MixedIncompatible);
        assert_eq!(classify(["고1"]), CohortTier::Unknown);
        assert_eq!(classify(std::iter::empty::<&str>()), CohortTier::Unknown);
    }

    #[test]
    fn test_middle_one_benchmark() {
        let groups = Schema::daegu().group_names();
        assert_eq!(
            benchmark_for(CohortTier::Middle1, &groups),
            vec![4.42, 4.17, 4.25, 4.34]
        );
    }

    #[test]
    fn test_incomparable_tiers_are_zero() {
        let groups = Schema::daegu().group_names();
        let mixed = benchmark_for(classify(["초4", "중1"]), &groups);
        assert_eq!(mixed, vec![0.0; 4]);
        assert_eq!(benchmark_for(CohortTier::Unknown, &groups), vec![0.0; 4]);
    }

    #[test]
    fn test_unknown_group_names_are_zero() {
        let groups = vec!["공감소통역량".to_string(), "디지털역량".to_string()];
        assert_eq!(
            benchmark_for(CohortTier::PrimaryAll, &groups),
            vec![4.41, 0.0]
        );
    }
}
