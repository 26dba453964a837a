//! Property-based tests for the risk transform using proptest.

use proptest::prelude::*;

use foundry_risk::transform::risk_score;
use foundry_risk::{
    ComplianceGap, Severity, SortDirection, SortField, bucket_matrix, score_gap, score_gaps,
    sort_risks,
};

fn severity_strategy() -> impl Strategy<Value = Severity> {
    prop_oneof![
        Just(Severity::Low),
        Just(Severity::Medium),
        Just(Severity::High),
        Just(Severity::Critical),
        "[a-z]{1,8}".prop_map(|s| Severity::parse(&s)),
    ]
}

fn gap_strategy() -> impl Strategy<Value = ComplianceGap> {
    (
        "[A-Za-z ]{0,12}",
        severity_strategy(),
        0.0f64..=1.0,
        proptest::option::of("[a-z0-9]{1,6}"),
    )
        .prop_map(|(title, severity, confidence, id)| {
            let gap = ComplianceGap::new(title, severity, confidence);
            match id {
                Some(id) => gap.with_id(id),
                None => gap,
            }
        })
}

// --- Scoring properties ---

proptest! {
    #[test]
    fn score_is_in_range_for_valid_likelihood(gap in gap_strategy(), index in 0usize..1000) {
        let item = score_gap(&gap, index);
        prop_assert!((0..=100).contains(&item.risk_score));
        prop_assert_eq!(item.risk_score, risk_score(item.likelihood, item.impact));
        prop_assert_eq!(item.likelihood.to_bits(), gap.confidence.to_bits());
    }

    #[test]
    fn score_gap_is_idempotent(gap in gap_strategy(), index in 0usize..1000) {
        let first = score_gap(&gap, index);
        let second = score_gap(&gap, index);
        prop_assert_eq!(first.impact.to_bits(), second.impact.to_bits());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn unrecognized_severity_uses_default_impact(label in "[a-z]{1,10}") {
        prop_assume!(!["low", "medium", "high", "critical"].contains(&label.as_str()));
        let item = score_gap(&ComplianceGap::new("t", Severity::parse(&label), 0.5), 0);
        prop_assert_eq!(item.impact, 0.5);
        prop_assert_eq!(item.risk_score, 25);
    }

    #[test]
    fn synthesized_ids_are_unique(gaps in prop::collection::vec(gap_strategy(), 0..40)) {
        let gaps: Vec<ComplianceGap> = gaps.into_iter().map(|mut g| { g.id = None; g }).collect();
        let items = score_gaps(&gaps);
        let mut ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        prop_assert_eq!(ids.len(), gaps.len());
    }

    #[test]
    fn ids_are_unique_in_mixed_batches(
        slots in prop::collection::vec(proptest::option::of("gap-[0-9]{1,2}(-[0-9])?"), 0..40),
    ) {
        // Explicit ids look like placeholders; duplicates among them are dropped.
        let mut seen = std::collections::HashSet::new();
        let gaps: Vec<ComplianceGap> = slots
            .into_iter()
            .map(|slot| {
                let gap = ComplianceGap::new("t", Severity::Low, 0.5);
                match slot {
                    Some(id) if seen.insert(id.clone()) => gap.with_id(id),
                    _ => gap,
                }
            })
            .collect();
        let items = score_gaps(&gaps);
        let mut ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        prop_assert_eq!(ids.len(), gaps.len());
        for (gap, item) in gaps.iter().zip(&items) {
            if let Some(id) = &gap.id {
                prop_assert_eq!(id, &item.id);
            }
        }
    }
}

// --- Sorting properties ---

proptest! {
    #[test]
    fn score_sort_directions_are_reverses(gaps in prop::collection::vec(gap_strategy(), 0..40)) {
        let items = score_gaps(&gaps);
        let asc: Vec<i64> = sort_risks(&items, SortField::RiskScore, SortDirection::Asc)
            .iter()
            .map(|i| i.risk_score)
            .collect();
        let mut desc: Vec<i64> = sort_risks(&items, SortField::RiskScore, SortDirection::Desc)
            .iter()
            .map(|i| i.risk_score)
            .collect();
        desc.reverse();
        prop_assert_eq!(asc, desc);
    }

    #[test]
    fn severity_sort_desc_groups_by_rank(gaps in prop::collection::vec(gap_strategy(), 0..40)) {
        let items = score_gaps(&gaps);
        let sorted = sort_risks(&items, SortField::Severity, SortDirection::Desc);
        prop_assert_eq!(sorted.len(), items.len());
        for pair in sorted.windows(2) {
            prop_assert!(pair[0].severity.rank() >= pair[1].severity.rank());
        }
    }

    #[test]
    fn sort_is_a_permutation(gaps in prop::collection::vec(gap_strategy(), 0..40)) {
        let items = score_gaps(&gaps);
        let sorted = sort_risks(&items, SortField::Title, SortDirection::Asc);
        let mut before: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        let mut after: Vec<&str> = sorted.iter().map(|i| i.id.as_str()).collect();
        before.sort_unstable();
        after.sort_unstable();
        prop_assert_eq!(before, after);
    }
}

// --- Matrix properties ---

proptest! {
    #[test]
    fn matrix_partitions_valid_items(gaps in prop::collection::vec(gap_strategy(), 0..60)) {
        let items = score_gaps(&gaps);
        let matrix = bucket_matrix(&items);
        prop_assert!(matrix.unplaced.is_empty());
        prop_assert_eq!(matrix.placed_count(), items.len());

        let mut placed: Vec<String> = matrix
            .iter_cells()
            .flat_map(|cell| cell.items.iter().map(|i| i.id.clone()))
            .collect();
        let mut expected: Vec<String> = items.iter().map(|i| i.id.clone()).collect();
        placed.sort_unstable();
        expected.sort_unstable();
        prop_assert_eq!(placed, expected);
    }

    #[test]
    fn matrix_cells_match_their_bands(gaps in prop::collection::vec(gap_strategy(), 0..60)) {
        let items = score_gaps(&gaps);
        let matrix = bucket_matrix(&items);
        for cell in matrix.iter_cells() {
            for item in &cell.items {
                prop_assert_eq!(foundry_risk::transform::impact_band(item.impact), Some(cell.impact_band));
                prop_assert_eq!(foundry_risk::transform::likelihood_band(item.likelihood), Some(cell.likelihood_band));
            }
        }
    }
}
