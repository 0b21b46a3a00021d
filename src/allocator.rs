//! # Publisher Metric Allocator
//!
//! Splits an entity's aggregate budget and bid targets into per-publisher
//! figures for outreach drafts. The split is seeded from the publisher id,
//! so a publisher always sees the same numbers for the same entity while
//! different publishers see visibly different ones.
//!
//! Allocated budgets are not reconciled against the aggregate.

use tracing::debug;

use crate::models::{EntityMetrics, PublisherMetrics};

const MIN_BUDGET: f64 = 50.0;
const MIN_CPC_BID: f64 = 0.10;
const MIN_CPA_GOAL: f64 = 1.00;

/// Lower bound and width of the budget share, i.e. shares in [0.15, 0.40).
const BUDGET_SHARE_BASE: f64 = 0.15;
const BUDGET_SHARE_SPREAD: f64 = 0.25;
/// Bid jitter spans [-0.20, 0.20).
const BID_VARIANCE_SPREAD: f64 = 0.4;

/// Sum of the UTF-16 code units of the publisher id.
pub fn publisher_seed(publisher_id: &str) -> u32 {
    publisher_id.encode_utf16().map(u32::from).sum()
}

/// Deterministic spread function in `[0, 1)`: the fractional part of
/// `sin(seed) * 10000`. Not suitable for anything security related.
pub fn pseudo_random(seed: u32) -> f64 {
    let x = f64::from(seed).sin() * 10_000.0;
    x - x.floor()
}

/// Rounds half toward positive infinity.
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

fn round_to_tens(value: f64) -> f64 {
    round_half_up(value / 10.0) * 10.0
}

fn round_to_cents(value: f64) -> f64 {
    round_half_up(value * 100.0) / 100.0
}

fn jitter(value: f64, seed: u32) -> f64 {
    let variance = (pseudo_random(seed) - 0.5) * BID_VARIANCE_SPREAD;
    round_to_cents(value * (1.0 + variance))
}

/// Derives one publisher's share of `metrics`.
///
/// Absent metrics yield an all-zero record.
pub fn allocate(metrics: Option<&EntityMetrics>, publisher_id: &str) -> PublisherMetrics {
    let Some(metrics) = metrics else {
        return PublisherMetrics {
            publisher_id: Some(publisher_id.to_string()),
            budget: 0.0,
            cpc_bid: 0.0,
            cpa_goal: 0.0,
        };
    };

    let seed = publisher_seed(publisher_id);
    let share = BUDGET_SHARE_BASE + pseudo_random(seed) * BUDGET_SHARE_SPREAD;

    PublisherMetrics {
        publisher_id: Some(publisher_id.to_string()),
        budget: round_to_tens(metrics.budget * share).max(MIN_BUDGET),
        cpc_bid: jitter(metrics.cpc_bid, seed.wrapping_add(1)).max(MIN_CPC_BID),
        cpa_goal: jitter(metrics.cpa_goal, seed.wrapping_add(2)).max(MIN_CPA_GOAL),
    }
}

/// Allocates across every selected publisher.
///
/// With no publishers selected the single returned record carries the
/// directly-entered `overrides` (or zeros). With no entity metrics the
/// result is a single zero record.
pub fn allocate_all(
    metrics: Option<&EntityMetrics>,
    publisher_ids: &[String],
    overrides: Option<&EntityMetrics>,
) -> Vec<PublisherMetrics> {
    if publisher_ids.is_empty() {
        let values = overrides.copied().unwrap_or_default();
        return vec![PublisherMetrics {
            publisher_id: None,
            budget: values.budget,
            cpc_bid: values.cpc_bid,
            cpa_goal: values.cpa_goal,
        }];
    }

    let Some(aggregate) = metrics else {
        return vec![PublisherMetrics {
            publisher_id: None,
            budget: 0.0,
            cpc_bid: 0.0,
            cpa_goal: 0.0,
        }];
    };

    let allocations: Vec<PublisherMetrics> = publisher_ids
        .iter()
        .map(|id| allocate(Some(aggregate), id))
        .collect();

    let allocated_total: f64 = allocations.iter().map(|a| a.budget).sum();
    debug!(
        "Allocated {} publishers: aggregate budget={:.2}, allocated total={:.2}, difference={:.2}",
        allocations.len(),
        aggregate.budget,
        allocated_total,
        allocated_total - aggregate.budget
    );

    allocations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EntityMetrics {
        EntityMetrics {
            budget: 1150.0,
            cpc_bid: 1.7,
            cpa_goal: 17.0,
        }
    }

    fn sample_publishers() -> Vec<String> {
        (1..=8).map(|i| format!("pub{}", i)).collect()
    }

    fn is_multiple_of_ten(value: f64) -> bool {
        (value / 10.0).fract() == 0.0
    }

    #[test]
    fn seed_sums_character_codes() {
        assert_eq!(publisher_seed("pub1"), 112 + 117 + 98 + 49);
        assert_eq!(publisher_seed(""), 0);
    }

    #[test]
    fn pseudo_random_stays_in_unit_interval() {
        for seed in 0..2_000 {
            let value = pseudo_random(seed);
            assert!((0.0..1.0).contains(&value), "seed {} gave {}", seed, value);
        }
    }

    #[test]
    fn allocation_is_deterministic() {
        let metrics = sample();
        let first = allocate(Some(&metrics), "pub1");
        let second = allocate(Some(&metrics), "pub1");

        assert_eq!(first.budget.to_bits(), second.budget.to_bits());
        assert_eq!(first.cpc_bid.to_bits(), second.cpc_bid.to_bits());
        assert_eq!(first.cpa_goal.to_bits(), second.cpa_goal.to_bits());
    }

    #[test]
    fn pub1_sample_values() {
        let result = allocate(Some(&sample()), "pub1");

        assert!((170.0..=460.0).contains(&result.budget));
        assert!((1.36..=2.04).contains(&result.cpc_bid));
        assert!((13.6..=20.4).contains(&result.cpa_goal));

        assert_eq!(result.budget, 350.0);
        assert_eq!(result.cpc_bid, 1.91);
        assert_eq!(result.cpa_goal, 16.08);
    }

    #[test]
    fn floors_apply_to_tiny_aggregates() {
        let tiny = EntityMetrics {
            budget: 10.0,
            cpc_bid: 0.01,
            cpa_goal: 0.2,
        };

        for id in sample_publishers() {
            let result = allocate(Some(&tiny), &id);
            assert_eq!(result.budget, MIN_BUDGET);
            assert_eq!(result.cpc_bid, MIN_CPC_BID);
            assert_eq!(result.cpa_goal, MIN_CPA_GOAL);
        }
    }

    #[test]
    fn budgets_respect_bounds_for_many_inputs() {
        for budget in [0.0, 75.0, 333.0, 1150.0, 9_999.0, 250_000.0] {
            let metrics = EntityMetrics {
                budget,
                cpc_bid: 2.35,
                cpa_goal: 40.0,
            };
            for id in sample_publishers().iter().chain(["publisher-x".to_string()].iter()) {
                let result = allocate(Some(&metrics), id);
                assert!(result.budget >= MIN_BUDGET);
                assert!(is_multiple_of_ten(result.budget), "{} not a multiple of 10", result.budget);
                assert!(result.cpc_bid >= MIN_CPC_BID);
                assert!(result.cpa_goal >= MIN_CPA_GOAL);
            }
        }
    }

    #[test]
    fn sample_publishers_get_distinct_budgets() {
        let metrics = sample();
        let mut budgets: Vec<i64> = sample_publishers()
            .iter()
            .map(|id| allocate(Some(&metrics), id).budget as i64)
            .collect();
        budgets.sort_unstable();
        budgets.dedup();

        assert!(budgets.len() >= 5, "too many collisions: {:?}", budgets);
    }

    #[test]
    fn no_publishers_uses_overrides_or_zeros() {
        let overrides = EntityMetrics {
            budget: 500.0,
            cpc_bid: 1.25,
            cpa_goal: 12.0,
        };

        let with_overrides = allocate_all(Some(&sample()), &[], Some(&overrides));
        assert_eq!(with_overrides.len(), 1);
        assert_eq!(with_overrides[0].publisher_id, None);
        assert_eq!(with_overrides[0].budget, 500.0);
        assert_eq!(with_overrides[0].cpc_bid, 1.25);

        let zeros = allocate_all(Some(&sample()), &[], None);
        assert_eq!(zeros[0].budget, 0.0);
        assert_eq!(zeros[0].cpa_goal, 0.0);
    }

    #[test]
    fn missing_metrics_yield_single_zero_record() {
        let result = allocate_all(None, &sample_publishers(), None);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].budget, 0.0);
        assert_eq!(result[0].cpc_bid, 0.0);

        let single = allocate(None, "pub3");
        assert_eq!(single.budget, 0.0);
    }

    #[test]
    fn allocations_are_not_forced_to_sum_to_aggregate() {
        let result = allocate_all(Some(&sample()), &sample_publishers(), None);
        assert_eq!(result.len(), 8);

        let total: f64 = result.iter().map(|r| r.budget).sum();
        assert_ne!(total, 1150.0);
    }
}
