use std::sync::Arc;

use chrono::NaiveDate;
use finance_ledger::{
    ledger::{AggregateTracker, Category, CategoryFilter, Ledger, RecordDraft, Totals},
    time::FixedClock,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Add(f64, Category),
    /// Index into the live records, or past the end for an unknown id.
    Delete(usize),
}

fn ledger() -> Ledger {
    Ledger::with_clock(Arc::new(FixedClock(
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
    )))
}

fn category_strategy() -> impl Strategy<Value = Category> {
    prop_oneof![Just(Category::Income), Just(Category::Spent)]
}

fn amount_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![
        (0u32..1_000_000u32).prop_map(|cents| f64::from(cents) / 100.0),
        0.0f64..1e9,
        1e290f64..1e300,
        Just(0.1),
        Just(-5.0),
        Just(f64::MAX),
        Just(5e-324),
    ]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (amount_strategy(), category_strategy()).prop_map(|(a, c)| Op::Add(a, c)),
        1 => (0usize..40).prop_map(Op::Delete),
    ]
}

fn apply(ledger: &mut Ledger, op: &Op) {
    match op {
        Op::Add(amount, category) => {
            ledger.add(RecordDraft::new(*amount).category(*category));
        }
        Op::Delete(index) => {
            let id = ledger
                .records()
                .get(*index)
                .map(|record| record.id)
                .unwrap_or(u64::MAX);
            ledger.delete(id);
        }
    }
}

fn recomputed(ledger: &Ledger) -> Totals {
    AggregateTracker::from_records(ledger.records()).totals()
}

/// Bit patterns, so totals that overflowed to infinity still compare.
fn bits(totals: Totals) -> (u64, u64, u64) {
    (
        totals.net.to_bits(),
        totals.spent.to_bits(),
        totals.saved.to_bits(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn totals_match_a_full_recomputation(ops in prop::collection::vec(op_strategy(), 0..60)) {
        let mut ledger = ledger();
        for op in &ops {
            apply(&mut ledger, op);
            let totals = ledger.totals();
            prop_assert_eq!(bits(totals), bits(recomputed(&ledger)));
            prop_assert_eq!(totals.net.to_bits(), (totals.saved - totals.spent).to_bits());
            prop_assert!(totals.saved >= 0.0 && totals.spent >= 0.0);
        }
    }

    #[test]
    fn live_ids_are_distinct(ops in prop::collection::vec(op_strategy(), 0..60)) {
        let mut ledger = ledger();
        for op in &ops {
            apply(&mut ledger, op);
        }
        let mut ids: Vec<_> = ledger.records().iter().map(|record| record.id).collect();
        let live = ids.len();
        ids.sort_unstable();
        ids.dedup();
        prop_assert_eq!(ids.len(), live);
    }

    #[test]
    fn additions_alone_number_from_zero(count in 0usize..50) {
        let mut ledger = ledger();
        for _ in 0..count {
            ledger.add(RecordDraft::new(1.0));
        }
        let ids: Vec<_> = ledger.records().iter().map(|record| record.id).collect();
        prop_assert_eq!(ids, (0..count as u64).collect::<Vec<_>>());
    }

    #[test]
    fn add_then_delete_restores_totals_exactly(
        setup in prop::collection::vec(op_strategy(), 0..30),
        amount in amount_strategy(),
        category in category_strategy(),
    ) {
        let mut ledger = ledger();
        for op in &setup {
            apply(&mut ledger, op);
        }
        let before = ledger.totals();

        let added = ledger.add(RecordDraft::new(amount).category(category));
        ledger.delete(added.id);

        prop_assert_eq!(bits(before), bits(ledger.totals()));
    }

    #[test]
    fn views_are_filtered_and_newest_first(ops in prop::collection::vec(op_strategy(), 0..60)) {
        let mut ledger = ledger();
        for op in &ops {
            apply(&mut ledger, op);
        }

        let all: Vec<_> = ledger.view(CategoryFilter::All).iter().map(|r| r.id).collect();
        let mut expected: Vec<_> = ledger.records().iter().map(|r| r.id).collect();
        expected.reverse();
        prop_assert_eq!(all, expected);

        ledger.set_filter(CategoryFilter::Income);
        let income: Vec<_> = ledger.current_view().iter().map(|r| r.id).collect();
        let expected_income: Vec<_> = ledger
            .records()
            .iter()
            .rev()
            .filter(|r| r.category == Category::Income)
            .map(|r| r.id)
            .collect();
        prop_assert_eq!(income, expected_income);
    }

    #[test]
    fn second_delete_of_an_id_is_a_no_op(
        setup in prop::collection::vec(op_strategy(), 1..30),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut ledger = ledger();
        for op in &setup {
            apply(&mut ledger, op);
        }
        prop_assume!(!ledger.is_empty());
        let id = ledger.records()[pick.index(ledger.len())].id;

        prop_assert!(ledger.delete(id).is_some());
        let once = ledger.totals();
        prop_assert!(ledger.delete(id).is_none());
        prop_assert_eq!(bits(ledger.totals()), bits(once));
    }
}

#[test]
fn walkthrough_matches_expected_balances() {
    let mut ledger = ledger();
    ledger.add(RecordDraft::new(50.0).source("Paycheck"));
    ledger.add(
        RecordDraft::new(20.0)
            .source("Coffee")
            .category(Category::Spent),
    );
    ledger.delete(0);

    assert_eq!(
        ledger.totals(),
        Totals {
            net: -20.0,
            spent: 20.0,
            saved: 0.0
        }
    );
    let view = ledger.current_view();
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].source, "Coffee");
}

#[test]
fn decimal_amounts_cancel_exactly() {
    let mut ledger = ledger();
    let a = ledger.add(RecordDraft::new(0.1));
    let b = ledger.add(RecordDraft::new(0.2));
    ledger.delete(a.id);
    ledger.delete(b.id);
    assert_eq!(ledger.totals(), Totals::default());
}

#[test]
fn totals_track_records_far_past_fixed_width_limits() {
    let mut ledger = ledger();
    for _ in 0..9_300 {
        ledger.add(RecordDraft::new(1e15));
    }
    ledger.delete(0);

    let totals = ledger.totals();
    assert_eq!(totals, recomputed(&ledger));
    assert_eq!(totals.saved, 9_299e15);
}

#[test]
fn large_amounts_are_not_capped() {
    let mut ledger = ledger();
    let record = ledger.add(RecordDraft::new(2e15).category(Category::Spent));
    assert_eq!(record.amount, 2e15);
    assert_eq!(ledger.totals().spent, 2e15);
    assert_eq!(ledger.totals().net, -2e15);
}
