//! Property-based tests for the candidate search.
//!
//! - Scan and Step agree whenever the grid covers every integer of the window
//! - Step never returns more than an in-window Scan answer
//! - Every returned candidate yields integral tax and lies in the window

use invoicegen_shared::types::TaxRate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::policy::{AdjustmentPolicy, SearchWindow};
use super::search::{integral_step, scan, step};

/// Amounts up to 1,000.00, where a 0.1% grid reaches every integer.
fn small_amount() -> impl Strategy<Value = Decimal> {
    (1i64..=100_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Amounts from 0.01 to 10,000,000.00.
fn any_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Integer percentage rates.
fn integer_rate() -> impl Strategy<Value = TaxRate> {
    (0u32..=100).prop_map(|r| TaxRate::new(Decimal::from(r)).unwrap())
}

/// Rates with up to two decimals (e.g. 17.5, 0.25).
fn decimal_rate() -> impl Strategy<Value = TaxRate> {
    (0i64..=10_000i64).prop_map(|r| TaxRate::new(Decimal::new(r, 2)).unwrap())
}

fn windows() -> [SearchWindow; 2] {
    let policy = AdjustmentPolicy::default();
    [*policy.standard(), *policy.third_schedule().window()]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// For bases up to 1000 both strategies return the same answer.
    #[test]
    fn prop_scan_equals_step_on_small_bases(
        base in small_amount(),
        rate in integer_rate(),
    ) {
        for window in windows() {
            prop_assert_eq!(
                scan(base, &rate, &window),
                step(base, &rate, &window),
                "base {} rate {}", base, rate
            );
        }
    }

    /// Fractional rates keep the equivalence.
    #[test]
    fn prop_scan_equals_step_for_decimal_rates(
        base in small_amount(),
        rate in decimal_rate(),
    ) {
        for window in windows() {
            prop_assert_eq!(scan(base, &rate, &window), step(base, &rate, &window));
        }
    }

    /// Step finds a value whenever the scan does, and never a larger one.
    #[test]
    fn prop_step_dominates_scan(
        base in any_amount(),
        rate in integer_rate(),
    ) {
        for window in windows() {
            if let Some(scanned) = scan(base, &rate, &window) {
                let stepped = step(base, &rate, &window);
                prop_assert!(stepped.is_some());
                prop_assert!(stepped.unwrap() <= scanned);
            }
        }
    }

    /// Every candidate is integral, taxes to a whole number and sits in the window.
    #[test]
    fn prop_candidates_are_valid(
        base in any_amount(),
        rate in decimal_rate(),
    ) {
        for window in windows() {
            let low = window.lower_bound(base).unwrap();
            let high = window.upper_bound(base).unwrap();
            for candidate in [scan(base, &rate, &window), step(base, &rate, &window)]
                .into_iter()
                .flatten()
            {
                prop_assert!(candidate.fract().is_zero());
                prop_assert!(rate.yields_integral_tax(candidate));
                prop_assert!(candidate >= low && candidate <= high);
            }
        }
    }

    /// An integer yields integral tax exactly when it is a multiple of the step.
    #[test]
    fn prop_integral_step_characterises_integral_tax(
        value in 0i64..100_000,
        rate in decimal_rate(),
    ) {
        let value = Decimal::from(value);
        let step = integral_step(&rate).unwrap();
        prop_assert_eq!(
            rate.yields_integral_tax(value),
            (value % step).is_zero()
        );
    }
}
