//! Integral-tax candidate search.
//!
//! Two interchangeable strategies find the smallest increased value whose
//! tax is a whole number:
//!
//! - **Scan** visits `ceil(base * (1 + p))` for each grid percentage `p`.
//! - **Step** computes the rate's integral step (`100 / gcd(100, rate)` for
//!   integer rates) and takes the smallest multiple of it inside
//!   `[ceil(base * (1 + min)), ceil(base * (1 + max))]`.
//!
//! Step examines every integer in the window, so it never misses a value the
//! scan would find and returns the same answer whenever the scan grid covers
//! every integer of the window. Above a base of about 1000 the grid skips
//! integers and the two differ: 12345 at 18% gives 12400 with Step, while
//! Scan finds nothing on the grid and falls back to 12592. Set
//! `policy.strategy = "scan"` to keep the grid-only behaviour.

use invoicegen_shared::config::SearchStrategy;
use invoicegen_shared::types::TaxRate;
use rust_decimal::Decimal;

use super::policy::{SearchWindow, raise};

/// Greatest common divisor.
const fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Smallest positive integer whose every multiple yields integral tax.
///
/// For a rate `m / 10^s` percent the tax on `v` is `v * m / (100 * 10^s)`,
/// which is whole exactly when `v` is a multiple of `100 * 10^s / gcd(...)`.
/// Returns `None` when the step does not fit in a `Decimal`.
#[must_use]
pub fn integral_step(rate: &TaxRate) -> Option<Decimal> {
    let percent = rate.percent().normalize();
    let numerator = percent.mantissa().unsigned_abs();
    let denominator = 100_u128.checked_mul(10_u128.checked_pow(percent.scale())?)?;

    let step = denominator / gcd(denominator, numerator);
    Decimal::try_from_i128_with_scale(i128::try_from(step).ok()?, 0).ok()
}

/// Linear scan over the window's percentage grid.
#[must_use]
pub fn scan(base: Decimal, rate: &TaxRate, window: &SearchWindow) -> Option<Decimal> {
    window
        .grid_points()
        .filter_map(|p| raise(base, p))
        .find(|candidate| rate.yields_integral_tax(*candidate))
}

/// Smallest multiple of the rate's integral step inside the window.
#[must_use]
pub fn step(base: Decimal, rate: &TaxRate, window: &SearchWindow) -> Option<Decimal> {
    let step = integral_step(rate)?;
    let low = window.lower_bound(base)?;
    let high = window.upper_bound(base)?;

    let first = low.checked_div(step)?.ceil().checked_mul(step)?;
    (first <= high).then_some(first)
}

/// Runs the configured strategy.
#[must_use]
pub fn find(
    strategy: SearchStrategy,
    base: Decimal,
    rate: &TaxRate,
    window: &SearchWindow,
) -> Option<Decimal> {
    match strategy {
        SearchStrategy::Scan => scan(base, rate, window),
        SearchStrategy::Step => step(base, rate, window),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjust::policy::AdjustmentPolicy;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn rate(raw: &str) -> TaxRate {
        raw.parse().unwrap()
    }

    #[rstest]
    #[case("18", dec!(50))]
    #[case("17", dec!(100))]
    #[case("16", dec!(25))]
    #[case("25", dec!(4))]
    #[case("20", dec!(5))]
    #[case("100", dec!(1))]
    #[case("0", dec!(1))]
    #[case("17.5", dec!(40))]
    #[case("0.25", dec!(400))]
    fn test_integral_step(#[case] raw: &str, #[case] expected: Decimal) {
        assert_eq!(integral_step(&rate(raw)), Some(expected));
    }

    #[test]
    fn test_integral_step_makes_tax_integral() {
        for raw in ["1", "3", "5", "13", "17.5", "18", "99"] {
            let r = rate(raw);
            let step = integral_step(&r).unwrap();
            assert!(r.yields_integral_tax(step), "rate {raw} step {step}");
            assert!(r.yields_integral_tax(step * dec!(7)), "rate {raw}");
        }
    }

    #[test]
    fn test_scan_and_step_agree_on_1000_at_18_percent() {
        // 1001..=1020 holds no multiple of 50.
        let window = *AdjustmentPolicy::default().standard();
        assert_eq!(scan(dec!(1000), &rate("18"), &window), None);
        assert_eq!(step(dec!(1000), &rate("18"), &window), None);
    }

    #[test]
    fn test_scan_finds_first_grid_hit() {
        // 1000 at 20%: step 5, 1005 is the first multiple at or above 1001.
        let window = *AdjustmentPolicy::default().standard();
        assert_eq!(scan(dec!(1000), &rate("20"), &window), Some(dec!(1005)));
        assert_eq!(step(dec!(1000), &rate("20"), &window), Some(dec!(1005)));
    }

    #[test]
    fn test_step_reaches_values_between_grid_points() {
        // Scan candidates for 12345 are 12358, 12370, ... none divisible by 50.
        let window = *AdjustmentPolicy::default().standard();
        assert_eq!(scan(dec!(12345), &rate("18"), &window), None);
        assert_eq!(step(dec!(12345), &rate("18"), &window), Some(dec!(12400)));
    }

    #[test]
    fn test_third_schedule_window() {
        let policy = AdjustmentPolicy::default();
        let window = *policy.third_schedule().window();
        // 1000 at 17%: step 100, window [1005, 1020].
        assert_eq!(step(dec!(1000), &rate("17"), &window), None);
        // 2000 at 25%: step 4, window [2010, 2040], first multiple 2012.
        assert_eq!(step(dec!(2000), &rate("25"), &window), Some(dec!(2012)));
        assert_eq!(scan(dec!(2000), &rate("25"), &window), Some(dec!(2012)));
    }

    #[test]
    fn test_zero_rate_takes_lower_bound() {
        let window = *AdjustmentPolicy::default().standard();
        assert_eq!(step(dec!(999.5), &rate("0"), &window), Some(dec!(1001)));
        assert_eq!(scan(dec!(999.5), &rate("0"), &window), Some(dec!(1001)));
    }

    #[test]
    fn test_find_dispatches() {
        let window = *AdjustmentPolicy::default().standard();
        assert_eq!(
            find(SearchStrategy::Scan, dec!(12345), &rate("18"), &window),
            None
        );
        assert_eq!(
            find(SearchStrategy::Step, dec!(12345), &rate("18"), &window),
            Some(dec!(12400))
        );
    }
}
