//! Property-based tests for the value adjuster.
//!
//! - Exempt values stay inside the rounded 5% to 10% band
//! - Taxable values yield integral tax or equal the forced maximum
//! - A positive fixed value replaces the base for standard goods
//! - Adjusted values are non-negative integers
//! - Unusable values pass through untouched

use invoicegen_shared::config::ColumnConfig;
use invoicegen_shared::types::{CellValue, Row, TaxRate};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use super::adjuster::{Adjustment, BaseSource, ValueAdjuster};
use super::policy::RateClass;

const VALUE: &str = "Value of Sales Excluding Sales Tax";
const FIXED: &str = "Fixed / notified value or Retail Price / Toll Charges";

fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn rate_strategy() -> impl Strategy<Value = u32> {
    1u32..=100
}

fn row(rate: &str, sale_type: &str, value: Decimal) -> Row {
    Row::new()
        .with("Rate", rate)
        .with("Sale Type", sale_type)
        .with(VALUE, value.to_string())
}

fn round(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
}

fn expect_adjusted(adjustment: &Adjustment) -> super::adjuster::AdjustedValue {
    match adjustment {
        Adjustment::Adjusted(adjusted) => adjusted.clone(),
        Adjustment::PassThrough { error, .. } => panic!("unexpected pass-through: {error}"),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Exempt rows land in [round(v * 1.05), round(v * 1.10)].
    #[test]
    fn prop_exempt_within_band(value in amount_strategy(), seed in any::<u64>()) {
        let adjuster = ValueAdjuster::default();
        let result = adjuster.adjust(&row("exempt", "", value), &mut StdRng::seed_from_u64(seed));
        let adjusted = expect_adjusted(&result);

        prop_assert_eq!(adjusted.class, RateClass::Exempt);
        prop_assert!(adjusted.value >= round(value * dec!(1.05)));
        prop_assert!(adjusted.value <= round(value * dec!(1.10)));
    }

    /// 3rd schedule rows yield integral tax inside the window, or the forced 2%.
    #[test]
    fn prop_third_schedule_integral_or_maximum(
        value in amount_strategy(),
        rate in rate_strategy(),
    ) {
        let adjuster = ValueAdjuster::default();
        let input = row(&rate.to_string(), "3rd Schedule Goods", value);
        let result = adjuster.adjust(&input, &mut StdRng::seed_from_u64(0));
        let adjusted = expect_adjusted(&result);
        let tax_rate = TaxRate::new(Decimal::from(rate)).unwrap();
        let high = (value * dec!(1.02)).ceil();

        prop_assert_eq!(adjusted.class, RateClass::ThirdSchedule);
        prop_assert!(adjusted.value >= (value * dec!(1.005)).ceil());
        prop_assert!(adjusted.value <= high);
        if adjusted.within_window {
            prop_assert!(tax_rate.yields_integral_tax(adjusted.value));
        } else {
            prop_assert_eq!(adjusted.value, high);
        }
    }

    /// Standard rows yield integral tax inside the window, or the forced 2%.
    #[test]
    fn prop_standard_integral_or_maximum(
        value in amount_strategy(),
        rate in rate_strategy(),
    ) {
        let adjuster = ValueAdjuster::default();
        let input = row(&rate.to_string(), "Goods at standard rate (default)", value);
        let result = adjuster.adjust(&input, &mut StdRng::seed_from_u64(0));
        let adjusted = expect_adjusted(&result);
        let tax_rate = TaxRate::new(Decimal::from(rate)).unwrap();
        let high = (value * dec!(1.02)).ceil();

        prop_assert_eq!(adjusted.class, RateClass::Standard);
        prop_assert!(adjusted.value >= (value * dec!(1.001)).ceil());
        prop_assert!(adjusted.value <= high);
        if adjusted.within_window {
            prop_assert!(tax_rate.yields_integral_tax(adjusted.value));
        } else {
            prop_assert_eq!(adjusted.value, high);
        }
    }

    /// A positive fixed value becomes the base for standard goods.
    #[test]
    fn prop_fixed_value_is_base(
        value in amount_strategy(),
        fixed in amount_strategy(),
        rate in rate_strategy(),
    ) {
        let adjuster = ValueAdjuster::default();
        let input = row(&rate.to_string(), "", value).with(FIXED, fixed.to_string());
        let adjusted = expect_adjusted(&adjuster.adjust(&input, &mut StdRng::seed_from_u64(0)));

        prop_assert_eq!(adjusted.base, fixed);
        prop_assert_eq!(adjusted.base_source, BaseSource::Fixed);
        prop_assert!(adjusted.value >= (fixed * dec!(1.001)).ceil());
        prop_assert!(adjusted.value <= (fixed * dec!(1.02)).ceil());
    }

    /// Whatever the class, the new value is a non-negative integer cell.
    #[test]
    fn prop_value_is_non_negative_integer(
        value in amount_strategy(),
        rate in prop_oneof![Just("exempt".to_string()), rate_strategy().prop_map(|r| r.to_string())],
        third_schedule in any::<bool>(),
        seed in any::<u64>(),
    ) {
        let sale_type = if third_schedule { "3rd Schedule Goods" } else { "" };
        let adjuster = ValueAdjuster::default();
        let result = adjuster.adjust(&row(&rate, sale_type, value), &mut StdRng::seed_from_u64(seed));
        let adjusted = expect_adjusted(&result);

        prop_assert!(adjusted.value >= Decimal::ZERO);
        prop_assert!(adjusted.value.fract().is_zero());
        prop_assert!(matches!(result.value_cell(), CellValue::Number(n) if n.is_i64()));
    }

    /// Non-numeric values come back exactly as they were.
    #[test]
    fn prop_unusable_value_passes_through(raw in "[A-Za-z/ ]{1,12}", rate in rate_strategy()) {
        let input = Row::new().with("Rate", rate.to_string()).with(VALUE, raw.as_str());
        let adjuster = ValueAdjuster::default();
        let result = adjuster.adjust(&input, &mut StdRng::seed_from_u64(0));

        prop_assert!(result.error().is_some());
        prop_assert_eq!(result.value_cell(), CellValue::Text(raw));
        prop_assert!(result.patch(&ColumnConfig::default()).is_empty());
        prop_assert_eq!(adjuster.adjust_row(&input, &mut StdRng::seed_from_u64(0)), input);
    }
}
