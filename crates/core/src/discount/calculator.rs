use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::discount::resolved::ResolvedDiscount;
use crate::domain::campaign::DiscountKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub final_amount: Decimal,
    pub saved_amount: Decimal,
}

impl PriceBreakdown {
    pub fn unchanged(amount: Decimal) -> Self {
        Self { final_amount: amount, saved_amount: Decimal::ZERO }
    }
}

pub trait DiscountCalculator: Send + Sync {
    fn apply(&self, amount: Decimal, discount: Option<&ResolvedDiscount>) -> PriceBreakdown;
}

/// Rounds to the currency's minor unit, half away from zero.
#[derive(Clone, Copy, Debug)]
pub struct StandardDiscountCalculator {
    minor_unit_digits: u32,
}

impl Default for StandardDiscountCalculator {
    fn default() -> Self {
        Self::new(0)
    }
}

impl StandardDiscountCalculator {
    pub fn new(minor_unit_digits: u32) -> Self {
        Self { minor_unit_digits }
    }
}

impl DiscountCalculator for StandardDiscountCalculator {
    fn apply(&self, amount: Decimal, discount: Option<&ResolvedDiscount>) -> PriceBreakdown {
        apply_discount(amount, discount, self.minor_unit_digits)
    }
}

/// Never fails: a discount that cannot apply leaves the amount unchanged.
pub fn apply_discount(
    amount: Decimal,
    discount: Option<&ResolvedDiscount>,
    minor_unit_digits: u32,
) -> PriceBreakdown {
    let Some(discount) = discount else {
        return PriceBreakdown::unchanged(amount);
    };
    if amount <= Decimal::ZERO {
        return PriceBreakdown::unchanged(amount);
    }
    if let Some(reason) = invalid_reason(discount) {
        warn!(
            event_name = "discount.apply.invalid",
            discount_id = %discount.id,
            reason,
            "discount ignored; charging full price"
        );
        return PriceBreakdown::unchanged(amount);
    }
    if discount.min_amount.is_some_and(|min_amount| amount < min_amount) {
        return PriceBreakdown::unchanged(amount);
    }

    // Both outputs land on the minor unit: the amount is rounded first, then
    // the saving, and the final amount is their difference.
    let amount = round_to_minor_unit(amount, minor_unit_digits);
    let raw_saved = match discount.discount_type {
        DiscountKind::Percent => {
            let saved = amount * discount.value / Decimal::ONE_HUNDRED;
            match discount.max_discount {
                Some(max_discount) if saved > max_discount => max_discount,
                _ => saved,
            }
        }
        DiscountKind::Amount => discount.value.min(amount),
    };

    let saved = round_to_minor_unit(raw_saved.min(amount), minor_unit_digits);
    let final_amount = amount - saved;
    if final_amount < Decimal::ZERO {
        return PriceBreakdown { final_amount: Decimal::ZERO, saved_amount: amount };
    }

    PriceBreakdown { final_amount, saved_amount: saved }
}

fn round_to_minor_unit(value: Decimal, minor_unit_digits: u32) -> Decimal {
    value.round_dp_with_strategy(minor_unit_digits, RoundingStrategy::MidpointAwayFromZero)
}

fn invalid_reason(discount: &ResolvedDiscount) -> Option<&'static str> {
    match discount.discount_type {
        DiscountKind::Percent
            if discount.value <= Decimal::ZERO || discount.value > Decimal::ONE_HUNDRED =>
        {
            return Some("percent_out_of_range");
        }
        DiscountKind::Amount if discount.value <= Decimal::ZERO => {
            return Some("amount_not_positive");
        }
        _ => {}
    }
    if discount.min_amount.is_some_and(|value| value < Decimal::ZERO)
        || discount.max_discount.is_some_and(|value| value < Decimal::ZERO)
    {
        return Some("negative_bound");
    }
    None
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{apply_discount, DiscountCalculator, PriceBreakdown, StandardDiscountCalculator};
    use crate::discount::resolved::{DiscountProvenance, ResolvedDiscount};
    use crate::domain::campaign::{DiscountKind, Stacking};

    fn discount(kind: DiscountKind, value: i64) -> ResolvedDiscount {
        ResolvedDiscount {
            id: "D-1".to_string(),
            title: "Test".to_string(),
            description: String::new(),
            discount_type: kind,
            value: Decimal::new(value, 0),
            min_amount: None,
            max_discount: None,
            stacking: Stacking::NotAllowed,
            provenance: DiscountProvenance::PlatformCampaign,
        }
    }

    fn dec(value: i64) -> Decimal {
        Decimal::new(value, 0)
    }

    fn apply(amount: Decimal, discount: &ResolvedDiscount) -> PriceBreakdown {
        StandardDiscountCalculator::default().apply(amount, Some(discount))
    }

    #[test]
    fn missing_discount_or_non_positive_amount_is_unchanged() {
        let calculator = StandardDiscountCalculator::default();
        assert_eq!(calculator.apply(dec(5_000), None), PriceBreakdown::unchanged(dec(5_000)));

        let ten_percent = discount(DiscountKind::Percent, 10);
        assert_eq!(apply(Decimal::ZERO, &ten_percent), PriceBreakdown::unchanged(Decimal::ZERO));
        assert_eq!(apply(dec(-100), &ten_percent), PriceBreakdown::unchanged(dec(-100)));
    }

    #[test]
    fn percent_discount_is_clamped_to_maximum() {
        let mut half = discount(DiscountKind::Percent, 50);
        half.max_discount = Some(dec(1_000));

        let result = apply(dec(5_000), &half);
        assert_eq!(result.saved_amount, dec(1_000));
        assert_eq!(result.final_amount, dec(4_000));
    }

    #[test]
    fn fixed_amount_never_goes_negative() {
        let result = apply(dec(7_000), &discount(DiscountKind::Amount, 10_000));
        assert_eq!(result.final_amount, Decimal::ZERO);
        assert_eq!(result.saved_amount, dec(7_000));
    }

    #[test]
    fn minimum_amount_gate_is_a_silent_no_op() {
        let mut fixed = discount(DiscountKind::Amount, 5_000);
        fixed.min_amount = Some(dec(50_000));

        assert_eq!(apply(dec(49_999), &fixed), PriceBreakdown::unchanged(dec(49_999)));
        assert_eq!(apply(dec(50_000), &fixed).saved_amount, dec(5_000));
    }

    #[test]
    fn rounding_is_half_up_at_the_minor_unit() {
        let fifteen = discount(DiscountKind::Percent, 15);

        let whole_units = apply(dec(1_003), &fifteen);
        assert_eq!(whole_units.saved_amount, dec(150));
        assert_eq!(whole_units.final_amount, dec(853));

        let midpoint = apply(dec(10), &fifteen);
        assert_eq!(midpoint.saved_amount, dec(2));
        assert_eq!(midpoint.final_amount, dec(8));

        let cents = apply_discount(Decimal::new(1_999, 2), Some(&fifteen), 2);
        assert_eq!(cents.saved_amount, Decimal::new(300, 2));
        assert_eq!(cents.final_amount, Decimal::new(1_699, 2));
    }

    #[test]
    fn amounts_finer_than_the_minor_unit_are_rounded_on_both_sides() {
        let ten_percent = discount(DiscountKind::Percent, 10);

        let result = apply_discount(Decimal::new(1_800_050, 2), Some(&ten_percent), 0);
        assert_eq!(result.final_amount, result.final_amount.round_dp(0));
        assert_eq!(result.saved_amount, result.saved_amount.round_dp(0));
        assert_eq!(result.saved_amount, dec(1_800));
        assert_eq!(result.final_amount, dec(16_201));
        assert_eq!(result.final_amount + result.saved_amount, dec(18_001));

        let cents = apply_discount(Decimal::new(100_005, 3), Some(&ten_percent), 2);
        assert_eq!(cents.saved_amount, Decimal::new(1_000, 2));
        assert_eq!(cents.final_amount, Decimal::new(9_001, 2));
    }

    #[test]
    fn final_plus_saved_always_equals_amount() {
        let mut capped = discount(DiscountKind::Percent, 33);
        capped.max_discount = Some(dec(250));
        let shapes = [
            discount(DiscountKind::Percent, 33),
            discount(DiscountKind::Percent, 100),
            discount(DiscountKind::Amount, 999),
            discount(DiscountKind::Amount, 100_000),
            capped,
        ];

        for shape in &shapes {
            for amount in [1, 7, 99, 1_001, 12_345, 99_999] {
                let amount = dec(amount);
                let result = apply(amount, shape);
                assert_eq!(result.final_amount + result.saved_amount, amount, "{shape:?}");
                assert!(result.final_amount >= Decimal::ZERO);
            }
        }
    }

    #[test]
    fn invalid_discount_values_leave_price_unchanged() {
        let too_much = discount(DiscountKind::Percent, 150);
        assert_eq!(apply(dec(1_000), &too_much), PriceBreakdown::unchanged(dec(1_000)));

        let zero_fixed = discount(DiscountKind::Amount, 0);
        assert_eq!(apply(dec(1_000), &zero_fixed), PriceBreakdown::unchanged(dec(1_000)));

        let mut negative_cap = discount(DiscountKind::Percent, 10);
        negative_cap.max_discount = Some(dec(-5));
        assert_eq!(apply(dec(1_000), &negative_cap), PriceBreakdown::unchanged(dec(1_000)));
    }
}
