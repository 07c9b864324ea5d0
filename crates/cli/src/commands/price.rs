use std::str::FromStr;

use offerly_core::discount::calculator::StandardDiscountCalculator;
use offerly_core::discount::resolver::EligibilityResolver;
use offerly_core::discount::{DeterministicDiscountRuntime, DiscountRuntime};
use rust_decimal::Decimal;
use serde_json::json;

use crate::commands::resolve::{load_store_snapshot, resolution_failure, ResolveArgs};
use crate::commands::CommandResult;

pub fn run(amount: &str, args: &ResolveArgs) -> CommandResult {
    let amount = match parse_amount(amount) {
        Ok(amount) => amount,
        Err(message) => return CommandResult::failure("price", "invalid_input", message, 6),
    };
    let context = match args.to_context() {
        Ok(context) => context,
        Err(message) => return CommandResult::failure("price", "invalid_input", message, 6),
    };
    let (config, snapshot) = match load_store_snapshot("price") {
        Ok(loaded) => loaded,
        Err(failure) => return failure,
    };

    let runtime = DeterministicDiscountRuntime::new(
        EligibilityResolver::new(&snapshot, &snapshot, &snapshot),
        StandardDiscountCalculator::new(config.pricing.minor_unit_digits),
    );

    match runtime.quote(&context, amount) {
        Ok(quote) => CommandResult::success_with_data(
            "price",
            format!(
                "{amount} {currency} -> {final_amount} {currency}",
                amount = quote.amount,
                final_amount = quote.price.final_amount,
                currency = config.pricing.currency,
            ),
            json!({ "currency": config.pricing.currency, "quote": quote }),
        ),
        Err(error) => resolution_failure("price", error),
    }
}

fn parse_amount(raw: &str) -> Result<Decimal, String> {
    let amount = Decimal::from_str(raw.trim().replace(',', "").as_str())
        .map_err(|error| format!("invalid amount `{raw}`: {error}"))?;
    if amount < Decimal::ZERO {
        return Err(format!("invalid amount `{raw}`: must not be negative"));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::parse_amount;

    #[test]
    fn amounts_accept_grouping_separators() {
        assert_eq!(parse_amount("100,000"), Ok(Decimal::from(100_000)));
        assert_eq!(parse_amount(" 18000.50 "), Ok(Decimal::new(1_800_050, 2)));
    }

    #[test]
    fn negative_and_garbage_amounts_are_rejected() {
        assert!(parse_amount("-1").is_err());
        assert!(parse_amount("ten").is_err());
    }
}
