pub mod calculator;
pub mod normalizer;
pub mod ports;
pub mod resolved;
pub mod resolver;
pub mod snapshot;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::context::RequestContext;
use crate::errors::ApplicationError;

use self::{
    calculator::{DiscountCalculator, PriceBreakdown, StandardDiscountCalculator},
    resolved::ResolvedDiscount,
    resolver::DiscountResolver,
};

/// Outcome of resolving and applying a discount to one amount.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountQuote {
    pub amount: Decimal,
    pub discount: Option<ResolvedDiscount>,
    pub price: PriceBreakdown,
}

pub trait DiscountRuntime: Send + Sync {
    fn quote(
        &self,
        context: &RequestContext,
        amount: Decimal,
    ) -> Result<DiscountQuote, ApplicationError>;
}

pub struct DeterministicDiscountRuntime<R, K = StandardDiscountCalculator> {
    resolver: R,
    calculator: K,
}

impl<R, K> DeterministicDiscountRuntime<R, K> {
    pub fn new(resolver: R, calculator: K) -> Self {
        Self { resolver, calculator }
    }
}

impl<R, K> DiscountRuntime for DeterministicDiscountRuntime<R, K>
where
    R: DiscountResolver,
    K: DiscountCalculator,
{
    fn quote(
        &self,
        context: &RequestContext,
        amount: Decimal,
    ) -> Result<DiscountQuote, ApplicationError> {
        let discount = self.resolver.resolve(context)?;
        let price = self.calculator.apply(amount, discount.as_ref());

        Ok(DiscountQuote { amount, discount, price })
    }
}
