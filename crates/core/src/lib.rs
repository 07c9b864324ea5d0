pub mod config;
pub mod discount;
pub mod domain;
pub mod errors;

pub use discount::calculator::{
    apply_discount, DiscountCalculator, PriceBreakdown, StandardDiscountCalculator,
};
pub use discount::normalizer::{
    LegacyCampaignRecord, LegacyPartnerDiscountRecord, LegacyScalar, NormalizeError,
};
pub use discount::ports::{
    AllowAllTargeting, CampaignSource, ChannelSettings, EnablementOracle, TargetingOracle,
};
pub use discount::resolved::{DiscountProvenance, ResolvedDiscount};
pub use discount::resolver::{DiscountResolver, EligibilityResolver};
pub use discount::snapshot::DiscountSnapshot;
pub use discount::{DeterministicDiscountRuntime, DiscountQuote, DiscountRuntime};
pub use domain::campaign::{
    Campaign, CampaignAudience, CampaignId, CampaignRules, CampaignStatus, DiscountKind,
    DiscountValue, Owner, PartnerEligibility, PlatformTargeting, Scope, Stacking, TargetMode,
    ValidityWindow,
};
pub use domain::context::{EntityType, RequestContext};
pub use domain::partner::PartnerId;
pub use domain::partner_discount::{EntityLink, PartnerDiscount, PartnerDiscountId};
pub use errors::{ApplicationError, DomainError, InterfaceError};
