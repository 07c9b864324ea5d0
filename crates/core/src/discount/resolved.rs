use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::campaign::{Campaign, CampaignAudience, DiscountKind, Stacking};
use crate::domain::partner_discount::PartnerDiscount;

/// Which pool a resolved discount came from, kept for settlement auditing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountProvenance {
    PlatformCampaign,
    PartnerCampaign,
    PartnerDiscount,
}

impl DiscountProvenance {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PlatformCampaign => "PLATFORM_CAMPAIGN",
            Self::PartnerCampaign => "PARTNER_CAMPAIGN",
            Self::PartnerDiscount => "PARTNER_DISCOUNT",
        }
    }

    /// Partner-funded discounts are charged back to the partner's settlement.
    pub fn is_partner_funded(self) -> bool {
        !matches!(self, Self::PlatformCampaign)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDiscount {
    pub id: String,
    pub title: String,
    pub description: String,
    pub discount_type: DiscountKind,
    pub value: Decimal,
    pub min_amount: Option<Decimal>,
    pub max_discount: Option<Decimal>,
    pub stacking: Stacking,
    #[serde(rename = "type")]
    pub provenance: DiscountProvenance,
}

impl ResolvedDiscount {
    pub fn from_campaign(campaign: &Campaign) -> Self {
        let provenance = match campaign.audience {
            CampaignAudience::Platform { .. } => DiscountProvenance::PlatformCampaign,
            CampaignAudience::Partner { .. } => DiscountProvenance::PartnerCampaign,
        };

        Self {
            id: campaign.id.0.clone(),
            title: campaign.title.clone(),
            description: campaign.description.clone(),
            discount_type: campaign.discount.kind,
            value: campaign.discount.value,
            min_amount: campaign.rules.minimum_amount,
            max_discount: campaign.rules.maximum_discount,
            stacking: campaign.rules.stacking,
            provenance,
        }
    }

    /// Standalone partner discounts never stack.
    pub fn from_partner_discount(discount: &PartnerDiscount) -> Self {
        Self {
            id: discount.id.0.clone(),
            title: discount.title.clone(),
            description: discount.description.clone(),
            discount_type: discount.discount.kind,
            value: discount.discount.value,
            min_amount: discount.min_amount,
            max_discount: discount.max_discount,
            stacking: Stacking::NotAllowed,
            provenance: DiscountProvenance::PartnerDiscount,
        }
    }
}
