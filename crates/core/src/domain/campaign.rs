use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::partner::PartnerId;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CampaignId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Owner {
    Platform,
    Partner,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Scope {
    RealEstate,
    Delivery,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RealEstate => "REAL_ESTATE",
            Self::Delivery => "DELIVERY",
        }
    }
}

impl std::str::FromStr for Scope {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "real_estate" | "realestate" => Ok(Self::RealEstate),
            "delivery" => Ok(Self::Delivery),
            other => Err(DomainError::InvariantViolation(format!(
                "unsupported scope `{other}` (expected real_estate|delivery)"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampaignStatus {
    Draft,
    Active,
    Paused,
    Expired,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountKind {
    Percent,
    Amount,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountValue {
    pub kind: DiscountKind,
    pub value: Decimal,
}

impl DiscountValue {
    pub fn percent(value: Decimal) -> Self {
        Self { kind: DiscountKind::Percent, value }
    }

    pub fn amount(value: Decimal) -> Self {
        Self { kind: DiscountKind::Amount, value }
    }

    /// `Percent` must lie in `(0, 100]`, `Amount` must be positive.
    pub fn is_valid(&self) -> bool {
        match self.kind {
            DiscountKind::Percent => {
                self.value > Decimal::ZERO && self.value <= Decimal::ONE_HUNDRED
            }
            DiscountKind::Amount => self.value > Decimal::ZERO,
        }
    }
}

/// Inclusive validity window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityWindow {
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

impl ValidityWindow {
    pub fn new(start_at: DateTime<Utc>, end_at: DateTime<Utc>) -> Self {
        Self { start_at, end_at }
    }

    pub fn is_well_formed(&self) -> bool {
        self.start_at <= self.end_at
    }

    /// An inverted window contains nothing.
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.start_at <= now && now <= self.end_at
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetMode {
    AllUsers,
    NewUsersOnly,
    Category,
    Service,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformTargeting {
    pub mode: TargetMode,
    #[serde(default)]
    pub target_ids: Vec<String>,
}

impl PlatformTargeting {
    pub fn all_users() -> Self {
        Self { mode: TargetMode::AllUsers, target_ids: Vec::new() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "partner_ids", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartnerEligibility {
    AllPartnersInDomain,
    SelectPartners(Vec<PartnerId>),
}

impl PartnerEligibility {
    /// Exact membership on the raw identifier, falling back to its local part.
    pub fn admits(&self, partner: &PartnerId) -> bool {
        match self {
            Self::AllPartnersInDomain => true,
            Self::SelectPartners(partner_ids) => partner_ids.iter().any(|candidate| {
                candidate.as_str() == partner.as_str() || candidate.as_str() == partner.local_part()
            }),
        }
    }
}

/// Owner-specific campaign fields. The variant is the owner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "owner", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampaignAudience {
    Platform { targeting: PlatformTargeting },
    Partner {
        /// Partner whose settlement funds the campaign, when known.
        #[serde(default)]
        sponsor: Option<PartnerId>,
        eligibility: PartnerEligibility,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stacking {
    #[default]
    NotAllowed,
    Allowed,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignRules {
    #[serde(default)]
    pub stacking: Stacking,
    pub minimum_amount: Option<Decimal>,
    pub maximum_discount: Option<Decimal>,
    pub usage_limit_total: Option<u32>,
    pub usage_limit_per_user: Option<u32>,
}

impl CampaignRules {
    fn validate(&self) -> Result<(), String> {
        if self.minimum_amount.is_some_and(|value| value < Decimal::ZERO) {
            return Err("rules.minimum_amount must be >= 0".to_string());
        }
        if self.maximum_discount.is_some_and(|value| value < Decimal::ZERO) {
            return Err("rules.maximum_discount must be >= 0".to_string());
        }
        if self.usage_limit_total == Some(0) {
            return Err("rules.usage_limit_total must be positive".to_string());
        }
        if self.usage_limit_per_user == Some(0) {
            return Err("rules.usage_limit_per_user must be positive".to_string());
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub scope: Scope,
    pub status: CampaignStatus,
    pub discount: DiscountValue,
    pub window: ValidityWindow,
    #[serde(flatten)]
    pub audience: CampaignAudience,
    #[serde(default)]
    pub rules: CampaignRules,
    #[serde(default)]
    pub used_count: u32,
}

impl Campaign {
    pub fn owner(&self) -> Owner {
        match self.audience {
            CampaignAudience::Platform { .. } => Owner::Platform,
            CampaignAudience::Partner { .. } => Owner::Partner,
        }
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status == CampaignStatus::Active && self.window.contains(now)
    }

    pub fn has_usage_available(&self) -> bool {
        self.rules.usage_limit_total.map_or(true, |limit| self.used_count < limit)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let invalid =
            |reason: String| DomainError::InvalidCampaign { id: self.id.0.clone(), reason };

        if self.id.0.trim().is_empty() {
            return Err(invalid("id must not be empty".to_string()));
        }
        if !self.discount.is_valid() {
            return Err(invalid(format!(
                "{:?} discount value {} is out of range",
                self.discount.kind, self.discount.value
            )));
        }
        if !self.window.is_well_formed() {
            return Err(invalid("start_at is after end_at".to_string()));
        }

        match &self.audience {
            CampaignAudience::Platform { targeting } => {
                if targeting.mode != TargetMode::AllUsers && targeting.target_ids.is_empty() {
                    return Err(invalid(format!(
                        "target_ids are required for target mode {:?}",
                        targeting.mode
                    )));
                }
            }
            CampaignAudience::Partner { eligibility, .. } => {
                if matches!(eligibility, PartnerEligibility::SelectPartners(ids) if ids.is_empty())
                {
                    return Err(invalid(
                        "partner_ids are required for SELECT_PARTNERS".to_string(),
                    ));
                }
            }
        }

        self.rules.validate().map_err(invalid)
    }
}
