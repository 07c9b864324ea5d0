use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::campaign::{CampaignStatus, DiscountValue, Scope};
use crate::domain::context::EntityType;
use crate::domain::partner::PartnerId;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartnerDiscountId(pub String);

/// Restricts a standalone discount to one listing or service.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityLink {
    #[default]
    None,
    Listing(String),
    Service(String),
}

impl EntityLink {
    /// `None` links match every request; others need the same type and id.
    pub fn matches(&self, entity_type: EntityType, entity_id: Option<&str>) -> bool {
        let (expected_type, expected_id) = match self {
            Self::None => return true,
            Self::Listing(id) => (EntityType::Listing, id),
            Self::Service(id) => (EntityType::Service, id),
        };
        entity_type == expected_type && entity_id.is_some_and(|id| id.trim() == expected_id.trim())
    }
}

/// Legacy single-partner discount, carrying its partner directly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerDiscount {
    pub id: PartnerDiscountId,
    pub partner_id: PartnerId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub scope: Scope,
    pub status: CampaignStatus,
    pub is_active: bool,
    pub discount: DiscountValue,
    pub min_amount: Option<Decimal>,
    pub max_discount: Option<Decimal>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub related_entity: EntityLink,
    pub usage_limit_total: Option<u32>,
    #[serde(default)]
    pub used_count: u32,
}

impl PartnerDiscount {
    pub fn is_live(&self) -> bool {
        self.status == CampaignStatus::Active && self.is_active
    }

    /// Missing bounds leave that side of the window open.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        let started = self.valid_from.map_or(true, |from| from <= now);
        let not_ended = self.valid_until.map_or(true, |until| now <= until);
        started && not_ended
    }

    pub fn has_usage_available(&self) -> bool {
        self.usage_limit_total.map_or(true, |limit| self.used_count < limit)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let invalid = |reason: &str| DomainError::InvalidPartnerDiscount {
            id: self.id.0.clone(),
            reason: reason.to_string(),
        };

        if self.id.0.trim().is_empty() {
            return Err(invalid("id must not be empty"));
        }
        if !self.discount.is_valid() {
            return Err(invalid("discount value is out of range"));
        }
        if let (Some(from), Some(until)) = (self.valid_from, self.valid_until) {
            if from > until {
                return Err(invalid("valid_from is after valid_until"));
            }
        }
        if self.min_amount.is_some_and(|value| value < Decimal::ZERO)
            || self.max_discount.is_some_and(|value| value < Decimal::ZERO)
        {
            return Err(invalid("amount bounds must be >= 0"));
        }
        if self.usage_limit_total == Some(0) {
            return Err(invalid("usage_limit_total must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::{EntityLink, PartnerDiscount, PartnerDiscountId};
    use crate::domain::campaign::{CampaignStatus, DiscountValue, Scope};
    use crate::domain::context::EntityType;
    use crate::domain::partner::PartnerId;

    fn discount() -> PartnerDiscount {
        PartnerDiscount {
            id: PartnerDiscountId("PD-1".to_string()),
            partner_id: PartnerId::parse("acme").expect("partner"),
            title: "Move-in week".to_string(),
            description: String::new(),
            scope: Scope::RealEstate,
            status: CampaignStatus::Active,
            is_active: true,
            discount: DiscountValue::amount(Decimal::new(5_000, 0)),
            min_amount: None,
            max_discount: None,
            valid_from: None,
            valid_until: None,
            related_entity: EntityLink::None,
            usage_limit_total: None,
            used_count: 0,
        }
    }

    #[test]
    fn entity_link_requires_type_and_id() {
        let link = EntityLink::Listing("42".to_string());
        assert!(link.matches(EntityType::Listing, Some("42")));
        assert!(!link.matches(EntityType::Service, Some("42")));
        assert!(!link.matches(EntityType::Listing, Some("43")));
        assert!(!link.matches(EntityType::Listing, None));
        assert!(EntityLink::None.matches(EntityType::None, None));
    }

    #[test]
    fn open_ended_window_is_always_valid() {
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).single().expect("now");
        let mut record = discount();
        assert!(record.is_valid_at(now));

        record.valid_from = Some(now);
        record.valid_until = Some(now);
        assert!(record.is_valid_at(now));
        assert!(!record.is_valid_at(now + Duration::milliseconds(1)));
        assert!(!record.is_valid_at(now - Duration::milliseconds(1)));
    }

    #[test]
    fn live_requires_status_and_flag() {
        let mut record = discount();
        assert!(record.is_live());
        record.is_active = false;
        assert!(!record.is_live());
        record.is_active = true;
        record.status = CampaignStatus::Paused;
        assert!(!record.is_live());
    }

    #[test]
    fn inverted_window_fails_validation() {
        let now = Utc::now();
        let mut record = discount();
        record.valid_from = Some(now);
        record.valid_until = Some(now - Duration::days(1));
        assert!(record.validate().is_err());
    }
}
