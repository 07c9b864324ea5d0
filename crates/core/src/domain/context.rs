use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::campaign::Scope;
use crate::domain::partner::PartnerId;
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Listing,
    Service,
    #[default]
    None,
}

impl std::str::FromStr for EntityType {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "listing" => Ok(Self::Listing),
            "service" => Ok(Self::Service),
            "none" | "" => Ok(Self::None),
            other => Err(DomainError::InvariantViolation(format!(
                "unsupported entity type `{other}` (expected listing|service|none)"
            ))),
        }
    }
}

/// Input of a single resolution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub partner_id: Option<PartnerId>,
    pub scope: Scope,
    pub entity_type: EntityType,
    pub entity_id: Option<String>,
    /// Only consulted by targeting checks.
    pub customer_id: Option<String>,
    pub now: DateTime<Utc>,
}

impl RequestContext {
    /// Context evaluated at wall-clock time. A blank partner id yields no partner.
    pub fn new(partner_id: &str, scope: Scope) -> Self {
        Self {
            partner_id: PartnerId::parse(partner_id),
            scope,
            entity_type: EntityType::None,
            entity_id: None,
            customer_id: None,
            now: Utc::now(),
        }
    }

    pub fn with_entity(mut self, entity_type: EntityType, entity_id: impl Into<String>) -> Self {
        self.entity_type = entity_type;
        self.entity_id = Some(entity_id.into());
        self
    }

    pub fn with_customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{EntityType, RequestContext};
    use crate::domain::campaign::Scope;

    #[test]
    fn builder_sets_entity_and_instant() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).single().expect("instant");
        let context = RequestContext::new("acme", Scope::RealEstate)
            .with_entity(EntityType::Listing, "42")
            .at(at);

        assert_eq!(context.partner_id.as_ref().map(|id| id.as_str()), Some("acme"));
        assert_eq!(context.entity_type, EntityType::Listing);
        assert_eq!(context.entity_id.as_deref(), Some("42"));
        assert_eq!(context.now, at);
    }

    #[test]
    fn blank_partner_is_absent() {
        assert!(RequestContext::new("  ", Scope::Delivery).partner_id.is_none());
    }

    #[test]
    fn entity_type_parses_case_insensitively() {
        assert_eq!("LISTING".parse::<EntityType>().ok(), Some(EntityType::Listing));
        assert_eq!("service".parse::<EntityType>().ok(), Some(EntityType::Service));
        assert!("room".parse::<EntityType>().is_err());
    }
}
