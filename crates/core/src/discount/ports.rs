//! Read-only collaborators consulted during resolution.
//!
//! All ports are synchronous. Callers that load data asynchronously do so up
//! front and hand in a materialised [`DiscountSnapshot`](super::snapshot::DiscountSnapshot).

use crate::domain::campaign::{Campaign, CampaignId, Scope, TargetMode};
use crate::domain::context::EntityType;
use crate::domain::partner::PartnerId;
use crate::domain::partner_discount::PartnerDiscount;
use crate::errors::ApplicationError;

pub trait CampaignSource: Send + Sync {
    fn list_platform_campaigns(&self) -> Result<Vec<Campaign>, ApplicationError>;
    fn list_partner_campaigns(&self) -> Result<Vec<Campaign>, ApplicationError>;
    fn list_partner_discounts(&self) -> Result<Vec<PartnerDiscount>, ApplicationError>;
}

pub trait ChannelSettings: Send + Sync {
    /// Only meaningful for [`Scope::Delivery`].
    fn is_channel_discount_enabled(&self, scope: Scope) -> Result<bool, ApplicationError>;
}

pub trait EnablementOracle: Send + Sync {
    fn is_campaign_enabled_for_partner(
        &self,
        campaign_id: &CampaignId,
        partner_id: &PartnerId,
    ) -> Result<bool, ApplicationError>;
}

/// Platform target-mode checks that need user history or an entity catalog.
pub trait TargetingOracle: Send + Sync {
    fn is_new_user(&self, customer_id: Option<&str>) -> bool;

    fn entity_in_targets(
        &self,
        mode: TargetMode,
        target_ids: &[String],
        entity_type: EntityType,
        entity_id: Option<&str>,
    ) -> bool;
}

/// Interim default: no user-history or catalog integration exists yet, so every
/// targeted platform campaign passes its target-mode check.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAllTargeting;

impl TargetingOracle for AllowAllTargeting {
    fn is_new_user(&self, _customer_id: Option<&str>) -> bool {
        true
    }

    fn entity_in_targets(
        &self,
        _mode: TargetMode,
        _target_ids: &[String],
        _entity_type: EntityType,
        _entity_id: Option<&str>,
    ) -> bool {
        true
    }
}

impl<T: CampaignSource + ?Sized> CampaignSource for &T {
    fn list_platform_campaigns(&self) -> Result<Vec<Campaign>, ApplicationError> {
        (**self).list_platform_campaigns()
    }

    fn list_partner_campaigns(&self) -> Result<Vec<Campaign>, ApplicationError> {
        (**self).list_partner_campaigns()
    }

    fn list_partner_discounts(&self) -> Result<Vec<PartnerDiscount>, ApplicationError> {
        (**self).list_partner_discounts()
    }
}

impl<T: ChannelSettings + ?Sized> ChannelSettings for &T {
    fn is_channel_discount_enabled(&self, scope: Scope) -> Result<bool, ApplicationError> {
        (**self).is_channel_discount_enabled(scope)
    }
}

impl<T: EnablementOracle + ?Sized> EnablementOracle for &T {
    fn is_campaign_enabled_for_partner(
        &self,
        campaign_id: &CampaignId,
        partner_id: &PartnerId,
    ) -> Result<bool, ApplicationError> {
        (**self).is_campaign_enabled_for_partner(campaign_id, partner_id)
    }
}

impl<T: TargetingOracle + ?Sized> TargetingOracle for &T {
    fn is_new_user(&self, customer_id: Option<&str>) -> bool {
        (**self).is_new_user(customer_id)
    }

    fn entity_in_targets(
        &self,
        mode: TargetMode,
        target_ids: &[String],
        entity_type: EntityType,
        entity_id: Option<&str>,
    ) -> bool {
        (**self).entity_in_targets(mode, target_ids, entity_type, entity_id)
    }
}
