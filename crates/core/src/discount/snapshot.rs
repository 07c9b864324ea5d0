use std::collections::{HashMap, HashSet};

use crate::discount::ports::{CampaignSource, ChannelSettings, EnablementOracle};
use crate::domain::campaign::{Campaign, CampaignId, Owner, Scope};
use crate::domain::partner::PartnerId;
use crate::domain::partner_discount::PartnerDiscount;
use crate::errors::ApplicationError;

/// Materialised copy of everything the resolver reads, taken at one instant.
///
/// Campaign lists keep insertion order because the resolver's "first match
/// wins" rule depends on it.
#[derive(Clone, Debug)]
pub struct DiscountSnapshot {
    platform_campaigns: Vec<Campaign>,
    partner_campaigns: Vec<Campaign>,
    partner_discounts: Vec<PartnerDiscount>,
    enablements: HashSet<(CampaignId, PartnerId)>,
    channel_toggles: HashMap<Scope, bool>,
    channel_default: bool,
}

impl Default for DiscountSnapshot {
    fn default() -> Self {
        Self::new(true)
    }
}

impl DiscountSnapshot {
    /// `channel_default` answers the channel gate when no toggle was stored.
    pub fn new(channel_default: bool) -> Self {
        Self {
            platform_campaigns: Vec::new(),
            partner_campaigns: Vec::new(),
            partner_discounts: Vec::new(),
            enablements: HashSet::new(),
            channel_toggles: HashMap::new(),
            channel_default,
        }
    }

    /// Routes the campaign into the pool matching its owner.
    pub fn push_campaign(&mut self, campaign: Campaign) {
        match campaign.owner() {
            Owner::Platform => self.platform_campaigns.push(campaign),
            Owner::Partner => self.partner_campaigns.push(campaign),
        }
    }

    pub fn push_partner_discount(&mut self, discount: PartnerDiscount) {
        self.partner_discounts.push(discount);
    }

    pub fn enable_for_partner(&mut self, campaign_id: CampaignId, partner_id: PartnerId) {
        self.enablements.insert((campaign_id, partner_id));
    }

    pub fn set_channel_enabled(&mut self, scope: Scope, enabled: bool) {
        self.channel_toggles.insert(scope, enabled);
    }

    pub fn with_campaigns(mut self, campaigns: impl IntoIterator<Item = Campaign>) -> Self {
        campaigns.into_iter().for_each(|campaign| self.push_campaign(campaign));
        self
    }

    pub fn with_partner_discounts(
        mut self,
        discounts: impl IntoIterator<Item = PartnerDiscount>,
    ) -> Self {
        self.partner_discounts.extend(discounts);
        self
    }

    pub fn platform_campaigns(&self) -> &[Campaign] {
        &self.platform_campaigns
    }

    pub fn partner_campaigns(&self) -> &[Campaign] {
        &self.partner_campaigns
    }

    pub fn partner_discounts(&self) -> &[PartnerDiscount] {
        &self.partner_discounts
    }

    pub fn enablement_count(&self) -> usize {
        self.enablements.len()
    }
}

impl CampaignSource for DiscountSnapshot {
    fn list_platform_campaigns(&self) -> Result<Vec<Campaign>, ApplicationError> {
        Ok(self.platform_campaigns.clone())
    }

    fn list_partner_campaigns(&self) -> Result<Vec<Campaign>, ApplicationError> {
        Ok(self.partner_campaigns.clone())
    }

    fn list_partner_discounts(&self) -> Result<Vec<PartnerDiscount>, ApplicationError> {
        Ok(self.partner_discounts.clone())
    }
}

impl ChannelSettings for DiscountSnapshot {
    fn is_channel_discount_enabled(&self, scope: Scope) -> Result<bool, ApplicationError> {
        Ok(self.channel_toggles.get(&scope).copied().unwrap_or(self.channel_default))
    }
}

impl EnablementOracle for DiscountSnapshot {
    fn is_campaign_enabled_for_partner(
        &self,
        campaign_id: &CampaignId,
        partner_id: &PartnerId,
    ) -> Result<bool, ApplicationError> {
        Ok(self.enablements.contains(&(campaign_id.clone(), partner_id.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::DiscountSnapshot;
    use crate::discount::ports::{ChannelSettings, EnablementOracle};
    use crate::domain::campaign::{CampaignId, Scope};
    use crate::domain::partner::PartnerId;

    #[test]
    fn channel_toggle_falls_back_to_default() {
        let mut snapshot = DiscountSnapshot::new(false);
        assert_eq!(snapshot.is_channel_discount_enabled(Scope::Delivery), Ok(false));

        snapshot.set_channel_enabled(Scope::Delivery, true);
        assert_eq!(snapshot.is_channel_discount_enabled(Scope::Delivery), Ok(true));
    }

    #[test]
    fn enablement_uses_canonical_partner_identity() {
        let mut snapshot = DiscountSnapshot::default();
        snapshot.enable_for_partner(
            CampaignId("CMP-7".to_string()),
            PartnerId::parse("partner_acme").expect("partner"),
        );

        let acme = PartnerId::parse("acme@offerly.example").expect("partner");
        assert_eq!(
            snapshot.is_campaign_enabled_for_partner(&CampaignId("CMP-7".to_string()), &acme),
            Ok(true)
        );
        assert_eq!(
            snapshot.is_campaign_enabled_for_partner(&CampaignId("CMP-8".to_string()), &acme),
            Ok(false)
        );
    }
}
