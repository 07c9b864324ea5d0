use std::collections::{HashMap, HashSet};

use tokio::sync::RwLock;

use offerly_core::domain::campaign::{Campaign, CampaignId, Owner, Scope};
use offerly_core::domain::partner::PartnerId;
use offerly_core::domain::partner_discount::PartnerDiscount;

use super::{
    CampaignRepository, ChannelSettingsRepository, EnablementRepository,
    PartnerDiscountRepository, RepositoryError,
};

#[derive(Default)]
pub struct InMemoryCampaignRepository {
    campaigns: RwLock<Vec<Campaign>>,
}

#[async_trait::async_trait]
impl CampaignRepository for InMemoryCampaignRepository {
    async fn list_by_owner(&self, owner: Owner) -> Result<Vec<Campaign>, RepositoryError> {
        let campaigns = self.campaigns.read().await;
        Ok(campaigns.iter().filter(|campaign| campaign.owner() == owner).cloned().collect())
    }

    async fn find_by_id(&self, id: &CampaignId) -> Result<Option<Campaign>, RepositoryError> {
        let campaigns = self.campaigns.read().await;
        Ok(campaigns.iter().find(|campaign| campaign.id == *id).cloned())
    }

    async fn save(&self, campaign: Campaign) -> Result<(), RepositoryError> {
        campaign.validate()?;
        let mut campaigns = self.campaigns.write().await;
        match campaigns.iter_mut().find(|existing| existing.id == campaign.id) {
            Some(slot) => *slot = campaign,
            None => campaigns.push(campaign),
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryPartnerDiscountRepository {
    discounts: RwLock<Vec<PartnerDiscount>>,
}

#[async_trait::async_trait]
impl PartnerDiscountRepository for InMemoryPartnerDiscountRepository {
    async fn list(&self) -> Result<Vec<PartnerDiscount>, RepositoryError> {
        Ok(self.discounts.read().await.clone())
    }

    async fn save(&self, discount: PartnerDiscount) -> Result<(), RepositoryError> {
        discount.validate()?;
        let mut discounts = self.discounts.write().await;
        match discounts.iter_mut().find(|existing| existing.id == discount.id) {
            Some(slot) => *slot = discount,
            None => discounts.push(discount),
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryEnablementRepository {
    enabled: RwLock<HashSet<(CampaignId, PartnerId)>>,
}

#[async_trait::async_trait]
impl EnablementRepository for InMemoryEnablementRepository {
    async fn list_enabled(&self) -> Result<Vec<(CampaignId, PartnerId)>, RepositoryError> {
        Ok(self.enabled.read().await.iter().cloned().collect())
    }

    async fn set_enabled(
        &self,
        campaign_id: &CampaignId,
        partner_id: &PartnerId,
        enabled: bool,
    ) -> Result<(), RepositoryError> {
        let mut entries = self.enabled.write().await;
        let pair = (campaign_id.clone(), partner_id.clone());
        if enabled {
            entries.insert(pair);
        } else {
            entries.remove(&pair);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryChannelSettingsRepository {
    toggles: RwLock<HashMap<Scope, bool>>,
}

#[async_trait::async_trait]
impl ChannelSettingsRepository for InMemoryChannelSettingsRepository {
    async fn find(&self, scope: Scope) -> Result<Option<bool>, RepositoryError> {
        Ok(self.toggles.read().await.get(&scope).copied())
    }

    async fn set(&self, scope: Scope, enabled: bool) -> Result<(), RepositoryError> {
        self.toggles.write().await.insert(scope, enabled);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;

    use offerly_core::domain::campaign::{
        Campaign, CampaignAudience, CampaignId, CampaignRules, CampaignStatus, DiscountValue,
        Owner, PlatformTargeting, Scope, ValidityWindow,
    };
    use offerly_core::domain::partner::PartnerId;

    use crate::repositories::{
        CampaignRepository, ChannelSettingsRepository, EnablementRepository,
        InMemoryCampaignRepository, InMemoryChannelSettingsRepository,
        InMemoryEnablementRepository,
    };

    fn platform_campaign(id: &str) -> Campaign {
        let now = Utc::now();
        Campaign {
            id: CampaignId(id.to_string()),
            title: id.to_string(),
            description: String::new(),
            scope: Scope::RealEstate,
            status: CampaignStatus::Active,
            discount: DiscountValue::percent(Decimal::new(5, 0)),
            window: ValidityWindow::new(now - Duration::days(1), now + Duration::days(1)),
            audience: CampaignAudience::Platform { targeting: PlatformTargeting::all_users() },
            rules: CampaignRules::default(),
            used_count: 0,
        }
    }

    #[tokio::test]
    async fn in_memory_campaigns_keep_insertion_order() {
        let repo = InMemoryCampaignRepository::default();
        for id in ["C", "A", "B"] {
            repo.save(platform_campaign(id)).await.expect("save");
        }
        repo.save(platform_campaign("A")).await.expect("resave");

        let ids: Vec<String> = repo
            .list_by_owner(Owner::Platform)
            .await
            .expect("list")
            .into_iter()
            .map(|campaign| campaign.id.0)
            .collect();
        assert_eq!(ids, vec!["C", "A", "B"]);
        assert!(repo.list_by_owner(Owner::Partner).await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn in_memory_enablement_and_channels_round_trip() {
        let enablement = InMemoryEnablementRepository::default();
        let campaign = CampaignId("PC-1".to_string());
        let acme = PartnerId::parse("acme").expect("partner");

        enablement.set_enabled(&campaign, &acme, true).await.expect("enable");
        assert_eq!(enablement.list_enabled().await.expect("list"), vec![(campaign.clone(), acme.clone())]);
        enablement.set_enabled(&campaign, &acme, false).await.expect("disable");
        assert!(enablement.list_enabled().await.expect("list").is_empty());

        let channels = InMemoryChannelSettingsRepository::default();
        assert_eq!(channels.find(Scope::Delivery).await.expect("find"), None);
        channels.set(Scope::Delivery, false).await.expect("set");
        assert_eq!(channels.find(Scope::Delivery).await.expect("find"), Some(false));
    }
}
