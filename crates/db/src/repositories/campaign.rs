use serde_json::Value;
use tracing::warn;

use offerly_core::discount::normalizer::{to_canonical, to_legacy, LegacyCampaignRecord};
use offerly_core::domain::campaign::{Campaign, CampaignId, Owner};

use super::kv::{document_id, keys, upsert_document, SqlKvStore};
use super::{CampaignRepository, RepositoryError};

pub struct SqlCampaignRepository {
    store: SqlKvStore,
}

impl SqlCampaignRepository {
    pub fn new(store: SqlKvStore) -> Self {
        Self { store }
    }
}

pub(crate) fn pool_key(owner: Owner) -> &'static str {
    match owner {
        Owner::Platform => keys::PLATFORM_CAMPAIGNS,
        Owner::Partner => keys::PARTNER_CAMPAIGNS,
    }
}

fn owner_token(owner: Owner) -> &'static str {
    match owner {
        Owner::Platform => "platform",
        Owner::Partner => "partner",
    }
}

/// Decodes one stored campaign. The pool a document sits in names its owner
/// when the document itself does not.
pub(crate) fn decode_campaign(document: &Value, pool_owner: Owner) -> Option<Campaign> {
    let id = document_id(document).unwrap_or_default();
    let mut record: LegacyCampaignRecord = match serde_json::from_value(document.clone()) {
        Ok(record) => record,
        Err(error) => {
            warn!(
                event_name = "db.campaign.skipped",
                campaign_id = %id,
                reason = %error,
                "stored campaign is not a campaign document"
            );
            return None;
        }
    };
    record.owner_type.get_or_insert_with(|| owner_token(pool_owner).to_string());

    let campaign = match to_canonical(&record) {
        Ok(campaign) => campaign,
        Err(error) => {
            warn!(
                event_name = "db.campaign.skipped",
                campaign_id = %id,
                reason = %error,
                "stored campaign could not be normalised"
            );
            return None;
        }
    };

    if campaign.owner() != pool_owner {
        warn!(
            event_name = "db.campaign.skipped",
            campaign_id = %id,
            reason = "owner does not match pool",
            "stored campaign sits in the wrong pool"
        );
        return None;
    }

    Some(campaign)
}

#[async_trait::async_trait]
impl CampaignRepository for SqlCampaignRepository {
    async fn list_by_owner(&self, owner: Owner) -> Result<Vec<Campaign>, RepositoryError> {
        let documents = self.store.get_documents(pool_key(owner)).await?;
        Ok(documents.iter().filter_map(|document| decode_campaign(document, owner)).collect())
    }

    async fn find_by_id(&self, id: &CampaignId) -> Result<Option<Campaign>, RepositoryError> {
        for owner in [Owner::Platform, Owner::Partner] {
            let found = self
                .list_by_owner(owner)
                .await?
                .into_iter()
                .find(|campaign| campaign.id == *id);
            if found.is_some() {
                return Ok(found);
            }
        }
        Ok(None)
    }

    async fn save(&self, campaign: Campaign) -> Result<(), RepositoryError> {
        campaign.validate()?;

        let key = pool_key(campaign.owner());
        let replacement = serde_json::to_value(to_legacy(&campaign))
            .map_err(|error| RepositoryError::Decode(error.to_string()))?;

        let mut documents = self.store.get_documents(key).await?;
        upsert_document(&mut documents, &campaign.id.0, replacement);
        self.store.put_json(key, &documents).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;
    use serde_json::json;

    use offerly_core::domain::campaign::{
        Campaign, CampaignAudience, CampaignId, CampaignRules, CampaignStatus, DiscountValue,
        Owner, PartnerEligibility, PlatformTargeting, Scope, ValidityWindow,
    };
    use offerly_core::domain::partner::PartnerId;

    use super::SqlCampaignRepository;
    use crate::repositories::{keys, CampaignRepository, RepositoryError, SqlKvStore};
    use crate::{connect_with_settings, migrations};

    async fn setup() -> (SqlKvStore, SqlCampaignRepository) {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        let store = SqlKvStore::new(pool);
        (store.clone(), SqlCampaignRepository::new(store))
    }

    fn campaign(id: &str, audience: CampaignAudience) -> Campaign {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single().expect("start");
        Campaign {
            id: CampaignId(id.to_string()),
            title: format!("{id} title"),
            description: String::new(),
            scope: Scope::Delivery,
            status: CampaignStatus::Active,
            discount: DiscountValue::percent(Decimal::new(15, 0)),
            window: ValidityWindow::new(start, start + Duration::days(90)),
            audience,
            rules: CampaignRules::default(),
            used_count: 0,
        }
    }

    #[tokio::test]
    async fn save_routes_by_owner_and_replaces_in_place() {
        let (_, repo) = setup().await;
        let platform =
            campaign("PL-1", CampaignAudience::Platform { targeting: PlatformTargeting::all_users() });
        let partner = campaign(
            "PC-1",
            CampaignAudience::Partner {
                sponsor: PartnerId::parse("acme"),
                eligibility: PartnerEligibility::AllPartnersInDomain,
            },
        );

        repo.save(platform.clone()).await.expect("save platform");
        repo.save(campaign("PL-2", platform.audience.clone())).await.expect("save second");
        repo.save(partner.clone()).await.expect("save partner");

        let mut renamed = platform.clone();
        renamed.title = "Renamed".to_string();
        repo.save(renamed).await.expect("update platform");

        let platform_pool = repo.list_by_owner(Owner::Platform).await.expect("list platform");
        assert_eq!(
            platform_pool.iter().map(|c| c.id.0.as_str()).collect::<Vec<_>>(),
            vec!["PL-1", "PL-2"]
        );
        assert_eq!(platform_pool[0].title, "Renamed");
        assert_eq!(repo.list_by_owner(Owner::Partner).await.expect("list partner"), vec![partner]);
        assert!(repo.find_by_id(&CampaignId("PC-1".to_string())).await.expect("find").is_some());
    }

    #[tokio::test]
    async fn malformed_documents_are_skipped_not_fatal() {
        let (store, repo) = setup().await;
        store
            .put_json(
                keys::PARTNER_CAMPAIGNS,
                &json!([
                    { "id": "bad-1", "domain": "delivery" },
                    "not an object",
                    {
                        "id": "ok-1",
                        "partnerId": "acme",
                        "domain": "delivery",
                        "status": "active",
                        "discountType": "percent",
                        "discountValue": 10,
                        "startDate": "2026-01-01",
                        "endDate": "2026-12-31"
                    },
                    {
                        "id": "legacy-no-owner",
                        "domain": "delivery",
                        "status": "active",
                        "discountType": "amount",
                        "discountValue": 500,
                        "startDate": "2026-01-01",
                        "endDate": "2026-12-31"
                    }
                ]),
            )
            .await
            .expect("put");

        let partner_pool = repo.list_by_owner(Owner::Partner).await.expect("list");
        assert_eq!(
            partner_pool.iter().map(|c| c.id.0.as_str()).collect::<Vec<_>>(),
            vec!["ok-1", "legacy-no-owner"]
        );
    }

    #[tokio::test]
    async fn invalid_campaign_is_rejected_on_save() {
        let (_, repo) = setup().await;
        let mut broken =
            campaign("PL-9", CampaignAudience::Platform { targeting: PlatformTargeting::all_users() });
        broken.discount = DiscountValue::percent(Decimal::new(150, 0));

        let error = repo.save(broken).await.expect_err("rejected");
        assert!(matches!(error, RepositoryError::Rejected(_)));
        assert!(repo.list_by_owner(Owner::Platform).await.expect("list").is_empty());
    }
}
