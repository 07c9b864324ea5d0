use offerly_core::domain::campaign::{CampaignId, Owner, Scope};
use offerly_core::domain::partner::PartnerId;

use crate::import::{import_export, ImportReport, LegacyExport};
use crate::repositories::RepositoryError;
use crate::snapshot::SqlDiscountStore;
use crate::DbPool;

const DEMO_PLATFORM_CAMPAIGNS: &[&str] = &["PL-WELCOME-10", "PL-DELIVERY-2000"];
const DEMO_PARTNER_CAMPAIGNS: &[&str] = &["PC-ACME-SPRING", "PC-DELIVERY-5"];
const DEMO_PARTNER_DISCOUNTS: &[&str] = &["PD-BETA-LISTING-42"];
const DEMO_ENABLEMENTS: &[(&str, &str)] =
    &[("PC-ACME-SPRING", "acme"), ("PC-DELIVERY-5", "gamma")];

/// Deterministic demo discounts, written in the storefront's export format.
///
/// Covers both campaign pools, a standalone partner discount tied to a
/// listing, partner enablements and the delivery channel toggle. Loading is
/// idempotent because every save replaces documents by id.
pub struct DemoDataset;

impl DemoDataset {
    pub const JSON: &str = include_str!("../../../config/fixtures/demo_discounts.json");

    pub fn export() -> Result<LegacyExport, RepositoryError> {
        LegacyExport::from_json(Self::JSON)
    }

    pub async fn load(pool: &DbPool) -> Result<ImportReport, RepositoryError> {
        let store = SqlDiscountStore::new(pool.clone());
        import_export(store.sources(), &Self::export()?).await
    }

    /// Verify that every demo record is present and readable.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let store = SqlDiscountStore::new(pool.clone());
        let sources = store.sources();
        let mut checks = Vec::new();

        let platform = sources.campaigns.list_by_owner(Owner::Platform).await?;
        for id in DEMO_PLATFORM_CAMPAIGNS {
            checks.push((*id, platform.iter().any(|campaign| campaign.id.0 == *id)));
        }

        let partner = sources.campaigns.list_by_owner(Owner::Partner).await?;
        for id in DEMO_PARTNER_CAMPAIGNS {
            checks.push((*id, partner.iter().any(|campaign| campaign.id.0 == *id)));
        }

        let discounts = sources.partner_discounts.list().await?;
        for id in DEMO_PARTNER_DISCOUNTS {
            checks.push((*id, discounts.iter().any(|discount| discount.id.0 == *id)));
        }

        let enabled = sources.enablements.list_enabled().await?;
        for (campaign_id, partner_id) in DEMO_ENABLEMENTS {
            let present = PartnerId::parse(partner_id).is_some_and(|partner_id| {
                enabled.contains(&(CampaignId((*campaign_id).to_string()), partner_id))
            });
            checks.push((*campaign_id, present));
        }

        let delivery_toggle = sources.channels.find(Scope::Delivery).await?;
        checks.push(("channel-delivery", delivery_toggle == Some(true)));

        let all_present = checks.iter().all(|(_, ok)| *ok);
        Ok(VerificationResult { all_present, checks })
    }
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{connect_with_settings, migrations};

    #[test]
    fn demo_export_parses() {
        let export = DemoDataset::export().expect("demo export");
        assert_eq!(export.platform_campaigns.len(), DEMO_PLATFORM_CAMPAIGNS.len());
        assert_eq!(export.partner_campaigns.len(), DEMO_PARTNER_CAMPAIGNS.len());
        assert_eq!(export.partner_discounts.len(), DEMO_PARTNER_DISCOUNTS.len());
    }

    #[tokio::test]
    async fn verify_seed_contract_and_idempotency() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect to test database");
        migrations::run_pending(&pool).await.expect("run migrations");

        let first = DemoDataset::load(&pool).await.expect("load demo dataset");
        let first_verification = DemoDataset::verify(&pool).await.expect("verify demo dataset");
        assert!(first_verification.all_present, "{:?}", first_verification.checks);
        assert_eq!(first.skipped, 0);
        assert_eq!(first.campaigns_imported, 4);

        let second = DemoDataset::load(&pool).await.expect("reload demo dataset");
        let second_verification = DemoDataset::verify(&pool).await.expect("re-verify");
        assert!(second_verification.all_present);
        assert_eq!(first, second);
        assert_eq!(first_verification.checks, second_verification.checks);

        let store = SqlDiscountStore::new(pool);
        assert_eq!(
            store.sources().campaigns.list_by_owner(Owner::Platform).await.expect("list").len(),
            2
        );
    }
}
