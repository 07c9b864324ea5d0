use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use offerly_core::domain::campaign::CampaignId;
use offerly_core::domain::partner::PartnerId;

use super::kv::{keys, SqlKvStore};
use super::{EnablementRepository, RepositoryError};

/// One partner's opt-in toggle for one partner-funded campaign.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyEnablementEntry {
    pub campaign_id: String,
    pub partner_id: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl LegacyEnablementEntry {
    /// `None` when either identifier is blank.
    pub fn to_pair(&self) -> Option<(CampaignId, PartnerId)> {
        let campaign_id = self.campaign_id.trim();
        if campaign_id.is_empty() {
            return None;
        }
        Some((CampaignId(campaign_id.to_string()), PartnerId::parse(&self.partner_id)?))
    }
}

pub struct SqlEnablementRepository {
    store: SqlKvStore,
}

impl SqlEnablementRepository {
    pub fn new(store: SqlKvStore) -> Self {
        Self { store }
    }

    async fn entries(&self) -> Result<Vec<LegacyEnablementEntry>, RepositoryError> {
        let documents = self.store.get_documents(keys::PARTNER_CAMPAIGN_ENABLEMENT).await?;
        Ok(documents.into_iter().filter_map(decode_entry).collect())
    }
}

fn decode_entry(document: Value) -> Option<LegacyEnablementEntry> {
    match serde_json::from_value::<LegacyEnablementEntry>(document) {
        Ok(entry) => Some(entry),
        Err(error) => {
            warn!(
                event_name = "db.enablement.skipped",
                reason = %error,
                "stored enablement entry could not be decoded"
            );
            None
        }
    }
}

#[async_trait::async_trait]
impl EnablementRepository for SqlEnablementRepository {
    async fn list_enabled(&self) -> Result<Vec<(CampaignId, PartnerId)>, RepositoryError> {
        Ok(self
            .entries()
            .await?
            .iter()
            .filter(|entry| entry.enabled)
            .filter_map(LegacyEnablementEntry::to_pair)
            .collect())
    }

    async fn set_enabled(
        &self,
        campaign_id: &CampaignId,
        partner_id: &PartnerId,
        enabled: bool,
    ) -> Result<(), RepositoryError> {
        let mut entries = self.entries().await?;
        let existing = entries.iter_mut().find(|entry| {
            entry.to_pair().is_some_and(|(id, partner)| id == *campaign_id && partner == *partner_id)
        });

        match existing {
            Some(entry) => entry.enabled = enabled,
            None => entries.push(LegacyEnablementEntry {
                campaign_id: campaign_id.0.clone(),
                partner_id: partner_id.as_str().to_string(),
                enabled,
            }),
        }

        self.store.put_json(keys::PARTNER_CAMPAIGN_ENABLEMENT, &entries).await
    }
}

#[cfg(test)]
mod tests {
    use offerly_core::domain::campaign::CampaignId;
    use offerly_core::domain::partner::PartnerId;

    use super::SqlEnablementRepository;
    use crate::repositories::{EnablementRepository, SqlKvStore};
    use crate::{connect_with_settings, migrations};

    async fn repo() -> SqlEnablementRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlEnablementRepository::new(SqlKvStore::new(pool))
    }

    #[tokio::test]
    async fn toggling_updates_the_existing_entry() {
        let repo = repo().await;
        let campaign = CampaignId("PC-1".to_string());

        repo.set_enabled(&campaign, &PartnerId::parse("partner_acme").expect("id"), true)
            .await
            .expect("enable");
        assert_eq!(repo.list_enabled().await.expect("list").len(), 1);

        repo.set_enabled(&campaign, &PartnerId::parse("acme").expect("id"), false)
            .await
            .expect("disable");
        assert!(repo.list_enabled().await.expect("list").is_empty());
    }
}
