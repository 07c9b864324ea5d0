use tracing::info;

use offerly_core::discount::snapshot::DiscountSnapshot;
use offerly_core::domain::campaign::{Owner, Scope};

use crate::repositories::{
    CampaignRepository, ChannelSettingsRepository, EnablementRepository,
    PartnerDiscountRepository, RepositoryError, SqlCampaignRepository,
    SqlChannelSettingsRepository, SqlEnablementRepository, SqlKvStore,
    SqlPartnerDiscountRepository,
};
use crate::DbPool;

/// Repositories a snapshot is read from.
#[derive(Clone, Copy)]
pub struct SnapshotSources<'a> {
    pub campaigns: &'a dyn CampaignRepository,
    pub partner_discounts: &'a dyn PartnerDiscountRepository,
    pub enablements: &'a dyn EnablementRepository,
    pub channels: &'a dyn ChannelSettingsRepository,
}

/// The four key-value repositories sharing one store.
pub struct SqlDiscountStore {
    pub campaigns: SqlCampaignRepository,
    pub partner_discounts: SqlPartnerDiscountRepository,
    pub enablements: SqlEnablementRepository,
    pub channels: SqlChannelSettingsRepository,
}

impl SqlDiscountStore {
    pub fn new(pool: DbPool) -> Self {
        let store = SqlKvStore::new(pool);
        Self {
            campaigns: SqlCampaignRepository::new(store.clone()),
            partner_discounts: SqlPartnerDiscountRepository::new(store.clone()),
            enablements: SqlEnablementRepository::new(store.clone()),
            channels: SqlChannelSettingsRepository::new(store),
        }
    }

    pub fn sources(&self) -> SnapshotSources<'_> {
        SnapshotSources {
            campaigns: &self.campaigns,
            partner_discounts: &self.partner_discounts,
            enablements: &self.enablements,
            channels: &self.channels,
        }
    }
}

/// Reads everything the resolver needs in one pass, so resolution itself
/// never touches storage. `channel_default` answers channels with no stored toggle.
pub async fn load_snapshot(
    sources: SnapshotSources<'_>,
    channel_default: bool,
) -> Result<DiscountSnapshot, RepositoryError> {
    let platform = sources.campaigns.list_by_owner(Owner::Platform).await?;
    let partner = sources.campaigns.list_by_owner(Owner::Partner).await?;
    let partner_discounts = sources.partner_discounts.list().await?;

    let mut snapshot = DiscountSnapshot::new(channel_default)
        .with_campaigns(platform.into_iter().chain(partner))
        .with_partner_discounts(partner_discounts);

    for (campaign_id, partner_id) in sources.enablements.list_enabled().await? {
        snapshot.enable_for_partner(campaign_id, partner_id);
    }
    for scope in [Scope::RealEstate, Scope::Delivery] {
        if let Some(enabled) = sources.channels.find(scope).await? {
            snapshot.set_channel_enabled(scope, enabled);
        }
    }

    info!(
        event_name = "db.snapshot.loaded",
        platform_campaigns = snapshot.platform_campaigns().len(),
        partner_campaigns = snapshot.partner_campaigns().len(),
        partner_discounts = snapshot.partner_discounts().len(),
        enablements = snapshot.enablement_count(),
        "discount snapshot loaded"
    );

    Ok(snapshot)
}
