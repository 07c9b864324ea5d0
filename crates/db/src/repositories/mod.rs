use async_trait::async_trait;
use thiserror::Error;

use offerly_core::domain::campaign::{Campaign, CampaignId, Owner, Scope};
use offerly_core::domain::partner::PartnerId;
use offerly_core::domain::partner_discount::PartnerDiscount;
use offerly_core::errors::{ApplicationError, DomainError};

pub mod campaign;
pub mod channel;
pub mod enablement;
pub mod kv;
pub mod memory;
pub mod partner_discount;

pub use campaign::SqlCampaignRepository;
pub use channel::SqlChannelSettingsRepository;
pub use enablement::SqlEnablementRepository;
pub use kv::{keys, SqlKvStore};
pub use memory::{
    InMemoryCampaignRepository, InMemoryChannelSettingsRepository, InMemoryEnablementRepository,
    InMemoryPartnerDiscountRepository,
};
pub use partner_discount::SqlPartnerDiscountRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("record rejected: {0}")]
    Rejected(#[from] DomainError),
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Rejected(error) => ApplicationError::Domain(error),
            other => ApplicationError::Persistence(other.to_string()),
        }
    }
}

/// Campaigns are stored in one pool per owner; listing keeps stored order.
#[async_trait]
pub trait CampaignRepository: Send + Sync {
    async fn list_by_owner(&self, owner: Owner) -> Result<Vec<Campaign>, RepositoryError>;
    async fn find_by_id(&self, id: &CampaignId) -> Result<Option<Campaign>, RepositoryError>;
    /// Replaces the campaign with the same id in its owner's pool, or appends it.
    async fn save(&self, campaign: Campaign) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait PartnerDiscountRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<PartnerDiscount>, RepositoryError>;
    async fn save(&self, discount: PartnerDiscount) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait EnablementRepository: Send + Sync {
    async fn list_enabled(&self) -> Result<Vec<(CampaignId, PartnerId)>, RepositoryError>;
    async fn set_enabled(
        &self,
        campaign_id: &CampaignId,
        partner_id: &PartnerId,
        enabled: bool,
    ) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait ChannelSettingsRepository: Send + Sync {
    /// `None` when no toggle was ever stored for the channel.
    async fn find(&self, scope: Scope) -> Result<Option<bool>, RepositoryError>;
    async fn set(&self, scope: Scope, enabled: bool) -> Result<(), RepositoryError>;
}

/// Lower-case channel key used by the stored settings document.
pub(crate) fn channel_key(scope: Scope) -> &'static str {
    match scope {
        Scope::RealEstate => "real_estate",
        Scope::Delivery => "delivery",
    }
}
