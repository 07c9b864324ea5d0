use serde_json::Value;
use tracing::warn;

use offerly_core::discount::normalizer::{
    partner_discount_to_canonical, partner_discount_to_legacy, LegacyPartnerDiscountRecord,
};
use offerly_core::domain::partner_discount::PartnerDiscount;

use super::kv::{document_id, keys, upsert_document, SqlKvStore};
use super::{PartnerDiscountRepository, RepositoryError};

pub struct SqlPartnerDiscountRepository {
    store: SqlKvStore,
}

impl SqlPartnerDiscountRepository {
    pub fn new(store: SqlKvStore) -> Self {
        Self { store }
    }
}

pub(crate) fn decode_partner_discount(document: &Value) -> Option<PartnerDiscount> {
    let decoded = serde_json::from_value::<LegacyPartnerDiscountRecord>(document.clone())
        .map_err(|error| error.to_string())
        .and_then(|record| {
            partner_discount_to_canonical(&record).map_err(|error| error.to_string())
        });

    match decoded {
        Ok(discount) => Some(discount),
        Err(reason) => {
            warn!(
                event_name = "db.partner_discount.skipped",
                discount_id = %document_id(document).unwrap_or_default(),
                reason = %reason,
                "stored partner discount could not be normalised"
            );
            None
        }
    }
}

#[async_trait::async_trait]
impl PartnerDiscountRepository for SqlPartnerDiscountRepository {
    async fn list(&self) -> Result<Vec<PartnerDiscount>, RepositoryError> {
        let documents = self.store.get_documents(keys::PARTNER_DISCOUNTS).await?;
        Ok(documents.iter().filter_map(decode_partner_discount).collect())
    }

    async fn save(&self, discount: PartnerDiscount) -> Result<(), RepositoryError> {
        discount.validate()?;

        let replacement = serde_json::to_value(partner_discount_to_legacy(&discount))
            .map_err(|error| RepositoryError::Decode(error.to_string()))?;

        let mut documents = self.store.get_documents(keys::PARTNER_DISCOUNTS).await?;
        upsert_document(&mut documents, &discount.id.0, replacement);
        self.store.put_json(keys::PARTNER_DISCOUNTS, &documents).await
    }
}
