//! SQLite-backed key-value store holding the storefront's JSON documents.
//!
//! Each key stores one JSON document, exactly as the storefront wrote it.
//! Repositories decode documents on read and rewrite whole documents on save.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use sqlx::Row;

use super::RepositoryError;
use crate::DbPool;

pub mod keys {
    pub const PLATFORM_CAMPAIGNS: &str = "platform_campaigns";
    pub const PARTNER_CAMPAIGNS: &str = "partner_campaigns";
    pub const PARTNER_DISCOUNTS: &str = "partner_discounts";
    pub const PARTNER_CAMPAIGN_ENABLEMENT: &str = "partner_campaign_enablement";
    pub const CHANNEL_DISCOUNT_SETTINGS: &str = "channel_discount_settings";
}

#[derive(Clone)]
pub struct SqlKvStore {
    pool: DbPool,
}

impl SqlKvStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        let row = sqlx::query("SELECT value FROM kv_entry WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| row.get::<String, _>("value")))
    }

    pub async fn put(&self, key: &str, value: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO kv_entry (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET
                 value = excluded.value,
                 updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, RepositoryError> {
        let Some(raw) = self.get(key).await? else {
            return Ok(None);
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|error| RepositoryError::Decode(format!("kv key `{key}`: {error}")))
    }

    pub async fn put_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), RepositoryError> {
        let raw = serde_json::to_string(value)
            .map_err(|error| RepositoryError::Decode(format!("kv key `{key}`: {error}")))?;
        self.put(key, &raw).await
    }

    /// Raw array document under `key`; a missing key reads as empty.
    pub async fn get_documents(&self, key: &str) -> Result<Vec<Value>, RepositoryError> {
        Ok(self.get_json::<Vec<Value>>(key).await?.unwrap_or_default())
    }
}

/// Identifier of a raw legacy document, whether stored as text or number.
pub(crate) fn document_id(document: &Value) -> Option<String> {
    match document.get("id")? {
        Value::String(id) => Some(id.trim().to_string()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

/// Swaps the document carrying `id` for `replacement`, appending when absent.
pub(crate) fn upsert_document(documents: &mut Vec<Value>, id: &str, replacement: Value) {
    match documents.iter_mut().find(|document| document_id(document).as_deref() == Some(id)) {
        Some(slot) => *slot = replacement,
        None => documents.push(replacement),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{document_id, keys, upsert_document, SqlKvStore};
    use crate::{connect_with_settings, migrations};

    async fn store() -> SqlKvStore {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlKvStore::new(pool)
    }

    #[tokio::test]
    async fn put_overwrites_existing_value() {
        let store = store().await;
        store.put(keys::PLATFORM_CAMPAIGNS, "[]").await.expect("first put");
        store.put(keys::PLATFORM_CAMPAIGNS, "[{\"id\":1}]").await.expect("second put");

        assert_eq!(
            store.get(keys::PLATFORM_CAMPAIGNS).await.expect("get").as_deref(),
            Some("[{\"id\":1}]")
        );
    }

    #[tokio::test]
    async fn missing_document_reads_as_empty() {
        let store = store().await;
        assert!(store.get_documents(keys::PARTNER_DISCOUNTS).await.expect("documents").is_empty());
    }

    #[tokio::test]
    async fn corrupt_document_is_a_decode_error() {
        let store = store().await;
        store.put(keys::PARTNER_CAMPAIGNS, "{not json").await.expect("put");

        let error = store.get_documents(keys::PARTNER_CAMPAIGNS).await.expect_err("decode");
        assert!(error.to_string().contains("partner_campaigns"));
    }

    #[test]
    fn upsert_matches_numeric_and_text_ids() {
        let mut documents = vec![json!({ "id": 7, "title": "old" }), json!({ "id": "B" })];

        upsert_document(&mut documents, "7", json!({ "id": "7", "title": "new" }));
        upsert_document(&mut documents, "C", json!({ "id": "C" }));

        assert_eq!(documents.len(), 3);
        assert_eq!(documents[0]["title"], "new");
        assert_eq!(document_id(&documents[2]).as_deref(), Some("C"));
    }
}
