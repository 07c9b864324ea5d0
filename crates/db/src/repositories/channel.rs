use std::collections::BTreeMap;
use std::str::FromStr;

use offerly_core::domain::campaign::Scope;

use super::kv::{keys, SqlKvStore};
use super::{channel_key, ChannelSettingsRepository, RepositoryError};

/// Stored as `{ "delivery": true, "real_estate": false }`.
pub type LegacyChannelSettings = BTreeMap<String, bool>;

pub struct SqlChannelSettingsRepository {
    store: SqlKvStore,
}

impl SqlChannelSettingsRepository {
    pub fn new(store: SqlKvStore) -> Self {
        Self { store }
    }

    async fn settings(&self) -> Result<LegacyChannelSettings, RepositoryError> {
        Ok(self
            .store
            .get_json::<LegacyChannelSettings>(keys::CHANNEL_DISCOUNT_SETTINGS)
            .await?
            .unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl ChannelSettingsRepository for SqlChannelSettingsRepository {
    async fn find(&self, scope: Scope) -> Result<Option<bool>, RepositoryError> {
        let settings = self.settings().await?;
        Ok(settings
            .iter()
            .find(|(key, _)| Scope::from_str(key).is_ok_and(|stored| stored == scope))
            .map(|(_, enabled)| *enabled))
    }

    async fn set(&self, scope: Scope, enabled: bool) -> Result<(), RepositoryError> {
        let mut settings = self.settings().await?;
        settings.retain(|key, _| !Scope::from_str(key).is_ok_and(|stored| stored == scope));
        settings.insert(channel_key(scope).to_string(), enabled);
        self.store.put_json(keys::CHANNEL_DISCOUNT_SETTINGS, &settings).await
    }
}

#[cfg(test)]
mod tests {
    use offerly_core::domain::campaign::Scope;

    use super::SqlChannelSettingsRepository;
    use crate::repositories::{keys, ChannelSettingsRepository, SqlKvStore};
    use crate::{connect_with_settings, migrations};

    #[tokio::test]
    async fn absent_toggle_is_none_and_legacy_keys_are_understood() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        let store = SqlKvStore::new(pool);
        let repo = SqlChannelSettingsRepository::new(store.clone());

        assert_eq!(repo.find(Scope::Delivery).await.expect("find"), None);

        store.put(keys::CHANNEL_DISCOUNT_SETTINGS, r#"{"DELIVERY":false}"#).await.expect("put");
        assert_eq!(repo.find(Scope::Delivery).await.expect("find"), Some(false));

        repo.set(Scope::Delivery, true).await.expect("set");
        assert_eq!(repo.find(Scope::Delivery).await.expect("find"), Some(true));
        assert_eq!(
            store.get(keys::CHANNEL_DISCOUNT_SETTINGS).await.expect("get").as_deref(),
            Some(r#"{"delivery":true}"#)
        );
    }
}
