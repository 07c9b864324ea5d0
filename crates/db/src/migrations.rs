use sqlx::migrate::{MigrateError, Migrator};

use crate::DbPool;

pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

pub async fn run_pending(pool: &DbPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

#[cfg(test)]
mod tests {
    use sqlx::Row;

    use super::run_pending;
    use crate::{connect_with_settings, migrations::MIGRATOR};

    const MANAGED_SCHEMA_OBJECTS: &[&str] = &["kv_entry", "idx_kv_entry_updated_at"];

    async fn table_count(pool: &sqlx::SqlitePool, name: &str) -> i64 {
        sqlx::query(
            "SELECT COUNT(*) AS count FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(name)
        .fetch_one(pool)
        .await
        .expect("check table")
        .get::<i64, _>("count")
    }

    #[tokio::test]
    async fn migrations_create_kv_table() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("run migrations");

        assert_eq!(table_count(&pool, "kv_entry").await, 1);
    }

    #[tokio::test]
    async fn migrations_are_reversible() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("run migrations");

        MIGRATOR.undo(&pool, 0).await.expect("undo migrations");

        assert_eq!(table_count(&pool, "kv_entry").await, 0);
    }

    #[tokio::test]
    async fn migrations_up_down_up_preserves_schema_signature() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("run migrations");

        let initial_signature = managed_schema_signature(&pool).await;
        assert_eq!(initial_signature.len(), MANAGED_SCHEMA_OBJECTS.len());

        MIGRATOR.undo(&pool, 0).await.expect("undo migrations");
        assert!(managed_schema_signature(&pool).await.is_empty());

        run_pending(&pool).await.expect("re-run migrations");
        assert_eq!(managed_schema_signature(&pool).await, initial_signature);
    }

    async fn managed_schema_signature(pool: &sqlx::SqlitePool) -> Vec<(String, String, String)> {
        let mut signature: Vec<(String, String, String)> = sqlx::query(
            "SELECT type, name, IFNULL(sql, '') AS sql
             FROM sqlite_master
             WHERE type IN ('table', 'index')",
        )
        .fetch_all(pool)
        .await
        .expect("load schema objects")
        .into_iter()
        .filter_map(|row| {
            let name = row.get::<String, _>("name");
            MANAGED_SCHEMA_OBJECTS.contains(&name.as_str()).then(|| {
                (row.get::<String, _>("type"), name, row.get::<String, _>("sql"))
            })
        })
        .collect();
        signature.sort();
        signature
    }
}
