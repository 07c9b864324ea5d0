pub mod connection;
pub mod fixtures;
pub mod import;
pub mod migrations;
pub mod repositories;
pub mod snapshot;

pub use connection::{connect_with_config, connect_with_settings, DbPool};
pub use fixtures::{DemoDataset, VerificationResult};
pub use import::{import_export, ImportReport, LegacyExport};
pub use repositories::RepositoryError;
pub use snapshot::{load_snapshot, SnapshotSources, SqlDiscountStore};
