//! Import of a storefront key-value export into the store.
//!
//! The export is one JSON object holding every discount document the
//! storefront keeps. Documents are normalised one by one; a document that
//! cannot be normalised is counted and skipped, never fatal.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use offerly_core::domain::campaign::{Owner, Scope};

use crate::repositories::campaign::decode_campaign;
use crate::repositories::channel::LegacyChannelSettings;
use crate::repositories::enablement::LegacyEnablementEntry;
use crate::repositories::partner_discount::decode_partner_discount;
use crate::repositories::RepositoryError;
use crate::snapshot::SnapshotSources;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LegacyExport {
    pub platform_campaigns: Vec<Value>,
    pub partner_campaigns: Vec<Value>,
    pub partner_discounts: Vec<Value>,
    pub enablements: Vec<LegacyEnablementEntry>,
    pub channels: LegacyChannelSettings,
}

impl LegacyExport {
    pub fn from_json(raw: &str) -> Result<Self, RepositoryError> {
        serde_json::from_str(raw)
            .map_err(|error| RepositoryError::Decode(format!("legacy export: {error}")))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub campaigns_imported: usize,
    pub partner_discounts_imported: usize,
    pub enablements_imported: usize,
    pub channels_imported: usize,
    pub skipped: usize,
}

/// Persists every normalisable document from `export` through `targets`.
///
/// Records that normalise but fail validation are skipped like undecodable
/// ones; storage failures abort the import.
pub async fn import_export(
    targets: SnapshotSources<'_>,
    export: &LegacyExport,
) -> Result<ImportReport, RepositoryError> {
    let mut report = ImportReport::default();

    let pools = [
        (Owner::Platform, &export.platform_campaigns),
        (Owner::Partner, &export.partner_campaigns),
    ];
    for (owner, documents) in pools {
        for document in documents {
            let Some(campaign) = decode_campaign(document, owner) else {
                report.skipped += 1;
                continue;
            };
            match targets.campaigns.save(campaign).await {
                Ok(()) => report.campaigns_imported += 1,
                Err(RepositoryError::Rejected(error)) => {
                    warn!(event_name = "db.import.rejected", reason = %error, "campaign rejected");
                    report.skipped += 1;
                }
                Err(other) => return Err(other),
            }
        }
    }

    for document in &export.partner_discounts {
        let Some(discount) = decode_partner_discount(document) else {
            report.skipped += 1;
            continue;
        };
        match targets.partner_discounts.save(discount).await {
            Ok(()) => report.partner_discounts_imported += 1,
            Err(RepositoryError::Rejected(error)) => {
                warn!(event_name = "db.import.rejected", reason = %error, "partner discount rejected");
                report.skipped += 1;
            }
            Err(other) => return Err(other),
        }
    }

    for entry in &export.enablements {
        let Some((campaign_id, partner_id)) = entry.to_pair() else {
            report.skipped += 1;
            continue;
        };
        targets.enablements.set_enabled(&campaign_id, &partner_id, entry.enabled).await?;
        report.enablements_imported += 1;
    }

    for (key, enabled) in &export.channels {
        let Ok(scope) = Scope::from_str(key) else {
            warn!(event_name = "db.import.rejected", channel = %key, "unknown channel key");
            report.skipped += 1;
            continue;
        };
        targets.channels.set(scope, *enabled).await?;
        report.channels_imported += 1;
    }

    info!(
        event_name = "db.import.completed",
        campaigns = report.campaigns_imported,
        partner_discounts = report.partner_discounts_imported,
        enablements = report.enablements_imported,
        channels = report.channels_imported,
        skipped = report.skipped,
        "legacy export imported"
    );

    Ok(report)
}
