use std::fs;
use std::path::Path;

use anyhow::Context;
use offerly_db::{import_export, LegacyExport, SqlDiscountStore};
use serde_json::json;

use crate::commands::{build_runtime, load_config, open_store, CommandResult};

pub fn run(file: &Path) -> CommandResult {
    let export = match read_export(file) {
        Ok(export) => export,
        Err(error) => {
            return CommandResult::failure("import", "invalid_input", format!("{error:#}"), 6);
        }
    };
    let config = match load_config("import") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match build_runtime("import") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = open_store(&config).await?;
        let store = SqlDiscountStore::new(pool.clone());
        let report = import_export(store.sources(), &export)
            .await
            .map_err(|error| ("import_execution", error.to_string(), 5u8));
        pool.close().await;
        report
    });

    match result {
        Ok(report) => CommandResult::success_with_data(
            "import",
            format!(
                "imported {} campaigns and {} partner discounts from {} ({} skipped)",
                report.campaigns_imported,
                report.partner_discounts_imported,
                file.display(),
                report.skipped
            ),
            json!(report),
        ),
        Err(failure) => CommandResult::from_failure("import", failure),
    }
}

fn read_export(file: &Path) -> anyhow::Result<LegacyExport> {
    let raw = fs::read_to_string(file)
        .with_context(|| format!("failed to read export file `{}`", file.display()))?;
    LegacyExport::from_json(&raw)
        .with_context(|| format!("export file `{}` is not a discount export", file.display()))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::read_export;

    #[test]
    fn missing_file_reports_path() {
        let error = read_export(Path::new("does/not/exist.json")).expect_err("missing file");
        assert!(format!("{error:#}").contains("does/not/exist.json"));
    }

    #[test]
    fn malformed_export_is_rejected_with_context() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("export.json");
        std::fs::write(&path, "{\"platformCampaigns\": 7}").expect("write export");

        let error = read_export(&path).expect_err("malformed export");
        assert!(format!("{error:#}").contains("is not a discount export"));
    }
}
