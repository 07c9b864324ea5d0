use offerly_db::{DemoDataset, ImportReport};
use serde_json::json;

use crate::commands::{build_runtime, load_config, open_store, CommandResult, Failure};

pub fn run() -> CommandResult {
    let config = match load_config("seed") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match build_runtime("seed") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = open_store(&config).await?;

        let run_result: Result<SeedOutput, Failure> = async {
            let report = DemoDataset::load(&pool)
                .await
                .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;
            let verification = DemoDataset::verify(&pool)
                .await
                .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

            if !verification.all_present {
                return Err((
                    "seed_verification",
                    verification_failure_message(&verification.checks),
                    6u8,
                ));
            }
            Ok(SeedOutput { report, checks: verification.checks })
        }
        .await;

        pool.close().await;
        run_result
    });

    match result {
        Ok(output) => {
            let checks = output
                .checks
                .iter()
                .map(|(check, passed)| json!({ "check": check, "passed": passed }))
                .collect::<Vec<_>>();
            CommandResult::success_with_data(
                "seed",
                format!(
                    "demo discount dataset loaded: {} campaigns, {} partner discounts, {} enablements",
                    output.report.campaigns_imported,
                    output.report.partner_discounts_imported,
                    output.report.enablements_imported
                ),
                json!({ "report": output.report, "checks": checks }),
            )
        }
        Err(failure) => CommandResult::from_failure("seed", failure),
    }
}

struct SeedOutput {
    report: ImportReport,
    checks: Vec<(&'static str, bool)>,
}

fn verification_failure_message(checks: &[(&str, bool)]) -> String {
    let failed_checks = checks
        .iter()
        .filter_map(|(check, passed)| (!passed).then_some(*check))
        .collect::<Vec<_>>();

    if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed_checks.join(", "))
    }
}
