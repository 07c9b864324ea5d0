use crate::commands::{build_runtime, load_config, open_store, CommandResult};

pub fn run() -> CommandResult {
    let config = match load_config("migrate") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match build_runtime("migrate") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = open_store(&config).await?;
        pool.close().await;
        Ok::<(), crate::commands::Failure>(())
    });

    match result {
        Ok(()) => CommandResult::success("migrate", "applied pending migrations"),
        Err(failure) => CommandResult::from_failure("migrate", failure),
    }
}
