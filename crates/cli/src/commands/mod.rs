pub mod config;
pub mod import;
pub mod migrate;
pub mod price;
pub mod resolve;
pub mod seed;

use offerly_core::config::{AppConfig, LoadOptions};
use offerly_db::{connect_with_config, migrations, DbPool};
use serde::Serialize;
use serde_json::Value;
use tokio::runtime::Runtime;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

/// `(error_class, message, exit_code)` raised inside a command's async block.
pub(crate) type Failure = (&'static str, String, u8);

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::ok(command, message.into(), None)
    }

    pub fn success_with_data(command: &str, message: impl Into<String>, data: Value) -> Self {
        Self::ok(command, message.into(), Some(data))
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    fn ok(command: &str, message: String, data: Option<Value>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message,
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub(crate) fn from_failure(command: &str, (error_class, message, exit_code): Failure) -> Self {
        Self::failure(command, error_class, message, exit_code)
    }
}

pub(crate) fn load_config(command: &str) -> Result<AppConfig, CommandResult> {
    AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            2,
        )
    })
}

pub(crate) fn build_runtime(command: &str) -> Result<Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            3,
        )
    })
}

/// Connects and brings the schema up to date.
pub(crate) async fn open_store(config: &AppConfig) -> Result<DbPool, Failure> {
    let pool = connect_with_config(&config.database)
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
    if let Err(error) = migrations::run_pending(&pool).await {
        pool.close().await;
        return Err(("migration", error.to_string(), 5u8));
    }
    Ok(pool)
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::CommandResult;

    #[test]
    fn data_is_omitted_when_absent() {
        let result = CommandResult::success("migrate", "applied pending migrations");
        let payload: Value = serde_json::from_str(&result.output).expect("json payload");

        assert_eq!(result.exit_code, 0);
        assert_eq!(payload["status"], "ok");
        assert!(payload.get("data").is_none());
        assert_eq!(payload["error_class"], Value::Null);
    }

    #[test]
    fn failure_carries_class_and_exit_code() {
        let result = CommandResult::failure("resolve", "invalid_input", "bad scope", 6);
        let payload: Value = serde_json::from_str(&result.output).expect("json payload");

        assert_eq!(result.exit_code, 6);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "invalid_input");
    }

    #[test]
    fn success_with_data_embeds_payload() {
        let result = CommandResult::success_with_data("price", "priced", json!({"final": "9"}));
        let payload: Value = serde_json::from_str(&result.output).expect("json payload");

        assert_eq!(payload["data"]["final"], "9");
    }
}
