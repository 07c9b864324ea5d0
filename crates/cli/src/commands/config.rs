use std::env;
use std::fs;
use std::path::Path;

use offerly_core::config::{lookup, resolve_config_path, SETTINGS};
use serde_json::{json, Value};

use crate::commands::{load_config, CommandResult};

pub fn run() -> CommandResult {
    let config = match load_config("config") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let entries = SETTINGS
        .iter()
        .map(|setting| {
            entry(
                setting.path,
                config.value_of(setting.path).unwrap_or(Value::Null),
                field_source(
                    setting.path,
                    setting.env,
                    config_file_doc.as_ref(),
                    config_file_path.as_deref(),
                ),
            )
        })
        .collect();

    CommandResult::success_with_data(
        "config",
        "effective config (source precedence: env > file > default)",
        Value::Array(entries),
    )
}

fn entry(key: &str, value: Value, source: String) -> Value {
    json!({ "key": key, "value": value, "source": source })
}

fn load_config_file_doc(path: Option<&Path>) -> Option<toml::Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<toml::Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&toml::Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys
        .iter()
        .find(|key| env::var(key).is_ok_and(|value| !value.trim().is_empty())) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if lookup(doc, key_path).is_some() {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}
