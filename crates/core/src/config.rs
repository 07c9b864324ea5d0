use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub pricing: PricingConfig,
    pub channels: ChannelsConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct PricingConfig {
    pub currency: String,
    /// Decimal places of the currency's minor unit; saved amounts round here.
    pub minor_unit_digits: u32,
}

/// Fallbacks used when the store holds no channel toggle.
#[derive(Clone, Debug)]
pub struct ChannelsConfig {
    pub delivery_discounts_enabled: bool,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

/// A value that can be set from `offerly.toml` or the environment.
#[derive(Clone, Copy, Debug)]
pub struct Setting {
    /// Dotted key inside the config file, e.g. `pricing.currency`.
    pub path: &'static str,
    /// Environment variables that override the file, first set one wins.
    pub env: &'static [&'static str],
}

pub const SETTINGS: &[Setting] = &[
    Setting { path: "database.url", env: &["OFFERLY_DATABASE_URL"] },
    Setting { path: "database.max_connections", env: &["OFFERLY_DATABASE_MAX_CONNECTIONS"] },
    Setting { path: "database.timeout_secs", env: &["OFFERLY_DATABASE_TIMEOUT_SECS"] },
    Setting { path: "pricing.currency", env: &["OFFERLY_PRICING_CURRENCY"] },
    Setting { path: "pricing.minor_unit_digits", env: &["OFFERLY_PRICING_MINOR_UNIT_DIGITS"] },
    Setting {
        path: "channels.delivery_discounts_enabled",
        env: &["OFFERLY_CHANNELS_DELIVERY_DISCOUNTS_ENABLED"],
    },
    Setting { path: "logging.level", env: &["OFFERLY_LOGGING_LEVEL", "OFFERLY_LOG_LEVEL"] },
    Setting { path: "logging.format", env: &["OFFERLY_LOGGING_FORMAT", "OFFERLY_LOG_FORMAT"] },
];

/// Values set by the caller; they beat both the file and the environment.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub minor_unit_digits: Option<u32>,
    pub delivery_discounts_enabled: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("`{path}` is not valid TOML: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("no offerly config file at `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("config file refers to `${{{var}}}` but `{var}` is not set")]
    MissingEnvInterpolation { var: String },
    #[error("config file has a `${{` with no closing `}}`")]
    UnterminatedInterpolation,
    #[error("{origin} gives `{value}` for {setting}, which is not a usable value")]
    InvalidValue { setting: &'static str, origin: String, value: String },
    #[error("{0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://offerly.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            pricing: PricingConfig { currency: "KRW".to_string(), minor_unit_digits: 0 },
            channels: ChannelsConfig { delivery_discounts_enabled: true },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("log format `{other}` is not compact, pretty or json")),
        }
    }
}

impl AppConfig {
    /// Defaults, then the config file, then `OFFERLY_*` variables, then
    /// `options.overrides`. The result is validated before it is returned.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        match resolve_config_path(options.config_path.as_deref()) {
            Some(path) => config.merge_file(&path)?,
            None if options.require_file => {
                return Err(ConfigError::MissingConfigFile(
                    options.config_path.unwrap_or_else(|| PathBuf::from("offerly.toml")),
                ));
            }
            None => {}
        }

        for setting in SETTINGS {
            let found = setting.env.iter().find_map(|var| non_blank_env(var).map(|raw| (*var, raw)));
            if let Some((var, raw)) = found {
                config.assign(setting.path, &raw, var)?;
            }
        }

        let overrides = options.overrides;
        if let Some(url) = overrides.database_url {
            config.database.url = url;
        }
        if let Some(level) = overrides.log_level {
            config.logging.level = level;
        }
        if let Some(format) = overrides.log_format {
            config.logging.format = format;
        }
        if let Some(digits) = overrides.minor_unit_digits {
            config.pricing.minor_unit_digits = digits;
        }
        if let Some(enabled) = overrides.delivery_discounts_enabled {
            config.channels.delivery_discounts_enabled = enabled;
        }

        config.validate()?;
        Ok(config)
    }

    /// Current value of a [`SETTINGS`] entry, or `None` for an unknown path.
    pub fn value_of(&self, path: &str) -> Option<Value> {
        let value = match path {
            "database.url" => json!(self.database.url),
            "database.max_connections" => json!(self.database.max_connections),
            "database.timeout_secs" => json!(self.database.timeout_secs),
            "pricing.currency" => json!(self.pricing.currency),
            "pricing.minor_unit_digits" => json!(self.pricing.minor_unit_digits),
            "channels.delivery_discounts_enabled" => json!(self.channels.delivery_discounts_enabled),
            "logging.level" => json!(self.logging.level),
            "logging.format" => json!(self.logging.format),
            _ => return None,
        };
        Some(value)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.database.url.trim();
        if !(url.starts_with("sqlite:") || url == ":memory:") {
            return Err(invalid(format!(
                "database.url `{url}` is not a sqlite location; offerly only stores discounts in SQLite"
            )));
        }
        if self.database.max_connections == 0 {
            return Err(invalid("database.max_connections is 0; the pool needs at least one"));
        }
        if !(1..=300).contains(&self.database.timeout_secs) {
            return Err(invalid(format!(
                "database.timeout_secs is {}; pick between 1 and 300 seconds",
                self.database.timeout_secs
            )));
        }

        let currency = self.pricing.currency.trim();
        if currency.len() != 3 || !currency.chars().all(|ch| ch.is_ascii_uppercase()) {
            return Err(invalid(format!(
                "pricing.currency `{currency}` is not a three-letter ISO 4217 code like KRW"
            )));
        }
        if self.pricing.minor_unit_digits > 4 {
            return Err(invalid(format!(
                "pricing.minor_unit_digits is {}; currencies use at most 4 decimal places",
                self.pricing.minor_unit_digits
            )));
        }

        let level = self.logging.level.trim().to_ascii_lowercase();
        if !matches!(level.as_str(), "trace" | "debug" | "info" | "warn" | "error") {
            return Err(invalid(format!(
                "logging.level `{}` is not one of trace, debug, info, warn or error",
                self.logging.level
            )));
        }

        Ok(())
    }

    fn merge_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let text = fs::read_to_string(path)
            .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
        let document = expand_env_refs(&text)?
            .parse::<toml::Value>()
            .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })?;

        let origin = path.display().to_string();
        for setting in SETTINGS {
            let Some(value) = lookup(&document, setting.path) else {
                continue;
            };
            let raw = match value {
                toml::Value::String(text) => text.clone(),
                toml::Value::Integer(number) => number.to_string(),
                toml::Value::Boolean(flag) => flag.to_string(),
                other => {
                    return Err(ConfigError::InvalidValue {
                        setting: setting.path,
                        origin: origin.clone(),
                        value: other.to_string(),
                    });
                }
            };
            self.assign(setting.path, &raw, &origin)?;
        }

        Ok(())
    }

    fn assign(&mut self, path: &'static str, raw: &str, origin: &str) -> Result<(), ConfigError> {
        match path {
            "database.url" => self.database.url = raw.to_string(),
            "database.max_connections" => self.database.max_connections = parse(path, raw, origin)?,
            "database.timeout_secs" => self.database.timeout_secs = parse(path, raw, origin)?,
            "pricing.currency" => self.pricing.currency = raw.to_string(),
            "pricing.minor_unit_digits" => {
                self.pricing.minor_unit_digits = parse(path, raw, origin)?;
            }
            "channels.delivery_discounts_enabled" => {
                self.channels.delivery_discounts_enabled =
                    parse(path, &raw.trim().to_ascii_lowercase(), origin)?;
            }
            "logging.level" => self.logging.level = raw.to_string(),
            "logging.format" => self.logging.format = parse(path, raw, origin)?,
            _ => {}
        }
        Ok(())
    }
}

/// Path of the config file `load` would read, if any.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("offerly.toml"), PathBuf::from("config/offerly.toml")]
        .into_iter()
        .find(|path| path.exists())
}

/// Walks a dotted key through nested TOML tables.
pub fn lookup<'a>(document: &'a toml::Value, path: &str) -> Option<&'a toml::Value> {
    path.split('.').try_fold(document, |table, key| table.get(key))
}

/// Replaces each `${NAME}` with the value of the environment variable `NAME`.
fn expand_env_refs(text: &str) -> Result<String, ConfigError> {
    let mut expanded = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("${") {
        expanded.push_str(&rest[..start]);
        let reference = &rest[start + 2..];
        let end = reference.find('}').ok_or(ConfigError::UnterminatedInterpolation)?;
        let name = &reference[..end];
        let value = env::var(name)
            .map_err(|_| ConfigError::MissingEnvInterpolation { var: name.to_string() })?;
        expanded.push_str(&value);
        rest = &reference[end + 1..];
    }

    expanded.push_str(rest);
    Ok(expanded)
}

fn parse<T: FromStr>(setting: &'static str, raw: &str, origin: &str) -> Result<T, ConfigError> {
    raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
        setting,
        origin: origin.to_string(),
        value: raw.to_string(),
    })
}

fn non_blank_env(var: &str) -> Option<String> {
    env::var(var).ok().filter(|value| !value.trim().is_empty())
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation(message.into())
}
