use chrono::{DateTime, Utc};
use clap::Args;
use offerly_core::config::AppConfig;
use offerly_core::discount::resolver::{DiscountResolver, EligibilityResolver};
use offerly_core::discount::snapshot::DiscountSnapshot;
use offerly_core::domain::campaign::Scope;
use offerly_core::domain::context::{EntityType, RequestContext};
use offerly_core::errors::ApplicationError;
use offerly_db::{load_snapshot, SqlDiscountStore};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::commands::{build_runtime, load_config, open_store, CommandResult};

/// Request context flags shared by `resolve` and `price`.
#[derive(Clone, Debug, Default, Args)]
pub struct ResolveArgs {
    #[arg(long, default_value = "", help = "Partner id, mail-style ids are accepted")]
    pub partner: String,
    #[arg(long, help = "Service scope: real_estate or delivery")]
    pub scope: String,
    #[arg(long, help = "Entity kind the request is about: listing, service or none")]
    pub entity_type: Option<String>,
    #[arg(long, help = "Entity id, compared against partner discount links")]
    pub entity_id: Option<String>,
    #[arg(long, help = "Customer id for targeting checks")]
    pub customer: Option<String>,
    #[arg(long, help = "Evaluation instant as RFC 3339; defaults to now")]
    pub at: Option<String>,
}

impl ResolveArgs {
    pub fn new(partner: &str, scope: &str) -> Self {
        Self { partner: partner.to_string(), scope: scope.to_string(), ..Self::default() }
    }

    pub fn to_context(&self) -> Result<RequestContext, String> {
        let scope = self.scope.parse::<Scope>().map_err(|error| error.to_string())?;
        let entity_type = match self.entity_type.as_deref() {
            Some(raw) => raw.parse::<EntityType>().map_err(|error| error.to_string())?,
            None => EntityType::None,
        };

        let mut context = RequestContext::new(&self.partner, scope);
        match self.entity_id.as_deref().map(str::trim) {
            Some(entity_id) if !entity_id.is_empty() => {
                context = context.with_entity(entity_type, entity_id);
            }
            _ => context.entity_type = entity_type,
        }
        if let Some(customer) = self.customer.as_deref().map(str::trim) {
            if !customer.is_empty() {
                context = context.with_customer(customer);
            }
        }
        if let Some(raw) = self.at.as_deref() {
            let at = DateTime::parse_from_rfc3339(raw.trim())
                .map_err(|error| format!("invalid --at instant `{raw}`: {error}"))?;
            context = context.at(at.with_timezone(&Utc));
        }

        Ok(context)
    }
}

pub fn run(args: &ResolveArgs) -> CommandResult {
    let context = match args.to_context() {
        Ok(context) => context,
        Err(message) => return CommandResult::failure("resolve", "invalid_input", message, 6),
    };
    let snapshot = match load_store_snapshot("resolve") {
        Ok((_, snapshot)) => snapshot,
        Err(failure) => return failure,
    };

    let resolver = EligibilityResolver::new(&snapshot, &snapshot, &snapshot);
    match resolver.resolve(&context) {
        Ok(discount) => {
            let message = match &discount {
                Some(discount) => {
                    format!("resolved {} discount `{}`", discount.provenance.as_str(), discount.id)
                }
                None => "no discount applies".to_string(),
            };
            CommandResult::success_with_data(
                "resolve",
                message,
                json!({
                    "context": context,
                    "partner_funded": discount
                        .as_ref()
                        .is_some_and(|discount| discount.provenance.is_partner_funded()),
                    "discount": discount,
                }),
            )
        }
        Err(error) => resolution_failure("resolve", error),
    }
}

/// Loads config, migrates the store and materialises a snapshot for one resolution.
pub(crate) fn load_store_snapshot(
    command: &str,
) -> Result<(AppConfig, DiscountSnapshot), CommandResult> {
    let config = load_config(command)?;
    let runtime = build_runtime(command)?;

    let result = runtime.block_on(async {
        let pool = open_store(&config).await?;
        let store = SqlDiscountStore::new(pool.clone());
        let snapshot =
            load_snapshot(store.sources(), config.channels.delivery_discounts_enabled)
                .await
                .map_err(|error| ("snapshot_load", error.to_string(), 5u8));
        pool.close().await;
        snapshot
    });

    match result {
        Ok(snapshot) => Ok((config, snapshot)),
        Err(failure) => Err(CommandResult::from_failure(command, failure)),
    }
}

pub(crate) fn resolution_failure(command: &str, error: ApplicationError) -> CommandResult {
    let correlation_id = Uuid::new_v4().to_string();
    error!(
        event_name = "cli.resolve.failed",
        correlation_id = %correlation_id,
        error = %error,
        "discount resolution failed"
    );
    let interface = error.into_interface(correlation_id);
    CommandResult::failure(
        command,
        "resolution",
        format!(
            "{} (correlation id {}): {interface}",
            interface.user_message(),
            interface.correlation_id()
        ),
        5,
    )
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use offerly_core::domain::campaign::Scope;
    use offerly_core::domain::context::EntityType;

    use super::ResolveArgs;

    #[test]
    fn context_parses_every_flag() {
        let args = ResolveArgs {
            entity_type: Some("LISTING".to_string()),
            entity_id: Some("42".to_string()),
            customer: Some("cust-7".to_string()),
            at: Some("2026-03-01T09:00:00+09:00".to_string()),
            ..ResolveArgs::new("partner_beta", "real-estate")
        };

        let context = args.to_context().expect("valid context");
        assert_eq!(context.scope, Scope::RealEstate);
        assert_eq!(context.entity_type, EntityType::Listing);
        assert_eq!(context.entity_id.as_deref(), Some("42"));
        assert_eq!(context.customer_id.as_deref(), Some("cust-7"));
        assert_eq!(
            context.now,
            Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).single().expect("instant")
        );
    }

    #[test]
    fn blank_partner_and_entity_are_absent() {
        let args =
            ResolveArgs { entity_id: Some("  ".to_string()), ..ResolveArgs::new("", "delivery") };

        let context = args.to_context().expect("valid context");
        assert!(context.partner_id.is_none());
        assert!(context.entity_id.is_none());
    }

    #[test]
    fn unknown_scope_and_bad_instant_are_rejected() {
        assert!(ResolveArgs::new("acme", "groceries").to_context().is_err());

        let args =
            ResolveArgs { at: Some("yesterday".to_string()), ..ResolveArgs::new("acme", "delivery") };
        let error = args.to_context().expect_err("bad instant");
        assert!(error.contains("--at"));
    }
}
