//! Mapping between the legacy flat discount documents kept by the storefront
//! key-value store and the canonical [`Campaign`] / [`PartnerDiscount`] model.
//!
//! Only the persistence boundary calls into this module. Decoding never panics:
//! missing optional fields fall back to defaults and structurally broken records
//! come back as [`NormalizeError`] so the caller can skip and log them.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::campaign::{
    Campaign, CampaignAudience, CampaignId, CampaignRules, CampaignStatus, DiscountKind,
    DiscountValue, PartnerEligibility, PlatformTargeting, Scope, Stacking, TargetMode,
    ValidityWindow,
};
use crate::domain::partner::PartnerId;
use crate::domain::partner_discount::{EntityLink, PartnerDiscount, PartnerDiscountId};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("legacy record is missing required field `{field}`")]
    MissingField { field: &'static str },
    #[error("legacy field `{field}` has unsupported value `{value}`")]
    InvalidValue { field: &'static str, value: String },
}

/// Loosely typed scalar as written by the storefront (ids and amounts show up
/// as numbers or strings, flags as booleans or strings).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LegacyScalar {
    Flag(bool),
    Number(serde_json::Number),
    Text(String),
}

impl LegacyScalar {
    fn text(&self) -> String {
        match self {
            Self::Flag(flag) => flag.to_string(),
            Self::Number(number) => number.to_string(),
            Self::Text(text) => text.trim().to_string(),
        }
    }

    fn from_decimal(value: Decimal) -> Self {
        serde_json::Number::from_str(&value.normalize().to_string())
            .map(Self::Number)
            .unwrap_or_else(|_| Self::Text(value.to_string()))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LegacyCampaignRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<LegacyScalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_value: Option<LegacyScalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_ids: Option<Vec<LegacyScalar>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eligible_partners: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stacking: Option<LegacyScalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_amount: Option<LegacyScalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_discount: Option<LegacyScalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_limit: Option<LegacyScalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_limit_per_user: Option<LegacyScalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_count: Option<LegacyScalar>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LegacyPartnerDiscountRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<LegacyScalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<LegacyScalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "value")]
    pub discount_value: Option<LegacyScalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_amount: Option<LegacyScalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_discount: Option<LegacyScalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_entity_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_entity_id: Option<LegacyScalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_limit: Option<LegacyScalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_count: Option<LegacyScalar>,
}

pub fn to_canonical(record: &LegacyCampaignRecord) -> Result<Campaign, NormalizeError> {
    let id = required_text(record.id.as_ref().map(LegacyScalar::text), "id")?;
    let sponsor = record.partner_id.as_deref().and_then(PartnerId::parse);

    let owner_is_partner = match record.owner_type.as_deref().map(normalize_token) {
        Some(token) => match token.as_str() {
            "platform" | "admin" => false,
            "partner" => true,
            _ => return Err(invalid("ownerType", record.owner_type.as_deref())),
        },
        // Legacy documents never stored an owner; a partner id marks partner-funded ones.
        None => sponsor.is_some(),
    };

    let audience = if owner_is_partner {
        CampaignAudience::Partner { sponsor, eligibility: partner_eligibility(record)? }
    } else {
        CampaignAudience::Platform { targeting: platform_targeting(record)? }
    };

    let start_at = parse_instant(record.start_date.as_deref(), "startDate", DayBound::Start)?;
    let end_at = parse_instant(record.end_date.as_deref(), "endDate", DayBound::End)?;

    Ok(Campaign {
        id: CampaignId(id),
        title: title_of(record.title.as_deref(), record.name.as_deref()),
        description: record.description.clone().unwrap_or_default(),
        scope: parse_scope(record.domain.as_deref())?,
        status: parse_status(record.status.as_deref())?,
        discount: parse_discount(record.discount_type.as_deref(), record.discount_value.as_ref())?,
        window: ValidityWindow::new(start_at, end_at),
        audience,
        rules: CampaignRules {
            stacking: parse_stacking(record.stacking.as_ref())?,
            minimum_amount: optional_decimal(record.minimum_amount.as_ref(), "minimumAmount")?,
            maximum_discount: optional_decimal(
                record.maximum_discount.as_ref(),
                "maximumDiscount",
            )?,
            usage_limit_total: optional_count(record.usage_limit.as_ref(), "usageLimit")?,
            usage_limit_per_user: optional_count(
                record.usage_limit_per_user.as_ref(),
                "usageLimitPerUser",
            )?,
        },
        used_count: optional_count(record.used_count.as_ref(), "usedCount")?.unwrap_or(0),
    })
}

/// Always writes `ownerType`, so re-reading never falls back to inference.
pub fn to_legacy(campaign: &Campaign) -> LegacyCampaignRecord {
    let mut record = LegacyCampaignRecord {
        id: Some(LegacyScalar::Text(campaign.id.0.clone())),
        title: Some(campaign.title.clone()),
        description: Some(campaign.description.clone()),
        domain: Some(scope_token(campaign.scope).to_string()),
        status: Some(status_token(campaign.status).to_string()),
        discount_type: Some(kind_token(campaign.discount.kind).to_string()),
        discount_value: Some(LegacyScalar::from_decimal(campaign.discount.value)),
        start_date: Some(format_instant(campaign.window.start_at)),
        end_date: Some(format_instant(campaign.window.end_at)),
        stacking: Some(LegacyScalar::Text(stacking_token(campaign.rules.stacking).to_string())),
        minimum_amount: campaign.rules.minimum_amount.map(LegacyScalar::from_decimal),
        maximum_discount: campaign.rules.maximum_discount.map(LegacyScalar::from_decimal),
        usage_limit: campaign.rules.usage_limit_total.map(count_scalar),
        usage_limit_per_user: campaign.rules.usage_limit_per_user.map(count_scalar),
        used_count: Some(count_scalar(campaign.used_count)),
        ..LegacyCampaignRecord::default()
    };

    match &campaign.audience {
        CampaignAudience::Platform { targeting } => {
            record.owner_type = Some("platform".to_string());
            record.target_type = Some(target_token(targeting.mode).to_string());
            record.target_ids = Some(
                targeting.target_ids.iter().cloned().map(LegacyScalar::Text).collect(),
            );
        }
        CampaignAudience::Partner { sponsor, eligibility } => {
            record.owner_type = Some("partner".to_string());
            record.partner_id = sponsor.as_ref().map(|id| id.as_str().to_string());
            match eligibility {
                PartnerEligibility::AllPartnersInDomain => {
                    record.eligible_partners = Some("all_partners_in_domain".to_string());
                }
                PartnerEligibility::SelectPartners(partner_ids) => {
                    record.eligible_partners = Some("select_partners".to_string());
                    record.partner_ids =
                        Some(partner_ids.iter().map(|id| id.as_str().to_string()).collect());
                }
            }
        }
    }

    record
}

pub fn partner_discount_to_canonical(
    record: &LegacyPartnerDiscountRecord,
) -> Result<PartnerDiscount, NormalizeError> {
    let id = required_text(record.id.as_ref().map(LegacyScalar::text), "id")?;
    let partner_id = record
        .partner_id
        .as_deref()
        .and_then(PartnerId::parse)
        .ok_or(NormalizeError::MissingField { field: "partnerId" })?;

    let related_entity_id = record.related_entity_id.as_ref().map(LegacyScalar::text);
    let related_entity =
        match (record.related_entity_type.as_deref().map(normalize_token), related_entity_id) {
            (None, _) => EntityLink::None,
            (Some(token), _) if token.is_empty() || token == "none" => EntityLink::None,
            (Some(token), Some(id)) if !id.is_empty() => match token.as_str() {
                "listing" | "property" => EntityLink::Listing(id),
                "service" => EntityLink::Service(id),
                _ => return Err(invalid("relatedEntityType", record.related_entity_type.as_deref())),
            },
            (Some(_), _) => return Err(NormalizeError::MissingField { field: "relatedEntityId" }),
        };

    Ok(PartnerDiscount {
        id: PartnerDiscountId(id),
        partner_id,
        title: title_of(record.title.as_deref(), record.name.as_deref()),
        description: record.description.clone().unwrap_or_default(),
        scope: parse_scope(record.domain.as_deref())?,
        status: parse_status(record.status.as_deref())?,
        is_active: match &record.is_active {
            None => true,
            Some(flag) => parse_flag(flag, "isActive")?,
        },
        discount: parse_discount(record.discount_type.as_deref(), record.discount_value.as_ref())?,
        min_amount: optional_decimal(record.min_amount.as_ref(), "minAmount")?,
        max_discount: optional_decimal(record.max_discount.as_ref(), "maxDiscount")?,
        valid_from: optional_instant(record.start_date.as_deref(), "startDate", DayBound::Start)?,
        valid_until: optional_instant(record.end_date.as_deref(), "endDate", DayBound::End)?,
        related_entity,
        usage_limit_total: optional_count(record.usage_limit.as_ref(), "usageLimit")?,
        used_count: optional_count(record.used_count.as_ref(), "usedCount")?.unwrap_or(0),
    })
}

pub fn partner_discount_to_legacy(discount: &PartnerDiscount) -> LegacyPartnerDiscountRecord {
    let (related_entity_type, related_entity_id) = match &discount.related_entity {
        EntityLink::None => ("none", None),
        EntityLink::Listing(id) => ("listing", Some(LegacyScalar::Text(id.clone()))),
        EntityLink::Service(id) => ("service", Some(LegacyScalar::Text(id.clone()))),
    };

    LegacyPartnerDiscountRecord {
        id: Some(LegacyScalar::Text(discount.id.0.clone())),
        partner_id: Some(discount.partner_id.as_str().to_string()),
        title: Some(discount.title.clone()),
        name: None,
        description: Some(discount.description.clone()),
        domain: Some(scope_token(discount.scope).to_string()),
        status: Some(status_token(discount.status).to_string()),
        is_active: Some(LegacyScalar::Flag(discount.is_active)),
        discount_type: Some(kind_token(discount.discount.kind).to_string()),
        discount_value: Some(LegacyScalar::from_decimal(discount.discount.value)),
        min_amount: discount.min_amount.map(LegacyScalar::from_decimal),
        max_discount: discount.max_discount.map(LegacyScalar::from_decimal),
        start_date: discount.valid_from.map(format_instant),
        end_date: discount.valid_until.map(format_instant),
        related_entity_type: Some(related_entity_type.to_string()),
        related_entity_id,
        usage_limit: discount.usage_limit_total.map(count_scalar),
        used_count: Some(count_scalar(discount.used_count)),
    }
}

fn partner_eligibility(record: &LegacyCampaignRecord) -> Result<PartnerEligibility, NormalizeError> {
    let partner_ids: Vec<PartnerId> = record
        .partner_ids
        .iter()
        .flatten()
        .filter_map(|raw| PartnerId::parse(raw))
        .collect();

    match record.eligible_partners.as_deref().map(normalize_token) {
        None if partner_ids.is_empty() => Ok(PartnerEligibility::AllPartnersInDomain),
        None => Ok(PartnerEligibility::SelectPartners(partner_ids)),
        Some(token) => match token.as_str() {
            "all" | "all_partners" | "all_partners_in_domain" => {
                Ok(PartnerEligibility::AllPartnersInDomain)
            }
            "select" | "selected" | "select_partners" => {
                Ok(PartnerEligibility::SelectPartners(partner_ids))
            }
            _ => Err(invalid("eligiblePartners", record.eligible_partners.as_deref())),
        },
    }
}

fn platform_targeting(record: &LegacyCampaignRecord) -> Result<PlatformTargeting, NormalizeError> {
    let mode = match record.target_type.as_deref().map(normalize_token) {
        None => TargetMode::AllUsers,
        Some(token) => match token.as_str() {
            "" | "all" | "all_users" => TargetMode::AllUsers,
            "new_users" | "new_users_only" => TargetMode::NewUsersOnly,
            "category" => TargetMode::Category,
            "service" => TargetMode::Service,
            _ => return Err(invalid("targetType", record.target_type.as_deref())),
        },
    };
    let target_ids = record
        .target_ids
        .iter()
        .flatten()
        .map(LegacyScalar::text)
        .filter(|id| !id.is_empty())
        .collect();

    Ok(PlatformTargeting { mode, target_ids })
}

fn parse_scope(raw: Option<&str>) -> Result<Scope, NormalizeError> {
    let raw = raw.ok_or(NormalizeError::MissingField { field: "domain" })?;
    Scope::from_str(raw).map_err(|_| invalid("domain", Some(raw)))
}

fn parse_status(raw: Option<&str>) -> Result<CampaignStatus, NormalizeError> {
    match raw.map(normalize_token).as_deref() {
        None | Some("draft") => Ok(CampaignStatus::Draft),
        Some("active") => Ok(CampaignStatus::Active),
        Some("paused" | "inactive") => Ok(CampaignStatus::Paused),
        Some("expired" | "ended") => Ok(CampaignStatus::Expired),
        Some(_) => Err(invalid("status", raw)),
    }
}

fn parse_discount(
    kind: Option<&str>,
    value: Option<&LegacyScalar>,
) -> Result<DiscountValue, NormalizeError> {
    let kind = match kind.map(normalize_token).as_deref() {
        None => return Err(NormalizeError::MissingField { field: "discountType" }),
        Some("percent" | "percentage" | "rate") => DiscountKind::Percent,
        Some("amount" | "fixed" | "fixed_amount") => DiscountKind::Amount,
        Some(_) => return Err(invalid("discountType", kind)),
    };
    let value = optional_decimal(value, "discountValue")?
        .ok_or(NormalizeError::MissingField { field: "discountValue" })?;

    Ok(DiscountValue { kind, value })
}

fn parse_stacking(raw: Option<&LegacyScalar>) -> Result<Stacking, NormalizeError> {
    let Some(raw) = raw else {
        return Ok(Stacking::NotAllowed);
    };
    match normalize_token(&raw.text()).as_str() {
        "" | "false" | "not_allowed" | "none" => Ok(Stacking::NotAllowed),
        "true" | "allowed" => Ok(Stacking::Allowed),
        _ => Err(invalid("stacking", Some(&raw.text()))),
    }
}

fn parse_flag(raw: &LegacyScalar, field: &'static str) -> Result<bool, NormalizeError> {
    match normalize_token(&raw.text()).as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(invalid(field, Some(&raw.text()))),
    }
}

fn optional_decimal(
    raw: Option<&LegacyScalar>,
    field: &'static str,
) -> Result<Option<Decimal>, NormalizeError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let text = raw.text();
    if text.is_empty() {
        return Ok(None);
    }
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map(Some)
        .map_err(|_| invalid(field, Some(&text)))
}

fn optional_count(
    raw: Option<&LegacyScalar>,
    field: &'static str,
) -> Result<Option<u32>, NormalizeError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let text = raw.text();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<u32>().map(Some).map_err(|_| invalid(field, Some(&text)))
}

#[derive(Clone, Copy)]
enum DayBound {
    Start,
    End,
}

fn parse_instant(
    raw: Option<&str>,
    field: &'static str,
    bound: DayBound,
) -> Result<DateTime<Utc>, NormalizeError> {
    optional_instant(raw, field, bound)?.ok_or(NormalizeError::MissingField { field })
}

/// Date-only values cover the whole day: a start means midnight, an end means
/// the last millisecond of that day.
fn optional_instant(
    raw: Option<&str>,
    field: &'static str,
    bound: DayBound,
) -> Result<Option<DateTime<Utc>>, NormalizeError> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };

    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(instant.with_timezone(&Utc)));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(Some(Utc.from_utc_datetime(&naive)));
        }
    }

    let date =
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid(field, Some(raw)))?;
    let naive = match bound {
        DayBound::Start => date.and_hms_opt(0, 0, 0),
        DayBound::End => date.and_hms_milli_opt(23, 59, 59, 999),
    }
    .ok_or_else(|| invalid(field, Some(raw)))?;

    Ok(Some(Utc.from_utc_datetime(&naive)))
}

fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn required_text(raw: Option<String>, field: &'static str) -> Result<String, NormalizeError> {
    raw.filter(|value| !value.trim().is_empty()).ok_or(NormalizeError::MissingField { field })
}

fn title_of(title: Option<&str>, name: Option<&str>) -> String {
    title.or(name).unwrap_or_default().trim().to_string()
}

fn normalize_token(raw: &str) -> String {
    raw.trim().to_ascii_lowercase().replace(['-', ' '], "_")
}

fn invalid(field: &'static str, value: Option<&str>) -> NormalizeError {
    NormalizeError::InvalidValue { field, value: value.unwrap_or_default().to_string() }
}

fn count_scalar(count: u32) -> LegacyScalar {
    LegacyScalar::Number(serde_json::Number::from(count))
}

fn scope_token(scope: Scope) -> &'static str {
    match scope {
        Scope::RealEstate => "real_estate",
        Scope::Delivery => "delivery",
    }
}

fn status_token(status: CampaignStatus) -> &'static str {
    match status {
        CampaignStatus::Draft => "draft",
        CampaignStatus::Active => "active",
        CampaignStatus::Paused => "paused",
        CampaignStatus::Expired => "expired",
    }
}

fn kind_token(kind: DiscountKind) -> &'static str {
    match kind {
        DiscountKind::Percent => "percent",
        DiscountKind::Amount => "amount",
    }
}

fn target_token(mode: TargetMode) -> &'static str {
    match mode {
        TargetMode::AllUsers => "all_users",
        TargetMode::NewUsersOnly => "new_users_only",
        TargetMode::Category => "category",
        TargetMode::Service => "service",
    }
}

fn stacking_token(stacking: Stacking) -> &'static str {
    match stacking {
        Stacking::NotAllowed => "not_allowed",
        Stacking::Allowed => "allowed",
    }
}
