use tracing::{debug, info};

use crate::discount::ports::{
    AllowAllTargeting, CampaignSource, ChannelSettings, EnablementOracle, TargetingOracle,
};
use crate::discount::resolved::ResolvedDiscount;
use crate::domain::campaign::{
    Campaign, CampaignAudience, CampaignStatus, Owner, PlatformTargeting, Scope, TargetMode,
};
use crate::domain::context::RequestContext;
use crate::domain::partner::PartnerId;
use crate::domain::partner_discount::PartnerDiscount;
use crate::errors::ApplicationError;

pub trait DiscountResolver: Send + Sync {
    fn resolve(&self, context: &RequestContext)
        -> Result<Option<ResolvedDiscount>, ApplicationError>;
}

/// Picks at most one discount for a request, scanning the pools in priority order:
/// platform campaigns, then partner campaigns, then standalone partner discounts.
/// The first record passing every check wins.
///
/// Records that fail validation are skipped. Collaborator failures propagate,
/// since "no discount" and "unknown" must stay distinguishable.
pub struct EligibilityResolver<S, C, E, T = AllowAllTargeting> {
    source: S,
    channels: C,
    enablement: E,
    targeting: T,
}

impl<S, C, E> EligibilityResolver<S, C, E> {
    pub fn new(source: S, channels: C, enablement: E) -> Self {
        Self { source, channels, enablement, targeting: AllowAllTargeting }
    }
}

impl<S, C, E, T> EligibilityResolver<S, C, E, T> {
    pub fn with_targeting<U>(self, targeting: U) -> EligibilityResolver<S, C, E, U> {
        EligibilityResolver {
            source: self.source,
            channels: self.channels,
            enablement: self.enablement,
            targeting,
        }
    }
}

impl<S, C, E, T> EligibilityResolver<S, C, E, T>
where
    S: CampaignSource,
    C: ChannelSettings,
    E: EnablementOracle,
    T: TargetingOracle,
{
    /// Resolves only the standalone partner-discount tier, gate included.
    pub fn resolve_partner_discount(
        &self,
        context: &RequestContext,
    ) -> Result<Option<ResolvedDiscount>, ApplicationError> {
        let Some(partner_id) = context.partner_id.as_ref() else {
            return Ok(None);
        };
        if !self.partner_tiers_open(context.scope)? {
            return Ok(None);
        }

        Ok(self.first_partner_discount(context, partner_id)?.map(|discount| {
            log_resolved(context, &discount);
            discount
        }))
    }

    fn partner_tiers_open(&self, scope: Scope) -> Result<bool, ApplicationError> {
        match scope {
            Scope::Delivery => self.channels.is_channel_discount_enabled(scope),
            Scope::RealEstate => Ok(true),
        }
    }

    fn first_platform_campaign(
        &self,
        context: &RequestContext,
    ) -> Result<Option<ResolvedDiscount>, ApplicationError> {
        let campaigns = self.source.list_platform_campaigns()?;

        let found = campaigns.iter().find(|campaign| {
            let CampaignAudience::Platform { targeting } = &campaign.audience else {
                skipped(campaign, "owner_mismatch");
                return false;
            };
            if let Some(reason) = campaign_skip_reason(campaign, context) {
                skipped(campaign, reason);
                return false;
            }
            if !self.passes_targeting(targeting, context) {
                skipped(campaign, "target_mode");
                return false;
            }
            true
        });

        Ok(found.map(ResolvedDiscount::from_campaign))
    }

    fn first_partner_campaign(
        &self,
        context: &RequestContext,
        partner_id: &PartnerId,
    ) -> Result<Option<ResolvedDiscount>, ApplicationError> {
        let campaigns = self.source.list_partner_campaigns()?;

        for campaign in &campaigns {
            let CampaignAudience::Partner { eligibility, .. } = &campaign.audience else {
                skipped(campaign, "owner_mismatch");
                continue;
            };
            if let Some(reason) = campaign_skip_reason(campaign, context) {
                skipped(campaign, reason);
                continue;
            }
            if !eligibility.admits(partner_id) {
                skipped(campaign, "partner_not_eligible");
                continue;
            }
            if !self.enablement.is_campaign_enabled_for_partner(&campaign.id, partner_id)? {
                skipped(campaign, "not_enabled_by_partner");
                continue;
            }
            return Ok(Some(ResolvedDiscount::from_campaign(campaign)));
        }

        Ok(None)
    }

    fn first_partner_discount(
        &self,
        context: &RequestContext,
        partner_id: &PartnerId,
    ) -> Result<Option<ResolvedDiscount>, ApplicationError> {
        let discounts = self.source.list_partner_discounts()?;

        let found = discounts.iter().find(|discount| {
            match partner_discount_skip_reason(discount, context, partner_id) {
                Some(reason) => {
                    debug!(
                        event_name = "discount.resolve.skipped",
                        record_id = %discount.id.0,
                        reason,
                        "partner discount skipped"
                    );
                    false
                }
                None => true,
            }
        });

        Ok(found.map(ResolvedDiscount::from_partner_discount))
    }

    fn passes_targeting(&self, targeting: &PlatformTargeting, context: &RequestContext) -> bool {
        match targeting.mode {
            TargetMode::AllUsers => true,
            TargetMode::NewUsersOnly => self.targeting.is_new_user(context.customer_id.as_deref()),
            TargetMode::Category | TargetMode::Service => self.targeting.entity_in_targets(
                targeting.mode,
                &targeting.target_ids,
                context.entity_type,
                context.entity_id.as_deref(),
            ),
        }
    }
}

impl<S, C, E, T> DiscountResolver for EligibilityResolver<S, C, E, T>
where
    S: CampaignSource,
    C: ChannelSettings,
    E: EnablementOracle,
    T: TargetingOracle,
{
    fn resolve(
        &self,
        context: &RequestContext,
    ) -> Result<Option<ResolvedDiscount>, ApplicationError> {
        let Some(partner_id) = context.partner_id.as_ref() else {
            return Ok(none(context, "missing_partner"));
        };

        if let Some(discount) = self.first_platform_campaign(context)? {
            log_resolved(context, &discount);
            return Ok(Some(discount));
        }

        // Read once; the same answer gates both partner-funded tiers.
        if !self.partner_tiers_open(context.scope)? {
            return Ok(none(context, "channel_disabled"));
        }

        if let Some(discount) = self.first_partner_campaign(context, partner_id)? {
            log_resolved(context, &discount);
            return Ok(Some(discount));
        }

        if let Some(discount) = self.first_partner_discount(context, partner_id)? {
            log_resolved(context, &discount);
            return Ok(Some(discount));
        }

        Ok(none(context, "no_match"))
    }
}

fn campaign_skip_reason(campaign: &Campaign, context: &RequestContext) -> Option<&'static str> {
    if let Err(error) = campaign.validate() {
        debug!(event_name = "discount.resolve.malformed", error = %error, "malformed campaign");
        return Some("malformed");
    }
    if !campaign.is_active_at(context.now) {
        let reason =
            if campaign.status == CampaignStatus::Active { "outside_window" } else { "inactive" };
        return Some(reason);
    }
    if campaign.scope != context.scope {
        return Some("scope_mismatch");
    }
    if !campaign.has_usage_available() {
        return Some("usage_exhausted");
    }
    None
}

fn partner_discount_skip_reason(
    discount: &PartnerDiscount,
    context: &RequestContext,
    partner_id: &PartnerId,
) -> Option<&'static str> {
    if discount.partner_id != *partner_id {
        return Some("partner_mismatch");
    }
    if let Err(error) = discount.validate() {
        debug!(event_name = "discount.resolve.malformed", error = %error, "malformed discount");
        return Some("malformed");
    }
    if !discount.is_live() {
        return Some("inactive");
    }
    if discount.scope != context.scope {
        return Some("scope_mismatch");
    }
    if !discount.is_valid_at(context.now) {
        return Some("outside_window");
    }
    if !discount.related_entity.matches(context.entity_type, context.entity_id.as_deref()) {
        return Some("entity_mismatch");
    }
    if !discount.has_usage_available() {
        return Some("usage_exhausted");
    }
    None
}

fn skipped(campaign: &Campaign, reason: &'static str) {
    let owner = match campaign.owner() {
        Owner::Platform => "platform",
        Owner::Partner => "partner",
    };
    debug!(
        event_name = "discount.resolve.skipped",
        record_id = %campaign.id.0,
        owner,
        reason,
        "campaign skipped"
    );
}

fn log_resolved(context: &RequestContext, discount: &ResolvedDiscount) {
    info!(
        event_name = "discount.resolve.completed",
        scope = context.scope.as_str(),
        partner_id = context.partner_id.as_ref().map(|id| id.as_str()).unwrap_or("unknown"),
        discount_id = %discount.id,
        provenance = discount.provenance.as_str(),
        "discount resolved"
    );
}

fn none(context: &RequestContext, reason: &'static str) -> Option<ResolvedDiscount> {
    debug!(
        event_name = "discount.resolve.none",
        scope = context.scope.as_str(),
        reason,
        "no discount applies"
    );
    None
}
