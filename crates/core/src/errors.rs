use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("campaign `{id}` is invalid: {reason}")]
    InvalidCampaign { id: String, reason: String },
    #[error("partner discount `{id}` is invalid: {reason}")]
    InvalidPartnerDiscount { id: String, reason: String },
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

/// Failures surfaced by resolution and pricing.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("discount store failure: {0}")]
    Persistence(String),
    /// A resolution port (enablement, channel settings, targeting) could not answer.
    #[error("collaborator `{port}` failed: {reason}")]
    Collaborator { port: &'static str, reason: String },
}

/// What a caller outside the engine is told. `detail` stays in logs and
/// diagnostics; `user_message` is safe to show a shopper.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("discount request rejected: {detail}")]
    Rejected { detail: String, correlation_id: String },
    #[error("discount lookup unavailable: {detail}")]
    Unavailable { detail: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Rejected { .. } => "This discount could not be applied to the request.",
            Self::Unavailable { .. } => {
                "Discounts cannot be checked right now; the full price applies until they return."
            }
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::Rejected { correlation_id, .. } | Self::Unavailable { correlation_id, .. } => {
                correlation_id
            }
        }
    }
}

impl ApplicationError {
    /// Domain failures are the caller's problem; anything else means the
    /// lookup itself could not run.
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        match self {
            Self::Domain(error) => {
                InterfaceError::Rejected { detail: error.to_string(), correlation_id }
            }
            Self::Persistence(detail) => InterfaceError::Unavailable { detail, correlation_id },
            Self::Collaborator { port, reason } => {
                InterfaceError::Unavailable { detail: format!("{port}: {reason}"), correlation_id }
            }
        }
    }
}
