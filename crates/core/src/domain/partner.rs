use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Prefix tokens that some stores put in front of a partner slug.
pub const PARTNER_ID_PREFIXES: &[&str] = &["partner_", "partner-", "partner:"];

/// Partner identifier normalised once at the boundary where it enters the system.
///
/// Discount records and request contexts carry the same partner as a bare
/// local part (`acme`), a prefixed slug (`partner_acme`) or a full address
/// (`acme@offerly.example`). The canonical key strips one prefix token and
/// keeps the local part before `@`; equality and hashing only look at that key.
#[derive(Clone)]
pub struct PartnerId {
    raw: String,
    canonical: String,
}

impl PartnerId {
    /// Returns `None` for blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let canonical = canonical_key(raw);
        if canonical.is_empty() {
            return None;
        }

        Some(Self { raw: raw.to_string(), canonical })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// Part of the raw identifier before `@`, or the whole identifier.
    pub fn local_part(&self) -> &str {
        self.raw.split_once('@').map(|(local, _)| local).unwrap_or(&self.raw)
    }
}

fn canonical_key(raw: &str) -> String {
    let unprefixed = PARTNER_ID_PREFIXES
        .iter()
        .find_map(|prefix| raw.strip_prefix(prefix))
        .unwrap_or(raw);
    let local = unprefixed.split_once('@').map(|(local, _)| local).unwrap_or(unprefixed);
    local.trim().to_string()
}

impl PartialEq for PartnerId {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for PartnerId {}

impl Hash for PartnerId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl fmt::Debug for PartnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PartnerId").field(&self.raw).finish()
    }
}

impl fmt::Display for PartnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for PartnerId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for PartnerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom("partner id must not be blank"))
    }
}
