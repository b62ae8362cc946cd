// Strong Types - newtypes for identities that travel through the moderation core

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Canonical voter identity.
///
/// Identities reach the core as UUIDs, hyphen-less hex, upper-case strings or
/// plain opaque strings. Two identities are equal iff their canonical string
/// forms match: anything that parses as a UUID is rendered in lower-case
/// hyphenated form, everything else is kept verbatim (trimmed).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct VoterId(String);

impl VoterId {
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim();
        match Uuid::parse_str(trimmed) {
            Ok(uuid) => Self(uuid.hyphenated().to_string()),
            Err(_) => Self(trimmed.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VoterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for VoterId {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<&str> for VoterId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<Uuid> for VoterId {
    fn from(id: Uuid) -> Self {
        Self(id.hyphenated().to_string())
    }
}

impl From<VoterId> for String {
    fn from(id: VoterId) -> Self {
        id.0
    }
}

/// Fresh identifier for documents and nested nodes.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Inclusive bounds for a rating dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingRange {
    pub min: f64,
    pub max: f64,
}

impl RatingRange {
    pub const ONE_TO_FIVE: RatingRange = RatingRange { min: 1.0, max: 5.0 };
    pub const ONE_TO_TEN: RatingRange = RatingRange { min: 1.0, max: 10.0 };

    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }
}
