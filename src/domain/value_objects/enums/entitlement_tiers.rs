use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Subscription level gating package visibility. Ordered: `None < Standard < Pro`.
#[derive(
    Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum EntitlementTier {
    #[default]
    None,
    Standard,
    Pro,
}

impl Display for EntitlementTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tier = match self {
            EntitlementTier::None => "none",
            EntitlementTier::Standard => "standard",
            EntitlementTier::Pro => "pro",
        };
        write!(f, "{}", tier)
    }
}

impl EntitlementTier {
    pub fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "standard" => EntitlementTier::Standard,
            "pro" => EntitlementTier::Pro,
            _ => EntitlementTier::None,
        }
    }

    /// `None` is satisfied by everyone; otherwise the holder needs at least the same tier.
    pub fn satisfies(&self, required: EntitlementTier) -> bool {
        required == EntitlementTier::None || *self >= required
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_requirement_is_satisfied_by_every_tier() {
        for tier in [EntitlementTier::None, EntitlementTier::Standard, EntitlementTier::Pro] {
            assert!(tier.satisfies(EntitlementTier::None));
        }
    }

    #[test]
    fn higher_tiers_cover_lower_requirements() {
        assert!(EntitlementTier::Pro.satisfies(EntitlementTier::Standard));
        assert!(!EntitlementTier::Standard.satisfies(EntitlementTier::Pro));
        assert!(!EntitlementTier::None.satisfies(EntitlementTier::Standard));
    }

    #[test]
    fn unknown_values_parse_as_none() {
        assert_eq!(EntitlementTier::from_str("Gold"), EntitlementTier::None);
        assert_eq!(EntitlementTier::from_str(" PRO "), EntitlementTier::Pro);
    }
}
