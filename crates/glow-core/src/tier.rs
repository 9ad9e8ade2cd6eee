//! Course Tiers
//!
//! Tier identity is carried as structured data end-to-end: it is chosen at
//! charge creation, stored on the payment attempt, and looked up again at
//! reconciliation to pick the unlock message. It is never inferred from the
//! free-text charge description.

use serde::{Deserialize, Serialize};

/// Paid course tiers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Video lessons only, no feedback
    SelfPaced,
    /// Lessons plus personal feedback on the student's result
    Mentored,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::SelfPaced => "self_paced",
            Tier::Mentored => "mentored",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "self_paced" => Some(Tier::SelfPaced),
            "mentored" => Some(Tier::Mentored),
            _ => None,
        }
    }

    /// Price in whole rubles (the provider's native unit for this shop)
    pub fn price_rub(self) -> i64 {
        match self {
            Tier::SelfPaced => 3000,
            Tier::Mentored => 5000,
        }
    }

    /// Charge description shown on the provider's payment page
    pub fn description(self) -> &'static str {
        match self {
            Tier::SelfPaced => "Home Glow course, self-paced",
            Tier::Mentored => "Home Glow course with personal feedback",
        }
    }

    /// Short label for history listings
    pub fn label(self) -> &'static str {
        match self {
            Tier::SelfPaced => "Tier 1 (self-paced)",
            Tier::Mentored => "Tier 2 (with feedback)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_pricing() {
        assert_eq!(Tier::SelfPaced.price_rub(), 3000);
        assert_eq!(Tier::Mentored.price_rub(), 5000);
    }

    #[test]
    fn test_tier_round_trip() {
        for tier in [Tier::SelfPaced, Tier::Mentored] {
            assert_eq!(Tier::from_str(tier.as_str()), Some(tier));
        }
        assert_eq!(Tier::from_str("vip"), None);
    }
}
