//! Subscription tiers and the tier catalog.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use wayfarer_core::defaults::*;

use crate::error::GuardError;
use crate::size::deserialize_size;

/// Subscription tier, ordered from least to most capable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Explorer,
    Traveler,
    Enterprise,
}

impl Tier {
    /// All tiers in capability order.
    pub const ALL: [Tier; 4] = [Tier::Free, Tier::Explorer, Tier::Traveler, Tier::Enterprise];

    /// Parse a tier id. Case-insensitive, surrounding whitespace ignored.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Some(Tier::Free),
            "explorer" => Some(Tier::Explorer),
            "traveler" => Some(Tier::Traveler),
            "enterprise" => Some(Tier::Enterprise),
            _ => None,
        }
    }

    /// Tier id as stored in user profiles.
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Explorer => "explorer",
            Tier::Traveler => "traveler",
            Tier::Enterprise => "enterprise",
        }
    }

    /// Position in the ordered tier list.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Whether this tier grants everything `required` grants.
    #[inline]
    pub fn covers(self, required: Tier) -> bool {
        self.index() >= required.index()
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = GuardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tier::parse(s).ok_or_else(|| GuardError::validation(format!("unknown tier: {s}")))
    }
}

/// Whether a user on `user_tier` may use a feature that requires `required_tier`.
///
/// Both arguments are raw tier ids. Anything outside the known tier list
/// yields `false`.
///
/// # Example
/// ```
/// use wayfarer_guard::meets_requirement;
///
/// assert!(meets_requirement("traveler", "explorer"));
/// assert!(!meets_requirement("free", "explorer"));
/// assert!(!meets_requirement("platinum", "free"));
/// ```
pub fn meets_requirement(user_tier: &str, required_tier: &str) -> bool {
    match (Tier::parse(user_tier), Tier::parse(required_tier)) {
        (Some(user), Some(required)) => user.covers(required),
        _ => false,
    }
}

/// Limits and display metadata for one tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierLimits {
    /// Storage budget in bytes. Accepts "500MB" style strings in config files.
    #[serde(deserialize_with = "deserialize_size")]
    pub max_storage_bytes: u64,
    /// Maximum number of experiences.
    pub max_experiences: u32,
    /// Maximum number of exports per billing period.
    pub max_exports: u32,
    /// Display name shown on pricing pages.
    #[serde(default)]
    pub display_name: String,
    /// Monthly price in cents (display only).
    #[serde(default)]
    pub monthly_price_cents: u32,
    /// Feature bullet points (display only).
    #[serde(default)]
    pub features: Vec<String>,
}

impl TierLimits {
    /// Built-in limits for a tier.
    pub fn defaults_for(tier: Tier) -> Self {
        match tier {
            Tier::Free => Self {
                max_storage_bytes: DEFAULT_FREE_STORAGE_BYTES,
                max_experiences: DEFAULT_FREE_MAX_EXPERIENCES,
                max_exports: DEFAULT_FREE_MAX_EXPORTS,
                display_name: "Free".into(),
                monthly_price_cents: 0,
                features: vec!["500 MB photo storage".into(), "3 experiences".into()],
            },
            Tier::Explorer => Self {
                max_storage_bytes: DEFAULT_EXPLORER_STORAGE_BYTES,
                max_experiences: DEFAULT_EXPLORER_MAX_EXPERIENCES,
                max_exports: DEFAULT_EXPLORER_MAX_EXPORTS,
                display_name: "Explorer".into(),
                monthly_price_cents: 499,
                features: vec!["5 GB photo storage".into(), "25 experiences".into()],
            },
            Tier::Traveler => Self {
                max_storage_bytes: DEFAULT_TRAVELER_STORAGE_BYTES,
                max_experiences: DEFAULT_TRAVELER_MAX_EXPERIENCES,
                max_exports: DEFAULT_TRAVELER_MAX_EXPORTS,
                display_name: "Traveler".into(),
                monthly_price_cents: 999,
                features: vec![
                    "25 GB photo storage".into(),
                    "100 experiences".into(),
                    "Bulk photo editing".into(),
                ],
            },
            Tier::Enterprise => Self {
                max_storage_bytes: DEFAULT_ENTERPRISE_STORAGE_BYTES,
                max_experiences: DEFAULT_ENTERPRISE_MAX_EXPERIENCES,
                max_exports: DEFAULT_ENTERPRISE_MAX_EXPORTS,
                display_name: "Enterprise".into(),
                monthly_price_cents: 4999,
                features: vec![
                    "100 GB photo storage".into(),
                    "Unlimited experiences".into(),
                    "Bulk photo editing".into(),
                    "Priority support".into(),
                ],
            },
        }
    }
}

/// Built-in catalog entries, keyed by tier.
pub fn default_tier_limits() -> BTreeMap<Tier, TierLimits> {
    Tier::ALL
        .into_iter()
        .map(|t| (t, TierLimits::defaults_for(t)))
        .collect()
}

/// Immutable mapping from tier to limits.
///
/// Built once at startup and shared by reference; nothing mutates it at
/// request time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierCatalog {
    limits: [TierLimits; 4],
}

impl TierCatalog {
    /// Build a catalog from per-tier limits.
    ///
    /// Every tier must be present, every storage limit must be non-zero and
    /// storage limits must not decrease as tiers increase.
    pub fn from_limits(mut entries: BTreeMap<Tier, TierLimits>) -> Result<Self, GuardError> {
        let mut take = |tier: Tier| {
            entries.remove(&tier).ok_or_else(|| {
                GuardError::Configuration(format!("tier catalog is missing '{tier}'"))
            })
        };
        let limits = [
            take(Tier::Free)?,
            take(Tier::Explorer)?,
            take(Tier::Traveler)?,
            take(Tier::Enterprise)?,
        ];

        for (tier, l) in Tier::ALL.iter().zip(limits.iter()) {
            if l.max_storage_bytes == 0 {
                return Err(GuardError::Configuration(format!(
                    "tier '{tier}' has a zero storage limit"
                )));
            }
        }
        for pair in Tier::ALL.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if limits[hi.index()].max_storage_bytes < limits[lo.index()].max_storage_bytes {
                return Err(GuardError::Configuration(format!(
                    "tier '{hi}' storage limit is below '{lo}'"
                )));
            }
        }

        Ok(Self { limits })
    }

    /// Limits for a known tier.
    #[inline]
    pub fn lookup(&self, tier: Tier) -> &TierLimits {
        &self.limits[tier.index()]
    }

    /// Resolve a raw tier id as stored on a profile.
    ///
    /// Unknown ids resolve to [`Tier::Free`], the most restrictive entry.
    pub fn resolve(&self, raw_tier: &str) -> (Tier, &TierLimits) {
        let tier = Tier::parse(raw_tier).unwrap_or(Tier::Free);
        (tier, self.lookup(tier))
    }

    /// Iterate tiers in capability order.
    pub fn iter(&self) -> impl Iterator<Item = (Tier, &TierLimits)> {
        Tier::ALL.into_iter().zip(self.limits.iter())
    }
}

impl Default for TierCatalog {
    fn default() -> Self {
        Self {
            limits: Tier::ALL.map(TierLimits::defaults_for),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meets_requirement_matches_index_order() {
        for user in Tier::ALL {
            for required in Tier::ALL {
                assert_eq!(
                    meets_requirement(user.as_str(), required.as_str()),
                    user.index() >= required.index(),
                    "{user} vs {required}"
                );
            }
        }
    }

    #[test]
    fn test_meets_requirement_unknown_is_denied() {
        assert!(!meets_requirement("gold", "free"));
        assert!(!meets_requirement("enterprise", "gold"));
        assert!(!meets_requirement("", ""));
        assert!(!meets_requirement("enterprise ", "premium"));
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(Tier::parse(" Traveler "), Some(Tier::Traveler));
        assert_eq!("ENTERPRISE".parse::<Tier>().unwrap(), Tier::Enterprise);
        assert!("vip".parse::<Tier>().is_err());
    }

    #[test]
    fn test_resolve_unknown_falls_back_to_free() {
        let catalog = TierCatalog::default();
        let (tier, limits) = catalog.resolve("legacy-pro");
        assert_eq!(tier, Tier::Free);
        assert_eq!(limits.max_storage_bytes, DEFAULT_FREE_STORAGE_BYTES);
    }

    #[test]
    fn test_from_limits_requires_every_tier() {
        let mut entries = default_tier_limits();
        entries.remove(&Tier::Explorer);
        let err = TierCatalog::from_limits(entries).unwrap_err();
        assert!(matches!(err, GuardError::Configuration(_)));
    }

    #[test]
    fn test_from_limits_rejects_decreasing_storage() {
        let mut entries = default_tier_limits();
        if let Some(l) = entries.get_mut(&Tier::Enterprise) {
            l.max_storage_bytes = 1;
        }
        assert!(TierCatalog::from_limits(entries).is_err());
    }

    #[test]
    fn test_from_limits_default_roundtrip() {
        let catalog = TierCatalog::from_limits(default_tier_limits()).unwrap();
        assert_eq!(catalog, TierCatalog::default());
    }

    #[test]
    fn test_limits_accept_size_strings() {
        let json = r#"{"max_storage_bytes": "2GB", "max_experiences": 5, "max_exports": 1}"#;
        let limits: TierLimits = serde_json::from_str(json).unwrap();
        assert_eq!(limits.max_storage_bytes, 2 * 1024 * 1024 * 1024);
        assert!(limits.features.is_empty());
    }
}
