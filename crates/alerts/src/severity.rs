use serde::{Deserialize, Serialize};

/// Alert urgency tier.
///
/// Declaration order is the urgency ranking (most urgent first), so sorting
/// alerts ascending by `Severity` puts `Critical` at the top.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    /// Tiers worth a spot in a daily digest; the rest stay in the full
    /// report only.
    pub fn is_urgent(&self) -> bool {
        matches!(self, Self::Critical | Self::High)
    }
}

impl core::fmt::Display for Severity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            Self::Critical => "CRITICAL",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
            Self::Info => "INFO",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_ranks_critical_first() {
        let mut tiers = vec![
            Severity::Low,
            Severity::Critical,
            Severity::Info,
            Severity::High,
            Severity::Medium,
        ];
        tiers.sort();
        assert_eq!(
            tiers,
            vec![
                Severity::Critical,
                Severity::High,
                Severity::Medium,
                Severity::Low,
                Severity::Info,
            ]
        );
    }

    #[test]
    fn only_top_two_tiers_are_urgent() {
        assert!(Severity::Critical.is_urgent());
        assert!(Severity::High.is_urgent());
        assert!(!Severity::Medium.is_urgent());
        assert!(!Severity::Low.is_urgent());
        assert!(!Severity::Info.is_urgent());
    }

    #[test]
    fn serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&Severity::Critical).unwrap(),
            "\"CRITICAL\""
        );
    }
}
