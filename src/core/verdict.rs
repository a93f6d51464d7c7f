use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Outcome of a single detector probe. Failure is a first-class outcome: a
/// failed probe may still carry a small score ("could not resolve, mildly
/// suspicious") and always carries a diagnostic flag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectorResult {
    pub success: bool,
    pub score: u32,
    pub flags: Vec<String>,
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl DetectorResult {
    pub fn clean() -> Self {
        Self {
            success: true,
            score: 0,
            flags: Vec::new(),
            details: serde_json::Map::new(),
        }
    }

    pub fn scored(score: u32, flags: Vec<String>) -> Self {
        Self {
            success: true,
            score,
            flags,
            details: serde_json::Map::new(),
        }
    }

    pub fn failure(score: u32, flag: &str) -> Self {
        Self {
            success: false,
            score,
            flags: vec![flag.to_string()],
            details: serde_json::Map::new(),
        }
    }

    pub fn with_detail(mut self, key: &str, value: serde_json::Value) -> Self {
        self.details.insert(key.to_string(), value);
        self
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }
}

/// One result slot per registered detector, in registration order. Every
/// detector reports exactly once: a real result, a failure placeholder, a
/// timeout placeholder, or a skip placeholder.
#[derive(Debug, Clone, Default)]
pub struct SignalSet {
    entries: Vec<(String, DetectorResult)>,
}

impl SignalSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, result: DetectorResult) {
        self.entries.push((name.to_string(), result));
    }

    pub fn get(&self, name: &str) -> Option<&DetectorResult> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, r)| r)
    }

    pub fn score(&self, name: &str) -> u32 {
        self.get(name).map(|r| r.score).unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DetectorResult)> {
        self.entries.iter().map(|(n, r)| (n.as_str(), r))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchType {
    ExactSubdomain,
    CharSubstitution,
    BrandWithKeywords,
    Similarity,
    None,
}

impl MatchType {
    /// Flag string carried into the fused verdict.
    pub fn as_flag(&self) -> &'static str {
        match self {
            MatchType::ExactSubdomain => "EXACT_SUBDOMAIN",
            MatchType::CharSubstitution => "CHAR_SUBSTITUTION",
            MatchType::BrandWithKeywords => "BRAND_WITH_KEYWORDS",
            MatchType::Similarity => "SIMILARITY",
            MatchType::None => "NONE",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Result of the brand-impersonation scan; produced once per target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrandMatch {
    pub is_match: bool,
    pub brand: Option<String>,
    pub match_type: MatchType,
    pub confidence: Confidence,
    pub score: u32,
    pub edit_distance: Option<usize>,
}

impl BrandMatch {
    pub fn none() -> Self {
        Self {
            is_match: false,
            brand: None,
            match_type: MatchType::None,
            confidence: Confidence::Low,
            score: 0,
            edit_distance: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerdictBand {
    Safe,
    LowRisk,
    Suspicious,
    HighRisk,
}

/// Terminal artifact of one evaluation; immutable, cacheable, rendered to the
/// caller as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Verdict {
    pub url: String,
    pub band: VerdictBand,
    pub risk_score: u32,
    pub flags: Vec<String>,
    pub summary: String,
    pub recommendation: String,
    pub per_signal_scores: BTreeMap<String, u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_set_preserves_registration_order() {
        let mut set = SignalSet::new();
        set.insert("b", DetectorResult::clean());
        set.insert("a", DetectorResult::scored(7, vec![]));
        let names: Vec<&str> = set.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(set.score("a"), 7);
        assert_eq!(set.score("missing"), 0);
    }

    #[test]
    fn failure_results_keep_their_score_and_flag() {
        let result = DetectorResult::failure(5, "DNS_RESOLUTION_FAILED");
        assert!(!result.success);
        assert_eq!(result.score, 5);
        assert!(result.has_flag("DNS_RESOLUTION_FAILED"));
    }
}
