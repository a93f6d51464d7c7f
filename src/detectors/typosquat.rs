use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use strsim::levenshtein;

use crate::config::SubstitutionRule;
use crate::core::target::Target;
use crate::core::verdict::{BrandMatch, Confidence, DetectorResult, MatchType};
use crate::detectors::{Detector, TYPOSQUAT};

/// Leftover characters around a contained brand name that mark an
/// impersonation attempt (`tokopedia-login.com`).
const BRAND_KEYWORDS: [&str; 6] = ["login", "verify", "secure", "account", "official", "auth"];

#[derive(Debug, Clone)]
struct Brand {
    display: String,
    norm: String,
}

#[derive(Debug, Clone)]
struct Rule {
    fake: String,
    real: Vec<char>,
}

/// Brand-impersonation similarity engine. Holds the curated brand list and
/// the character-substitution table; both are immutable after construction.
pub struct BrandMatcher {
    brands: Vec<Brand>,
    rules: Vec<Rule>,
}

struct NormalizedTarget {
    hostname: String,
    label: String,
    subdomain: String,
}

impl BrandMatcher {
    pub fn new(brands: &[String], substitutions: &[SubstitutionRule]) -> Self {
        Self {
            brands: brands
                .iter()
                .map(|b| Brand {
                    display: b.clone(),
                    norm: normalize(b),
                })
                .filter(|b| !b.norm.is_empty())
                .collect(),
            rules: substitutions
                .iter()
                .map(|r| Rule {
                    fake: r.fake.to_lowercase(),
                    real: r.real.to_lowercase().chars().collect(),
                })
                .collect(),
        }
    }

    /// Scan all brands. Terminal rules (exact subdomain, character
    /// substitution, brand-plus-keywords) return the first hit immediately;
    /// edit-distance similarity needs the full scan because the closest
    /// brand is not known in advance.
    pub fn best_match(&self, target: &Target) -> BrandMatch {
        let norm = NormalizedTarget {
            hostname: normalize(&target.hostname),
            label: normalize(target.registrable_label()),
            subdomain: normalize(&target.subdomain),
        };

        let mut candidate: Option<(usize, &Brand)> = None;
        for brand in &self.brands {
            if let Some(hit) = self.terminal_rules(&norm, brand) {
                return hit;
            }

            let distance = levenshtein(&norm.label, &brand.norm);
            let threshold = 2.max(brand.norm.len() / 5);
            // distance 0 is the brand itself, not a squat
            if (1..=threshold).contains(&distance)
                && candidate.map_or(true, |(best, _)| distance < best)
            {
                candidate = Some((distance, brand));
            }
        }

        match candidate {
            Some((distance, brand)) if distance <= 2 => BrandMatch {
                is_match: true,
                brand: Some(brand.display.clone()),
                match_type: MatchType::Similarity,
                confidence: if distance == 1 {
                    Confidence::High
                } else {
                    Confidence::Medium
                },
                score: if distance == 1 { 45 } else { 35 },
                edit_distance: Some(distance),
            },
            _ => BrandMatch::none(),
        }
    }

    fn terminal_rules(&self, norm: &NormalizedTarget, brand: &Brand) -> Option<BrandMatch> {
        // brand name used verbatim as a subdomain (brand.hosting.tld)
        if !norm.subdomain.is_empty() && norm.subdomain == brand.norm {
            return Some(hit(brand, MatchType::ExactSubdomain, 50));
        }

        if self.has_substitution(norm, &brand.norm) {
            return Some(hit(brand, MatchType::CharSubstitution, 50));
        }

        if norm.hostname.contains(&brand.norm) && norm.hostname != brand.norm {
            let remainder = norm.hostname.replacen(&brand.norm, "", 1);
            if BRAND_KEYWORDS.iter().any(|k| remainder.contains(k)) {
                return Some(hit(brand, MatchType::BrandWithKeywords, 45));
            }
        }

        None
    }

    fn has_substitution(&self, norm: &NormalizedTarget, brand_norm: &str) -> bool {
        for rule in &self.rules {
            if rule.fake.chars().count() > 1 {
                // multi-char pseudo-letter, e.g. rn impersonating m
                let impersonated = match rule.real.first() {
                    Some(c) => *c,
                    None => continue,
                };
                if norm.hostname.contains(&rule.fake) && brand_norm.contains(impersonated) {
                    return true;
                }
            } else {
                for real in &rule.real {
                    let swapped = brand_norm.replace(*real, &rule.fake);
                    if swapped != brand_norm && norm.label == swapped {
                        return true;
                    }
                }
            }
        }
        false
    }
}

fn hit(brand: &Brand, match_type: MatchType, score: u32) -> BrandMatch {
    BrandMatch {
        is_match: true,
        brand: Some(brand.display.clone()),
        match_type,
        confidence: Confidence::High,
        score,
        edit_distance: None,
    }
}

/// Lower-case and strip everything non-alphanumeric.
pub fn normalize(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

pub struct TyposquatDetector {
    matcher: Arc<BrandMatcher>,
}

impl TyposquatDetector {
    pub fn new(matcher: Arc<BrandMatcher>) -> Self {
        Self { matcher }
    }
}

#[async_trait]
impl Detector for TyposquatDetector {
    fn name(&self) -> &'static str {
        TYPOSQUAT
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(1)
    }

    async fn detect(&self, target: &Target) -> DetectorResult {
        let m = self.matcher.best_match(target);
        let mut flags = Vec::new();
        if m.is_match {
            flags.push(m.match_type.as_flag().to_string());
        }
        DetectorResult::scored(m.score, flags).with_detail(
            "match",
            serde_json::to_value(&m).unwrap_or(serde_json::Value::Null),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn matcher() -> BrandMatcher {
        let cfg = AppConfig::default();
        BrandMatcher::new(&cfg.brands, &cfg.substitutions)
    }

    fn target(raw: &str) -> Target {
        Target::parse(raw, &AppConfig::default()).unwrap()
    }

    #[test]
    fn exact_brand_subdomain_on_hosting_platform() {
        let m = matcher().best_match(&target("https://tokopedia.vercel.app"));
        assert!(m.is_match);
        assert_eq!(m.match_type, MatchType::ExactSubdomain);
        assert_eq!(m.confidence, Confidence::High);
        assert_eq!(m.score, 50);
        assert_eq!(m.brand.as_deref(), Some("tokopedia"));
    }

    #[test]
    fn digit_for_letter_substitution() {
        let m = matcher().best_match(&target("https://paypa1.com"));
        assert!(m.is_match);
        assert_eq!(m.match_type, MatchType::CharSubstitution);
        assert_eq!(m.score, 50);
        assert_eq!(m.brand.as_deref(), Some("paypal"));
    }

    #[test]
    fn multi_char_pseudo_letter() {
        let m = matcher().best_match(&target("https://rnicrosoft.com"));
        assert!(m.is_match);
        assert_eq!(m.match_type, MatchType::CharSubstitution);
    }

    #[test]
    fn brand_with_suspicious_keyword() {
        let m = matcher().best_match(&target("https://tokopedia-login.com"));
        assert!(m.is_match);
        assert_eq!(m.match_type, MatchType::BrandWithKeywords);
        assert_eq!(m.score, 45);
    }

    #[test]
    fn one_edit_similarity_is_high_confidence() {
        let m = matcher().best_match(&target("https://tokopedla.com"));
        assert!(m.is_match);
        assert_eq!(m.match_type, MatchType::Similarity);
        assert_eq!(m.confidence, Confidence::High);
        assert_eq!(m.score, 45);
        assert_eq!(m.edit_distance, Some(1));
    }

    #[test]
    fn two_edit_similarity_is_medium_confidence() {
        let m = matcher().best_match(&target("https://tokopedlla.com"));
        assert!(m.is_match);
        assert_eq!(m.match_type, MatchType::Similarity);
        assert_eq!(m.confidence, Confidence::Medium);
        assert_eq!(m.score, 35);
        assert_eq!(m.edit_distance, Some(2));
    }

    #[test]
    fn closest_brand_wins_after_full_scan() {
        let brands = vec!["brandxyz".to_string(), "brandxy".to_string()];
        let m = BrandMatcher::new(&brands, &AppConfig::default().substitutions)
            .best_match(&target("https://brandxq.com"));
        // brandxy is distance 1, brandxyz distance 2; the later closer brand
        // must win over the earlier looser one
        assert!(m.is_match);
        assert_eq!(m.brand.as_deref(), Some("brandxy"));
        assert_eq!(m.edit_distance, Some(1));
    }

    #[test]
    fn legitimate_brand_domain_is_not_a_squat() {
        let m = matcher().best_match(&target("https://paypal.com"));
        assert!(!m.is_match);
        assert_eq!(m.match_type, MatchType::None);
        assert_eq!(m.score, 0);
    }

    #[test]
    fn unrelated_domain_matches_nothing() {
        let m = matcher().best_match(&target("https://wikipedia.org"));
        assert!(!m.is_match);
        assert_eq!(m.score, 0);
    }
}
