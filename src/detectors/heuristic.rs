use std::time::Duration;

use async_trait::async_trait;

use crate::core::target::Target;
use crate::core::verdict::DetectorResult;
use crate::detectors::{Detector, HEURISTIC};

/// Pure string checks over the URL itself; no I/O.
pub struct HeuristicDetector {
    keywords: Vec<String>,
}

impl HeuristicDetector {
    pub fn new(keywords: &[String]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    pub fn analyze(&self, target: &Target) -> DetectorResult {
        let full_url = format!("{}{}{}", target.hostname, target.path, target.query);
        let full_lower = full_url.to_lowercase();

        let mut score = 0u32;
        let mut flags = Vec::new();

        if target.hostname.len() > 50 {
            score += 15;
            flags.push("LONG_HOSTNAME".to_string());
        }

        let dash_count = target.hostname.matches('-').count();
        if dash_count > 3 {
            score += 10;
            flags.push("EXCESSIVE_DASHES".to_string());
        }

        let digit_count = target.hostname.chars().filter(|c| c.is_ascii_digit()).count();
        if digit_count > 4 {
            score += 10;
            flags.push("EXCESSIVE_DIGITS".to_string());
        }

        let matched: Vec<&str> = self
            .keywords
            .iter()
            .filter(|k| full_lower.contains(k.as_str()))
            .map(|k| k.as_str())
            .collect();
        if !matched.is_empty() {
            score += (matched.len() as u32 * 5).min(20);
            flags.push("SUSPICIOUS_KEYWORDS".to_string());
        }

        if full_url.contains('@') {
            score += 25;
            flags.push("AT_SYMBOL".to_string());
        }

        if is_ipv4(&target.hostname) {
            score += 20;
            flags.push("IP_ADDRESS".to_string());
        }

        let subdomain_depth = target
            .subdomain
            .split('.')
            .filter(|part| !part.is_empty())
            .count();
        if subdomain_depth > 3 {
            score += 10;
            flags.push("DEEP_SUBDOMAIN".to_string());
        }

        DetectorResult::scored(score, flags)
            .with_detail("hostname_length", target.hostname.len().into())
            .with_detail("dash_count", dash_count.into())
            .with_detail("digit_count", digit_count.into())
            .with_detail("subdomain_depth", subdomain_depth.into())
            .with_detail(
                "suspicious_keywords",
                serde_json::Value::Array(
                    matched.iter().map(|k| (*k).into()).collect(),
                ),
            )
    }
}

fn is_ipv4(hostname: &str) -> bool {
    hostname.parse::<std::net::Ipv4Addr>().is_ok()
}

#[async_trait]
impl Detector for HeuristicDetector {
    fn name(&self) -> &'static str {
        HEURISTIC
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(1)
    }

    async fn detect(&self, target: &Target) -> DetectorResult {
        self.analyze(target)
    }
}
