use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;

use crate::core::target::Target;
use crate::core::verdict::DetectorResult;
use crate::detectors::{Detector, DOMAIN_AGE};

/// Registration-age lookup via RDAP. Young domains score highest; anything
/// older than two years contributes nothing here (the fusion step uses the
/// age itself for its contextual rules).
pub struct DomainAgeDetector {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl DomainAgeDetector {
    pub fn new(client: Client, base_url: String, timeout: Duration) -> Self {
        Self {
            client,
            base_url,
            timeout,
        }
    }

    async fn lookup(&self, root_domain: &str) -> Result<DetectorResult> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), root_domain);
        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Ok(DetectorResult::failure(0, "RDAP_NO_DATA")
                .with_detail("status", resp.status().as_u16().into()));
        }
        let json: serde_json::Value = resp.json().await?;
        let created = registration_date(&json)
            .ok_or_else(|| anyhow!("no registration event for {}", root_domain))?;

        let age_days = (Utc::now() - created).num_days();
        let (score, flag) = age_bucket(age_days);
        let age_years = (age_days as f64 / 365.0 * 100.0).round() / 100.0;

        let mut flags = Vec::new();
        if let Some(flag) = flag {
            flags.push(flag.to_string());
        }
        Ok(DetectorResult::scored(score, flags)
            .with_detail("creation_date", created.to_rfc3339().into())
            .with_detail("age_days", age_days.into())
            .with_detail(
                "age_years",
                serde_json::Number::from_f64(age_years)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null),
            ))
    }
}

fn registration_date(json: &serde_json::Value) -> Option<DateTime<Utc>> {
    let events = json.get("events")?.as_array()?;
    for event in events {
        let action = event.get("eventAction").and_then(|a| a.as_str());
        if matches!(action, Some("registration") | Some("creation")) {
            if let Some(date) = event.get("eventDate").and_then(|d| d.as_str()) {
                if let Ok(parsed) = DateTime::parse_from_rfc3339(date) {
                    return Some(parsed.with_timezone(&Utc));
                }
            }
        }
    }
    None
}

fn age_bucket(age_days: i64) -> (u32, Option<&'static str>) {
    if age_days < 0 {
        (0, Some("INVALID_CREATION_DATE"))
    } else if age_days < 30 {
        (30, Some("VERY_NEW_DOMAIN"))
    } else if age_days < 365 {
        (20, Some("NEW_DOMAIN"))
    } else if age_days < 730 {
        (10, Some("RECENT_DOMAIN"))
    } else {
        (0, None)
    }
}

#[async_trait]
impl Detector for DomainAgeDetector {
    fn name(&self) -> &'static str {
        DOMAIN_AGE
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn detect(&self, target: &Target) -> DetectorResult {
        match self.lookup(&target.root_domain).await {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!("domain age lookup failed for {}: {}", target.root_domain, err);
                DetectorResult::failure(0, "DOMAIN_AGE_CHECK_FAILED")
                    .with_detail("error", err.to_string().into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_buckets_follow_thresholds() {
        assert_eq!(age_bucket(5), (30, Some("VERY_NEW_DOMAIN")));
        assert_eq!(age_bucket(29), (30, Some("VERY_NEW_DOMAIN")));
        assert_eq!(age_bucket(30), (20, Some("NEW_DOMAIN")));
        assert_eq!(age_bucket(183), (20, Some("NEW_DOMAIN")));
        assert_eq!(age_bucket(364), (20, Some("NEW_DOMAIN")));
        assert_eq!(age_bucket(400), (10, Some("RECENT_DOMAIN")));
        assert_eq!(age_bucket(3_000), (0, None));
        assert_eq!(age_bucket(-1), (0, Some("INVALID_CREATION_DATE")));
    }

    #[test]
    fn registration_event_is_parsed() {
        let json: serde_json::Value = serde_json::json!({
            "events": [
                { "eventAction": "last changed", "eventDate": "2024-01-01T00:00:00Z" },
                { "eventAction": "registration", "eventDate": "2015-06-01T00:00:00Z" }
            ]
        });
        let date = registration_date(&json).unwrap();
        assert_eq!(date.to_rfc3339(), "2015-06-01T00:00:00+00:00");
    }

    #[test]
    fn missing_events_yield_none() {
        assert!(registration_date(&serde_json::json!({})).is_none());
        assert!(registration_date(&serde_json::json!({ "events": [] })).is_none());
    }
}
