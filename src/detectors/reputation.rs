use std::net::IpAddr;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::core::target::Target;
use crate::core::verdict::DetectorResult;
use crate::detectors::{Detector, REPUTATION};

/// Resolves the target and, when an AbuseIPDB key is configured, scores the
/// resolved address against its abuse-confidence report.
pub struct ReputationDetector {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct AbuseResponse {
    data: AbuseData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AbuseData {
    abuse_confidence_score: u32,
    #[serde(default)]
    total_reports: u64,
    #[serde(default)]
    is_whitelisted: Option<bool>,
}

impl ReputationDetector {
    pub fn new(
        client: Client,
        api_url: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            api_url,
            api_key,
            timeout,
        }
    }

    async fn query_abuse(&self, ip: IpAddr, key: &str) -> Result<DetectorResult> {
        let resp = self
            .client
            .get(&self.api_url)
            .header("Key", key)
            .header("Accept", "application/json")
            .query(&[
                ("ipAddress", ip.to_string()),
                ("maxAgeInDays", "90".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;
        let parsed: AbuseResponse = resp.json().await?;

        let (score, flag) = abuse_bucket(parsed.data.abuse_confidence_score);
        let mut flags = Vec::new();
        if let Some(flag) = flag {
            flags.push(flag.to_string());
        }
        Ok(DetectorResult::scored(score, flags)
            .with_detail("ip", ip.to_string().into())
            .with_detail(
                "abuse_confidence_score",
                parsed.data.abuse_confidence_score.into(),
            )
            .with_detail("total_reports", parsed.data.total_reports.into())
            .with_detail(
                "is_whitelisted",
                parsed.data.is_whitelisted.map(Into::into).unwrap_or(serde_json::Value::Null),
            ))
    }
}

fn abuse_bucket(confidence: u32) -> (u32, Option<&'static str>) {
    if confidence > 75 {
        (40, Some("HIGH_ABUSE_SCORE"))
    } else if confidence > 50 {
        (25, Some("MEDIUM_ABUSE_SCORE"))
    } else if confidence > 25 {
        (10, Some("LOW_ABUSE_SCORE"))
    } else {
        (0, None)
    }
}

#[async_trait]
impl Detector for ReputationDetector {
    fn name(&self) -> &'static str {
        REPUTATION
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn detect(&self, target: &Target) -> DetectorResult {
        let resolved = tokio::net::lookup_host((target.hostname.as_str(), 443)).await;
        let ip = match resolved.map(|mut addrs| addrs.next()) {
            Ok(Some(addr)) => addr.ip(),
            Ok(None) | Err(_) => {
                return DetectorResult::failure(5, "DNS_RESOLUTION_FAILED");
            }
        };

        let key = match &self.api_key {
            Some(key) => key.clone(),
            None => {
                return DetectorResult::clean().with_detail("ip", ip.to_string().into());
            }
        };

        match self.query_abuse(ip, &key).await {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!("reputation check failed for {}: {}", target.hostname, err);
                DetectorResult::failure(0, "REPUTATION_CHECK_FAILED")
                    .with_detail("ip", ip.to_string().into())
                    .with_detail("error", err.to_string().into())
            }
        }
    }
}
