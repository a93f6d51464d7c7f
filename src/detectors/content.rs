use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use url::Url;

use crate::core::error::GuardError;
use crate::core::target::Target;
use crate::core::verdict::DetectorResult;
use crate::detectors::{Detector, CONTENT};

/// Fetches the landing page and scans the raw markup for phishing tells:
/// credential forms, off-site form actions, alarmist language, hidden forms,
/// iframe stuffing, link skew, cross-domain redirects.
pub struct ContentDetector {
    client: Client,
    timeout: Duration,
    phrases: Vec<String>,
    title_brands: Vec<String>,
    password_re: Regex,
    form_action_re: Regex,
    title_re: Regex,
    iframe_re: Regex,
    anchor_re: Regex,
    http_link_re: Regex,
    hidden_form_re: Regex,
}

impl ContentDetector {
    pub fn new(
        client: Client,
        timeout: Duration,
        phrases: &[String],
        title_brands: &[String],
    ) -> Result<Self, GuardError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| GuardError::Config(e.to_string()))
        };
        Ok(Self {
            client,
            timeout,
            phrases: phrases.iter().map(|p| p.to_lowercase()).collect(),
            title_brands: title_brands.iter().map(|b| b.to_lowercase()).collect(),
            password_re: compile(r#"(?i)<input[^>]*type\s*=\s*["']?password"#)?,
            form_action_re: compile(r#"(?i)<form[^>]*\saction\s*=\s*["']?([^"'\s>]+)"#)?,
            title_re: compile(r"(?i)<title[^>]*>([^<]*)")?,
            iframe_re: compile(r"(?i)<iframe")?,
            anchor_re: compile(r"(?i)<a\s[^>]*href")?,
            http_link_re: compile(r#"(?i)<a\s[^>]*href\s*=\s*["']?(https?://[^"'\s>]+)"#)?,
            hidden_form_re: compile(
                r#"(?i)<form[^>]*style\s*=\s*["'][^"']*display\s*:\s*none"#,
            )?,
        })
    }

    async fn fetch(&self, target: &Target) -> Result<DetectorResult> {
        let resp = self.client.get(target.href()).send().await?;
        let final_host = resp.url().host_str().map(str::to_string);
        let status = resp.status();
        if status.as_u16() >= 400 {
            return Ok(DetectorResult::failure(5, "HTTP_ERROR")
                .with_detail("status", status.as_u16().into()));
        }
        let body = resp.text().await?;
        Ok(self.scan(target, &body, final_host.as_deref()))
    }

    /// Pure scan over the fetched markup; `final_host` is the host the
    /// request actually landed on after redirects.
    pub fn scan(&self, target: &Target, body: &str, final_host: Option<&str>) -> DetectorResult {
        let body_lower = body.to_lowercase();
        let base = Url::parse(&target.href()).ok();

        let mut result = DetectorResult::clean();

        let has_password = self.password_re.is_match(body);
        if has_password {
            result.score += 5;
            result.flags.push("PASSWORD_FORM".to_string());
        }

        let mut external_action: Option<String> = None;
        for cap in self.form_action_re.captures_iter(body) {
            let action = &cap[1];
            let resolved = match (Url::parse(action), &base) {
                (Ok(url), _) => Some(url),
                (Err(_), Some(base)) => base.join(action).ok(),
                (Err(_), None) => None,
            };
            if let Some(host) = resolved.as_ref().and_then(|u| u.host_str()) {
                if host != target.hostname {
                    external_action = Some(host.to_string());
                    break;
                }
            }
        }
        if let Some(host) = external_action {
            result.score += 30;
            result.flags.push("EXTERNAL_FORM_ACTION".to_string());
            result
                .details
                .insert("external_form_action".to_string(), host.into());
            if has_password {
                // credentials posted straight off-site
                result.score += 15;
            }
        }

        let matched_phrases: Vec<&str> = self
            .phrases
            .iter()
            .filter(|p| body_lower.contains(p.as_str()))
            .map(|p| p.as_str())
            .take(5)
            .collect();
        if matched_phrases.len() >= 2 {
            result.score += 20;
            result.flags.push("PHISHING_LANGUAGE".to_string());
            result.details.insert(
                "phishing_phrases".to_string(),
                serde_json::Value::Array(matched_phrases.iter().map(|p| (*p).into()).collect()),
            );
        }

        if let Some(cap) = self.title_re.captures(body) {
            let title = cap[1].trim().to_lowercase();
            let domain = target.root_domain.to_lowercase();
            let brand_in_title = self.title_brands.iter().any(|b| title.contains(b.as_str()));
            let brand_in_domain = self
                .title_brands
                .iter()
                .any(|b| domain.contains(b.as_str()));
            result
                .details
                .insert("title".to_string(), cap[1].trim().into());
            if brand_in_title && !brand_in_domain {
                result.score += 15;
                result.flags.push("BRAND_MISMATCH".to_string());
            }
        }

        let iframe_count = self.iframe_re.find_iter(body).count();
        if iframe_count > 5 {
            result.score += 10;
            result.flags.push("EXCESSIVE_IFRAMES".to_string());
            result
                .details
                .insert("iframe_count".to_string(), iframe_count.into());
        }

        let total_links = self.anchor_re.find_iter(body).count();
        let external_links = self
            .http_link_re
            .captures_iter(body)
            .filter_map(|cap| Url::parse(&cap[1]).ok())
            .filter(|u| u.host_str().is_some_and(|h| h != target.hostname))
            .count();
        if total_links > 10 && external_links as f64 / total_links as f64 > 0.9 {
            result.score += 8;
            result.flags.push("EXCESSIVE_EXTERNAL_LINKS".to_string());
        }
        result
            .details
            .insert("total_links".to_string(), total_links.into());
        result
            .details
            .insert("external_links".to_string(), external_links.into());

        if self.hidden_form_re.is_match(body) {
            result.score += 20;
            result.flags.push("HIDDEN_FORM".to_string());
        }

        if let Some(host) = final_host {
            if host != target.hostname {
                result.score += 15;
                result.flags.push("CROSS_DOMAIN_REDIRECT".to_string());
                result
                    .details
                    .insert("redirected_to".to_string(), host.into());
            }
        }

        result
    }
}

#[async_trait]
impl Detector for ContentDetector {
    fn name(&self) -> &'static str {
        CONTENT
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn detect(&self, target: &Target) -> DetectorResult {
        match self.fetch(target).await {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!("content analysis failed for {}: {}", target.hostname, err);
                DetectorResult::failure(0, "CONTENT_CHECK_FAILED")
                    .with_detail("error", err.to_string().into())
            }
        }
    }
}
