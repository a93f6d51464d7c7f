use std::{fs, path::Path};

use serde::Deserialize;

use crate::core::error::GuardError;

/// A visually-deceptive character rule: `fake` is the pseudo-letter seen in a
/// squatted hostname, `real` lists the characters it impersonates.
#[derive(Debug, Clone, Deserialize)]
pub struct SubstitutionRule {
    pub fake: String,
    pub real: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_seconds: u64,
    #[serde(default)]
    pub disk_cache_enabled: bool,
    #[serde(default = "default_disk_cache_path")]
    pub disk_cache_path: String,
    /// Loopback/RFC1918 targets are rejected unless enabled (test harnesses).
    #[serde(default)]
    pub allow_private_targets: bool,

    #[serde(default = "default_tls_timeout_ms")]
    pub tls_timeout_ms: u64,
    #[serde(default = "default_rdap_timeout_ms")]
    pub rdap_timeout_ms: u64,
    #[serde(default = "default_content_timeout_ms")]
    pub content_timeout_ms: u64,
    #[serde(default = "default_reputation_timeout_ms")]
    pub reputation_timeout_ms: u64,

    #[serde(default = "default_rdap_base_url")]
    pub rdap_base_url: String,
    #[serde(default = "default_reputation_api_url")]
    pub reputation_api_url: String,
    #[serde(default)]
    pub abuseipdb_api_key: Option<String>,

    #[serde(default = "default_brands")]
    pub brands: Vec<String>,
    #[serde(default = "default_substitutions")]
    pub substitutions: Vec<SubstitutionRule>,
    #[serde(default = "default_hosted_platforms")]
    pub hosted_platforms: Vec<String>,
    #[serde(default = "default_multi_part_suffixes")]
    pub multi_part_suffixes: Vec<String>,
    #[serde(default = "default_whitelist_domains")]
    pub whitelist_domains: Vec<String>,
    #[serde(default = "default_whitelist_suffixes")]
    pub whitelist_suffixes: Vec<String>,
    #[serde(default = "default_suspicious_url_keywords")]
    pub suspicious_url_keywords: Vec<String>,
    #[serde(default = "default_phishing_phrases")]
    pub phishing_phrases: Vec<String>,
    #[serde(default = "default_title_brands")]
    pub title_brands: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
            cache_ttl_seconds: default_cache_ttl(),
            disk_cache_enabled: false,
            disk_cache_path: default_disk_cache_path(),
            allow_private_targets: false,
            tls_timeout_ms: default_tls_timeout_ms(),
            rdap_timeout_ms: default_rdap_timeout_ms(),
            content_timeout_ms: default_content_timeout_ms(),
            reputation_timeout_ms: default_reputation_timeout_ms(),
            rdap_base_url: default_rdap_base_url(),
            reputation_api_url: default_reputation_api_url(),
            abuseipdb_api_key: None,
            brands: default_brands(),
            substitutions: default_substitutions(),
            hosted_platforms: default_hosted_platforms(),
            multi_part_suffixes: default_multi_part_suffixes(),
            whitelist_domains: default_whitelist_domains(),
            whitelist_suffixes: default_whitelist_suffixes(),
            suspicious_url_keywords: default_suspicious_url_keywords(),
            phishing_phrases: default_phishing_phrases(),
            title_brands: default_title_brands(),
        }
    }
}

pub fn load_config(path: Option<&str>) -> Result<AppConfig, GuardError> {
    let default_path = Path::new("config/phishguard.toml");
    let path = path.map(Path::new).unwrap_or(default_path);

    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|e| GuardError::Config(e.to_string()))?;
    let cfg: AppConfig =
        toml::from_str(&content).map_err(|e| GuardError::Config(e.to_string()))?;
    Ok(cfg)
}

fn default_timeout_ms() -> u64 {
    8_000
}

fn default_user_agent() -> String {
    "phishguard/1.0 (url-risk-checks)".to_string()
}

fn default_cache_ttl() -> u64 {
    3_600
}

fn default_disk_cache_path() -> String {
    "data/verdicts.json".to_string()
}

fn default_tls_timeout_ms() -> u64 {
    5_000
}

fn default_rdap_timeout_ms() -> u64 {
    10_000
}

fn default_content_timeout_ms() -> u64 {
    8_000
}

fn default_reputation_timeout_ms() -> u64 {
    3_000
}

fn default_rdap_base_url() -> String {
    "https://rdap.org/domain".to_string()
}

fn default_reputation_api_url() -> String {
    "https://api.abuseipdb.com/api/v2/check".to_string()
}

fn default_brands() -> Vec<String> {
    [
        // E-commerce
        "tokopedia",
        "shopee",
        "bukalapak",
        "lazada",
        "blibli",
        // Banking & payments
        "bca",
        "mandiri",
        "bni",
        "bri",
        "cimb",
        "danamon",
        "jenius",
        "ovo",
        "gopay",
        "dana",
        "linkaja",
        "shopeepay",
        "paypal",
        "stripe",
        "visa",
        "mastercard",
        // Social & tech
        "google",
        "facebook",
        "instagram",
        "twitter",
        "tiktok",
        "whatsapp",
        "telegram",
        "youtube",
        "linkedin",
        "microsoft",
        "apple",
        "amazon",
        // Crypto
        "binance",
        "coinbase",
        "indodax",
        // Entertainment
        "steam",
        "roblox",
        "netflix",
        "spotify",
        // Logistics
        "jne",
        "sicepat",
        "anteraja",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_substitutions() -> Vec<SubstitutionRule> {
    [
        ("0", "o"),
        ("1", "li"),
        ("3", "e"),
        ("4", "a"),
        ("5", "s"),
        ("8", "b"),
        ("rn", "m"),
        ("vv", "w"),
        ("cl", "d"),
    ]
    .into_iter()
    .map(|(fake, real)| SubstitutionRule {
        fake: fake.to_string(),
        real: real.to_string(),
    })
    .collect()
}

fn default_hosted_platforms() -> Vec<String> {
    [
        "vercel.app",
        "netlify.app",
        "github.io",
        "pages.dev",
        "firebaseapp.com",
        "herokuapp.com",
        "azurewebsites.net",
        "web.app",
        "railway.app",
        "onrender.com",
        "fly.dev",
        "replit.app",
        "glitch.me",
        "wixsite.com",
        "wordpress.com",
        "blogspot.com",
        "weebly.com",
        "webflow.io",
        "carrd.co",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_multi_part_suffixes() -> Vec<String> {
    [
        "co.id", "or.id", "ac.id", "go.id", "web.id", "my.id", "co.uk", "org.uk", "ac.uk",
        "com.au", "net.au", "org.au", "co.jp", "com.sg", "com.my", "com.br", "co.in",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_whitelist_domains() -> Vec<String> {
    [
        "tokopedia.com",
        "shopee.co.id",
        "shopee.com",
        "bukalapak.com",
        "lazada.co.id",
        "blibli.com",
        "klikbca.com",
        "bca.co.id",
        "bankmandiri.co.id",
        "bni.co.id",
        "bri.co.id",
        "google.com",
        "youtube.com",
        "facebook.com",
        "instagram.com",
        "microsoft.com",
        "live.com",
        "outlook.com",
        "apple.com",
        "icloud.com",
        "amazon.com",
        "gojek.com",
        "ovo.id",
        "dana.id",
        "paypal.com",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_whitelist_suffixes() -> Vec<String> {
    [
        "google.com",
        "googleapis.com",
        "youtube.com",
        "facebook.com",
        "instagram.com",
        "microsoft.com",
        "apple.com",
        "amazon.com",
        "tokopedia.com",
        "shopee.co.id",
        "bukalapak.com",
        "go.id",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_suspicious_url_keywords() -> Vec<String> {
    [
        "login", "signin", "verify", "secure", "account", "update", "confirm", "validate",
        "suspend", "unusual", "activity", "password", "reset", "recover", "unlock", "blocked",
        "urgent", "action", "required", "immediately", "warning", "security", "alert",
        "notification", "verification",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_phishing_phrases() -> Vec<String> {
    [
        "verify account",
        "confirm identity",
        "suspended account",
        "unusual activity",
        "click here immediately",
        "urgent action required",
        "account will be closed",
        "update payment",
        "verify payment method",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_title_brands() -> Vec<String> {
    [
        "paypal", "amazon", "facebook", "google", "microsoft", "apple", "netflix", "bank",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_brand_and_platform_tables() {
        let cfg = AppConfig::default();
        assert!(cfg.brands.iter().any(|b| b == "paypal"));
        assert!(cfg.hosted_platforms.iter().any(|p| p == "vercel.app"));
        assert!(!cfg.allow_private_targets);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            cache_ttl_seconds = 60
            brands = ["examplebrand"]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.cache_ttl_seconds, 60);
        assert_eq!(cfg.brands, vec!["examplebrand".to_string()]);
        assert_eq!(cfg.timeout_ms, 8_000);
        assert!(cfg.substitutions.iter().any(|r| r.fake == "rn"));
    }
}
