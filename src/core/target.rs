use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::AppConfig;
use crate::core::error::GuardError;

/// Normalized representation of a candidate URL. Built once per evaluation
/// and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Target {
    pub hostname: String,
    pub root_domain: String,
    pub subdomain: String,
    pub protocol: String,
    /// Explicit non-default port, kept so fetches hit the right origin.
    pub port: Option<u16>,
    pub path: String,
    pub query: String,
    pub is_hosted_platform: bool,
    pub platform_name: Option<String>,
}

impl Target {
    /// Parse and normalize a raw URL. Scheme-less input is assumed https.
    /// Rejects non-http(s) schemes and, unless the config allows them,
    /// loopback/private/link-local targets.
    pub fn parse(raw: &str, config: &AppConfig) -> Result<Self, GuardError> {
        let trimmed = raw.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(GuardError::InvalidUrl(raw.to_string()));
        }
        let candidate = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("https://{}", trimmed)
        };

        let url = Url::parse(&candidate).map_err(|_| GuardError::InvalidUrl(raw.to_string()))?;
        let protocol = url.scheme().to_string();
        if protocol != "http" && protocol != "https" {
            return Err(GuardError::InvalidUrl(raw.to_string()));
        }
        let hostname = url
            .host_str()
            .ok_or_else(|| GuardError::InvalidUrl(raw.to_string()))?
            .to_lowercase();

        if !config.allow_private_targets && is_private_host(&hostname) {
            return Err(GuardError::PrivateTarget(hostname));
        }

        let (root_domain, subdomain) = split_domain(&hostname, &config.multi_part_suffixes);
        let is_hosted_platform = config.hosted_platforms.iter().any(|platform| {
            root_domain == *platform || hostname.ends_with(&format!(".{}", platform))
        });
        let platform_name = is_hosted_platform.then(|| root_domain.clone());

        Ok(Self {
            hostname,
            root_domain,
            subdomain,
            protocol,
            port: url.port(),
            path: url.path().to_string(),
            query: url.query().unwrap_or("").to_string(),
            is_hosted_platform,
            platform_name,
        })
    }

    /// Reassemble the normalized URL; used as the cache key and for fetches.
    pub fn href(&self) -> String {
        let mut out = format!("{}://{}", self.protocol, self.hostname);
        if let Some(port) = self.port {
            out.push_str(&format!(":{}", port));
        }
        out.push_str(&self.path);
        if !self.query.is_empty() {
            out.push('?');
            out.push_str(&self.query);
        }
        out
    }

    /// The registrable label: root domain minus its public suffix
    /// (`paypa1` for `paypa1.com`). For IP hostnames this is the first octet,
    /// which never matches a brand.
    pub fn registrable_label(&self) -> &str {
        self.root_domain
            .split('.')
            .next()
            .unwrap_or(&self.root_domain)
    }
}

fn split_domain(hostname: &str, multi_part_suffixes: &[String]) -> (String, String) {
    if hostname.parse::<IpAddr>().is_ok() {
        return (hostname.to_string(), String::new());
    }
    let labels: Vec<&str> = hostname.split('.').collect();
    if labels.len() <= 2 {
        return (hostname.to_string(), String::new());
    }
    let last_two = labels[labels.len() - 2..].join(".");
    let root_len = if multi_part_suffixes.iter().any(|s| *s == last_two) && labels.len() >= 3 {
        3
    } else {
        2
    };
    let root = labels[labels.len() - root_len..].join(".");
    let sub = labels[..labels.len() - root_len].join(".");
    (root, sub)
}

fn is_private_host(hostname: &str) -> bool {
    if hostname == "localhost" {
        return true;
    }
    match hostname.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => {
            v4.is_loopback() || v4.is_private() || v4.is_link_local() || v4 == Ipv4Addr::UNSPECIFIED
        }
        Ok(IpAddr::V6(v6)) => v6.is_loopback() || v6.is_unspecified(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> AppConfig {
        AppConfig::default()
    }

    #[test]
    fn parses_and_lowercases_hostname() {
        let target = Target::parse("https://Sub.Example.COM/Path?q=1", &cfg()).unwrap();
        assert_eq!(target.hostname, "sub.example.com");
        assert_eq!(target.root_domain, "example.com");
        assert_eq!(target.subdomain, "sub");
        assert_eq!(target.protocol, "https");
        assert_eq!(target.path, "/Path");
        assert_eq!(target.query, "q=1");
        assert!(target.hostname.ends_with(&target.root_domain));
    }

    #[test]
    fn schemeless_input_defaults_to_https() {
        let target = Target::parse("example.com", &cfg()).unwrap();
        assert_eq!(target.protocol, "https");
        assert_eq!(target.href(), "https://example.com/");
    }

    #[test]
    fn multi_part_suffix_keeps_three_labels() {
        let target = Target::parse("https://mail.shopee.co.id", &cfg()).unwrap();
        assert_eq!(target.root_domain, "shopee.co.id");
        assert_eq!(target.subdomain, "mail");
        assert_eq!(target.registrable_label(), "shopee");
    }

    #[test]
    fn hosted_platform_is_classified() {
        let target = Target::parse("https://tokopedia.vercel.app", &cfg()).unwrap();
        assert!(target.is_hosted_platform);
        assert_eq!(target.platform_name.as_deref(), Some("vercel.app"));
        assert_eq!(target.subdomain, "tokopedia");
    }

    #[test]
    fn private_targets_are_rejected_by_default() {
        assert!(matches!(
            Target::parse("http://127.0.0.1/login", &cfg()),
            Err(GuardError::PrivateTarget(_))
        ));
        assert!(matches!(
            Target::parse("http://192.168.1.10", &cfg()),
            Err(GuardError::PrivateTarget(_))
        ));
        assert!(matches!(
            Target::parse("http://localhost:3000", &cfg()),
            Err(GuardError::PrivateTarget(_))
        ));
    }

    #[test]
    fn private_targets_allowed_when_configured() {
        let mut config = cfg();
        config.allow_private_targets = true;
        let target = Target::parse("http://127.0.0.1:8080/x", &config).unwrap();
        assert_eq!(target.hostname, "127.0.0.1");
        assert_eq!(target.root_domain, "127.0.0.1");
        assert_eq!(target.subdomain, "");
        assert_eq!(target.port, Some(8080));
        assert_eq!(target.href(), "http://127.0.0.1:8080/x");
    }

    #[test]
    fn rejects_garbage_and_non_http_schemes() {
        assert!(Target::parse("", &cfg()).is_err());
        assert!(Target::parse("ftp://example.com", &cfg()).is_err());
        assert!(Target::parse("http://", &cfg()).is_err());
    }
}
