use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::core::target::Target;
use crate::core::verdict::DetectorResult;
use crate::detectors::{Detector, TLS};

/// Transport-security probe. Plain-http targets are flagged without any
/// network traffic; https targets get a HEAD through the validating client,
/// with a cert-permissive client used only to tell broken certificates apart
/// from unreachable hosts.
pub struct TlsDetector {
    client: Client,
    permissive: Client,
    timeout: Duration,
}

impl TlsDetector {
    pub fn new(client: Client, permissive: Client, timeout: Duration) -> Self {
        Self {
            client,
            permissive,
            timeout,
        }
    }

    async fn probe(&self, target: &Target) -> DetectorResult {
        let url = format!("https://{}/", target.hostname);
        let err = match self.client.head(&url).send().await {
            Ok(_) => {
                return DetectorResult::clean().with_detail("https", true.into());
            }
            Err(err) => err,
        };

        if err.is_timeout() {
            return DetectorResult::failure(5, "SSL_TIMEOUT");
        }

        let chain = error_chain(&err);
        if !chain.contains("certificate") && !chain.contains("cert") {
            tracing::warn!("tls probe failed for {}: {}", target.hostname, err);
            return DetectorResult::failure(15, "SSL_CONNECTION_ERROR")
                .with_detail("error", chain.into());
        }

        // cert rejected by validation; confirm the endpoint answers at all
        match self.permissive.head(&url).send().await {
            Ok(_) => {
                let (flag, score) = if chain.contains("expired") {
                    ("CERT_EXPIRED", 30)
                } else {
                    ("SELF_SIGNED_CERT", 20)
                };
                DetectorResult::scored(score, vec![flag.to_string()])
                    .with_detail("error", chain.into())
            }
            Err(second) => {
                tracing::warn!("tls probe unreachable for {}: {}", target.hostname, second);
                DetectorResult::failure(15, "SSL_CONNECTION_ERROR")
                    .with_detail("error", chain.into())
            }
        }
    }
}

fn error_chain(err: &reqwest::Error) -> String {
    let mut out = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        out.push_str("; ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out.to_lowercase()
}

#[async_trait]
impl Detector for TlsDetector {
    fn name(&self) -> &'static str {
        TLS
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn detect(&self, target: &Target) -> DetectorResult {
        if target.protocol != "https" {
            return DetectorResult::scored(20, vec!["NO_HTTPS".to_string()])
                .with_detail("protocol", target.protocol.clone().into());
        }
        self.probe(target).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[tokio::test]
    async fn plain_http_is_flagged_without_io() {
        let mut cfg = AppConfig::default();
        cfg.allow_private_targets = true;
        let target = Target::parse("http://127.0.0.1:1/x", &cfg).unwrap();
        let detector = TlsDetector::new(
            Client::new(),
            Client::new(),
            Duration::from_secs(1),
        );
        let result = detector.detect(&target).await;
        assert!(result.success);
        assert_eq!(result.score, 20);
        assert!(result.has_flag("NO_HTTPS"));
    }
}
