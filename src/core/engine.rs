use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use crate::{
    config::AppConfig,
    core::{
        disk_cache::DiskCache,
        error::GuardError,
        target::Target,
        verdict::{Verdict, VerdictBand},
        whitelist::Whitelist,
    },
    detectors::{
        content::ContentDetector,
        domain_age::DomainAgeDetector,
        heuristic::HeuristicDetector,
        reputation::ReputationDetector,
        tls::TlsDetector,
        typosquat::{BrandMatcher, TyposquatDetector},
        Detector,
    },
    pipeline::{fusion::fuse, orchestrator::run_detectors},
};

struct CachedVerdict {
    verdict: Verdict,
    timestamp: Instant,
}

/// Front door of the evaluation pipeline: whitelist bypass, cache
/// read-through, concurrent detector fan-out, score fusion. Holds the shared
/// HTTP client and the immutable brand/whitelist tables.
pub struct Engine {
    pub config: AppConfig,
    matcher: Arc<BrandMatcher>,
    whitelist: Whitelist,
    detectors: Vec<Arc<dyn Detector>>,
    cache: Mutex<HashMap<String, CachedVerdict>>,
    disk_cache: Option<DiskCache>,
}

impl Engine {
    pub fn new(config: AppConfig) -> Result<Self, GuardError> {
        let timeout = Duration::from_millis(config.timeout_ms);
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(GuardError::from)?;
        // only the tls probe uses this, to tell broken certs from dead hosts
        let permissive = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(timeout)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(GuardError::from)?;

        let matcher = Arc::new(BrandMatcher::new(&config.brands, &config.substitutions));
        let whitelist = Whitelist::new(&config.whitelist_domains, &config.whitelist_suffixes);

        let detectors: Vec<Arc<dyn Detector>> = vec![
            Arc::new(HeuristicDetector::new(&config.suspicious_url_keywords)),
            Arc::new(TyposquatDetector::new(Arc::clone(&matcher))),
            Arc::new(TlsDetector::new(
                client.clone(),
                permissive,
                Duration::from_millis(config.tls_timeout_ms),
            )),
            Arc::new(DomainAgeDetector::new(
                client.clone(),
                config.rdap_base_url.clone(),
                Duration::from_millis(config.rdap_timeout_ms),
            )),
            Arc::new(ContentDetector::new(
                client.clone(),
                Duration::from_millis(config.content_timeout_ms),
                &config.phishing_phrases,
                &config.title_brands,
            )?),
            Arc::new(ReputationDetector::new(
                client,
                config.reputation_api_url.clone(),
                config.abuseipdb_api_key.clone(),
                Duration::from_millis(config.reputation_timeout_ms),
            )),
        ];

        let disk_cache = if config.disk_cache_enabled {
            let cache = DiskCache::new(Path::new(&config.disk_cache_path))?;
            let ttl = Duration::from_secs(config.cache_ttl_seconds);
            if let Err(err) = cache.purge_expired(ttl) {
                tracing::warn!("disk cache purge failed: {}", err);
            }
            Some(cache)
        } else {
            None
        };

        Ok(Self {
            config,
            matcher,
            whitelist,
            detectors,
            cache: Mutex::new(HashMap::new()),
            disk_cache,
        })
    }

    pub async fn check_url(&self, raw_url: &str, use_cache: bool) -> Result<Verdict, GuardError> {
        let target = Target::parse(raw_url, &self.config)?;

        if self.whitelist.is_listed(&target.hostname) {
            tracing::info!("whitelisted domain: {}", target.hostname);
            return Ok(whitelisted_verdict(&target));
        }

        let key = target.href();
        if use_cache {
            if let Some(verdict) = self.cached(&key) {
                tracing::debug!("cache hit for {}", key);
                return Ok(verdict);
            }
        }

        tracing::info!("analyzing {}", key);
        let shared = Arc::new(target);
        let signals = run_detectors(&self.detectors, &shared).await;
        let brand_match = self.matcher.best_match(&shared);
        let verdict = fuse(&shared, &signals, &brand_match);
        tracing::info!(
            "analysis complete for {}: {:?} ({})",
            key,
            verdict.band,
            verdict.risk_score
        );

        if use_cache && self.config.cache_ttl_seconds > 0 {
            self.store(&key, &verdict);
        }
        Ok(verdict)
    }

    /// Number of verdicts currently held in the in-memory cache.
    pub fn cached_entries(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    fn cached(&self, key: &str) -> Option<Verdict> {
        if self.config.cache_ttl_seconds == 0 {
            return None;
        }
        let ttl = Duration::from_secs(self.config.cache_ttl_seconds);
        if let Ok(cache) = self.cache.lock() {
            if let Some(entry) = cache.get(key) {
                if entry.timestamp.elapsed() < ttl {
                    return Some(entry.verdict.clone());
                }
            }
        }
        if let Some(disk) = &self.disk_cache {
            match disk.get(key, ttl) {
                Ok(found) => return found,
                Err(err) => tracing::warn!("disk cache read failed: {}", err),
            }
        }
        None
    }

    fn store(&self, key: &str, verdict: &Verdict) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(
                key.to_string(),
                CachedVerdict {
                    verdict: verdict.clone(),
                    timestamp: Instant::now(),
                },
            );
        }
        if let Some(disk) = &self.disk_cache {
            if let Err(err) = disk.put(key, verdict) {
                tracing::warn!("disk cache write failed: {}", err);
            }
        }
    }
}

fn whitelisted_verdict(target: &Target) -> Verdict {
    Verdict {
        url: target.href(),
        band: VerdictBand::Safe,
        risk_score: 0,
        flags: vec!["WHITELISTED".to_string()],
        summary: "Domain is in the trusted whitelist.".to_string(),
        recommendation: "This domain is verified as safe.".to_string(),
        per_signal_scores: Default::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn whitelisted_domain_bypasses_all_detectors() {
        let engine = Engine::new(AppConfig::default()).unwrap();
        let verdict = engine.check_url("https://google.com/search", true).await.unwrap();
        assert_eq!(verdict.band, VerdictBand::Safe);
        assert_eq!(verdict.risk_score, 0);
        assert_eq!(verdict.flags, vec!["WHITELISTED".to_string()]);
        assert!(verdict.per_signal_scores.is_empty());
        // bypass verdicts are not cached
        assert_eq!(engine.cached_entries(), 0);
    }

    #[tokio::test]
    async fn malformed_and_private_urls_are_rejected() {
        let engine = Engine::new(AppConfig::default()).unwrap();
        assert!(matches!(
            engine.check_url("not a url at all", true).await,
            Err(GuardError::InvalidUrl(_))
        ));
        assert!(matches!(
            engine.check_url("http://192.168.0.1/admin", true).await,
            Err(GuardError::PrivateTarget(_))
        ));
    }
}
