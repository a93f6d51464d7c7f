use crate::core::target::Target;
use crate::core::verdict::{BrandMatch, SignalSet, Verdict, VerdictBand};
use crate::detectors::{CONTENT, DOMAIN_AGE, HEURISTIC, REPUTATION, TLS, TYPOSQUAT};

const CRITICAL_FLAGS: [&str; 10] = [
    "EXACT_SUBDOMAIN",
    "CHAR_SUBSTITUTION",
    "BRAND_WITH_KEYWORDS",
    "SIMILARITY",
    "EXTERNAL_FORM_ACTION",
    "HIGH_ABUSE_SCORE",
    "CERT_EXPIRED",
    "HIDDEN_FORM",
    "CROSS_DOMAIN_REDIRECT",
    "BRAND_MISMATCH",
];

const WARNING_FLAGS: [&str; 5] = [
    "NO_HTTPS",
    "VERY_NEW_DOMAIN",
    "PHISHING_LANGUAGE",
    "SELF_SIGNED_CERT",
    "EXCESSIVE_IFRAMES",
];

/// Combine a fully-populated signal set into the final verdict. Base signals
/// add up unconditionally; the content and domain-age contributions are
/// reweighted by how established the domain is, then critical flag
/// combinations stack on top.
pub fn fuse(target: &Target, signals: &SignalSet, brand_match: &BrandMatch) -> Verdict {
    let mut flags: Vec<String> = Vec::new();
    if target.is_hosted_platform {
        push_unique(&mut flags, "HOSTED_PLATFORM");
    }
    for (_, result) in signals.iter() {
        for flag in &result.flags {
            push_unique(&mut flags, flag);
        }
    }
    if brand_match.is_match {
        push_unique(&mut flags, brand_match.match_type.as_flag());
    }

    let password_form = has(&flags, "PASSWORD_FORM");
    let external_form = has(&flags, "EXTERNAL_FORM_ACTION");

    let mut total: u32 = signals.score(HEURISTIC)
        + signals.score(TYPOSQUAT)
        + signals.score(TLS)
        + signals.score(REPUTATION);

    let age_years = signals
        .get(DOMAIN_AGE)
        .and_then(|r| r.details.get("age_years"))
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);
    let content_score = signals.score(CONTENT);
    let age_score = signals.score(DOMAIN_AGE);

    if age_years >= 5.0 {
        // an old domain with a bare login form is presumptively legitimate;
        // its registration age carries no residual risk either
        total += dampened(content_score, 5, password_form && !external_form);
    } else if age_years >= 2.0 {
        total += dampened(content_score, 3, password_form && !external_form);
        total += age_score.saturating_sub(5);
    } else {
        total += age_score + content_score;
        if password_form && (has(&flags, "VERY_NEW_DOMAIN") || has(&flags, "NEW_DOMAIN")) {
            total += 10;
            push_unique(&mut flags, "NEW_DOMAIN_WITH_LOGIN");
        }
    }

    if age_years >= 2.0 && !has(&flags, "NO_HTTPS") && !has(&flags, "SELF_SIGNED_CERT") {
        total = total.saturating_sub(5);
    }

    if external_form && password_form {
        total += 20;
    }
    if brand_match.is_match && password_form {
        total += 15;
    }
    if target.is_hosted_platform && brand_match.is_match {
        total += 10;
    }

    let risk_score = total.min(100);
    let (band, recommendation) = band_for(risk_score);
    let summary = summary_for(&flags);

    Verdict {
        url: target.href(),
        band,
        risk_score,
        flags,
        summary: summary.to_string(),
        recommendation: recommendation.to_string(),
        per_signal_scores: signals
            .iter()
            .map(|(name, result)| (name.to_string(), result.score))
            .collect(),
    }
}

fn dampened(score: u32, discount: u32, apply: bool) -> u32 {
    if apply {
        score.saturating_sub(discount)
    } else {
        score
    }
}

fn band_for(risk_score: u32) -> (VerdictBand, &'static str) {
    if risk_score >= 70 {
        (
            VerdictBand::HighRisk,
            "DO NOT ENTER CREDENTIALS - Likely phishing attempt. Avoid this website.",
        )
    } else if risk_score >= 40 {
        (
            VerdictBand::Suspicious,
            "Exercise caution. Verify the website authenticity before entering any sensitive information.",
        )
    } else if risk_score >= 20 {
        (
            VerdictBand::LowRisk,
            "Minor concerns detected. Proceed with normal caution.",
        )
    } else {
        (
            VerdictBand::Safe,
            "No significant phishing indicators detected.",
        )
    }
}

fn summary_for(flags: &[String]) -> &'static str {
    if flags.iter().any(|f| CRITICAL_FLAGS.contains(&f.as_str())) {
        "Critical phishing indicators detected. This website is highly suspicious."
    } else if flags.iter().any(|f| WARNING_FLAGS.contains(&f.as_str())) {
        "Some phishing indicators detected. Exercise caution."
    } else if !flags.is_empty() {
        "Minor concerns detected. Website appears mostly legitimate."
    } else {
        "No significant concerns detected."
    }
}

fn push_unique(flags: &mut Vec<String>, flag: &str) {
    if !flags.iter().any(|f| f == flag) {
        flags.push(flag.to_string());
    }
}

fn has(flags: &[String], flag: &str) -> bool {
    flags.iter().any(|f| f == flag)
}
