use std::fs;
use std::path::Path;

use chrono::Utc;

use crate::core::error::GuardError;
use crate::core::verdict::Verdict;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Markdown,
}

pub fn write_verdict(
    verdict: &Verdict,
    format: ReportFormat,
    path: &Path,
) -> Result<(), GuardError> {
    let rendered = render(verdict, format)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| GuardError::Config(e.to_string()))?;
    }
    fs::write(path, rendered).map_err(|e| GuardError::Config(e.to_string()))
}

pub fn render(verdict: &Verdict, format: ReportFormat) -> Result<String, GuardError> {
    match format {
        ReportFormat::Json => {
            serde_json::to_string_pretty(verdict).map_err(|_| GuardError::Unknown)
        }
        ReportFormat::Markdown => Ok(render_markdown(verdict)),
    }
}

fn render_markdown(verdict: &Verdict) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Phishing check: {}\n\n", verdict.url));
    out.push_str(&format!("Generated: {}\n\n", Utc::now().to_rfc3339()));
    out.push_str(&format!(
        "- Verdict: {:?}\n- Risk score: {}/100\n- Summary: {}\n- Recommendation: {}\n",
        verdict.band, verdict.risk_score, verdict.summary, verdict.recommendation
    ));
    if verdict.flags.is_empty() {
        out.push_str("- Flags: none\n");
    } else {
        out.push_str(&format!("- Flags: {}\n", verdict.flags.join(", ")));
    }
    out.push_str("\n## Signal scores\n\n");
    for (name, score) in &verdict.per_signal_scores {
        out.push_str(&format!("- {}: {}\n", name, score));
    }
    out
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::core::verdict::VerdictBand;

    fn verdict() -> Verdict {
        Verdict {
            url: "https://example.com/".to_string(),
            band: VerdictBand::LowRisk,
            risk_score: 25,
            flags: vec!["NO_HTTPS".to_string()],
            summary: "Some phishing indicators detected. Exercise caution.".to_string(),
            recommendation: "Minor concerns detected. Proceed with normal caution.".to_string(),
            per_signal_scores: BTreeMap::from([
                ("heuristic".to_string(), 5),
                ("tls".to_string(), 20),
            ]),
        }
    }

    #[test]
    fn json_render_round_trips() {
        let rendered = render(&verdict(), ReportFormat::Json).unwrap();
        let parsed: Verdict = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed, verdict());
    }

    #[test]
    fn markdown_render_lists_flags_and_scores() {
        let rendered = render(&verdict(), ReportFormat::Markdown).unwrap();
        assert!(rendered.contains("Risk score: 25/100"));
        assert!(rendered.contains("NO_HTTPS"));
        assert!(rendered.contains("- tls: 20"));
    }
}
