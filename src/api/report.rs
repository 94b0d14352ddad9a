use super::types::AnalysisResult;
use std::fmt::Write;
use url::Url;

/// Plain-text rendering of an analysis for the terminal.
pub fn render_text(result: &AnalysisResult, heatmap: Option<&Url>) -> String {
    let mut out = String::new();

    let verdict = if result.is_healthy() { "no risk pattern" } else { "attention advised" };
    let _ = writeln!(out, "Prediction: {} ({})", result.prediction, verdict);
    if let Some(name) = &result.file_name {
        let _ = writeln!(out, "File:       {}", name);
    }
    let _ = writeln!(out, "Confidence: {:.1}%", result.confidence);
    if result.risk_confidence.is_some() {
        let level = if result.is_high_risk() { "high" } else { "low" };
        let _ = writeln!(out, "Risk:       {}% ({})", result.risk_percent(), level);
    }
    if let Some(url) = heatmap {
        let _ = writeln!(out, "Heatmap:    {}", url);
    }
    if let Some(explanation) = &result.explanation {
        let _ = writeln!(out, "\n{}", explanation);
    }

    if let Some(report) = &result.ai_report {
        let _ = writeln!(out, "\n--- AI Report ---");
        if let Some(severity) = &report.severity {
            let _ = writeln!(out, "{}", severity);
        }
        for (title, items) in report.sections() {
            let _ = writeln!(out, "\n{}:", title);
            for item in items {
                let _ = writeln!(out, "  - {}", item);
            }
        }
    }

    out
}
