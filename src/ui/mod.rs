use anyhow::Error;
use std::io::{self, Write};

use crate::core::{
    FailureStage, GuidanceBlock, HealthStatus, ImageInfo, PredictionFailure, PredictionResponse,
    PredictionSuccess, VerificationReport,
};

#[derive(Debug, Clone)]
pub struct UiConfig {
    pub color: bool,
    pub quiet: bool,
}

const NOT_AVAILABLE: &str = "N/A";

pub fn eprintln_error(err: &Error) {
    let mut stderr = io::stderr().lock();
    let _ = writeln!(stderr, "error:");
    let _ = writeln!(stderr, "  {err}");

    let mut causes = err.chain().skip(1).peekable();
    if causes.peek().is_some() {
        let _ = writeln!(stderr, "caused by:");
        for cause in causes {
            let _ = writeln!(stderr, "  - {cause}");
        }
    }

    let _ = writeln!(stderr, "next:");
    if let Some(hint) = crate::exit::hint(err) {
        let _ = writeln!(stderr, "  - {hint}");
    }
    let _ = writeln!(stderr, "  - re-run with `--verbose` for details");
    let _ = writeln!(stderr, "  - see `cropcheck --help` for commands and options");
}

pub fn print_report(report: &VerificationReport, cfg: &UiConfig) {
    if cfg.quiet {
        return;
    }
    let mut out = io::stdout().lock();
    write_report(&mut out, report, cfg.color);
}

pub fn write_report(out: &mut dyn Write, report: &VerificationReport, color: bool) {
    let failed_stage = report.failure.as_ref().map(|f| f.stage);

    if let Some(health) = &report.health {
        write_health(out, health, &report.base_url, color);
    }

    if let Some(image) = &report.image {
        let _ = writeln!(out);
        write_image(out, image);
    }

    match &report.prediction {
        Some(response) => {
            let _ = writeln!(out);
            write_prediction(out, response, color);
        }
        None if failed_stage == Some(FailureStage::Prediction) => {
            let kind = report
                .failure
                .as_ref()
                .map(|f| f.kind.as_str())
                .unwrap_or("unknown");
            let _ = writeln!(out);
            let _ = writeln!(out, "Prediction: {} ({kind})", paint("ERROR", "31", color));
        }
        None => {}
    }
}

pub fn write_health(out: &mut dyn Write, health: &HealthStatus, base_url: &str, color: bool) {
    if health.reachable {
        let _ = writeln!(out, "Health: {} ({base_url})", paint("OK", "32", color));
        if !health.raw_payload.is_empty() {
            let payload = serde_json::to_string(&health.raw_payload).unwrap_or_default();
            let _ = writeln!(out, "  {payload}");
        }
    } else {
        let _ = writeln!(
            out,
            "Health: {} ({base_url})",
            paint("UNREACHABLE", "31", color)
        );
    }
}

pub fn write_image(out: &mut dyn Write, image: &ImageInfo) {
    let _ = writeln!(
        out,
        "Image: {} ({}, sent as {})",
        image.path,
        format_bytes(image.size_bytes),
        image.mime_type
    );
}

pub fn write_prediction(out: &mut dyn Write, response: &PredictionResponse, color: bool) {
    match response {
        PredictionResponse::Success(success) => write_success(out, success, color),
        PredictionResponse::Failure(failure) => write_failure(out, failure, color),
    }
}

fn write_success(out: &mut dyn Write, success: &PredictionSuccess, color: bool) {
    let prediction = &success.prediction;
    let outcome = success.outcome();

    let _ = writeln!(out, "Prediction:");
    let _ = writeln!(out, "  Disease detected: {}", prediction.disease);
    let _ = writeln!(out, "  Confidence: {:.2}%", outcome.confidence_pct);
    if outcome.low_confidence_flag {
        let _ = writeln!(
            out,
            "  {}",
            paint("WARNING: low confidence prediction", "33", color)
        );
    }
    let _ = writeln!(out, "  Model used: {}", prediction.model_used);

    if let Some(warning) = &success.warning {
        let _ = writeln!(out, "  {} {warning}", paint("Server warning:", "33", color));
    }
    if let Some(suggestion) = &success.suggestion {
        let _ = writeln!(out, "  Suggestion: {suggestion}");
    }

    if let Some(guidance) = &prediction.guidance {
        write_guidance(out, guidance);
    }

    if outcome.is_healthy {
        let _ = writeln!(
            out,
            "  Verdict: plant appears {}",
            paint("HEALTHY", "32", color)
        );
    } else {
        let _ = writeln!(
            out,
            "  Verdict: plant may have {}: {}",
            paint("DISEASE", "31", color),
            prediction.disease
        );
    }
}

pub fn write_guidance(out: &mut dyn Write, guidance: &GuidanceBlock) {
    let _ = writeln!(out, "  Guidance:");
    let _ = writeln!(
        out,
        "    Description: {}",
        guidance.description.as_deref().unwrap_or(NOT_AVAILABLE)
    );
    let _ = writeln!(
        out,
        "    Severity: {}",
        guidance.severity.as_deref().unwrap_or(NOT_AVAILABLE)
    );
    if !guidance.remedies.is_empty() {
        let _ = writeln!(out, "    Remedies:");
        for (i, remedy) in guidance.remedies.iter().enumerate() {
            let _ = writeln!(out, "      {}. {remedy}", i + 1);
        }
    }
    if let Some(follow_up) = &guidance.follow_up {
        let _ = writeln!(out, "    Follow-up: {follow_up}");
    }
    let _ = writeln!(
        out,
        "    Source: {}",
        guidance.source.as_deref().unwrap_or(NOT_AVAILABLE)
    );
}

fn write_failure(out: &mut dyn Write, failure: &PredictionFailure, color: bool) {
    let _ = writeln!(out, "Prediction: {}", paint("FAILED", "31", color));
    let _ = writeln!(out, "  Error: {}", failure.error);
    if let Some(suggestion) = &failure.suggestion {
        let _ = writeln!(out, "  Suggestion: {suggestion}");
    }
    if let (Some(raw), Some(pct)) = (&failure.raw_prediction, failure.raw_confidence_pct()) {
        let _ = writeln!(out, "  Raw prediction: {}", crate::core::value_text(raw));
        let _ = writeln!(out, "  Confidence: {pct:.2}%");
    }
}

fn paint(s: &str, code: &str, color: bool) -> String {
    if !color {
        return s.to_string();
    }
    format!("\x1b[{code}m{s}\x1b[0m")
}

pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let b = bytes as f64;
    if b < KB {
        return format!("{bytes} B");
    }
    if b < MB {
        return format!("{:.2} KiB", b / KB);
    }
    if b < GB {
        return format!("{:.2} MiB", b / MB);
    }
    format!("{:.2} GiB", b / GB)
}
