use anyhow::{Context, Result};
use colored::Colorize;
use iam_permission_validator_engine::{RuleOutcome, ValidationResult};
use log::debug;
use serde::Serialize;
use std::io::{self, Write};

pub(crate) fn note(msg: &str) {
    let _ = writeln!(io::stderr(), "iam-permission-validator: {msg}");
}

pub(crate) fn warn(msg: &str) {
    let _ = writeln!(io::stderr(), "iam-permission-validator (warning): {msg}");
}

/// A validation result paired with the error met while producing it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RuleReport {
    pub(crate) result: ValidationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) error: Option<String>,
}

impl RuleReport {
    /// Succeeded with no companion error
    pub(crate) fn passed(&self) -> bool {
        self.result.is_success() && self.error.is_none()
    }
}

impl From<RuleOutcome> for RuleReport {
    fn from(outcome: RuleOutcome) -> Self {
        let error = outcome.error.map(|e| e.to_string());
        if let Some(error) = &error {
            warn(&format!("{}: {error}", outcome.result.condition.validation_rule));
        }
        Self {
            result: outcome.result,
            error,
        }
    }
}

/// Write reports as a JSON array to stdout
pub(crate) fn print_json(reports: &[RuleReport], pretty: bool) -> Result<()> {
    debug!("Formatting {} reports as JSON (pretty: {})", reports.len(), pretty);

    let json_output = if pretty {
        serde_json::to_string_pretty(reports).context("Failed to serialize reports to pretty JSON")?
    } else {
        serde_json::to_string(reports).context("Failed to serialize reports to JSON")?
    };

    println!("{json_output}");
    Ok(())
}

/// Write a human-readable summary to stdout
pub(crate) fn print_text(reports: &[RuleReport]) {
    let stdout = io::stdout();
    let mut w = stdout.lock();

    for report in reports {
        let condition = &report.result.condition;
        let state = if report.passed() {
            "PASS".green().bold()
        } else {
            "FAIL".red().bold()
        };
        let _ = writeln!(
            w,
            "{state} {} ({})",
            condition.validation_rule, condition.validation_type
        );

        for failure in &condition.failures {
            let _ = writeln!(w, "  - {failure}");
        }
        for detail in &condition.details {
            let _ = writeln!(w, "  {} {detail}", "detail:".yellow());
        }
        if let Some(error) = &report.error {
            let _ = writeln!(w, "  {} {error}", "error:".red());
        }
    }

    let failed = reports.iter().filter(|r| !r.passed()).count();
    let _ = writeln!(w);
    let _ = writeln!(
        w,
        "{} rule(s) evaluated, {} passed, {} failed",
        reports.len(),
        reports.len() - failed,
        failed
    );
}
