//! `check` and `check-path` - classify without executing.

use std::process::ExitCode;

use anyhow::Result;
use warden_core::RiskLevel;
use warden_safety::{PathOperation, RiskClassifier, RiskFinding};

use crate::theme::Theme;
use crate::{EXIT_RISKY, EXIT_SUCCESS};

/// Exit code for a classified level.
pub(crate) fn exit_code_for(level: RiskLevel) -> u8 {
    if level.is_safe() {
        EXIT_SUCCESS
    } else {
        EXIT_RISKY
    }
}

fn print_findings(findings: &[RiskFinding]) {
    if findings.is_empty() {
        println!("{}", Theme::dimmed("  no risks detected"));
        return;
    }
    for finding in findings {
        println!(
            "  {} [{}] {} {}",
            Theme::risk_level(finding.level),
            finding.category,
            finding.message,
            Theme::dimmed(&format!("(matched `{}`)", finding.matched_text)),
        );
    }
}

/// Classify a shell command.
pub(crate) fn check_command(command: &str, json: bool) -> Result<ExitCode> {
    let result = RiskClassifier::check_command(command);
    tracing::debug!(command, level = %result.level, "classified command");

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("\n{}", Theme::header("Command check"));
        println!("{}", Theme::separator());
        println!("{}", Theme::kv("Command", command));
        println!("{}", Theme::kv("Risk", &Theme::risk_level(result.level)));
        println!("{}", Theme::kv("Needs approval", &result.needs_approval.to_string()));
        println!();
        print_findings(&result.findings);
        println!();
    }
    Ok(ExitCode::from(exit_code_for(result.level)))
}

/// Classify a file path for an operation.
pub(crate) fn check_path(path: &str, operation: PathOperation, json: bool) -> Result<ExitCode> {
    let result = RiskClassifier::check_file_path(path, operation);
    tracing::debug!(path, %operation, level = %result.level, "classified path");

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("\n{}", Theme::header("Path check"));
        println!("{}", Theme::separator());
        println!("{}", Theme::kv("Path", path));
        println!("{}", Theme::kv("Operation", &operation.to_string()));
        println!("{}", Theme::kv("Risk", &Theme::risk_level(result.level)));
        println!();
        print_findings(&result.findings);
        println!();
    }
    Ok(ExitCode::from(exit_code_for(result.level)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_for_levels() {
        assert_eq!(exit_code_for(RiskLevel::Safe), 0);
        assert_eq!(exit_code_for(RiskLevel::Low), 2);
        assert_eq!(exit_code_for(RiskLevel::Critical), 2);
    }

    #[test]
    fn test_classified_levels_map_to_exit_codes() {
        let safe = RiskClassifier::check_command("ls -la");
        assert_eq!(exit_code_for(safe.level), EXIT_SUCCESS);

        let risky = RiskClassifier::check_file_path("/etc/passwd", PathOperation::Read);
        assert_eq!(exit_code_for(risky.level), EXIT_RISKY);
    }
}
