//! Human-readable previews of proposed operations.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use warden_core::RiskLevel;

use crate::classifier::{RiskClassifier, RiskFinding};
use crate::operation::ProposedOperation;

/// Default cap on rendered diff lines.
pub const DEFAULT_MAX_DIFF_LINES: usize = 50;

/// Whether a diff line was removed or added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Present in the old content only.
    Remove,
    /// Present in the new content only.
    Add,
}

/// One line of a positional diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    /// Removed or added.
    pub change: ChangeKind,
    /// The line text, without its newline.
    pub line: String,
    /// 1-based line number.
    pub number: usize,
}

/// Preview of a file write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileWritePreview {
    /// Heading.
    pub title: String,
    /// Target path.
    pub path: String,
    /// "create new file" or "modify existing file".
    pub description: String,
    /// `true` when no (or empty) previous content was supplied.
    pub is_new_file: bool,
    /// Line count of the previous content, 0 for a new file.
    pub old_lines: usize,
    /// Line count of the new content.
    pub new_lines: usize,
    /// `new_lines - old_lines`.
    pub line_delta: i64,
    /// Size of the new content in bytes.
    pub byte_size: usize,
    /// Positional diff, capped.
    pub diff_lines: Vec<DiffLine>,
}

/// Preview of a shell command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandPreview {
    /// Heading.
    pub title: String,
    /// The command line.
    pub command: String,
    /// Directory it would run in.
    pub working_dir: Option<String>,
    /// Risk count summary.
    pub description: String,
    /// Classifier findings.
    pub findings: Vec<RiskFinding>,
    /// Classifier level.
    pub risk_level: RiskLevel,
}

/// Preview of a file deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDeletePreview {
    /// Heading.
    pub title: String,
    /// Target path.
    pub path: String,
    /// Description line.
    pub description: String,
    /// Warning shown next to the confirm button.
    pub irreversible_warning: String,
}

/// Preview of an operation with no dedicated renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericPreview {
    /// The tool kind.
    pub title: String,
    /// Always "unknown operation type".
    pub description: String,
    /// Raw parameters.
    pub details: Value,
}

/// A rendered preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Preview {
    /// See [`FileWritePreview`].
    FileWrite(FileWritePreview),
    /// See [`CommandPreview`].
    Command(CommandPreview),
    /// See [`FileDeletePreview`].
    FileDelete(FileDeletePreview),
    /// See [`GenericPreview`].
    Generic(GenericPreview),
}

impl Preview {
    /// Heading of whichever preview this is.
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::FileWrite(p) => &p.title,
            Self::Command(p) => &p.title,
            Self::FileDelete(p) => &p.title,
            Self::Generic(p) => &p.title,
        }
    }

    /// Description line of whichever preview this is.
    #[must_use]
    pub fn description(&self) -> &str {
        match self {
            Self::FileWrite(p) => &p.description,
            Self::Command(p) => &p.description,
            Self::FileDelete(p) => &p.description,
            Self::Generic(p) => &p.description,
        }
    }
}

/// Renders [`ProposedOperation`]s into [`Preview`]s. Pure, never fails.
#[derive(Debug, Clone, Copy)]
pub struct PreviewGenerator {
    max_diff_lines: usize,
}

impl Default for PreviewGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DIFF_LINES)
    }
}

fn count_lines(text: &str) -> usize {
    text.split('\n').count()
}

fn signed(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

impl PreviewGenerator {
    /// Create a generator that keeps at most `max_diff_lines` diff entries.
    #[must_use]
    pub fn new(max_diff_lines: usize) -> Self {
        Self { max_diff_lines }
    }

    /// Render a preview.
    #[must_use]
    pub fn generate_preview(&self, operation: &ProposedOperation) -> Preview {
        match operation {
            ProposedOperation::WriteFile {
                path,
                content,
                old_content,
            } => Preview::FileWrite(self.file_write(path, content, old_content.as_deref())),
            ProposedOperation::ExecuteCommand {
                command,
                working_dir,
            } => Preview::Command(Self::command(command, working_dir.as_deref())),
            ProposedOperation::DeleteFile { path } => Preview::FileDelete(FileDeletePreview {
                title: "Delete file".to_string(),
                path: path.clone(),
                description: "this operation cannot be undone".to_string(),
                irreversible_warning: "the file cannot be recovered after deletion".to_string(),
            }),
            ProposedOperation::Other { kind, params } => Preview::Generic(GenericPreview {
                title: kind.clone(),
                description: "unknown operation type".to_string(),
                details: params.clone(),
            }),
        }
    }

    /// Positional line diff of `old` against `new`.
    ///
    /// Line `i` of each side is compared with line `i` of the other. For each
    /// differing position the old line (if any) is emitted as a removal, then
    /// the new line (if any) as an addition. An insertion near the top shows
    /// every later line as changed. Output is capped at `max_diff_lines`.
    #[must_use]
    pub fn diff(&self, old: &str, new: &str) -> Vec<DiffLine> {
        let old_lines: Vec<&str> = old.split('\n').collect();
        let new_lines: Vec<&str> = new.split('\n').collect();
        let total = old_lines.len().max(new_lines.len());

        let mut changes = Vec::new();
        for i in 0..total {
            if changes.len() >= self.max_diff_lines {
                break;
            }
            let before = old_lines.get(i);
            let after = new_lines.get(i);
            if before == after {
                continue;
            }
            let number = i.saturating_add(1);
            if let Some(line) = before {
                changes.push(DiffLine {
                    change: ChangeKind::Remove,
                    line: (*line).to_string(),
                    number,
                });
            }
            if let Some(line) = after {
                changes.push(DiffLine {
                    change: ChangeKind::Add,
                    line: (*line).to_string(),
                    number,
                });
            }
        }
        changes.truncate(self.max_diff_lines);
        changes
    }

    fn file_write(&self, path: &str, content: &str, old_content: Option<&str>) -> FileWritePreview {
        let existing = old_content.filter(|old| !old.is_empty());
        let old_lines = existing.map_or(0, count_lines);
        let new_lines = count_lines(content);

        FileWritePreview {
            title: "Write file".to_string(),
            path: path.to_string(),
            description: if existing.is_some() {
                "modify existing file".to_string()
            } else {
                "create new file".to_string()
            },
            is_new_file: existing.is_none(),
            old_lines,
            new_lines,
            line_delta: signed(new_lines).saturating_sub(signed(old_lines)),
            byte_size: content.len(),
            diff_lines: existing
                .map(|old| self.diff(old, content))
                .unwrap_or_default(),
        }
    }

    fn command(command: &str, working_dir: Option<&str>) -> CommandPreview {
        let check = RiskClassifier::check_command(command);
        let description = match check.findings.len() {
            0 => "ordinary command".to_string(),
            1 => "1 risk detected".to_string(),
            n => format!("{n} risks detected"),
        };
        CommandPreview {
            title: "Run command".to_string(),
            command: command.to_string(),
            working_dir: working_dir.map(str::to_string),
            description,
            findings: check.findings,
            risk_level: check.level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_preview(content: &str, old: Option<&str>) -> FileWritePreview {
        let op = ProposedOperation::WriteFile {
            path: "/tmp/a.txt".into(),
            content: content.into(),
            old_content: old.map(str::to_string),
        };
        match PreviewGenerator::default().generate_preview(&op) {
            Preview::FileWrite(p) => p,
            other => panic!("unexpected preview: {other:?}"),
        }
    }

    #[test]
    fn test_new_file_has_no_diff() {
        let p = write_preview("a\nb\nc", None);
        assert!(p.is_new_file);
        assert_eq!(p.description, "create new file");
        assert_eq!(p.old_lines, 0);
        assert_eq!(p.new_lines, 3);
        assert_eq!(p.line_delta, 3);
        assert_eq!(p.byte_size, 5);
        assert!(p.diff_lines.is_empty());
    }

    #[test]
    fn test_empty_old_content_counts_as_new_file() {
        let p = write_preview("x", Some(""));
        assert!(p.is_new_file);
        assert!(p.diff_lines.is_empty());
    }

    #[test]
    fn test_modified_file_diff() {
        let p = write_preview("a\nB\nc\nd", Some("a\nb\nc"));
        assert!(!p.is_new_file);
        assert_eq!(p.description, "modify existing file");
        assert_eq!(p.old_lines, 3);
        assert_eq!(p.new_lines, 4);
        assert_eq!(p.line_delta, 1);
        assert_eq!(
            p.diff_lines,
            vec![
                DiffLine {
                    change: ChangeKind::Remove,
                    line: "b".into(),
                    number: 2
                },
                DiffLine {
                    change: ChangeKind::Add,
                    line: "B".into(),
                    number: 2
                },
                DiffLine {
                    change: ChangeKind::Add,
                    line: "d".into(),
                    number: 4
                },
            ]
        );
    }

    #[test]
    fn test_shrinking_file_has_negative_delta() {
        let p = write_preview("a", Some("a\nb\nc"));
        assert_eq!(p.line_delta, -2);
        assert!(p.diff_lines.iter().all(|d| d.change == ChangeKind::Remove));
    }

    #[test]
    fn test_diff_is_capped() {
        let old: Vec<String> = (0..200).map(|i| format!("old {i}")).collect();
        let new: Vec<String> = (0..200).map(|i| format!("new {i}")).collect();
        let p = write_preview(&new.join("\n"), Some(&old.join("\n")));
        assert_eq!(p.diff_lines.len(), 50);
        assert_eq!(p.diff_lines[0].change, ChangeKind::Remove);
        assert_eq!(p.diff_lines[49].number, 25);
    }

    #[test]
    fn test_custom_cap() {
        let generator = PreviewGenerator::new(3);
        assert_eq!(generator.diff("a\nb\nc", "x\ny\nz").len(), 3);
    }

    #[test]
    fn test_command_preview_embeds_findings() {
        let op = ProposedOperation::ExecuteCommand {
            command: "sudo rm -rf /".into(),
            working_dir: Some("/home".into()),
        };
        let Preview::Command(p) = PreviewGenerator::default().generate_preview(&op) else {
            panic!("expected command preview");
        };
        assert_eq!(p.risk_level, RiskLevel::Critical);
        assert_eq!(p.description, format!("{} risks detected", p.findings.len()));
        assert_eq!(p.working_dir.as_deref(), Some("/home"));
    }

    #[test]
    fn test_safe_command_preview() {
        let op = ProposedOperation::ExecuteCommand {
            command: "ls".into(),
            working_dir: None,
        };
        let preview = PreviewGenerator::default().generate_preview(&op);
        assert_eq!(preview.description(), "ordinary command");
    }

    #[test]
    fn test_delete_preview_warns() {
        let op = ProposedOperation::DeleteFile {
            path: "/tmp/a".into(),
        };
        let Preview::FileDelete(p) = PreviewGenerator::default().generate_preview(&op) else {
            panic!("expected delete preview");
        };
        assert_eq!(p.path, "/tmp/a");
        assert!(!p.irreversible_warning.is_empty());
    }

    #[test]
    fn test_generic_preview() {
        let op = ProposedOperation::from_tool_call("search_web", json!({"q": "rust"}));
        let preview = PreviewGenerator::default().generate_preview(&op);
        assert_eq!(preview.title(), "search_web");
        assert_eq!(preview.description(), "unknown operation type");
        let Preview::Generic(p) = preview else {
            panic!("expected generic preview");
        };
        assert_eq!(p.details, json!({"q": "rust"}));
    }
}
