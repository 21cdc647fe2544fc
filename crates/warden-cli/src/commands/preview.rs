//! `preview-write` - show what writing a file would change.

use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use warden_safety::{
    CommandPreview, FileDeletePreview, FileWritePreview, GenericPreview, PathOperation, Preview,
    PreviewGenerator, ProposedOperation, RiskClassifier,
};

use crate::theme::Theme;

async fn read_optional(path: &Path) -> Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
    }
}

/// Preview replacing `target` with the content of `source`.
pub(crate) async fn preview_write(
    generator: PreviewGenerator,
    target: &Path,
    source: &Path,
    json: bool,
) -> Result<()> {
    let content = tokio::fs::read_to_string(source)
        .await
        .with_context(|| format!("failed to read {}", source.display()))?;
    let old_content = read_optional(target).await?;

    let path = target.display().to_string();
    let check = RiskClassifier::check_file_path(&path, PathOperation::Write);
    let preview = generator.generate_preview(&ProposedOperation::WriteFile {
        path,
        content,
        old_content,
    });

    if json {
        println!("{}", serde_json::to_string_pretty(&preview)?);
        return Ok(());
    }

    println!(
        "{}",
        Theme::approval_box(preview.title(), &render_preview(&preview), check.level)
    );
    if let Preview::FileWrite(write) = &preview {
        print_diff(write);
    }
    Ok(())
}

/// Summary lines of a preview, for an approval box.
pub(crate) fn render_preview(preview: &Preview) -> String {
    match preview {
        Preview::FileWrite(FileWritePreview {
            path,
            description,
            old_lines,
            new_lines,
            line_delta,
            byte_size,
            ..
        }) => [
            Theme::kv("Path", path),
            Theme::kv("Change", description),
            Theme::kv("Lines", &format!("{old_lines} -> {new_lines} ({line_delta:+})")),
            Theme::kv("Size", &format!("{byte_size} bytes")),
        ]
        .join("\n"),
        Preview::Command(CommandPreview {
            command,
            working_dir,
            description,
            risk_level,
            findings,
            ..
        }) => {
            let mut lines = vec![
                Theme::kv("Command", command),
                Theme::kv("Directory", working_dir.as_deref().unwrap_or(".")),
                Theme::kv("Risk", &Theme::risk_level(*risk_level)),
                Theme::kv("Summary", description),
            ];
            lines.extend(findings.iter().map(|f| format!("  - {}", f.message)));
            lines.join("\n")
        },
        Preview::FileDelete(FileDeletePreview {
            path,
            description,
            irreversible_warning,
            ..
        }) => [
            Theme::kv("Path", path),
            Theme::warning(description),
            Theme::dimmed(irreversible_warning),
        ]
        .join("\n"),
        Preview::Generic(GenericPreview {
            description,
            details,
            ..
        }) => [Theme::kv("Summary", description), details.to_string()].join("\n"),
    }
}

fn print_diff(preview: &FileWritePreview) {
    if preview.diff_lines.is_empty() {
        println!("{}", Theme::dimmed("no line changes"));
        return;
    }
    println!();
    for line in &preview.diff_lines {
        println!("{}", Theme::diff_line(line));
    }
    println!();
}
