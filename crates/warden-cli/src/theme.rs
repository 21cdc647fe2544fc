//! Terminal styling.

use colored::Colorize;
use warden_activity::LogLevel;
use warden_core::RiskLevel;
use warden_safety::{ChangeKind, DiffLine};

const BOX_WIDTH: usize = 64;

pub(crate) struct Theme;

impl Theme {
    pub(crate) fn header(text: &str) -> String {
        format!("{}", text.bold().cyan())
    }

    pub(crate) fn error(text: &str) -> String {
        format!("{} {}", "✗".red(), text.red())
    }

    pub(crate) fn warning(text: &str) -> String {
        format!("{} {}", "!".yellow(), text.yellow())
    }

    pub(crate) fn info(text: &str) -> String {
        format!("{} {}", "i".blue(), text)
    }

    pub(crate) fn dimmed(text: &str) -> String {
        format!("{}", text.dimmed())
    }

    pub(crate) fn separator() -> String {
        "━".repeat(50).dimmed().to_string()
    }

    pub(crate) fn kv(key: &str, value: &str) -> String {
        format!("{}: {}", key.bold(), value)
    }

    /// Colored risk level name.
    pub(crate) fn risk_level(level: RiskLevel) -> String {
        let name = level.to_string();
        match level {
            RiskLevel::Safe => name.green().to_string(),
            RiskLevel::Low => name.cyan().to_string(),
            RiskLevel::Medium => name.yellow().to_string(),
            RiskLevel::High => name.red().to_string(),
            RiskLevel::Critical => name.red().bold().to_string(),
        }
    }

    pub(crate) fn log_level(level: LogLevel) -> String {
        let name = format!("{:<7}", level.as_str().to_uppercase());
        match level {
            LogLevel::Debug => name.dimmed().to_string(),
            LogLevel::Info => name.blue().to_string(),
            LogLevel::Warn => name.yellow().to_string(),
            LogLevel::Error => name.red().to_string(),
            LogLevel::Success => name.green().to_string(),
        }
    }

    pub(crate) fn diff_line(line: &DiffLine) -> String {
        let number = format!("{:>4}", line.number);
        match line.change {
            ChangeKind::Remove => format!("{} {}", number.dimmed(), format!("- {}", line.line).red()),
            ChangeKind::Add => format!("{} {}", number.dimmed(), format!("+ {}", line.line).green()),
        }
    }

    /// Box around `content`, colored by risk.
    pub(crate) fn approval_box(title: &str, content: &str, risk: RiskLevel) -> String {
        let color_fn = |s: &str| -> String {
            match risk {
                RiskLevel::Safe | RiskLevel::Low => s.green().to_string(),
                RiskLevel::Medium => s.yellow().to_string(),
                RiskLevel::High => s.red().to_string(),
                RiskLevel::Critical => s.red().bold().to_string(),
            }
        };

        let inner = BOX_WIDTH.saturating_sub(2);
        let top = format!("╭{}╮", "─".repeat(inner));
        let bottom = format!("╰{}╯", "─".repeat(inner));
        let empty = format!("│{:w$}│", "", w = inner);

        let pad_line = |text: &str| -> String {
            let visible_len = strip_ansi(text).chars().count();
            let padding = BOX_WIDTH.saturating_sub(4).saturating_sub(visible_len);
            format!("│ {text}{:p$} │", "", p = padding)
        };

        let mut lines = vec![
            color_fn(&top),
            pad_line(&title.bold().to_string()),
            color_fn(&empty),
        ];
        lines.extend(content.lines().map(pad_line));
        lines.push(color_fn(&bottom));
        lines.join("\n")
    }
}

/// Strip ANSI escape codes for visible-length calculation.
fn strip_ansi(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut in_escape = false;
    for c in s.chars() {
        if in_escape {
            if c.is_ascii_alphabetic() {
                in_escape = false;
            }
        } else if c == '\x1b' {
            in_escape = true;
        } else {
            result.push(c);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[1;31mhello\x1b[0m"), "hello");
        assert_eq!(strip_ansi("plain"), "plain");
    }

    #[test]
    fn test_approval_box_lines_have_equal_width() {
        let rendered = Theme::approval_box("Run command", "a\nlonger line", RiskLevel::High);
        let widths: Vec<usize> = rendered
            .lines()
            .map(|l| strip_ansi(l).chars().count())
            .collect();
        assert_eq!(widths.len(), 5);
        assert!(widths.iter().all(|w| *w == BOX_WIDTH), "{widths:?}");
    }
}
