//! The crate's boundary error type and the single normalization path for
//! flatpak diagnostic output.

use thiserror::Error;

use crate::subprocess::{ExitStatus, ProcessError};

#[derive(Debug, Error)]
pub enum FlatpakError {
    /// The flatpak process could not be spawned or its streams read.
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// flatpak ran and exited non-zero. `message` is the last non-blank
    /// diagnostic line with any `error:` prefix stripped; `usage_shown` marks
    /// a bad-arguments failure (flatpak printed its usage banner first).
    #[error("{}", tool_display(.message, .usage_shown, .exit_code))]
    Tool {
        message: String,
        usage_shown: bool,
        exit_code: Option<i32>,
    },

    /// flatpak succeeded but printed output this crate could not parse.
    #[error("Unexpected flatpak output: {0}")]
    Parse(String),
}

fn tool_display(message: &str, usage_shown: &bool, exit_code: &Option<i32>) -> String {
    if message.is_empty() {
        return match exit_code {
            Some(code) => format!("flatpak exited with code {code}"),
            None => "flatpak terminated abnormally".to_string(),
        };
    }
    if *usage_shown {
        format!("flatpak argument error: {message}")
    } else {
        format!("flatpak: {message}")
    }
}

impl FlatpakError {
    /// Normalize a non-zero exit into the one tool-failure shape every
    /// operation shares.
    pub(crate) fn tool_failure(status: &ExitStatus, stderr: &str) -> Self {
        let (message, usage_shown) = normalize_diagnostics(stderr);
        FlatpakError::Tool {
            message,
            usage_shown,
            exit_code: status.code(),
        }
    }

    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            FlatpakError::Tool {
                usage_shown: true,
                ..
            }
        )
    }
}

/// Extract the descriptive line from flatpak's stderr: the last non-blank
/// line, minus a literal `error:` prefix. The boolean is true when the first
/// line is a usage banner.
fn normalize_diagnostics(stderr: &str) -> (String, bool) {
    let usage_shown = stderr
        .lines()
        .next()
        .is_some_and(|line| line.starts_with("Usage:"));

    let last = stderr
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("");

    let message = last
        .strip_prefix("error:")
        .unwrap_or(last)
        .trim()
        .to_string();

    (message, usage_shown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_plain_error() {
        let (message, usage_shown) = normalize_diagnostics("error: remote flathub not found\n");
        assert_eq!(message, "remote flathub not found");
        assert!(!usage_shown);
    }

    #[test]
    fn test_normalize_usage_banner() {
        let stderr = "Usage: flatpak install ...\nerror: something went wrong";
        let (message, usage_shown) = normalize_diagnostics(stderr);
        assert_eq!(message, "something went wrong");
        assert!(usage_shown);
    }

    #[test]
    fn test_normalize_picks_last_non_blank_line() {
        let stderr = "warning: out of date appstream\n\nerror: nothing to do\n\n";
        let (message, _) = normalize_diagnostics(stderr);
        assert_eq!(message, "nothing to do");
    }

    #[test]
    fn test_normalize_empty_stderr() {
        let (message, usage_shown) = normalize_diagnostics("");
        assert_eq!(message, "");
        assert!(!usage_shown);
    }

    #[test]
    fn test_tool_failure_display() {
        let err = FlatpakError::tool_failure(
            &ExitStatus::Error(1),
            "Usage: flatpak install ...\nerror: something went wrong",
        );
        assert_eq!(
            err.to_string(),
            "flatpak argument error: something went wrong"
        );
        assert!(err.is_usage_error());

        let err = FlatpakError::tool_failure(&ExitStatus::Error(1), "error: no such ref");
        assert_eq!(err.to_string(), "flatpak: no such ref");
        assert!(!err.is_usage_error());
    }

    #[test]
    fn test_tool_failure_without_diagnostics_reports_exit_code() {
        let err = FlatpakError::tool_failure(&ExitStatus::Error(42), "");
        assert_eq!(err.to_string(), "flatpak exited with code 42");
    }
}
