//! User-facing output for the launcher binaries.

use std::fmt::Display;
use std::io::Write;

use crate::error::ActionError;

/// Write `message` and a newline to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort reporting; nothing else can be done.
    }
}

/// Format the notification shown when an action fails.
///
/// The first line names the action; the cause chain follows, one cause per
/// line.
#[must_use]
pub fn failure_notification(err: &ActionError) -> String {
    let mut text = format!("{} failed", err.action);
    let mut cause: Option<&dyn std::error::Error> = Some(&err.source);
    while let Some(current) = cause {
        text.push_str("\n  caused by: ");
        text.push_str(&current.to_string());
        cause = current.source();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LauncherError;
    use std::path::PathBuf;

    #[test]
    fn notification_lists_the_cause_chain() {
        let err = ActionError {
            action: "Export To Excel".to_owned(),
            source: LauncherError::Filesystem {
                operation: "remove",
                path: PathBuf::from("/srv/cache/Delivery"),
                source: std::io::Error::other("access denied"),
            },
        };

        let text = failure_notification(&err);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Export To Excel failed",
                "  caused by: failed to remove /srv/cache/Delivery",
                "  caused by: access denied",
            ]
        );
    }

    #[test]
    fn write_stderr_line_appends_newline() {
        let mut buffer = Vec::new();
        write_stderr_line(&mut buffer, "hello");
        assert_eq!(buffer, b"hello\n");
    }
}
