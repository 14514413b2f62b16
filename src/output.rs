//! User-facing output for the export sidecar.

use std::error::Error;
use std::fmt::Display;
use std::io::Write;

/// Write `message` and a newline to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Nothing else can be done when stderr is gone.
    }
}

/// Format `err` and its causes, one per line.
#[must_use]
pub fn error_report(err: &dyn Error) -> String {
    let mut text = format!("error: {err}");
    let mut cause = err.source();
    while let Some(current) = cause {
        text.push_str("\n  caused by: ");
        text.push_str(&current.to_string());
        cause = current.source();
    }
    text
}
