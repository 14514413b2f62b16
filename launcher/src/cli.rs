//! CLI argument definitions for the launcher.
//!
//! The launcher binary stands in for the host's context menu: invoking it
//! without `--table` is the device-level "Export To Excel" action, and
//! `--table NAME` is "Export Table To Excel" for one tag table.

use camino::Utf8PathBuf;
use clap::Parser;
use std::time::Duration;

use crate::action::ExportTarget;

/// Verify the cached export sidecar and start it.
#[derive(Parser, Debug, Default, Clone)]
#[command(name = "tagsheet-launcher")]
#[command(version, about)]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Export every tag table of the device:\n",
    "    $ tagsheet-launcher\n\n",
    "  Export a single tag table:\n",
    "    $ tagsheet-launcher --table \"Motor tags\"\n\n",
    "  Wait up to 30 seconds for the export to finish:\n",
    "    $ tagsheet-launcher --wait 30",
))]
pub struct Cli {
    /// Export only the named tag table.
    #[arg(short, long, value_name = "NAME")]
    pub table: Option<String>,

    /// Shared data directory holding the sidecar cache [default: platform-specific].
    #[arg(long, value_name = "DIR")]
    pub data_root: Option<Utf8PathBuf>,

    /// Wait up to SECONDS for the sidecar to exit and report its status.
    #[arg(long, value_name = "SECONDS")]
    pub wait: Option<u64>,

    /// Suppress progress output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Enable debug logging.
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,
}

impl Cli {
    /// The export target selected on the command line.
    #[must_use]
    pub fn target(&self) -> ExportTarget {
        ExportTarget::from_table(self.table.clone())
    }

    /// How long to wait for the sidecar, if at all.
    #[must_use]
    pub fn wait_timeout(&self) -> Option<Duration> {
        self.wait.map(Duration::from_secs)
    }

    /// Default log filter for this invocation; `RUST_LOG` overrides it.
    #[must_use]
    pub const fn log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::device(&["tagsheet-launcher"], ExportTarget::Device)]
    #[case::table(
        &["tagsheet-launcher", "--table", "Motor tags"],
        ExportTarget::Table("Motor tags".to_owned())
    )]
    #[case::short_flag(
        &["tagsheet-launcher", "-t", "TagsA"],
        ExportTarget::Table("TagsA".to_owned())
    )]
    fn parses_export_target(#[case] args: &[&str], #[case] expected: ExportTarget) {
        let cli = Cli::try_parse_from(args).expect("valid arguments");
        assert_eq!(cli.target(), expected);
    }

    #[test]
    fn parses_data_root_and_wait() {
        let cli = Cli::try_parse_from([
            "tagsheet-launcher",
            "--data-root",
            "/srv/shared",
            "--wait",
            "30",
        ])
        .expect("valid arguments");
        assert_eq!(cli.data_root, Some(Utf8PathBuf::from("/srv/shared")));
        assert_eq!(cli.wait_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        assert!(Cli::try_parse_from(["tagsheet-launcher", "--quiet", "--verbose"]).is_err());
    }

    #[rstest]
    #[case::default(Cli::default(), "warn")]
    #[case::verbose(Cli { verbose: true, ..Cli::default() }, "debug")]
    #[case::quiet(Cli { quiet: true, ..Cli::default() }, "error")]
    fn log_filter_follows_flags(#[case] cli: Cli, #[case] expected: &str) {
        assert_eq!(cli.log_filter(), expected);
    }
}
