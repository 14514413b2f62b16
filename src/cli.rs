//! CLI argument definitions for the export sidecar.

use camino::Utf8PathBuf;
use clap::Parser;

use crate::session::ExportScope;

/// Export PLC tag tables through the vendor engineering API.
#[derive(Parser, Debug, Default, Clone)]
#[command(name = "tagsheet-export")]
#[command(version, about)]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Export every tag table except the default one:\n",
    "    $ tagsheet-export\n\n",
    "  Export a single tag table:\n",
    "    $ tagsheet-export \"Motor tags\"",
))]
pub struct Cli {
    /// Export only this tag table.
    #[arg(value_name = "TABLE")]
    pub table: Option<String>,

    /// Configuration file [default: platform config directory].
    #[arg(long, value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Enable debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// The export scope selected by the positional argument.
    #[must_use]
    pub fn scope(&self) -> ExportScope {
        ExportScope::from_argument(self.table.clone())
    }

    /// Default log filter for this invocation; `RUST_LOG` overrides it.
    #[must_use]
    pub const fn log_filter(&self) -> &'static str {
        if self.verbose { "debug" } else { "warn" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::no_token(&["tagsheet-export"], ExportScope::AllTables)]
    #[case::one_token(&["tagsheet-export", "TagsA"], ExportScope::Table("TagsA".to_owned()))]
    #[case::blank_token(&["tagsheet-export", ""], ExportScope::AllTables)]
    fn positional_token_selects_the_scope(#[case] args: &[&str], #[case] expected: ExportScope) {
        let cli = Cli::try_parse_from(args).expect("valid arguments");
        assert_eq!(cli.scope(), expected);
    }

    #[test]
    fn more_than_one_table_is_rejected() {
        assert!(Cli::try_parse_from(["tagsheet-export", "TagsA", "TagsB"]).is_err());
    }

    #[test]
    fn parses_config_and_verbosity() {
        let cli = Cli::try_parse_from(["tagsheet-export", "--config", "/etc/tagsheet.toml", "-v"])
            .expect("valid arguments");
        assert_eq!(cli.config, Some(Utf8PathBuf::from("/etc/tagsheet.toml")));
        assert_eq!(cli.log_filter(), "debug");
        assert_eq!(Cli::default().log_filter(), "warn");
    }
}
