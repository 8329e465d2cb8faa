use clap::Parser;

pub mod global;
pub mod root_commands;
pub mod subcommands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::Commands;

/// Top-level CLI parser for the `tempo` binary.
#[derive(Debug, Parser)]
#[command(name = "tempo", version, about = "Tempo - attendance for music classes")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Database path (overrides `[store] path`)
    #[arg(long, global = true)]
    pub db: Option<String>,
}

impl Cli {
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            db: self.db.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};
    use tempo_core::enums::CanonicalStatus;

    use super::subcommands::{CatalogCommands, QueueCommands};
    use super::{Cli, Commands, OutputFormat};

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["tempo", "replay", "--format", "raw", "--quiet"])
            .expect("cli should parse");
        assert_eq!(cli.format, OutputFormat::Raw);
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::Replay));
    }

    #[test]
    fn output_format_rejects_invalid_value() {
        assert!(Cli::try_parse_from(["tempo", "--format", "xml", "replay"]).is_err());
    }

    #[test]
    fn record_parses_status() {
        let cli = Cli::try_parse_from([
            "tempo", "record", "--class", "piano", "--date", "2025-03-04", "--student", "s1",
            "--status", "late",
        ])
        .expect("cli should parse");
        let Commands::Record(args) = cli.command else {
            panic!("expected record");
        };
        assert_eq!(args.status, Some(CanonicalStatus::Late));
        assert_eq!(args.student.as_deref(), Some("s1"));
    }

    #[test]
    fn record_needs_an_intent() {
        let parsed = Cli::try_parse_from([
            "tempo", "record", "--class", "piano", "--date", "2025-03-04", "--student", "s1",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn record_status_needs_a_student() {
        let parsed = Cli::try_parse_from([
            "tempo", "record", "--class", "piano", "--date", "2025-03-04", "--status", "present",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn record_note_alone_is_fine() {
        let cli = Cli::try_parse_from([
            "tempo", "record", "--class", "piano", "--date", "2025-03-04", "--note", "scales",
        ])
        .expect("cli should parse");
        assert!(matches!(cli.command, Commands::Record(_)));
    }

    #[test]
    fn roster_is_comma_separated() {
        let cli = Cli::try_parse_from([
            "tempo", "record", "--class", "piano", "--date", "2025-03-04", "--note", "x",
            "--teacher", "t1", "--roster", "s1,s2,s3",
        ])
        .expect("cli should parse");
        let Commands::Record(args) = cli.command else {
            panic!("expected record");
        };
        assert_eq!(args.roster, vec!["s1", "s2", "s3"]);
    }

    #[test]
    fn nested_subcommands_parse() {
        let cli = Cli::try_parse_from(["tempo", "catalog", "import", "classes.json"])
            .expect("cli should parse");
        assert!(matches!(
            cli.command,
            Commands::Catalog {
                action: CatalogCommands::Import { .. }
            }
        ));

        let cli = Cli::try_parse_from([
            "tempo", "queue", "discard", "--class", "piano", "--date", "2025-03-04", "mut-00000001",
        ])
        .expect("cli should parse");
        assert!(matches!(
            cli.command,
            Commands::Queue {
                action: QueueCommands::Discard { .. }
            }
        ));
    }
}
