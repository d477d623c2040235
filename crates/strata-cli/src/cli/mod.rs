use std::path::PathBuf;

use clap::Parser;

pub mod global;
pub mod root_commands;
pub mod subcommands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::Commands;

/// Top-level CLI parser for the `strata` binary.
#[derive(Debug, Parser)]
#[command(
    name = "strata",
    version,
    about = "Strata - cross-temporal synthesis and selection queue for a daily digest"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, table, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Quiet mode (errors only, no progress bar)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file used in place of .strata/config.toml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Extract ergonomic global flags struct for command handlers.
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            quiet: self.quiet,
            verbose: self.verbose,
            config: self.config.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use chrono::NaiveDate;
    use clap::{CommandFactory, Parser};
    use pretty_assertions::assert_eq;

    use super::subcommands::{QueueCommands, SynthesisCommands};
    use super::{Cli, Commands, OutputFormat};

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_before_subcommand() {
        let cli = Cli::try_parse_from([
            "strata",
            "--format",
            "table",
            "--verbose",
            "--config",
            "strata.toml",
            "queue",
            "stats",
        ])
        .expect("cli should parse");

        assert_eq!(cli.format, OutputFormat::Table);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("strata.toml")));
        assert!(matches!(
            cli.command,
            Commands::Queue {
                action: QueueCommands::Stats
            }
        ));
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["strata", "queue", "distribution", "-f", "raw", "-q"])
            .expect("cli should parse");
        assert_eq!(cli.format, OutputFormat::Raw);
        assert!(cli.quiet);
        assert_eq!(cli.global_flags().format, OutputFormat::Raw);
    }

    #[test]
    fn default_format_is_json() {
        let cli = Cli::try_parse_from(["strata", "queue", "expire"]).expect("cli should parse");
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(!cli.quiet);
        assert!(cli.config.is_none());
    }

    #[test]
    fn synthesis_run_requires_a_target() {
        let result = Cli::try_parse_from(["strata", "synthesis", "run"]);
        assert!(result.is_err());
    }

    #[test]
    fn synthesis_run_rejects_both_targets() {
        let result = Cli::try_parse_from([
            "strata",
            "synthesis",
            "run",
            "--digest",
            "dig-1",
            "--date",
            "2026-03-10",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn synthesis_run_parses_date_and_overrides() {
        let cli = Cli::try_parse_from([
            "strata",
            "synthesis",
            "run",
            "--date",
            "2026-03-10",
            "--max-items",
            "4",
            "--min-similarity",
            "0.7",
            "--stream",
        ])
        .expect("cli should parse");

        let Commands::Synthesis {
            action: SynthesisCommands::Run(args),
        } = cli.command
        else {
            panic!("expected synthesis run");
        };
        assert_eq!(args.date, NaiveDate::from_ymd_opt(2026, 3, 10));
        assert_eq!(args.digest, None);
        assert_eq!(args.max_items, Some(4));
        assert_eq!(args.min_similarity, Some(0.7));
        assert!(args.stream);
    }

    #[test]
    fn synthesis_run_rejects_bad_date() {
        let result = Cli::try_parse_from(["strata", "synthesis", "run", "--date", "10/03/2026"]);
        assert!(result.is_err());
    }

    #[test]
    fn mark_used_requires_post() {
        let result = Cli::try_parse_from(["strata", "queue", "mark-used", "que-1"]);
        assert!(result.is_err());

        let cli = Cli::try_parse_from([
            "strata", "queue", "mark-used", "que-1", "que-2", "--post", "post-9",
        ])
        .expect("cli should parse");
        let Commands::Queue {
            action: QueueCommands::MarkUsed { ids, post },
        } = cli.command
        else {
            panic!("expected queue mark-used");
        };
        assert_eq!(ids, vec!["que-1".to_string(), "que-2".to_string()]);
        assert_eq!(post, "post-9");
    }

    #[test]
    fn select_requires_at_least_one_id() {
        assert!(Cli::try_parse_from(["strata", "queue", "select"]).is_err());
    }

    #[test]
    fn enqueue_items_takes_many_ids() {
        let cli = Cli::try_parse_from(["strata", "queue", "enqueue-items", "itm-1", "itm-2"])
            .expect("cli should parse");
        assert!(matches!(
            cli.command,
            Commands::Queue {
                action: QueueCommands::EnqueueItems { ref ids, .. }
            } if ids.len() == 2
        ));
    }
}
