//! CLI argument parsing using clap 4.x derive macros

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tidyagent_core::clean::{ImputeStrategy, TextCase};

/// Clean messy CSV datasets locally or with an LLM
///
/// The `clean` command runs a deterministic pipeline (type conversion,
/// imputation, deduplication, text formatting). The `agent` command sends the
/// data to an LLM in batches and prints its cleaned version.
#[derive(Parser, Debug)]
#[command(name = "tidyagent")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// The command to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file (defaults to ./tidyagent.toml, then the user config dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging, mirrored to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print version information
    #[arg(long)]
    pub version: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Clean a CSV file with the local pipeline
    Clean {
        /// Input CSV file
        input: PathBuf,

        /// Output CSV file (defaults to <input>_cleaned.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Imputation strategy: auto, mean, median, mode, skip or const:VALUE
        #[arg(long)]
        impute: Option<ImputeStrategy>,

        /// Keep duplicate rows
        #[arg(long)]
        no_dedup: bool,

        /// Leave column types as parsed
        #[arg(long)]
        no_convert: bool,

        /// Case applied to text cells: keep, lower, upper or title
        #[arg(long)]
        case: Option<TextCase>,

        /// Print the report in this format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        report: Format,
    },

    /// Clean a CSV file by sending batches to an LLM
    Agent {
        /// Input CSV file
        input: PathBuf,

        /// Write the cleaned text here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Rows per prompt
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// Batches sent at once
        #[arg(long)]
        concurrency: Option<usize>,

        /// Model name (overrides config)
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Show column types, null counts and statistics
    Profile {
        /// Input CSV file
        input: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Check the configured expectations against a CSV file
    Validate {
        /// Input CSV file
        input: PathBuf,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommand>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,
    /// Print the path of the configuration file in use
    Path,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_clean() {
        let cli = Cli::parse_from([
            "tidyagent",
            "clean",
            "data.csv",
            "--impute",
            "const:0",
            "--no-dedup",
            "--case",
            "title",
            "-v",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Some(Commands::Clean {
                impute,
                no_dedup,
                case,
                report,
                ..
            }) => {
                assert_eq!(impute, Some(ImputeStrategy::Constant("0".to_string())));
                assert!(no_dedup);
                assert_eq!(case, Some(TextCase::Title));
                assert_eq!(report, Format::Text);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_unknown_strategy() {
        assert!(Cli::try_parse_from(["tidyagent", "clean", "x.csv", "--impute", "guess"]).is_err());
    }

    #[test]
    fn test_parse_agent() {
        let cli = Cli::parse_from(["tidyagent", "agent", "in.csv", "-b", "5", "--concurrency", "2"]);
        match cli.command {
            Some(Commands::Agent {
                batch_size,
                concurrency,
                model,
                ..
            }) => {
                assert_eq!(batch_size, Some(5));
                assert_eq!(concurrency, Some(2));
                assert!(model.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
