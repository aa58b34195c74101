//! `tidyagent` - clean messy CSV datasets from the command line
//!
//! Runs the local cleaning pipeline, profiles and validates datasets, or hands
//! batches of rows to an LLM through the cleaning agent.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use console::Style;
use std::path::{Path, PathBuf};

use crate::cli::{Cli, Commands, ConfigCommand, Format};
use tidyagent_core::agent::CleaningAgent;
use tidyagent_core::clean::CleaningPipeline;
use tidyagent_core::config::{find_config_file, Config, CONFIG_FILE_NAME};
use tidyagent_core::data::{read_csv, write_csv};
use tidyagent_core::llm::{LlmClient, RetryingBackend};
use tidyagent_core::output::OutputFormatter;
use tidyagent_core::{logger, profile, validate, CleanError};

mod cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let verbose = cli.verbose;

    if let Err(err) = run(cli).await {
        let red = Style::new().red().bold();
        match err.downcast_ref::<CleanError>() {
            Some(clean) if clean.requires_user_action() => {
                eprintln!("{} {}", red.apply_to("error:"), clean.user_message());
            }
            _ => eprintln!("{} {:#}", red.apply_to("error:"), err),
        }
        // With --verbose the log is already mirrored to stderr.
        if !verbose {
            print_recent_logs(RECENT_LOG_LINES);
        }
        std::process::exit(2);
    }
}

const RECENT_LOG_LINES: usize = 5;

fn print_recent_logs(n: usize) {
    let recent = logger::get_recent_logs(n);
    if recent.is_empty() {
        return;
    }
    let dim = Style::new().dim();
    eprintln!("{}", dim.apply_to("recent log:"));
    for line in recent.iter().rev() {
        eprintln!("  {}", dim.apply_to(line));
    }
}

async fn run(cli: Cli) -> Result<()> {
    if cli.version {
        let blue = Style::new().blue();
        println!(
            "{} v{} ({})",
            blue.apply_to("tidyagent"),
            env!("CARGO_PKG_VERSION"),
            env!("GIT_HASH")
        );
        return Ok(());
    }

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    // Init must work before any config file exists.
    if let Commands::Config {
        cmd: Some(ConfigCommand::Init { force }),
    } = command
    {
        return init_config(cli.config, force);
    }

    let mut config =
        Config::resolve(cli.config.as_deref()).context("Failed to load configuration")?;

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        config.log_level()?
    };
    let log_file = config.logging.file.clone().or_else(logger::default_log_path);
    logger::init(level, log_file, cli.verbose);
    log::debug!("Starting tidyagent {}", env!("CARGO_PKG_VERSION"));

    let formatter = OutputFormatter::new();

    match command {
        Commands::Clean {
            input,
            output,
            impute,
            no_dedup,
            no_convert,
            case,
            report,
        } => {
            let mut options = config.cleaning.clone();
            if let Some(strategy) = impute {
                options.impute = strategy;
            }
            if let Some(case) = case {
                options.text.case = case;
            }
            options.deduplicate &= !no_dedup;
            options.convert_types &= !no_convert;

            let dataset = read_csv(&input, &config.csv)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let (cleaned, cleaning_report) = CleaningPipeline::new(options).run(&dataset)?;

            let output = output.unwrap_or_else(|| cleaned_path(&input));
            write_csv(&output, &cleaned, &config.csv)
                .with_context(|| format!("Failed to write {}", output.display()))?;

            match report {
                Format::Json => println!("{}", serde_json::to_string_pretty(&cleaning_report)?),
                Format::Text => {
                    formatter.print_report(&cleaning_report);
                    println!(
                        "Saved to {}",
                        Style::new().green().apply_to(output.display())
                    );
                }
            }
        }

        Commands::Agent {
            input,
            output,
            batch_size,
            concurrency,
            model,
        } => {
            if let Some(model) = model {
                config.llm.model = model;
            }
            let batch_size = batch_size.unwrap_or(config.agent.batch_size);
            let concurrency = concurrency.unwrap_or(config.agent.max_concurrency);

            // The key is checked before any data is read.
            let client = LlmClient::new(config.llm_config()?)?;
            log::info!("Using {} via {}", client.model(), client.provider());
            let backend = RetryingBackend::new(client, config.retry.clone());
            let agent = CleaningAgent::new(backend)?
                .with_max_concurrency(concurrency)
                .with_recursion_limit(config.agent.recursion_limit);

            let dataset = read_csv(&input, &config.csv)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let result = tokio::select! {
                result = agent.process_data(&dataset, batch_size) => result?,
                _ = tokio::signal::ctrl_c() => anyhow::bail!("Interrupted"),
            };

            match output {
                Some(path) => {
                    tokio::fs::write(&path, result.text())
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!(
                        "Saved {} batches to {} ({})",
                        result.responses.len(),
                        Style::new().green().apply_to(path.display()),
                        result.usage
                    );
                }
                None => formatter.print_agent_output(&result),
            }
        }

        Commands::Profile { input, format } => {
            let dataset = read_csv(&input, &config.csv)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let dataset_profile = profile::profile(&dataset);
            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&dataset_profile)?),
                Format::Text => formatter.print_profile(&dataset_profile),
            }
        }

        Commands::Validate { input } => {
            if config.expectations.is_empty() {
                anyhow::bail!("No [[expectations]] configured");
            }
            let dataset = read_csv(&input, &config.csv)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let report = validate::validate(&dataset, &config.expectations)?;
            formatter.print_validation(&report);
            if !report.success {
                std::process::exit(1);
            }
        }

        Commands::Config { cmd } => match cmd.unwrap_or(ConfigCommand::Show) {
            ConfigCommand::Show => print!("{}", config.to_toml()?),
            ConfigCommand::Path => match cli.config.or_else(find_config_file) {
                Some(path) => println!("{}", path.display()),
                None => println!("No configuration file found (using defaults)"),
            },
            ConfigCommand::Init { force } => init_config(cli.config, force)?,
        },
    }

    Ok(())
}

fn init_config(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = path
        .or_else(Config::default_path)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    Config::default()
        .save(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {}", Style::new().green().apply_to(path.display()));
    Ok(())
}

/// `data/input.csv` -> `data/input_cleaned.csv`
fn cleaned_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{}_cleaned.csv", stem))
}
