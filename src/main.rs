// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Build the run configuration and the HTTP prober
// 3. Run the batch (or the single URL) through the resolver
// 4. Write / print the results
// 5. Exit with proper code (0 = done, 1 = interrupted, 2 = error)
// =============================================================================

// Module declarations - tells Rust about our other source files
mod batch;         // src/batch/ - row loop, cache, pacing
mod cli;           // src/cli.rs - command-line parsing
mod config;        // src/config.rs - run configuration
mod error;         // src/error.rs - batch-level errors
mod logging;       // src/logging.rs - tracing setup
mod resolver;      // src/resolver/ - the availability resolution engine
mod table;         // src/table/ - CSV input and output

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;  // Parser trait enables the parse() method
use tracing::info;

use batch::{BatchReport, BatchRunner, PostReference, ResultRecord};
use cli::{Cli, Commands, HttpArgs};
use config::CheckerConfig;
use resolver::{AvailabilityCode, Classifier, HttpProber};

#[tokio::main]
async fn main() {
    // Run our application logic and capture the exit code
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // Print the whole context chain: "Unable to read ...: No such file"
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = batch completed
//   Ok(1) = batch interrupted before every row was resolved
//   Err   = something around the batch failed (exit code 2)
async fn run() -> Result<i32> {
    let cli = Cli::parse();
    logging::init(logging::Verbosity::from_flags(cli.verbose, cli.quiet));

    match cli.command {
        Commands::Check {
            input,
            url_column,
            output,
            json,
            http,
            sleep,
            progress_every,
            concurrency,
        } => {
            let mut config = build_config(&http)?;
            config.pause = CheckerConfig::seconds("sleep", sleep)?;
            config.progress_every = progress_every;
            config.concurrency = concurrency;
            config.validate()?;

            handle_check(&input, &url_column, output, json, &config).await
        }
        Commands::Url { url, json, http } => {
            let mut config = build_config(&http)?;
            config.pause = std::time::Duration::ZERO;
            config.progress_every = 0;
            config.validate()?;

            handle_url(&url, json, &config).await
        }
    }
}

// The part of the config both subcommands share
fn build_config(http: &HttpArgs) -> Result<CheckerConfig> {
    let mut config = CheckerConfig {
        timeout: CheckerConfig::seconds("timeout", http.timeout)?,
        ..CheckerConfig::default()
    };
    if let Some(user_agent) = &http.user_agent {
        config.fetch_user_agent = user_agent.clone();
    }
    if let Some(endpoint) = &http.embed_endpoint {
        config.embed_endpoint = endpoint.clone();
    }
    Ok(config)
}

fn build_runner(config: &CheckerConfig) -> Result<BatchRunner> {
    let prober = HttpProber::new(config).context("Unable to build HTTP clients")?;
    let classifier = Classifier::new(Arc::new(prober));
    Ok(BatchRunner::new(classifier, config))
}

// Handles the 'check' subcommand
async fn handle_check(
    input: &Path,
    url_column: &str,
    output: Option<PathBuf>,
    json: bool,
    config: &CheckerConfig,
) -> Result<i32> {
    let table = table::read_table_file(input, url_column)
        .with_context(|| format!("Unable to read {}", input.display()))?;

    info!(
        input = %input.display(),
        rows = table.len(),
        column = table.url_column(),
        "processing rows"
    );
    if table.is_empty() {
        info!("input has no data rows");
    }

    let runner = build_runner(config)?;
    let report = runner.run(&table.references(), batch::cancel_on_ctrl_c()).await;

    let output_path = output.unwrap_or_else(|| table::default_output_path(input));
    let written = table::write_results_file(&output_path, &table, &report)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;
    info!(output = %output_path.display(), rows = written, "wrote results");

    // Keep stdout pure JSON when asked for it
    if json {
        print_json(&report)?;
    } else {
        print_summary(&report);
    }

    Ok(exit_code(&report))
}

// Handles the 'url' subcommand
async fn handle_url(url: &str, json: bool, config: &CheckerConfig) -> Result<i32> {
    let runner = build_runner(config)?;
    let report = runner
        .run(&[PostReference::new(url)], batch::cancel_on_ctrl_c())
        .await;

    if json {
        print_json(&report)?;
    } else {
        print_table(&report);
    }

    Ok(exit_code(&report))
}

fn exit_code(report: &BatchReport) -> i32 {
    if report.was_cancelled() {
        1
    } else {
        0
    }
}

// Prints the recorded rows as a JSON array on stdout
fn print_json(report: &BatchReport) -> error::Result<()> {
    let records: Vec<&ResultRecord> = report.records.iter().flatten().collect();
    let json_output = serde_json::to_string_pretty(&records)?;
    println!("{}", json_output);
    Ok(())
}

// Prints results as a human-readable table in the terminal
fn print_table(report: &BatchReport) {
    println!("{:<22} {:<18} {:<8} {:<40}", "POST ID", "AVAILABILITY", "STATUS", "DETAIL");
    println!("{}", "=".repeat(90));

    for record in report.records.iter().flatten() {
        let outcome = &record.outcome;
        let status = outcome
            .http_status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<22} {:<18} {:<8} {:<40}",
            record.identifier.as_deref().unwrap_or("-"),
            outcome.availability,
            status,
            outcome.detail.as_deref().unwrap_or("")
        );
        if let Some(url) = &outcome.resolved_url {
            println!("{:<22} {}", "", url);
        }
    }

    println!();
    print_summary(report);
}

// Availability counts, in the fixed order of the taxonomy
fn print_summary(report: &BatchReport) {
    let counts = report.summary();

    println!("📊 Summary:");
    for code in AvailabilityCode::ALL {
        if let Some(count) = counts.get(&code) {
            println!("   {:<18} {}", code.as_str(), count);
        }
    }
    println!("   {:<18} {}", "total", report.completed());
    if report.was_cancelled() {
        println!(
            "   ⚠️  interrupted: {} row(s) not checked",
            report.records.len() - report.completed()
        );
    }
}
