// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two subcommands:
// - check: run a whole CSV file of post links
// - url:   check a single link and print the result
//
// Rust concepts:
// - Structs: Custom data types that group related data
// - Enums: Types that can be one of several variants
// - Derive macros: Automatically generate code for our types
// =============================================================================

use std::path::PathBuf;

use clap::{Parser, Subcommand};

// This struct represents our entire CLI application
//
// #[derive(Parser)] tells clap to automatically generate parsing code
// The #[command(...)] attributes configure how the CLI behaves
#[derive(Parser, Debug)]
#[command(
    name = "post-availability",
    version,
    about = "Check whether social media post links are still publicly reachable",
    long_about = "post-availability reads post links (twitter.com / x.com status URLs), asks the \
                  platform's embed endpoint and the post page itself whether each post can still \
                  be seen, and records WHY not when it can't (removed, protected, withheld, ...)."
)]
pub struct Cli {
    /// Show debug logs (every request made)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only show warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

// This enum defines our subcommands (check, url)
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check every post link in a CSV file
    ///
    /// Example: post-availability check posts.csv --url-column link --sleep 1
    Check {
        /// CSV file with a header row
        input: PathBuf,

        /// Name of the column that holds the post URLs
        #[arg(long, default_value = "URL")]
        url_column: String,

        /// Where to write the results (default: <input>_checked.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also print the records as JSON on stdout
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        http: HttpArgs,

        /// Seconds to pause between distinct posts, to stay under rate limits
        #[arg(long, default_value_t = 0.5)]
        sleep: f64,

        /// Log a progress line after this many rows (0 disables)
        #[arg(long, default_value_t = 25)]
        progress_every: usize,

        /// Posts resolved at the same time (1 = one request at a time)
        #[arg(long, default_value_t = 1)]
        concurrency: usize,
    },

    /// Check a single post link
    ///
    /// Example: post-availability url https://x.com/someone/status/123
    Url {
        /// The post URL to check
        url: String,

        /// Print the record as JSON instead of a table
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        http: HttpArgs,
    },
}

/// Flags shared by both subcommands.
#[derive(clap::Args, Debug, Clone)]
pub struct HttpArgs {
    /// Seconds to wait for each HTTP request
    #[arg(long, default_value_t = 10.0)]
    pub timeout: f64,

    /// User-Agent sent with direct page fetches
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Embed-metadata endpoint to query
    #[arg(long)]
    pub embed_endpoint: Option<String>,
}


// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why #[command(flatten)]?
//    - Both subcommands take the same HTTP flags
//    - Flattening a shared Args struct keeps them defined in one place
//
// 2. Why f64 seconds instead of Duration?
//    - clap can't parse "0.5" into a Duration on its own
//    - config.rs converts (and validates) them before anything runs
// -----------------------------------------------------------------------------
