// src/logging.rs
// =============================================================================
// Sets up structured logging with `tracing`.
//
// Logs always go to stderr. That keeps stdout clean for `--json` output,
// so the results can be piped straight into another tool.
//
// The level comes from the command line only (--verbose / --quiet), never
// from environment variables.
// =============================================================================

use tracing_subscriber::EnvFilter;

/// How chatty the program should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Verbosity {
    /// Picks a verbosity from the two global CLI flags.
    /// --quiet wins if both are given.
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        match (verbose, quiet) {
            (_, true) => Verbosity::Quiet,
            (true, false) => Verbosity::Verbose,
            (false, false) => Verbosity::Normal,
        }
    }

    fn directive(self) -> &'static str {
        match self {
            Verbosity::Quiet => "warn",
            Verbosity::Normal => "info",
            Verbosity::Verbose => "debug",
        }
    }
}

/// Installs the global subscriber. Calling it twice is harmless.
pub fn init(verbosity: Verbosity) {
    let filter = EnvFilter::new(format!(
        "{}={},warn",
        env!("CARGO_CRATE_NAME"),
        verbosity.directive()
    ));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
