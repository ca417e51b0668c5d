//! Log setup
//!
//! Logs go to stderr so that `--json` and `--quiet` output on stdout stays
//! machine-readable. `RUST_LOG` selects the filter; `--verbose` forces debug
//! output for both crates.

use tracing_subscriber::EnvFilter;

/// Filter used when neither `--verbose` nor `RUST_LOG` is given
const DEFAULT_FILTER: &str = "warn";

/// Filter forced by `--verbose`
const VERBOSE_FILTER: &str = "ewsdb_core=debug,ewsdb=debug";

/// Pick the filter directive from the verbose flag and `RUST_LOG`
fn filter_directive(verbose: bool, rust_log: Option<String>) -> String {
    if verbose {
        return VERBOSE_FILTER.to_string();
    }
    match rust_log {
        Some(directive) if !directive.trim().is_empty() => directive,
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Initialize stderr logging (ignored if a subscriber is already set)
pub fn init(verbose: bool) {
    let directive = filter_directive(verbose, std::env::var(EnvFilter::DEFAULT_ENV).ok());
    let env_filter = EnvFilter::try_new(&directive).unwrap_or_else(|e| {
        eprintln!("Warning: ignoring invalid log filter '{}': {}", directive, e);
        EnvFilter::new(DEFAULT_FILTER)
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
