//! # ihgraph
//!
//! Command-line front end for hierarchical transformation graphs.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │            apps/ihgraph (THE BINARY)         │
//! │                                              │
//! │   ┌─────────────┐        ┌───────────────┐   │
//! │   │    CLI      │        │    Config     │   │
//! │   │   (clap)    │        │    (toml)     │   │
//! │   └──────┬──────┘        └───────┬───────┘   │
//! │          └───────────┬───────────┘           │
//! │                      ▼                       │
//! │              ┌───────────────┐               │
//! │              │ ihgraph-core  │               │
//! │              │ (THE ALGEBRA) │               │
//! │              └───────────────┘               │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! ihgraph inspect -f graph.json --tree
//! ihgraph cliques -f graph.json --immediate
//! ihgraph induce -f graph.json -o hierarchy.txt
//! ihgraph flatten-check -f graph.json
//! ihgraph roundtrip -f graph.json --compact
//! ```

use clap::Parser;
use ihgraph::cli;
use ihgraph::config::{AppConfig, LogFormat};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    let config = AppConfig::load(cli.config.as_deref());
    let log_format = match &config {
        Ok(config) => {
            config.effective_log_format(std::env::var("IHGRAPH_LOG_FORMAT").ok().as_deref())
        }
        Err(_) => LogFormat::Text,
    };
    init_tracing(log_format, cli.verbose, cli.quiet);

    let result = config.and_then(|config| cli::execute(cli, &config));
    if let Err(e) = result {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// verbosity flags.
fn init_tracing(format: LogFormat, verbose: bool, quiet: bool) {
    let default_filter = if verbose {
        "ihgraph=debug"
    } else if quiet {
        "ihgraph=warn"
    } else {
        "ihgraph=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
