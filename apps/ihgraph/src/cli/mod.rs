//! # IHGraph CLI Module
//!
//! This module implements the CLI interface for ihgraph.
//!
//! ## Available Commands
//!
//! - `inspect` - Show metrics (and optionally the tree) of a factory graph
//! - `cliques` - Show the next clique or every immediate clique
//! - `induce` - Build the induced hierarchy
//! - `flatten-check` - Check that flattening undoes induction
//! - `roundtrip` - Re-export a factory graph as JSON

mod commands;

use crate::config::AppConfig;
use clap::{Parser, Subcommand};
use ihgraph_core::IHGraphError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// IHGraph - hierarchical transformation graphs
///
/// Loads graphs from the factory JSON format and runs clique detection,
/// induction and flattening on them.
#[derive(Parser, Debug)]
#[command(name = "ihgraph")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show metrics of a factory graph
    Inspect {
        /// Factory JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Also print the element tree
        #[arg(short, long)]
        tree: bool,
    },

    /// Show the next clique, or every immediate clique
    Cliques {
        /// Factory JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// List cliques of immediate edge types instead
        #[arg(short, long)]
        immediate: bool,
    },

    /// Build the induced hierarchy and print it
    Induce {
        /// Factory JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Write the hierarchy tree to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Bound on induction folds (overrides the config file)
        #[arg(short, long)]
        max_iterations: Option<usize>,
    },

    /// Check that flattening the induced hierarchy gives the input back
    FlattenCheck {
        /// Factory JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Bound on induction folds (overrides the config file)
        #[arg(short, long)]
        max_iterations: Option<usize>,
    },

    /// Load a factory graph and export it again
    Roundtrip {
        /// Factory JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Write the JSON to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Leave annotations out of the export
        #[arg(long)]
        no_annotations: bool,

        /// Single-line JSON
        #[arg(long)]
        compact: bool,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli, config: &AppConfig) -> Result<(), IHGraphError> {
    let json_mode = cli.json_mode;

    match cli.command {
        Commands::Inspect { file, tree } => cmd_inspect(&file, json_mode, tree),
        Commands::Cliques { file, immediate } => cmd_cliques(&file, json_mode, immediate),
        Commands::Induce {
            file,
            output,
            max_iterations,
        } => cmd_induce(
            &file,
            json_mode,
            max_iterations.unwrap_or(config.max_iterations),
            output.as_deref(),
        ),
        Commands::FlattenCheck {
            file,
            max_iterations,
        } => cmd_flatten_check(
            &file,
            json_mode,
            max_iterations.unwrap_or(config.max_iterations),
        ),
        Commands::Roundtrip {
            file,
            output,
            no_annotations,
            compact,
        } => cmd_roundtrip(
            &file,
            config.include_annotations && !no_annotations,
            config.pretty && !compact,
            output.as_deref(),
        ),
    }
}
