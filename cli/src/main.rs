// Copyright (c) 2026 Hiera Search Maintainers
// SPDX-License-Identifier: AGPL-3.0

//! # Hiera Search CLI
//!
//! The `hiera-search` binary runs the Hiera search HTTP service and offers
//! one-shot lookups for operators on the Puppet primary server.
//!
//! ## Commands
//!
//! - `hiera-search serve` - Run the HTTP API
//! - `hiera-search lookup --environment E --branch B --key K` - Resolve one key without HTTP
//! - `hiera-search config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use hiera_search::commands::{self, ConfigCommand, LookupArgs};

/// Hiera Search - resolve Puppet Hiera values per node group and branch
#[derive(Parser)]
#[command(name = "hiera-search")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "HIERA_SEARCH_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// HTTP API port (overrides spec.server.port)
    #[arg(long, global = true, env = "HIERA_SEARCH_PORT")]
    port: Option<u16>,

    /// HTTP API bind address (overrides spec.server.bind_address)
    #[arg(long, global = true, env = "HIERA_SEARCH_HOST")]
    host: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "HIERA_SEARCH_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log output format (compact, json)
    #[arg(long, global = true, env = "HIERA_SEARCH_LOG_FORMAT", default_value = "compact")]
    log_format: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    #[command(name = "serve")]
    Serve,

    /// Resolve a single Hiera key and print the result envelope
    #[command(name = "lookup")]
    Lookup {
        #[command(flatten)]
        args: LookupArgs,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level, &cli.log_format)?;

    match cli.command {
        Some(Commands::Serve) => commands::serve::execute(cli.config, cli.host, cli.port).await,
        Some(Commands::Lookup { args }) => commands::lookup::execute(args, cli.config).await,
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str, format: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    match format {
        "json" => builder.json().init(),
        "compact" => builder.compact().init(),
        other => anyhow::bail!("Unknown log format '{}'. Expected 'compact' or 'json'", other),
    }

    Ok(())
}
