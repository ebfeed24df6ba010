// Copyright (c) 2026 Hiera Search Maintainers
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};

use hiera_core::domain::service_config::ServiceConfigManifest;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./hiera-search-config.yaml)
        #[arg(short, long, default_value = "./hiera-search-config.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(&output, examples),
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = ServiceConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. HIERA_SEARCH_CONFIG_PATH: {}",
            std::env::var("HIERA_SEARCH_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./hiera-search-config.yaml");
        println!("  4. ~/.hiera-search/config.yaml");
        println!("  5. /etc/hiera-search/config.yaml");
        println!();
    }

    let spec = &config.spec;

    println!("{}", "Current configuration:".bold());
    println!("  Name: {}", config.metadata.name);
    println!();

    println!("{}", "Server:".bold());
    println!("  Listen: {}:{}", spec.server.bind_address, spec.server.port);
    let api_key_state = match spec.auth.resolved_api_key() {
        Some(key) if !key.is_empty() => "(set)".green(),
        Some(_) => "(empty)".red(),
        None => "(environment variable unset)".red(),
    };
    println!("  API key: {}", api_key_state);
    println!();

    println!("{}", "Classifier:".bold());
    println!("  Endpoint: {}", spec.classifier.endpoint);
    println!("  Client certificate: {}", spec.classifier.cert_path.display());
    println!("  Client key: {}", spec.classifier.key_path.display());
    if let Some(ca) = &spec.classifier.ca_cert_path {
        println!("  CA certificate: {}", ca.display());
    }
    if spec.classifier.accept_invalid_certs {
        println!("  Server certificate validation: {}", "disabled".yellow());
    } else {
        println!("  Server certificate validation: {}", "enabled".green());
    }
    println!("  Timeout: {}s", spec.classifier.timeout_secs);
    println!();

    println!("{}", "Lookup:".bold());
    println!("  Puppet binary: {}", spec.lookup.puppet_binary.display());
    println!("  Staging directory: {}", spec.lookup.staging_dir().display());
    println!("  Timeout: {}s", spec.lookup.timeout_secs);
    println!();

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = ServiceConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

fn sample_config(with_examples: bool) -> &'static str {
    if with_examples {
        include_str!("../../templates/config-with-examples.yaml")
    } else {
        include_str!("../../templates/config-minimal.yaml")
    }
}

fn generate(output: &Path, with_examples: bool) -> Result<()> {
    std::fs::write(output, sample_config(with_examples))
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}
