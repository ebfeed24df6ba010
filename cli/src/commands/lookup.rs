// Copyright (c) 2026 Hiera Search Maintainers
// SPDX-License-Identifier: AGPL-3.0

//! `lookup` command: run the search pipeline once and print the envelope
//!
//! Useful on the Puppet primary server to check what the HTTP API would
//! return without going through authentication.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use hiera_core::application::HieraSearchService;
use hiera_core::domain::query::HieraQuery;
use hiera_core::domain::service_config::ServiceConfigManifest;

#[derive(Debug, Args)]
pub struct LookupArgs {
    /// Node group name in the classifier (e.g. "dev")
    #[arg(short, long)]
    pub environment: String,

    /// Release branch, periods allowed (e.g. "2022.4")
    #[arg(short, long)]
    pub branch: String,

    /// Hiera key to resolve (e.g. "profile::app::setting")
    #[arg(short, long = "key", value_name = "KEY")]
    pub search_key: String,
}

pub async fn execute(args: LookupArgs, config_override: Option<PathBuf>) -> Result<()> {
    let config = ServiceConfigManifest::load_or_default(config_override)
        .context("Failed to load configuration")?;

    let query = HieraQuery::new(args.environment, args.branch, args.search_key)?;
    let service = HieraSearchService::from_config(&config.spec)
        .context("Failed to initialize search service")?;

    match service.search(&query).await {
        Ok(value) => {
            println!("{}", value.to_envelope());
            Ok(())
        }
        Err(e) if e.is_not_found() => {
            eprintln!("{}", e.to_string().yellow());
            std::process::exit(4);
        }
        Err(e) => Err(e).context("Hiera search failed"),
    }
}
