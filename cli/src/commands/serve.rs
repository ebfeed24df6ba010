// Copyright (c) 2026 Hiera Search Maintainers
// SPDX-License-Identifier: AGPL-3.0

//! `serve` command: load configuration and run the HTTP API

use anyhow::{Context, Result};
use std::path::PathBuf;

use hiera_core::domain::service_config::ServiceConfigManifest;

pub async fn execute(
    config_override: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    tracing::info!("Starting Hiera search service (PID: {})", std::process::id());

    let mut config = ServiceConfigManifest::load_or_default(config_override)
        .context("Failed to load configuration")?;

    if let Some(host) = host {
        config.spec.server.bind_address = host;
    }
    if let Some(port) = port {
        config.spec.server.port = port;
    }

    crate::server::start_server(config).await
}
