// Copyright (c) 2026 Hiera Search Maintainers
// SPDX-License-Identifier: AGPL-3.0

//! HTTP server bootstrap

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use hiera_core::application::HieraSearchService;
use hiera_core::domain::service_config::ServiceConfigManifest;
use hiera_core::presentation::api::app;
use hiera_core::presentation::auth::ApiKey;

pub async fn start_server(config: ServiceConfigManifest) -> Result<()> {
    config
        .validate()
        .context("Configuration validation failed")?;

    let spec = &config.spec;
    info!(
        name = %config.metadata.name,
        classifier = %spec.classifier.endpoint,
        puppet = %spec.lookup.puppet_binary.display(),
        staging_dir = %spec.lookup.staging_dir().display(),
        "Configuration loaded"
    );

    if !spec.lookup.puppet_binary.exists() {
        warn!(
            "Puppet binary {:?} not found, lookups will fail until it is installed",
            spec.lookup.puppet_binary
        );
    }

    let api_key = spec
        .auth
        .resolved_api_key()
        .context("API key environment variable is not set")?;

    let service = Arc::new(
        HieraSearchService::from_config(spec).context("Failed to initialize search service")?,
    );

    let router = app(service, ApiKey::new(api_key));

    let addr = format!("{}:{}", spec.server.bind_address, spec.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Hiera search API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Shut down complete.");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
