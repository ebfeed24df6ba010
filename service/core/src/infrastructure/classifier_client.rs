// Copyright (c) 2026 Hiera Search Maintainers
// SPDX-License-Identifier: AGPL-3.0

//! Puppet Node Classifier Client
//!
//! Fetches the node group topology from the Puppet Enterprise classifier
//! (`/classifier-api/v1/groups`) over mutually authenticated TLS.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** SecureClassifierClient adapter
//! - **Integration:** Classifier HTTPS API → raw topology text → EnvironmentFilter
//!
//! # Trust model
//!
//! The client presents the Puppet primary server's own certificate and, by
//! default, does not validate the classifier's certificate. Trust is anchored
//! in network placement. `accept_invalid_certs: false` together with
//! `ca_cert_path` restores validation against the Puppet CA.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, Certificate, Client, Identity};
use std::fs;

use crate::domain::classifier::ClassifierClient;
use crate::domain::error::HieraSearchError;
use crate::domain::service_config::ClassifierConfig;

pub struct PuppetClassifierClient {
    /// Full groups endpoint URL
    endpoint: String,

    /// HTTP client carrying the client identity, built once per process
    client: Client,
}

impl PuppetClassifierClient {
    /// Build the mTLS client from configuration. Reads the certificate and
    /// key from disk once.
    pub fn from_config(config: &ClassifierConfig) -> Result<Self> {
        let cert = fs::read(&config.cert_path).with_context(|| {
            format!("Failed to read classifier client certificate: {:?}", config.cert_path)
        })?;
        let key = fs::read(&config.key_path).with_context(|| {
            format!("Failed to read classifier client key: {:?}", config.key_path)
        })?;

        // Identity::from_pem expects the key and certificate chain in one buffer
        let mut pem = key;
        pem.push(b'\n');
        pem.extend_from_slice(&cert);
        let identity =
            Identity::from_pem(&pem).context("Invalid classifier client certificate/key pair")?;

        let mut builder = Client::builder()
            .identity(identity)
            .timeout(config.timeout());

        if let Some(ca_path) = &config.ca_cert_path {
            let ca = fs::read(ca_path)
                .with_context(|| format!("Failed to read classifier CA certificate: {:?}", ca_path))?;
            let ca = Certificate::from_pem(&ca).context("Invalid classifier CA certificate")?;
            builder = builder.add_root_certificate(ca);
        }

        if config.accept_invalid_certs {
            tracing::warn!(
                endpoint = %config.endpoint,
                "Classifier server certificate validation is disabled (accept_invalid_certs: true)"
            );
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .context("Failed to build classifier HTTP client")?;

        Ok(Self::new_with_client(config.endpoint.clone(), client))
    }

    /// Use an existing client, e.g. a plain HTTP client in tests.
    pub fn new_with_client(endpoint: impl Into<String>, client: Client) -> Self {
        Self {
            endpoint: endpoint.into(),
            client,
        }
    }
}

#[async_trait]
impl ClassifierClient for PuppetClassifierClient {
    async fn fetch_topology(&self) -> Result<String, HieraSearchError> {
        tracing::debug!("Querying Puppet Classifier endpoint: {}", self.endpoint);

        let response = self
            .client
            .get(&self.endpoint)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Puppet Classifier query failed, is it available?");
                HieraSearchError::UpstreamUnavailable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(%status, "Puppet Classifier query returned with error, is it available?");
            return Err(HieraSearchError::UpstreamUnavailable(format!("HTTP {}", status)));
        }

        let body = response.text().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to read Puppet Classifier response body");
            HieraSearchError::UpstreamUnavailable(e.to_string())
        })?;

        if body.trim().is_empty() {
            tracing::error!("Puppet Classifier result returned empty string, is there a problem with it?");
            return Err(HieraSearchError::UpstreamEmptyResponse);
        }

        tracing::debug!(bytes = body.len(), "Puppet Classifier topology received");
        Ok(body)
    }
}
