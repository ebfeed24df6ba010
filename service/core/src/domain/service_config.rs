// Copyright (c) 2026 Hiera Search Maintainers
// SPDX-License-Identifier: AGPL-3.0

// Service Configuration Types
//
// Defines the configuration schema for a Hiera search node, including:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - HTTP listener and shared-secret authentication
// - Node classifier endpoint and client certificate identity
// - `puppet lookup` binary, staging directory and timeouts

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const API_VERSION: &str = "hiera-search/v1";
pub const KIND: &str = "ServiceConfig";

/// Top-level Kubernetes-style service configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfigManifest {
    /// API version (must be "hiera-search/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "ServiceConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    pub spec: ServiceConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Human-readable instance name
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfigSpec {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub lookup: LookupConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_api_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared secret expected in the `ApiKey` header.
    /// Supports "env:VAR_NAME" to read from the environment.
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Full URL of the classifier `groups` endpoint
    #[serde(default = "default_classifier_endpoint")]
    pub endpoint: String,

    /// PEM client certificate presented for mutual TLS
    #[serde(default = "default_cert_path")]
    pub cert_path: PathBuf,

    /// PEM private key matching `cert_path`
    #[serde(default = "default_key_path")]
    pub key_path: PathBuf,

    /// Extra root certificate, only useful with `accept_invalid_certs: false`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_cert_path: Option<PathBuf>,

    /// Skip server certificate validation. The classifier is reached on a
    /// trusted network segment and serves a certificate signed by the Puppet
    /// CA; turning this off changes the trust model.
    #[serde(default = "default_true")]
    pub accept_invalid_certs: bool,

    #[serde(default = "default_classifier_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    #[serde(default = "default_puppet_binary")]
    pub puppet_binary: PathBuf,

    /// Directory for staged facts files. Default: the OS temp dir
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staging_dir: Option<PathBuf>,

    #[serde(default = "default_lookup_timeout")]
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_api_port(),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: default_classifier_endpoint(),
            cert_path: default_cert_path(),
            key_path: default_key_path(),
            ca_cert_path: None,
            accept_invalid_certs: true,
            timeout_secs: default_classifier_timeout(),
        }
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            puppet_binary: default_puppet_binary(),
            staging_dir: None,
            timeout_secs: default_lookup_timeout(),
        }
    }
}

impl Default for ServiceConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "hiera-search".to_string(),
                version: None,
            },
            spec: ServiceConfigSpec::default(),
        }
    }
}

impl ClassifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl LookupConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.staging_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

impl AuthConfig {
    /// Resolve `env:VAR_NAME` indirection. Returns `None` when the variable
    /// is unset.
    pub fn resolved_api_key(&self) -> Option<String> {
        match self.api_key.strip_prefix("env:") {
            Some(var) => std::env::var(var).ok(),
            None => Some(self.api_key.clone()),
        }
    }
}

impl ServiceConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. HIERA_SEARCH_CONFIG_PATH environment variable
    /// 2. ./hiera-search-config.yaml (working directory)
    /// 3. ~/.hiera-search/config.yaml (user home)
    /// 4. /etc/hiera-search/config.yaml (system)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("HIERA_SEARCH_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./hiera-search-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".hiera-search").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        let system_config = PathBuf::from("/etc/hiera-search/config.yaml");
        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path fails if missing/invalid
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    /// This allows container deployments to inject secrets and endpoints
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("HIERA_SEARCH_API_KEY") {
            tracing::info!("Environment override: HIERA_SEARCH_API_KEY=<redacted>");
            self.spec.auth.api_key = val;
        }

        if let Ok(val) = std::env::var("HIERA_SEARCH_CLASSIFIER_ENDPOINT") {
            tracing::info!("Environment override: HIERA_SEARCH_CLASSIFIER_ENDPOINT={}", val);
            self.spec.classifier.endpoint = val;
        }

        if let Ok(val) = std::env::var("HIERA_SEARCH_PUPPET_BINARY") {
            tracing::info!("Environment override: HIERA_SEARCH_PUPPET_BINARY={}", val);
            self.spec.lookup.puppet_binary = PathBuf::from(val);
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        match self.spec.auth.resolved_api_key() {
            Some(key) if !key.is_empty() => {}
            Some(_) => anyhow::bail!("spec.auth.api_key cannot be empty"),
            None => anyhow::bail!(
                "spec.auth.api_key references unset environment variable: {}",
                self.spec.auth.api_key
            ),
        }

        let endpoint = &self.spec.classifier.endpoint;
        if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
            anyhow::bail!("spec.classifier.endpoint must be an http(s) URL: '{}'", endpoint);
        }

        if self.spec.classifier.timeout_secs == 0 {
            anyhow::bail!("spec.classifier.timeout_secs must be greater than zero");
        }

        if self.spec.lookup.puppet_binary.as_os_str().is_empty() {
            anyhow::bail!("spec.lookup.puppet_binary cannot be empty");
        }

        if self.spec.lookup.timeout_secs == 0 {
            anyhow::bail!("spec.lookup.timeout_secs must be greater than zero");
        }

        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
    8000
}

fn default_classifier_endpoint() -> String {
    "https://localhost:4433/classifier-api/v1/groups".to_string()
}

fn default_cert_path() -> PathBuf {
    PathBuf::from("/etc/puppetlabs/puppet/ssl/certs/puppetmaster.pem")
}

fn default_key_path() -> PathBuf {
    PathBuf::from("/etc/puppetlabs/puppet/ssl/private_keys/puppetmaster.pem")
}

fn default_classifier_timeout() -> u64 {
    30
}

fn default_puppet_binary() -> PathBuf {
    PathBuf::from("/usr/local/bin/puppet")
}

fn default_lookup_timeout() -> u64 {
    60
}
