// Copyright (c) 2026 Hiera Search Maintainers
// SPDX-License-Identifier: AGPL-3.0
//! Shared-Secret Authentication
//!
//! Router middleware that admits a request only when its `ApiKey` header
//! matches the configured secret. The search pipeline is not reached on
//! rejection.
//!
//! # Architecture
//!
//! - **Layer:** Presentation Layer
//! - **Purpose:** Boundary authentication composed onto protected routes

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

pub const API_KEY_HEADER: &str = "ApiKey";

/// Expected shared secret.
#[derive(Clone)]
pub struct ApiKey(Arc<str>);

impl ApiKey {
    pub fn new(key: impl AsRef<str>) -> Self {
        Self(Arc::from(key.as_ref()))
    }

    /// Constant-time comparison against a presented value.
    pub fn matches(&self, presented: &[u8]) -> bool {
        self.0.as_bytes().ct_eq(presented).into()
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

pub async fn require_api_key(
    State(expected): State<ApiKey>,
    request: Request,
    next: Next,
) -> Response {
    tracing::debug!("Validating ApiKey...");

    let Some(presented) = request.headers().get(API_KEY_HEADER) else {
        tracing::warn!(path = %request.uri().path(), "ApiKey was not provided");
        return (StatusCode::UNAUTHORIZED, "ApiKey was not provided").into_response();
    };

    if !expected.matches(presented.as_bytes()) {
        tracing::warn!(path = %request.uri().path(), "ApiKey is not valid");
        return (StatusCode::UNAUTHORIZED, "ApiKey is not valid").into_response();
    }

    tracing::debug!("ApiKey validated successfully.");
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_exact_key_only() {
        let key = ApiKey::new("s3cret");
        assert!(key.matches(b"s3cret"));
        assert!(!key.matches(b"s3cre"));
        assert!(!key.matches(b"s3cret "));
        assert!(!key.matches(b"S3CRET"));
        assert!(!key.matches(b""));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", ApiKey::new("s3cret"));
        assert!(!rendered.contains("s3cret"));
    }
}
