// Copyright (c) 2026 Hiera Search Maintainers
// SPDX-License-Identifier: AGPL-3.0
//! HTTP API
//!
//! `GET /api/PuppetHieraSearch?environment=..&branch=..&hierasearchkey=..`
//! behind the `ApiKey` middleware, plus an unauthenticated `/health`.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

use crate::application::hiera_search::HieraSearchService;
use crate::domain::error::HieraSearchError;
use crate::domain::query::HieraQuery;
use crate::presentation::auth::{require_api_key, ApiKey};

pub const SEARCH_ROUTE: &str = "/api/PuppetHieraSearch";

pub struct AppState {
    pub search_service: Arc<HieraSearchService>,
    pub start_time: Instant,
}

pub fn app(service: Arc<HieraSearchService>, api_key: ApiKey) -> Router {
    let state = Arc::new(AppState {
        search_service: service,
        start_time: Instant::now(),
    });

    let protected = Router::new()
        .route(SEARCH_ROUTE, get(hiera_search_handler))
        .route_layer(middleware::from_fn_with_state(api_key, require_api_key));

    Router::new()
        .route("/health", get(health_handler))
        .merge(protected)
        .with_state(state)
}

/// Raw query string fields. Blank or missing values are rejected when the
/// [`HieraQuery`] is built.
#[derive(Debug, Default, Deserialize)]
pub struct HieraSearchParams {
    #[serde(default, alias = "Environment")]
    pub environment: Option<String>,

    #[serde(default, alias = "Branch")]
    pub branch: Option<String>,

    #[serde(default, alias = "hieraSearchKey", alias = "HieraSearchKey")]
    pub hierasearchkey: Option<String>,
}

async fn hiera_search_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HieraSearchParams>,
) -> Response {
    let query = match HieraQuery::new(
        params.environment.unwrap_or_default(),
        params.branch.unwrap_or_default(),
        params.hierasearchkey.unwrap_or_default(),
    ) {
        Ok(query) => query,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    tracing::info!(
        "Search request: Environment={}, Branch={}, HieraSearchKey={}",
        query.environment(),
        query.puppet_environment(),
        query.search_key()
    );

    match state.search_service.search(&query).await {
        Ok(value) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            value.to_envelope(),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "uptime_seconds": state.start_time.elapsed().as_secs(),
    }))
}

impl IntoResponse for HieraSearchError {
    fn into_response(self) -> Response {
        let status = if self.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, self.to_string()).into_response()
    }
}
