//! # API Endpoint Handlers
//!
//! Handlers that reach the property store run on the blocking pool.

use super::{
    AppState,
    types::{
        CriticalQuery, CriticalResponse, CriticalUpdateRequest, CriticalUpdateResponse,
        FiltersResponse, HealthResponse, ResolveRequest, ResolveResponse, StatsResponse,
    },
};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sluice_core::{CollectingMessageHandler, CriticalContext, FilterCatalog, SluiceError};
use std::sync::Arc;

// =============================================================================
// HEALTH HANDLER
// =============================================================================

pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// FILTERS HANDLER
// =============================================================================

/// The filter catalog.
pub async fn filters_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(FiltersResponse::from_catalog(FilterCatalog::global())),
    )
}

// =============================================================================
// RESOLVE HANDLER
// =============================================================================

/// Resolve global, host and request scopes into one snapshot.
///
/// Unknown filter names are reported as warnings; the rest of the scope
/// still applies.
pub async fn resolve_handler(
    State(state): State<AppState>,
    Json(request): Json<ResolveRequest>,
) -> impl IntoResponse {
    let mut handler = CollectingMessageHandler::new();
    match state
        .engine
        .resolve(&request.host, request.scope.as_ref(), &mut handler)
    {
        Ok(options) => {
            let warnings = handler.texts();
            for warning in &warnings {
                tracing::warn!(host = %request.host, %warning, "Resolve diagnostic");
            }
            (
                StatusCode::OK,
                Json(ResolveResponse::success(request.host, &options, warnings)),
            )
        }
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(ResolveResponse::error(
                request.host,
                format!("Resolve failed: {}", e),
            )),
        ),
    }
}

// =============================================================================
// CRITICAL RESOURCE HANDLERS
// =============================================================================

/// Look up a page's critical sets the way a request would, counting the
/// lookup.
pub async fn critical_handler(
    State(state): State<AppState>,
    Query(query): Query<CriticalQuery>,
) -> impl IntoResponse {
    if let Err(e) = query.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(CriticalResponse::error(query.url, e.to_string())),
        );
    }

    let engine = Arc::clone(&state.engine);
    let url = query.url.clone();
    let lookup = tokio::task::spawn_blocking(move || {
        let mut handler = CollectingMessageHandler::new();
        let mut request = engine.request(&query.host, &query.url, &mut handler)?;
        let finder = engine.finder();
        let status = finder.cache_status(&mut request);
        let html = finder.critical_set(&mut request, CriticalContext::Html).clone();
        let css = finder.critical_set(&mut request, CriticalContext::Css).clone();
        Ok::<_, SluiceError>((status, html, css))
    })
    .await;

    match lookup {
        Ok(Ok((status, html, css))) => (
            StatusCode::OK,
            Json(CriticalResponse::success(url, status, &html, &css)),
        ),
        Ok(Err(e)) => (
            StatusCode::BAD_REQUEST,
            Json(CriticalResponse::error(url, format!("Lookup failed: {}", e))),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(CriticalResponse::error(url, format!("Lookup task failed: {}", e))),
        ),
    }
}

/// Store newly computed critical sets for a page.
pub async fn critical_update_handler(
    State(state): State<AppState>,
    Json(request): Json<CriticalUpdateRequest>,
) -> impl IntoResponse {
    let [html, css] = match request.to_sets() {
        Ok(sets) => sets,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(CriticalUpdateResponse::error(request.url, e.to_string())),
            );
        }
    };
    if html.is_none() && css.is_none() {
        return (
            StatusCode::BAD_REQUEST,
            Json(CriticalUpdateResponse::error(
                request.url,
                "at least one of html or css is required",
            )),
        );
    }

    let engine = Arc::clone(&state.engine);
    let url = request.url.clone();
    let updated =
        tokio::task::spawn_blocking(move || engine.update_critical(&request.url, html, css)).await;

    match updated {
        Ok(true) => (StatusCode::OK, Json(CriticalUpdateResponse::success(url))),
        Ok(false) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(CriticalUpdateResponse::error(
                url,
                "critical resources were not written",
            )),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(CriticalUpdateResponse::error(
                url,
                format!("Update task failed: {}", e),
            )),
        ),
    }
}

// =============================================================================
// STATS HANDLER
// =============================================================================

pub async fn stats_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(StatsResponse {
            counters: state.engine.statistics().snapshot(),
        }),
    )
}
