//! Axum routes for the stock query service.

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::canonical::ledger_fingerprint;
use crate::query::{all_in_stock, in_stock_for};
use crate::store::StoreError;
use crate::types::{LatestObservations, Snapshot, Source, UnknownSource};

use super::state::ServiceState;

/// Message returned for any failure the caller cannot act on.
pub const GENERIC_FAILURE: &str = "Something went wrong, please try again later.";

// ============================================================================
// Request/Response Types
// ============================================================================

/// In-stock items across all sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockResponse {
    /// Fingerprint of the ledger the answer was read from.
    pub ledger_fingerprint: String,
    /// In-stock items keyed by source, then item id.
    pub sources: LatestObservations,
}

/// In-stock items for a single source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceStockResponse {
    /// The source queried.
    pub source: Source,
    /// Fingerprint of the ledger the answer was read from.
    pub ledger_fingerprint: String,
    /// In-stock items in item id order.
    pub items: Vec<Snapshot>,
}

/// Service health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Sources recorded in the ledger.
    pub sources: usize,
    /// Items recorded in the ledger.
    pub items: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_fingerprint: Option<String>,
}

/// Error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// Machine-readable error code.
    pub code: String,
}

/// Errors surfaced by the query API.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Path named a source that is not monitored.
    #[error(transparent)]
    UnknownSource(#[from] UnknownSource),
    /// Ledger could not be read.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ServiceError::UnknownSource(e) => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: e.to_string(),
                    code: "UNKNOWN_SOURCE".to_string(),
                },
            ),
            ServiceError::Store(e) => {
                tracing::error!(error = %e, "Query failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: GENERIC_FAILURE.to_string(),
                        code: "INTERNAL".to_string(),
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// In-stock items for every source with any.
async fn all_stock_handler(
    State(state): State<Arc<ServiceState>>,
) -> Result<Json<StockResponse>, ServiceError> {
    let ledger = state.query.ledger().await?;
    Ok(Json(StockResponse {
        ledger_fingerprint: ledger_fingerprint(&ledger),
        sources: all_in_stock(&ledger),
    }))
}

/// In-stock items for one source.
async fn source_stock_handler(
    State(state): State<Arc<ServiceState>>,
    Path(source): Path<String>,
) -> Result<Json<SourceStockResponse>, ServiceError> {
    let source: Source = source.parse()?;
    let ledger = state.query.ledger().await?;
    Ok(Json(SourceStockResponse {
        source,
        ledger_fingerprint: ledger_fingerprint(&ledger),
        items: in_stock_for(&ledger, source).into_values().collect(),
    }))
}

/// Health check.
///
/// Reports `degraded` when the ledger cannot be read.
async fn health_handler(State(state): State<Arc<ServiceState>>) -> Json<HealthResponse> {
    let version = env!("CARGO_PKG_VERSION").to_string();
    match state.query.ledger().await {
        Ok(ledger) => Json(HealthResponse {
            status: "healthy".to_string(),
            version,
            sources: ledger.num_sources(),
            items: ledger.num_items(),
            ledger_fingerprint: Some(ledger_fingerprint(&ledger)),
        }),
        Err(e) => {
            tracing::warn!(error = %e, "Ledger unreadable during health check");
            Json(HealthResponse {
                status: "degraded".to_string(),
                version,
                sources: 0,
                items: 0,
                ledger_fingerprint: None,
            })
        }
    }
}

// ============================================================================
// Router Construction
// ============================================================================

/// Create the Axum router for the query service.
pub fn create_router(state: ServiceState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/api/stock", get(all_stock_handler))
        .route("/api/stock/:source", get(source_stock_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}
