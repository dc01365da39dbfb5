//! Lookup/status HTTP API.
//!
//! Every store call runs on the blocking pool; handlers only shape responses.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use phonemap_core::import::ImportStatus;
use phonemap_core::{LookupService, StoreError};
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub lookup: LookupService,
    pub status: Arc<ImportStatus>,
}

type Reply = (StatusCode, Json<Value>);

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/lookup/real/:fake", get(lookup_real))
        .route("/lookup/fake/:real", get(lookup_fake))
        .route("/mappings", get(mappings))
        .with_state(state)
}

async fn on_store<T, F>(lookup: &LookupService, op: F) -> Result<T, String>
where
    T: Send + 'static,
    F: FnOnce(LookupService) -> Result<T, StoreError> + Send + 'static,
{
    let lookup = lookup.clone();
    match tokio::task::spawn_blocking(move || op(lookup)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(e.to_string()),
        Err(e) => Err(format!("store task failed: {e}")),
    }
}

fn internal_error(error: String) -> Reply {
    tracing::error!(error = %error, "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "success": false, "error": error })),
    )
}

fn not_found() -> Reply {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "error": "number not found" })),
    )
}

async fn status(State(state): State<AppState>) -> Reply {
    let body = match state.status.snapshot() {
        None => json!({ "status": "idle" }),
        Some(last_run) => json!({ "status": "ok", "last_run": last_run }),
    };
    (StatusCode::OK, Json(body))
}

async fn lookup_real(State(state): State<AppState>, Path(fake): Path<String>) -> Reply {
    match on_store(&state.lookup, move |l| l.resolve_real(&fake)).await {
        Ok(Some(real_phone)) => (
            StatusCode::OK,
            Json(json!({ "success": true, "real_phone": real_phone })),
        ),
        Ok(None) => not_found(),
        Err(error) => internal_error(error),
    }
}

async fn lookup_fake(State(state): State<AppState>, Path(real): Path<String>) -> Reply {
    match on_store(&state.lookup, move |l| l.resolve_fake(&real)).await {
        Ok(Some(fake_phone)) => (
            StatusCode::OK,
            Json(json!({ "success": true, "fake_phone": fake_phone })),
        ),
        Ok(None) => not_found(),
        Err(error) => internal_error(error),
    }
}

async fn mappings(State(state): State<AppState>) -> Reply {
    match on_store(&state.lookup, |l| l.store().list_all()).await {
        Ok(mappings) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "count": mappings.len(),
                "mappings": mappings,
            })),
        ),
        Err(error) => internal_error(error),
    }
}
