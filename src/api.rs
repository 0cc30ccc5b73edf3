// src/api.rs
use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::query::{self, PageParams, QueryError};
use crate::scrape::types::{Market, Source};
use crate::store::SnapshotStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SnapshotStore>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/event-calendar", get(event_calendar))
        .route("/announcements", get(announcements))
        .route("/crd", get(crd))
        .route("/credit-rating", get(credit_rating))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn event_calendar(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    data_response(&state.store, Source::EventCalendar, &q)
}

async fn announcements(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    data_response(&state.store, Source::Announcements, &q)
}

async fn crd(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    data_response(&state.store, Source::Crd, &q)
}

async fn credit_rating(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    data_response(&state.store, Source::CreditRating, &q)
}

/// Shared handler body for the four data routes: resolve parameters, read the
/// current snapshot, page it, and shape the envelope.
fn data_response(
    store: &SnapshotStore,
    source: Source,
    q: &HashMap<String, String>,
) -> (StatusCode, Json<Value>) {
    let market = match query::resolve_market(source, q.get("market").map(String::as_str)) {
        Ok(m) => m,
        Err(e) => return error_response(&e),
    };
    let params = match PageParams::from_query(
        q.get("page").map(String::as_str),
        q.get("per_page").map(String::as_str),
    ) {
        Ok(p) => p,
        Err(e) => return error_response(&e),
    };

    let Some(snapshot) = store.get(source, market) else {
        return error_response(&QueryError::NotReady);
    };
    let page = query::paginate(&snapshot, &params);

    let body = json!({
        "success": true,
        "metadata": {
            "scrape_timestamp": snapshot.scraped_at.to_rfc3339(),
            "total_records": page.pagination.total_records,
            "market_type": market.map(Market::as_str).unwrap_or("none"),
        },
        "pagination": page.pagination,
        "data": page.records,
    });
    (StatusCode::OK, Json(body))
}

fn error_response(err: &QueryError) -> (StatusCode, Json<Value>) {
    let status = match err {
        QueryError::Validation(_) => StatusCode::BAD_REQUEST,
        QueryError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(json!({ "success": false, "error": err.to_string() })))
}

/// Liveness plus per-source readiness: a source counts ready once at least one
/// of its scrape units has a snapshot.
async fn health(State(state): State<AppState>) -> Json<Value> {
    let mut monitors = serde_json::Map::new();
    let mut ready = false;
    for source in Source::ALL {
        let ok = state.store.is_ready(source);
        ready |= ok;
        monitors.insert(source.key().to_string(), Value::Bool(ok));
    }
    Json(json!({ "status": "ok", "ready": ready, "monitors": monitors }))
}
