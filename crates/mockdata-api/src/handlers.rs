//! REST API handlers.
//!
//! Each handler calls into `DataStore` and returns JSON responses. Store
//! failures map to status codes in [`status_for`].

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::Value;
use tracing::{debug, warn};

use mockdata_store::{PathView, StoreError};

use crate::ApiState;

/// Body of `GET /status`.
#[derive(serde::Serialize)]
struct StatusResponse {
    time: String,
    err: String,
}

/// Response wrapper for record operations.
#[derive(serde::Serialize)]
struct DataResponse {
    path: String,
    data: Value,
    err: String,
}

impl DataResponse {
    fn ok(path: impl Into<String>, data: Value) -> Json<Self> {
        Json(Self {
            path: path.into(),
            data,
            err: String::new(),
        })
    }
}

/// Body of `POST /data/:id`.
#[derive(serde::Deserialize)]
struct DataRequest {
    #[serde(default)]
    data: Option<Value>,
}

/// Status code for a store failure.
pub fn status_for(err: &StoreError) -> StatusCode {
    match err {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::MalformedData(_) => StatusCode::UNPROCESSABLE_ENTITY,
        StoreError::OperationFailed(_) => StatusCode::EXPECTATION_FAILED,
        StoreError::Serialize(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: &StoreError) -> axum::response::Response {
    (
        status_for(err),
        Json(serde_json::json!({ "error": err.to_string() })),
    )
        .into_response()
}

/// Parse a pagination segment, clamping negatives to zero.
fn parse_page_param(raw: &str) -> Option<usize> {
    let n: i64 = raw.trim().parse().ok()?;
    Some(usize::try_from(n.max(0)).unwrap_or(usize::MAX))
}

// ── Status ─────────────────────────────────────────────────────

/// GET /status
pub async fn status(State(state): State<ApiState>) -> impl IntoResponse {
    Json(StatusResponse {
        time: state.store.status(),
        err: String::new(),
    })
}

// ── Records ────────────────────────────────────────────────────

/// GET /data/:id
pub async fn get_data(State(state): State<ApiState>, Path(id): Path<String>) -> impl IntoResponse {
    match state.store.get(&id) {
        Ok(data) => DataResponse::ok(id, data).into_response(),
        Err(e) => error_response(&e),
    }
}

/// POST /data/:id
pub async fn post_data(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    body: Bytes,
) -> impl IntoResponse {
    let data = match serde_json::from_slice::<DataRequest>(&body) {
        Ok(DataRequest { data: Some(data) }) => data,
        Ok(DataRequest { data: None }) => {
            return error_response(&StoreError::MalformedData("missing data field".into()));
        }
        Err(e) => return error_response(&StoreError::MalformedData(e.to_string())),
    };

    match state.store.put(&id, &data) {
        Ok(stored) => DataResponse::ok(id, stored).into_response(),
        Err(e) => error_response(&e),
    }
}

/// DELETE /data/:id
pub async fn delete_data(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.delete(&id) {
        Ok(()) => DataResponse::ok(id, Value::Null).into_response(),
        Err(e) => {
            warn!(%id, error = %e, "delete did not take effect");
            error_response(&e)
        }
    }
}

/// GET /all/:offset/:limit
///
/// An unparsable offset falls back to zero; an unparsable limit is rejected.
pub async fn list_all(
    State(state): State<ApiState>,
    Path((offset, limit)): Path<(String, String)>,
) -> impl IntoResponse {
    let offset = parse_page_param(&offset).unwrap_or(0);
    let Some(limit) = parse_page_param(&limit) else {
        return error_response(&StoreError::MalformedData(format!("invalid limit '{limit}'")));
    };

    let records = state.store.list_all(offset, limit);
    DataResponse::ok("", Value::Array(records)).into_response()
}

// ── Index paths ────────────────────────────────────────────────

/// GET /ccapi/v1/cardData?<key>
///
/// The raw query string is the index key. Unresolvable keys answer with an
/// empty page rather than an error.
pub async fn get_path(State(state): State<ApiState>, RawQuery(query): RawQuery) -> impl IntoResponse {
    let key = query.unwrap_or_default();
    match state.store.get_by_path(&key) {
        Ok(view) => Json(view),
        Err(e) => {
            debug!(%key, error = %e, "serving empty page");
            Json(PathView::empty())
        }
    }
}
