//! mockdata-api — REST API for mockd.
//!
//! Provides axum route handlers that map requests onto `DataStore`
//! operations and typed store failures onto status codes.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/status` | Server time |
//! | GET | `/data/:id` | Get a record |
//! | POST | `/data/:id` | Store a record (`{"data": ...}`) |
//! | DELETE | `/data/:id` | Delete a record |
//! | GET | `/all/:offset/:limit` | Page through all records |
//! | GET | `/ccapi/v1/cardData?<key>` | Resolve an index entry |

pub mod handlers;

use axum::Router;
use axum::routing::get;
use mockdata_store::DataStore;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: DataStore,
}

/// Build the complete API router.
pub fn build_router(store: DataStore) -> Router {
    let state = ApiState { store };

    Router::new()
        .route("/status", get(handlers::status))
        .route(
            "/data/{id}",
            get(handlers::get_data)
                .post(handlers::post_data)
                .delete(handlers::delete_data),
        )
        .route("/all/{offset}/{limit}", get(handlers::list_all))
        .route("/ccapi/v1/cardData", get(handlers::get_path))
        .with_state(state)
}
