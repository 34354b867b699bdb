//! Action type endpoints
//!
//! The catalog is fixed in code and seeded into the store at startup, so
//! these routes are read-only.

use crate::error::{ApiError, ApiResult};
use crate::server::AppState;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use stepwright_common::ActionType;

pub fn actions_routes() -> Router<AppState> {
    Router::new()
        .route("/api/action-types", get(list_action_types_handler))
        .route("/api/action-types/:name", get(get_action_type_handler))
}

async fn list_action_types_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<ActionType>>> {
    Ok(Json(state.db.list_action_types()?))
}

async fn get_action_type_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<ActionType>> {
    let action = state
        .db
        .get_action_type(&name)?
        .ok_or_else(|| ApiError::NotFound(format!("action type '{}' not found", name)))?;
    Ok(Json(action))
}
