//! Test step endpoints
//!
//! Step create and update run the payload through the action catalog before
//! anything touches the store, so a step that names an unknown action or
//! omits a required field is rejected with 400 instead of being persisted.
//! Reordering goes through the step sequencer; handlers here only parse the
//! payload and translate the outcome.

use crate::error::ApiResult;
use crate::server::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use serde_json::json;
use stepwright_common::sequencer::parse_reorder_payload;
use stepwright_common::{Error, NewStep, StepDetails, StepPatch, TestStep};

pub fn steps_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/test-cases/:id/steps",
            get(list_steps_handler).post(create_step_handler),
        )
        .route("/api/test-cases/:id/steps/reorder", put(reorder_steps_handler))
        .route(
            "/api/test-cases/:id/steps/:step_id",
            get(get_step_handler)
                .put(update_step_handler)
                .delete(delete_step_handler),
        )
        .route(
            "/api/test-suites/:suite_id/test-cases/:case_id/steps/reorder",
            put(reorder_steps_in_suite_handler),
        )
}

async fn list_steps_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<StepDetails>>> {
    if state.db.get_case(id)?.is_none() {
        return Err(Error::TestCaseNotFound { id }.into());
    }
    Ok(Json(state.db.list_steps(id)?))
}

async fn create_step_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<NewStep>,
) -> ApiResult<impl IntoResponse> {
    state.catalog.validate_step(
        &req.action,
        req.selector_id.is_some(),
        req.input_value.is_some(),
        req.assertion_value.is_some(),
    )?;
    let step = state.db.create_step(id, &req)?;
    Ok((StatusCode::CREATED, Json(step)))
}

async fn get_step_handler(
    State(state): State<AppState>,
    Path((id, step_id)): Path<(i64, i64)>,
) -> ApiResult<Json<TestStep>> {
    let step = state
        .db
        .get_step(id, step_id)?
        .ok_or(Error::StepNotFound {
            id: step_id,
            test_case_id: id,
        })?;
    Ok(Json(step))
}

async fn update_step_handler(
    State(state): State<AppState>,
    Path((id, step_id)): Path<(i64, i64)>,
    Json(req): Json<StepPatch>,
) -> ApiResult<Json<TestStep>> {
    state.catalog.validate_step(
        &req.action,
        req.selector_id.is_some(),
        req.input_value.is_some(),
        req.assertion_value.is_some(),
    )?;
    let step = state
        .db
        .update_step(id, step_id, &req)?
        .ok_or(Error::StepNotFound {
            id: step_id,
            test_case_id: id,
        })?;
    Ok(Json(step))
}

async fn delete_step_handler(
    State(state): State<AppState>,
    Path((id, step_id)): Path<(i64, i64)>,
) -> ApiResult<StatusCode> {
    if state.db.delete_step(id, step_id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::StepNotFound {
            id: step_id,
            test_case_id: id,
        }
        .into())
    }
}

/// Atomically apply a proposed ordering to the steps of a case.
async fn reorder_steps_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<serde_json::Value>,
) -> ApiResult<Json<serde_json::Value>> {
    let proposed = parse_reorder_payload(&payload)?;
    state.sequencer.reorder(id, &proposed)?;
    Ok(Json(json!({ "message": "step order updated" })))
}

/// Suite-scoped variant: additionally verifies the case belongs to the
/// suite named in the path before any step is touched.
async fn reorder_steps_in_suite_handler(
    State(state): State<AppState>,
    Path((suite_id, case_id)): Path<(i64, i64)>,
    Json(payload): Json<serde_json::Value>,
) -> ApiResult<Json<serde_json::Value>> {
    let proposed = parse_reorder_payload(&payload)?;
    state.sequencer.reorder_in_suite(suite_id, case_id, &proposed)?;
    Ok(Json(json!({ "message": "step order updated" })))
}
