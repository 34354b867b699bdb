//! Test script generation endpoint
//!
//! Compiles the ordered steps of a case into Playwright TypeScript source.
//! Compilation itself never fails; steps the compiler cannot render are
//! skipped and reported alongside the code.

use crate::error::{ApiError, ApiResult};
use crate::server::AppState;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde_json::json;
use stepwright_common::{compile, Error};

pub fn generate_routes() -> Router<AppState> {
    Router::new().route("/api/test-cases/:id/generate", get(generate_script_handler))
}

async fn generate_script_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    let case = state
        .db
        .get_case(id)?
        .ok_or(Error::TestCaseNotFound { id })?;
    let steps = state.db.list_steps(id)?;
    if steps.is_empty() {
        return Err(ApiError::NotFound(format!(
            "test case {} has no steps to generate from",
            id
        )));
    }

    let script = compile(&case, &steps, &state.catalog);
    Ok(Json(json!({
        "code": script.code,
        "skipped": script.skipped,
    })))
}
