//! Test suite and test case endpoints
//!
//! Cases are nested under their suite; every case route re-checks the
//! suite scope so a case can never be read or written through the wrong
//! suite id.

use crate::error::ApiResult;
use crate::server::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use stepwright_common::{Error, TestCase, TestSuite};

pub fn suites_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/test-suites",
            get(list_suites_handler).post(create_suite_handler),
        )
        .route(
            "/api/test-suites/:id",
            get(get_suite_handler)
                .put(update_suite_handler)
                .delete(delete_suite_handler),
        )
        .route(
            "/api/test-suites/:id/test-cases",
            get(list_cases_handler).post(create_case_handler),
        )
        .route(
            "/api/test-suites/:id/test-cases/:case_id",
            get(get_case_handler)
                .put(update_case_handler)
                .delete(delete_case_handler),
        )
}

#[derive(Debug, Clone, Deserialize)]
struct SuiteRequest {
    name: String,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct CaseRequest {
    name: String,
    description: Option<String>,
}

fn require_name(name: &str, what: &str) -> ApiResult<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidPayload(format!("{} name must not be empty", what)).into());
    }
    Ok(())
}

async fn list_suites_handler(State(state): State<AppState>) -> ApiResult<Json<Vec<TestSuite>>> {
    Ok(Json(state.db.list_suites()?))
}

async fn create_suite_handler(
    State(state): State<AppState>,
    Json(req): Json<SuiteRequest>,
) -> ApiResult<impl IntoResponse> {
    require_name(&req.name, "test suite")?;
    let suite = state.db.create_suite(&req.name, req.description.as_deref())?;
    Ok((StatusCode::CREATED, Json(suite)))
}

async fn get_suite_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<TestSuite>> {
    let suite = state.db.get_suite(id)?.ok_or(Error::NotFound {
        kind: "test suite",
        id,
    })?;
    Ok(Json(suite))
}

async fn update_suite_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<SuiteRequest>,
) -> ApiResult<Json<TestSuite>> {
    require_name(&req.name, "test suite")?;
    let suite = state
        .db
        .update_suite(id, &req.name, req.description.as_deref())?
        .ok_or(Error::NotFound {
            kind: "test suite",
            id,
        })?;
    Ok(Json(suite))
}

async fn delete_suite_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if state.db.delete_suite(id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound {
            kind: "test suite",
            id,
        }
        .into())
    }
}

async fn list_cases_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<TestCase>>> {
    if state.db.get_suite(id)?.is_none() {
        return Err(Error::NotFound {
            kind: "test suite",
            id,
        }
        .into());
    }
    Ok(Json(state.db.list_cases(id)?))
}

async fn create_case_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<CaseRequest>,
) -> ApiResult<impl IntoResponse> {
    require_name(&req.name, "test case")?;
    let case = state
        .db
        .create_case(id, &req.name, req.description.as_deref())?;
    Ok((StatusCode::CREATED, Json(case)))
}

async fn get_case_handler(
    State(state): State<AppState>,
    Path((id, case_id)): Path<(i64, i64)>,
) -> ApiResult<Json<TestCase>> {
    let case = state
        .db
        .get_case_in_suite(id, case_id)?
        .ok_or(Error::TestCaseNotFound { id: case_id })?;
    Ok(Json(case))
}

async fn update_case_handler(
    State(state): State<AppState>,
    Path((id, case_id)): Path<(i64, i64)>,
    Json(req): Json<CaseRequest>,
) -> ApiResult<Json<TestCase>> {
    require_name(&req.name, "test case")?;
    let case = state
        .db
        .update_case(id, case_id, &req.name, req.description.as_deref())?
        .ok_or(Error::TestCaseNotFound { id: case_id })?;
    Ok(Json(case))
}

async fn delete_case_handler(
    State(state): State<AppState>,
    Path((id, case_id)): Path<(i64, i64)>,
) -> ApiResult<StatusCode> {
    if state.db.delete_case(id, case_id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::TestCaseNotFound { id: case_id }.into())
    }
}
