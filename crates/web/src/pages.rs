//! Page and selector endpoints
//!
//! Pages model the screens of the application under test; selectors are the
//! named element locators attached to them. `GET /api/pages/:id/generate`
//! renders the Playwright page-object module for a page.

use crate::error::ApiResult;
use crate::server::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use stepwright_common::{pageobject, Error, Page, Selector, SelectorKind};

pub fn pages_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/pages",
            get(list_pages_handler).post(create_page_handler),
        )
        .route(
            "/api/pages/:id",
            get(get_page_handler)
                .put(update_page_handler)
                .delete(delete_page_handler),
        )
        .route(
            "/api/pages/:id/selectors",
            get(list_selectors_handler).post(create_selector_handler),
        )
        .route(
            "/api/pages/:id/selectors/:selector_id",
            put(update_selector_handler).delete(delete_selector_handler),
        )
        .route("/api/pages/:id/generate", get(generate_page_object_handler))
}

#[derive(Debug, Clone, Deserialize)]
struct PageRequest {
    name: String,
    url_pattern: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SelectorRequest {
    name: String,
    #[serde(default)]
    kind: SelectorKind,
    value: String,
    description: Option<String>,
}

fn require_name(name: &str, what: &str) -> ApiResult<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidPayload(format!("{} name must not be empty", what)).into());
    }
    Ok(())
}

async fn list_pages_handler(State(state): State<AppState>) -> ApiResult<Json<Vec<Page>>> {
    Ok(Json(state.db.list_pages()?))
}

async fn create_page_handler(
    State(state): State<AppState>,
    Json(req): Json<PageRequest>,
) -> ApiResult<impl IntoResponse> {
    require_name(&req.name, "page")?;
    let page = state.db.create_page(
        &req.name,
        req.url_pattern.as_deref(),
        req.description.as_deref(),
    )?;
    Ok((StatusCode::CREATED, Json(page)))
}

async fn get_page_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Page>> {
    let page = state
        .db
        .get_page(id)?
        .ok_or(Error::NotFound { kind: "page", id })?;
    Ok(Json(page))
}

async fn update_page_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<PageRequest>,
) -> ApiResult<Json<Page>> {
    require_name(&req.name, "page")?;
    let page = state
        .db
        .update_page(
            id,
            &req.name,
            req.url_pattern.as_deref(),
            req.description.as_deref(),
        )?
        .ok_or(Error::NotFound { kind: "page", id })?;
    Ok(Json(page))
}

async fn delete_page_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if state.db.delete_page(id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound { kind: "page", id }.into())
    }
}

async fn list_selectors_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<Selector>>> {
    if state.db.get_page(id)?.is_none() {
        return Err(Error::NotFound { kind: "page", id }.into());
    }
    Ok(Json(state.db.list_selectors(id)?))
}

async fn create_selector_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<SelectorRequest>,
) -> ApiResult<impl IntoResponse> {
    require_name(&req.name, "selector")?;
    if req.value.trim().is_empty() {
        return Err(Error::InvalidPayload("selector value must not be empty".to_string()).into());
    }
    let selector = state.db.create_selector(
        id,
        &req.name,
        req.kind,
        &req.value,
        req.description.as_deref(),
    )?;
    Ok((StatusCode::CREATED, Json(selector)))
}

async fn update_selector_handler(
    State(state): State<AppState>,
    Path((id, selector_id)): Path<(i64, i64)>,
    Json(req): Json<SelectorRequest>,
) -> ApiResult<Json<Selector>> {
    require_name(&req.name, "selector")?;
    if req.value.trim().is_empty() {
        return Err(Error::InvalidPayload("selector value must not be empty".to_string()).into());
    }
    let selector = state
        .db
        .update_selector(
            id,
            selector_id,
            &req.name,
            req.kind,
            &req.value,
            req.description.as_deref(),
        )?
        .ok_or(Error::NotFound {
            kind: "selector",
            id: selector_id,
        })?;
    Ok(Json(selector))
}

async fn delete_selector_handler(
    State(state): State<AppState>,
    Path((id, selector_id)): Path<(i64, i64)>,
) -> ApiResult<StatusCode> {
    if state.db.delete_selector(id, selector_id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound {
            kind: "selector",
            id: selector_id,
        }
        .into())
    }
}

/// Render the page-object module for a page and its selectors.
async fn generate_page_object_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    let page = state
        .db
        .get_page(id)?
        .ok_or(Error::NotFound { kind: "page", id })?;
    let selectors = state.db.list_selectors(id)?;
    let code = pageobject::generate_page_object(&page, &selectors);
    Ok(Json(json!({ "code": code })))
}
