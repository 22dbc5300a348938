//! Small orders API used as the service under test

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::routing::{get, post};
use axum::{Json, Router};
use backstop_classify::{ApiException, ClientDataValidationError, ConstraintViolation, DownstreamError};
use backstop_engine::ErrorResolver;
use backstop_engine::http::{Failure, IntoFrameworkError, IntoFrameworkErrorWith, resolve_errors};
use serde::Deserialize;

/// Order id that is always locked
pub const LOCKED_ORDER: u32 = 13;

#[derive(Clone)]
struct AppState {
    resolver: Arc<ErrorResolver>,
    client: reqwest::Client,
    inventory_url: String,
}

#[derive(Debug, Deserialize)]
struct NewOrder {
    count: i64,
    #[serde(default)]
    sku: String,
}

#[derive(Debug, Deserialize)]
struct Search {
    limit: u32,
}

/// Router with every handler behind the error resolution middleware
pub fn router(resolver: Arc<ErrorResolver>, inventory_url: String) -> Router {
    let state = AppState {
        resolver: Arc::clone(&resolver),
        client: reqwest::Client::new(),
        inventory_url,
    };

    Router::new()
        .route("/orders/{id}", get(get_order))
        .route("/orders", post(create_order))
        .route("/search", get(search))
        .route("/inventory/{status}", get(inventory))
        .route("/boom", get(boom))
        .with_state(state)
        .layer(axum::middleware::from_fn_with_state(resolver, resolve_errors))
}

async fn get_order(State(state): State<AppState>, id: Result<Path<u32>, PathRejection>) -> Result<String, Failure> {
    let Path(id) = id.map_err(IntoFrameworkError::into_framework_error)?;

    if id == LOCKED_ORDER {
        let locked = state
            .resolver
            .catalog()
            .convert_to_api_error("ORDER_LOCKED")
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("ORDER_LOCKED missing from catalog"))?;
        return Err(ApiException::builder()
            .error(locked)
            .log_detail("order_id", id.to_string())
            .build()
            .into());
    }

    Ok(format!("order {id}"))
}

async fn create_order(
    headers: HeaderMap,
    body: Result<Json<NewOrder>, JsonRejection>,
) -> Result<StatusCode, Failure> {
    let Json(order) = body.map_err(|rejection| rejection.into_framework_error_with(&headers))?;

    let mut violations = Vec::new();
    if order.count <= 0 {
        violations.push(ConstraintViolation::new("count", "Positive", "INVALID_COUNT_VALUE"));
    }
    if order.sku.trim().is_empty() {
        violations.push(ConstraintViolation::new("sku", "NotBlank", "SKU_REQUIRED"));
    }
    if !violations.is_empty() {
        return Err(ClientDataValidationError::for_object::<NewOrder>(violations).into());
    }

    Ok(StatusCode::CREATED)
}

async fn search(uri: Uri, query: Result<Query<Search>, QueryRejection>) -> Result<String, Failure> {
    let Query(search) = query.map_err(|rejection| rejection.into_framework_error_with(&uri))?;
    Ok(format!("limit {}", search.limit))
}

/// Proxies to the inventory service, which answers with the requested status
async fn inventory(State(state): State<AppState>, Path(status): Path<u16>) -> Result<String, Failure> {
    let url = format!("{}/status/{status}", state.inventory_url);
    let response = state
        .client
        .get(url)
        .send()
        .await
        .map_err(|e| DownstreamError::from_reqwest("inventory", e))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| DownstreamError::from_reqwest("inventory", e))?;
    if !status.is_success() {
        return Err(DownstreamError::http_status("inventory", status.as_u16(), Some(body)).into());
    }

    Ok(body)
}

async fn boom() -> Result<String, Failure> {
    Err(anyhow::anyhow!("database password=hunter2 rejected").into())
}
