use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::error;

use crate::models::{NewPayment, PaymentFilter, PaymentStatus};
use crate::services::PaymentService;

/// Minimal structural email check, enough for an emulator: a single `@`
/// with non-empty sides and no whitespace.
fn is_email(address: &str) -> bool {
    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && !address.chars().any(char::is_whitespace)
}

fn internal_error(op: &str, err: impl std::fmt::Display) -> StatusCode {
    error!(error = %err, "{op} failed");
    StatusCode::INTERNAL_SERVER_ERROR
}

pub async fn create_payment(
    State(service): State<Arc<PaymentService>>,
    Json(input): Json<NewPayment>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    if !is_email(&input.user_email) {
        return Err(StatusCode::BAD_REQUEST);
    }

    match service.create_payment(&input).await {
        Ok(id) => Ok((StatusCode::CREATED, Json(json!({ "id": id })))),
        Err(err) => Err(internal_error("create payment", err)),
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: String,
}

pub async fn update_status(
    State(service): State<Arc<PaymentService>>,
    Path(id): Path<i64>,
    Json(body): Json<StatusBody>,
) -> Result<StatusCode, StatusCode> {
    let status: PaymentStatus = body
        .status
        .parse()
        .map_err(|_| StatusCode::BAD_REQUEST)?;

    match service.update_status(id, status).await {
        Ok(()) => Ok(StatusCode::OK),
        Err(err) => Err(internal_error("update status", err)),
    }
}

pub async fn get_status(
    State(service): State<Arc<PaymentService>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, StatusCode> {
    match service.get_status(id).await {
        Ok(status) => Ok(Json(json!({ "status": status }))),
        Err(err) => Err(internal_error("get status", err)),
    }
}

pub async fn get_payments_by_user(
    State(service): State<Arc<PaymentService>>,
    Path(user_id): Path<i64>,
) -> Result<Json<Value>, StatusCode> {
    list_payments(&service, PaymentFilter::ByUser(user_id)).await
}

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

pub async fn get_payments_by_email(
    State(service): State<Arc<PaymentService>>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<Value>, StatusCode> {
    let email = query.email.filter(|email| is_email(email));
    // A missing or malformed email is an ambiguous filter, rejected here
    // at the boundary rather than guessed at in the store.
    let filter =
        PaymentFilter::from_parts(None, email).map_err(|_| StatusCode::BAD_REQUEST)?;

    list_payments(&service, filter).await
}

async fn list_payments(
    service: &PaymentService,
    filter: PaymentFilter,
) -> Result<Json<Value>, StatusCode> {
    match service.get_payments(&filter).await {
        Ok(payments) => Ok(Json(json!({ "data": payments }))),
        Err(err) => Err(internal_error("get payments", err)),
    }
}

pub async fn cancel_payment(
    State(service): State<Arc<PaymentService>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, StatusCode> {
    match service.cancel_payment(id).await {
        Ok(()) => Ok(StatusCode::OK),
        Err(err) => Err(internal_error("cancel payment", err)),
    }
}
