//! Transfer handlers

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use utoipa::IntoParams;

use super::super::state::AppState;
use super::super::types::{
    ApiError, ApiResponse, HistoryEntry, TransactionData, TransactionDetail, TransferRequestBody,
    ValidatedTransfer,
};

/// Execute a transfer between two accounts
///
/// POST /api/transfers
#[utoipa::path(
    post,
    path = "/api/transfers",
    request_body(content = TransferRequestBody, content_type = "application/json"),
    responses(
        (status = 201, description = "Transfer completed", body = TransactionData, content_type = "application/json"),
        (status = 400, description = "Validation failed or invalid transfer"),
        (status = 404, description = "Account not found"),
        (status = 422, description = "Insufficient funds"),
        (status = 500, description = "Transfer could not be processed")
    ),
    tag = "Transfer"
)]
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    ValidatedTransfer(req): ValidatedTransfer,
) -> Result<(StatusCode, Json<ApiResponse<TransactionData>>), ApiError> {
    let tx = state.engine.transfer(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(TransactionData::from(&tx))),
    ))
}

/// Transaction details
///
/// GET /api/transfers/{transaction_id}
#[utoipa::path(
    get,
    path = "/api/transfers/{transaction_id}",
    params(
        ("transaction_id" = String, Path, description = "Transaction UUID")
    ),
    responses(
        (status = 200, description = "Transaction found", body = TransactionDetail, content_type = "application/json"),
        (status = 404, description = "Transaction not found")
    ),
    tag = "Transfer"
)]
pub async fn get_transfer(
    State(state): State<Arc<AppState>>,
    Path(transaction_id): Path<String>,
) -> Result<Json<ApiResponse<TransactionDetail>>, ApiError> {
    let tx = state
        .query
        .get_transaction(&transaction_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Transaction not found"))?;

    Ok(Json(ApiResponse::success(TransactionDetail::from(&tx))))
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryParams {
    /// Page size, default 50, capped at 100
    pub limit: Option<String>,
}

impl HistoryParams {
    /// Non-numeric values fall back to the default
    fn limit(&self) -> Option<usize> {
        self.limit.as_deref().and_then(|s| s.trim().parse().ok())
    }
}

/// Account transaction history, newest first
///
/// GET /api/accounts/{account_number}/transfers
#[utoipa::path(
    get,
    path = "/api/accounts/{account_number}/transfers",
    params(
        ("account_number" = String, Path, description = "Account number"),
        HistoryParams
    ),
    responses(
        (status = 200, description = "Sent and received transactions", body = [HistoryEntry], content_type = "application/json")
    ),
    tag = "Account"
)]
pub async fn get_account_transfers(
    State(state): State<Arc<AppState>>,
    Path(account_number): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<ApiResponse<Vec<HistoryEntry>>>, ApiError> {
    let txs = state
        .query
        .get_account_transactions(&account_number, params.limit())
        .await?;

    let entries = txs
        .iter()
        .map(|tx| HistoryEntry::for_account(tx, &account_number))
        .collect();
    Ok(Json(ApiResponse::list(entries)))
}
