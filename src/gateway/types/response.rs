//! API response envelope and DTOs
//!
//! Success: `{success: true, data, count?}`
//! Failure: `{success: false, error, errors?}`

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::money;
use crate::transfer::{Transaction, TransferError};

/// Rendering of every timestamp in responses (UTC)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Message returned for any failure whose detail stays in the logs
pub const GENERIC_TRANSFER_ERROR: &str = "An error occurred while processing the transfer";

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

// ============================================================================
// Envelope
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            errors: None,
            count: None,
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// Success with `count` set to the number of items
    pub fn list(data: Vec<T>) -> Self {
        let count = data.len();
        Self {
            count: Some(count),
            ..Self::success(data)
        }
    }
}

impl ApiResponse<()> {
    pub fn failure(error: impl Into<String>, errors: Option<BTreeMap<String, String>>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            errors,
            count: None,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Handler error rendered as a failure envelope
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub errors: Option<BTreeMap<String, String>>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            errors: None,
        }
    }

    /// 400 `Validation failed` with per-field messages
    pub fn validation(errors: BTreeMap<String, String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: "Validation failed".to_string(),
            errors: Some(errors),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<TransferError> for ApiError {
    fn from(e: TransferError) -> Self {
        let status =
            StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(code = e.code(), retryable = e.is_retryable(), "Transfer error: {}", e);
            return Self::new(status, GENERIC_TRANSFER_ERROR);
        }
        Self::new(status, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ApiResponse::<()>::failure(self.message, self.errors)),
        )
            .into_response()
    }
}

// ============================================================================
// Response DTOs
// ============================================================================

/// Transfer outcome returned by `POST /api/transfers`
#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionData {
    #[schema(example = "5f0c7c8e-3b1a-4a53-9d0e-2c6f7e8a9b10")]
    pub transaction_id: String,
    #[schema(example = "ACC1000000001")]
    pub from_account: String,
    #[schema(example = "ACC1000000002")]
    pub to_account: String,
    #[schema(example = "100.50")]
    pub amount: String,
    #[schema(example = "INR")]
    pub currency: String,
    #[schema(example = "completed")]
    pub status: String,
    pub description: Option<String>,
    #[schema(example = "2025-02-11 10:15:00")]
    pub created_at: String,
    pub completed_at: Option<String>,
}

impl From<&Transaction> for TransactionData {
    fn from(tx: &Transaction) -> Self {
        Self {
            transaction_id: tx.transaction_id.to_string(),
            from_account: tx.from_account.clone(),
            to_account: tx.to_account.clone(),
            amount: money::format_amount(tx.amount),
            currency: tx.currency.clone(),
            status: tx.status.as_str().to_string(),
            description: tx.description.clone(),
            created_at: format_timestamp(&tx.created_at),
            completed_at: tx.completed_at.as_ref().map(format_timestamp),
        }
    }
}

/// Stored transaction returned by `GET /api/transfers/{transaction_id}`
#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionDetail {
    pub transaction_id: String,
    pub from_account: String,
    pub to_account: String,
    pub amount: String,
    pub currency: String,
    pub status: String,
    pub description: Option<String>,
    /// Present only for failed transactions
    pub failure_reason: Option<String>,
    pub created_at: String,
    pub completed_at: Option<String>,
}

impl From<&Transaction> for TransactionDetail {
    fn from(tx: &Transaction) -> Self {
        let data = TransactionData::from(tx);
        Self {
            transaction_id: data.transaction_id,
            from_account: data.from_account,
            to_account: data.to_account,
            amount: data.amount,
            currency: data.currency,
            status: data.status,
            description: data.description,
            failure_reason: tx.failure_reason.clone(),
            created_at: data.created_at,
            completed_at: data.completed_at,
        }
    }
}

/// One entry of an account's history
#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryEntry {
    pub transaction_id: String,
    /// `debit` when the account sent the money, `credit` otherwise
    #[serde(rename = "type")]
    #[schema(example = "debit")]
    pub kind: String,
    pub from_account: String,
    pub to_account: String,
    pub amount: String,
    pub currency: String,
    pub status: String,
    pub description: Option<String>,
    pub created_at: String,
}

impl HistoryEntry {
    pub fn for_account(tx: &Transaction, account_number: &str) -> Self {
        Self {
            transaction_id: tx.transaction_id.to_string(),
            kind: tx.direction_for(account_number).as_str().to_string(),
            from_account: tx.from_account.clone(),
            to_account: tx.to_account.clone(),
            amount: money::format_amount(tx.amount),
            currency: tx.currency.clone(),
            status: tx.status.as_str().to_string(),
            description: tx.description.clone(),
            created_at: format_timestamp(&tx.created_at),
        }
    }
}

/// Health check body (not wrapped in the envelope)
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: String,
    #[schema(example = "2025-02-11 10:15:00")]
    pub timestamp: String,
}
