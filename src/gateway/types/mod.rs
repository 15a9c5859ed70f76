//! Gateway types module
//!
//! ## Input Types
//! - [`TransferRequestBody`]: `POST /api/transfers` body
//! - [`ValidatedTransfer`]: Axum extractor running JSON parsing and validation
//!
//! ## Output Types
//! - [`ApiResponse<T>`]: `{success, data | error, errors, count}` envelope
//! - [`ApiError`]: handler error rendered as a failure envelope

pub mod request;
pub mod response;

pub use request::{TransferRequestBody, ValidatedTransfer};
pub use response::{
    ApiError, ApiResponse, GENERIC_TRANSFER_ERROR, HealthResponse, HistoryEntry,
    TIMESTAMP_FORMAT, TransactionData, TransactionDetail, format_timestamp,
};
