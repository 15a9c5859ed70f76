//! Transfer request body and its extractor
//!
//! `ValidatedTransfer` runs JSON parsing and field validation before the
//! handler is entered; any rejection is a 400 `Validation failed` envelope.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::borrow::Cow;
use std::collections::BTreeMap;
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use super::response::ApiError;
use crate::money::{self, MoneyError};
use crate::transfer::TransferRequest;

/// Body of `POST /api/transfers`
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequestBody {
    #[validate(
        required(message = "From account number is required"),
        length(min = 10, max = 50, message = "Account number must be between 10 and 50 characters")
    )]
    #[schema(example = "ACC1000000001")]
    pub from_account_number: Option<String>,

    #[validate(
        required(message = "To account number is required"),
        length(min = 10, max = 50, message = "Account number must be between 10 and 50 characters")
    )]
    #[schema(example = "ACC1000000002")]
    pub to_account_number: Option<String>,

    /// Decimal string with at most two fractional digits
    #[validate(
        required(message = "Amount is required"),
        custom(function = "validate_amount")
    )]
    #[serde(default, deserialize_with = "string_or_number")]
    #[schema(example = "100.50")]
    pub amount: Option<String>,

    #[validate(length(max = 500, message = "Description cannot exceed 500 characters"))]
    pub description: Option<String>,
}

impl TransferRequestBody {
    /// Convert a validated body into an engine request
    pub fn into_request(self) -> Result<TransferRequest, ApiError> {
        let missing = |field: &str, message: &str| {
            ApiError::validation(BTreeMap::from([(field.to_string(), message.to_string())]))
        };

        let from = self
            .from_account_number
            .ok_or_else(|| missing("fromAccountNumber", "From account number is required"))?;
        let to = self
            .to_account_number
            .ok_or_else(|| missing("toAccountNumber", "To account number is required"))?;
        let amount_text = self
            .amount
            .ok_or_else(|| missing("amount", "Amount is required"))?;
        let amount: Decimal = money::parse_amount(&amount_text)
            .map_err(|e| missing("amount", &e.to_string()))?;

        let request = TransferRequest::new(from, to, amount);
        Ok(match self.description {
            Some(description) => request.with_description(description),
            None => request,
        })
    }
}

fn validate_amount(amount: &str) -> Result<(), ValidationError> {
    match money::parse_amount(amount) {
        Ok(value) if value > Decimal::ZERO => Ok(()),
        Ok(_) | Err(MoneyError::InvalidAmount) => Err(ValidationError::new("positive")
            .with_message(Cow::Borrowed("Amount must be positive"))),
        Err(_) => Err(ValidationError::new("amount_format").with_message(Cow::Borrowed(
            "Amount must be a valid decimal number with up to 2 decimal places",
        ))),
    }
}

/// Accept `"100.50"` as well as a bare JSON number `100.5`
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(serde::de::Error::custom("amount must be a string or number")),
    }
}

/// `fromAccountNumber` style keys, one message per field
fn field_messages(errors: &ValidationErrors) -> BTreeMap<String, String> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let message = errs
                .iter()
                .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
                .unwrap_or_else(|| "Invalid value".to_string());
            (camel_case(&field), message)
        })
        .collect()
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Axum extractor: JSON body → validated [`TransferRequest`]
pub struct ValidatedTransfer(pub TransferRequest);

impl<S> FromRequest<S> for ValidatedTransfer
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body): Json<TransferRequestBody> = Json::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| {
                ApiError::validation(BTreeMap::from([("body".to_string(), e.body_text())]))
            })?;

        body.validate()
            .map_err(|e| ApiError::validation(field_messages(&e)))?;

        Ok(ValidatedTransfer(body.into_request()?))
    }
}
