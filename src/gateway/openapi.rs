//! OpenAPI documentation
//!
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`

use utoipa::OpenApi;

use crate::gateway::types::{
    HealthResponse, HistoryEntry, TransactionData, TransactionDetail, TransferRequestBody,
};

/// Main API Documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Fund Transfer API",
        version = "1.0.0",
        description = "Account-to-account fund transfers with ordered locking and an audited ledger.",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::transfer::create_transfer,
        crate::gateway::handlers::transfer::get_transfer,
        crate::gateway::handlers::transfer::get_account_transfers,
        crate::gateway::handlers::health::health_check,
    ),
    components(
        schemas(
            TransferRequestBody,
            TransactionData,
            TransactionDetail,
            HistoryEntry,
            HealthResponse,
        )
    ),
    tags(
        (name = "Transfer", description = "Create and look up transfers"),
        (name = "Account", description = "Per-account transaction history"),
        (name = "System", description = "Health checks")
    )
)]
pub struct ApiDoc;
