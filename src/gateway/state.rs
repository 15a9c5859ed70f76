use std::sync::Arc;

use crate::config::TransferConfig;
use crate::ledger::LedgerStore;
use crate::lock::LockCoordinator;
use crate::transfer::{TransferEngine, TransferQueryService};

/// Shared gateway state
#[derive(Clone)]
pub struct AppState {
    /// Transfer engine (writes)
    pub engine: Arc<TransferEngine>,
    /// Query service (reads, never takes locks)
    pub query: Arc<TransferQueryService>,
    /// Ledger store, used by the health check
    pub ledger: Arc<dyn LedgerStore>,
}

impl AppState {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        locks: Arc<dyn LockCoordinator>,
        config: TransferConfig,
    ) -> Self {
        Self {
            engine: Arc::new(TransferEngine::new(ledger.clone(), locks, config)),
            query: Arc::new(TransferQueryService::new(ledger.clone())),
            ledger,
        }
    }
}
