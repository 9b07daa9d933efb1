use std::sync::Arc;

use tracing::debug;

use crate::{TickerId, TickerRegistry};

/// Referential integrity between tier series and the ticker registry.
///
/// Tickers are never removed, so the only enforced rule is that a tier
/// record cannot reference an unregistered ticker.
#[derive(Clone)]
pub struct IntegrityCoordinator {
    registry: Arc<TickerRegistry>,
}

impl IntegrityCoordinator {
    pub fn new(registry: Arc<TickerRegistry>) -> Self {
        Self { registry }
    }

    pub fn verify_ticker_exists(&self, id: TickerId) -> bool {
        self.registry.contains(id)
    }

    /// Cascade hook for ticker removal. Removal is not supported, so
    /// dependent records are left in place.
    pub fn on_ticker_removed(&self, id: TickerId) {
        debug!(ticker = %id, "ticker removal requested; records retained");
    }
}
