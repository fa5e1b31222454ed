use std::sync::Arc;

use puerta_core::{Config, DoorStore, PreorderBoard, SaleCounter, StoreError};
use tracing::warn;

/// Shared application state
pub struct AppState {
    config: Config,
    store: Arc<dyn DoorStore>,
    board: PreorderBoard,
    counter: SaleCounter,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn DoorStore>) -> Self {
        let mode = config.ledger.mode;
        let board = PreorderBoard::new(Arc::clone(&store), mode);
        let counter = SaleCounter::new(Arc::clone(&store), config.sales.clone(), mode);
        Self {
            config,
            store,
            board,
            counter,
        }
    }

    /// Fill both surfaces from the store.
    ///
    /// A surface that fails to load stays empty; it can be reloaded later.
    pub async fn load(&self) -> Result<(), StoreError> {
        let preorders = self.board.load().await;
        if let Err(ref e) = preorders {
            warn!("Failed to load preorders: {}", e);
        }
        let sales = self.counter.load().await;
        if let Err(ref e) = sales {
            warn!("Failed to load door sales: {}", e);
        }
        preorders.and(sales).map(|_| ())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &dyn DoorStore {
        self.store.as_ref()
    }

    pub fn board(&self) -> &PreorderBoard {
        &self.board
    }

    pub fn counter(&self) -> &SaleCounter {
        &self.counter
    }
}
