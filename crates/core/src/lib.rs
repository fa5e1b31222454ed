pub mod config;
pub mod metrics;
pub mod store;
pub mod testing;
pub mod workflow;

pub use config::{
    config_path, load_config, load_config_from_str, validate_config, Config, ConfigError, DatabaseConfig,
    LedgerConfig, LedgerMode, SalesConfig, ServerConfig,
};
pub use store::{
    Attendance, DoorSale, DoorStore, NewDoorSale, NewPreorder, Preorder, SqliteDoorStore,
    StoreError,
};
pub use workflow::{
    reconcile_ledger, repair_ledger, BoardStats, CheckInError, CheckInOutcome, LedgerReport,
    PreorderBoard, SaleCounter, SaleError,
};
