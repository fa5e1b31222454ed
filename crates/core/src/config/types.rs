use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub sales: SalesConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("puerta.db")
}

/// Door sale pricing and form options
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SalesConfig {
    /// Fixed price of one admission
    #[serde(default = "default_unit_price")]
    pub unit_price: i64,
    /// Name stored when the buyer leaves the name blank
    #[serde(default = "default_placeholder_name")]
    pub placeholder_name: String,
    /// Accepted payment method labels
    #[serde(default = "default_payment_methods")]
    pub payment_methods: Vec<String>,
}

impl Default for SalesConfig {
    fn default() -> Self {
        Self {
            unit_price: default_unit_price(),
            placeholder_name: default_placeholder_name(),
            payment_methods: default_payment_methods(),
        }
    }
}

fn default_unit_price() -> i64 {
    6000
}

fn default_placeholder_name() -> String {
    "-".to_string()
}

fn default_payment_methods() -> Vec<String> {
    vec!["MercadoPago".to_string(), "Billete".to_string()]
}

/// Attendance ledger configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub mode: LedgerMode,
}

/// How a state write and its ledger entry reach the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerMode {
    /// Two independent writes; a ledger failure after a committed state
    /// write is reported as a divergence.
    #[default]
    Sequential,
    /// Both writes in one store transaction.
    Transactional,
}
