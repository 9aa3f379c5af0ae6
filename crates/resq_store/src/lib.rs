pub mod cluster;
pub mod config;
pub mod datastore;
mod db;
pub mod migration;
pub mod normalize;
pub mod scenario;
pub mod seed;
pub mod store;
pub mod views;

pub use resq_core::*;
pub use cluster::ClusterIndex;
pub use config::{DatabaseConfig, PoolConfig, ResqConfig};
pub use datastore::{default_sqlite_path, load_or_init_config, open_store};
pub use seed::{DEFAULT_CLIMATES, DEFAULT_PERIODS, DEFAULT_WEATHERS, PeriodSeed, SeedReport};
pub use store::{BackendCapabilities, ResqStore};
