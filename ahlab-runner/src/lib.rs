//! AH Lab Runner — search orchestration, configuration, datasets, exports.
//!
//! This crate builds on `ahlab-core` to provide:
//! - TOML search configuration and factor library selection
//! - CSV dataset loading with per-row rejection reporting
//! - Seeded synthetic datasets
//! - Parallel search over combination sizes (rayon)
//! - JSON and CSV report export
//! - Tracing subscriber setup

pub mod config;
pub mod data_loader;
pub mod export;
pub mod logging;
pub mod search;
pub mod synthetic;

pub use config::{ConfigError, SearchConfig, SearchSection, StakeSection};
pub use data_loader::{load_csv, read_csv, save_csv, LoadError, LoadedDataset, RowRejection};
pub use export::{export_entries_csv, export_json, import_json, load_report, save_report};
pub use logging::{LogFormat, LoggingConfig, LoggingError};
pub use search::{
    run_search, RankedEntry, SearchError, SearchOptions, SearchReport, SizeSummary,
    SCHEMA_VERSION,
};
pub use synthetic::{generate as generate_synthetic, SyntheticConfig};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn report_types_are_send_sync() {
        assert_send::<SearchReport>();
        assert_sync::<SearchReport>();
        assert_send::<RankedEntry>();
        assert_sync::<RankedEntry>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<SearchConfig>();
        assert_sync::<SearchConfig>();
        assert_send::<SearchOptions>();
        assert_sync::<SearchOptions>();
        assert_send::<SyntheticConfig>();
        assert_sync::<SyntheticConfig>();
    }

    #[test]
    fn error_types_are_send_sync() {
        assert_send::<SearchError>();
        assert_sync::<SearchError>();
        assert_send::<ConfigError>();
        assert_sync::<ConfigError>();
        assert_send::<LoadError>();
        assert_sync::<LoadError>();
    }
}
