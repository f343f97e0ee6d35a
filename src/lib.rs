pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use adapters::{InMemoryRepository, LocalStorage, SnapshotRepository};
pub use crate::core::{export::SqlExporter, import::CsvImporter, search::LensFinder};
pub use domain::optics::{format_power, generate_range, transpose, Power, Prescription};
pub use utils::error::{LensError, Result};
