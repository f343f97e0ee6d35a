pub mod export;
pub mod import;
pub mod search;

pub use crate::domain::model::{Categories, ImportSummary, Lens, LensQuery, SearchResults};
pub use crate::domain::ports::{ConfigProvider, LensRepository, Storage};
pub use crate::utils::error::Result;
