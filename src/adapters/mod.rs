// Adapters layer: concrete storage backends and lens repositories.

pub mod local;
pub mod memory;
pub mod snapshot;

pub use local::LocalStorage;
pub use memory::InMemoryRepository;
pub use snapshot::SnapshotRepository;
