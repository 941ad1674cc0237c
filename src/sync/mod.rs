pub mod assembler;
pub mod fetcher;
pub mod orchestrator;
pub mod timestamp;

pub use fetcher::{FetchOptions, HistorySource};
pub use orchestrator::{SyncSettings, Syncer};
