//! Database access for cpath-web

pub mod accumulator;
pub mod settings;

pub use accumulator::{load_snapshot, store_path, Namespace, Snapshot, StoreSummary};
