//! Low-level storage primitives: atomic JSON records and CSV snapshots.

pub mod atomic_json;
pub mod table_store;

pub use atomic_json::AtomicJsonFile;
pub use table_store::{file_size, read_table, write_table};
