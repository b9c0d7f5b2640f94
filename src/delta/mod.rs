pub mod errors;
pub mod merge;
pub mod payload;
pub mod read;
pub mod table;
pub mod write;

pub use errors::{DeltaUtilsError, Result};
pub use merge::upsert_table;
pub use payload::{ArrowTable, ReadFormat, TablePayload};
pub use read::{read_metadata, read_table, TableInfo, TableMetadata};
pub use table::{check_if_delta_table, StorageOptions};
pub use write::{write_table, WriteOptions, DEFAULT_WRITE_MODE};
