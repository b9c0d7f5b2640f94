//! Helpers for working with Delta tables and the S3-compatible buckets behind them.
//!
//! Every function forwards to `deltalake` or `aws-sdk-s3`, logs the outcome
//! through `tracing` and hands library errors back unchanged.

pub mod cli;
pub mod config;
pub mod delta;
pub mod s3;
pub mod telemetry;

pub use delta::{
    check_if_delta_table, read_metadata, read_table, upsert_table, write_table, ArrowTable,
    DeltaUtilsError, ReadFormat, StorageOptions, TableInfo, TableMetadata, TablePayload,
    WriteOptions,
};
pub use s3::{connect_s3, ensure_bucket_exists, S3Config, S3Error};
