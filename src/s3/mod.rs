pub mod bucket;
pub mod client;
pub mod errors;

pub use bucket::ensure_bucket_exists;
pub use client::{connect_s3, S3Config, DEFAULT_REGION};
pub use errors::S3Error;
