use thiserror::Error;

#[derive(Error, Debug)]
pub enum S3Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error(transparent)]
    Sdk(#[from] aws_sdk_s3::Error),
}
