use deltalake::arrow::error::ArrowError;
use deltalake::datafusion::error::DataFusionError;
use deltalake::DeltaTableError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeltaUtilsError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Delta(#[from] DeltaTableError),

    #[error(transparent)]
    DataFusion(#[from] DataFusionError),

    #[error(transparent)]
    Arrow(#[from] ArrowError),

    #[error("schema serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DeltaUtilsError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}

pub type Result<T, E = DeltaUtilsError> = std::result::Result<T, E>;
