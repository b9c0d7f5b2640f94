use deltalake::arrow::record_batch::RecordBatch;
use deltalake::protocol::SaveMode;
use tracing::{error, info, instrument};

use super::errors::{DeltaUtilsError, Result};
use super::payload::TablePayload;
use super::table::{table_ops, StorageOptions};

pub const DEFAULT_WRITE_MODE: &str = "overwrite";

#[derive(Debug, Clone)]
pub struct WriteOptions {
    pub storage_options: StorageOptions,
    pub partition_by: Vec<String>,
    /// Passed to the table library untouched: `overwrite`, `append`, `error` or `ignore`.
    pub mode: String,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            storage_options: StorageOptions::new(),
            partition_by: Vec::new(),
            mode: DEFAULT_WRITE_MODE.to_string(),
        }
    }
}

impl WriteOptions {
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
        self
    }

    pub fn with_partition_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.partition_by = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_storage_options(mut self, storage_options: StorageOptions) -> Self {
        self.storage_options = storage_options;
        self
    }
}

#[instrument(skip_all, fields(table_uri = %location, mode = %options.mode))]
pub async fn write_table(
    table: impl Into<TablePayload>,
    location: &str,
    options: WriteOptions,
) -> Result<()> {
    info!("writing Delta table");

    let result = write_inner(table.into(), location, options).await;
    match &result {
        Ok(version) => info!(version = ?version, "Delta table write successful"),
        Err(DeltaUtilsError::InvalidArgument(msg)) => error!("invalid input table: {msg}"),
        Err(e) => error!(error = %e, "error writing Delta table"),
    }
    result.map(|_| ())
}

async fn write_inner(
    payload: TablePayload,
    location: &str,
    options: WriteOptions,
) -> Result<Option<i64>> {
    let table = payload.into_arrow().await?;
    if let Some(missing) = options
        .partition_by
        .iter()
        .find(|column| !table.has_column(column))
    {
        return Err(DeltaUtilsError::invalid(format!(
            "partition column '{missing}' is not in the table schema"
        )));
    }

    let schema = table.schema();
    let mut batches = table.into_batches();
    if batches.is_empty() {
        batches.push(RecordBatch::new_empty(schema));
    }

    let mode: SaveMode = options.mode.parse()?;
    let ops = table_ops(location, options.storage_options).await?;

    let mut builder = ops.write(batches).with_save_mode(mode);
    if !options.partition_by.is_empty() {
        builder = builder.with_partition_columns(options.partition_by);
    }
    let written = builder.await?;

    Ok(written.version())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_overwrite() {
        let options = WriteOptions::default();
        assert_eq!(options.mode, "overwrite");
        assert!(options.partition_by.is_empty());
        assert!(options.storage_options.is_empty());
    }

    #[test]
    fn builder_setters_replace_fields() {
        let options = WriteOptions::default()
            .with_mode("append")
            .with_partition_by(["country", "day"]);
        assert_eq!(options.mode, "append");
        assert_eq!(options.partition_by, vec!["country", "day"]);
    }
}
