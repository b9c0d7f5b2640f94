use std::collections::HashMap;

use deltalake::datafusion::physical_plan::common::collect;
use deltalake::operations::DeltaOps;
use deltalake::{DeltaTable, DeltaTableError};
use serde::Serialize;
use tracing::{error, info, instrument};

use super::errors::Result;
use super::payload::{ArrowTable, ReadFormat, TablePayload};
use super::table::{open_table, StorageOptions};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableMetadata {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub partition_columns: Vec<String>,
    pub configuration: HashMap<String, String>,
    pub created_time: Option<i64>,
    pub min_reader_version: i32,
    pub min_writer_version: i32,
}

/// Descriptive metadata, JSON schema and zero-based version of a table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableInfo {
    pub metadata: TableMetadata,
    pub schema: serde_json::Value,
    pub version: i64,
}

#[instrument(skip_all, fields(table_uri = %location, format = ?format))]
pub async fn read_table(
    location: &str,
    storage_options: StorageOptions,
    format: ReadFormat,
) -> Result<TablePayload> {
    info!("reading Delta table");

    let result = read_inner(location, storage_options, format).await;

    match &result {
        Ok(TablePayload::Arrow(table)) => {
            info!(rows = table.num_rows(), "Delta table read as columnar table")
        }
        Ok(TablePayload::DataFrame(_)) => info!("Delta table read as dataframe"),
        Err(e) => error!(error = %e, "error reading Delta table"),
    }
    result
}

async fn read_inner(
    location: &str,
    storage_options: StorageOptions,
    format: ReadFormat,
) -> Result<TablePayload> {
    let table = open_table(location, storage_options).await?;
    let arrow = scan(table).await?;
    match format {
        ReadFormat::Arrow => Ok(TablePayload::Arrow(arrow)),
        ReadFormat::DataFrame => Ok(TablePayload::DataFrame(arrow.into_data_frame()?)),
    }
}

async fn scan(table: DeltaTable) -> Result<ArrowTable> {
    let column_order: Vec<String> = table
        .snapshot()?
        .metadata()
        .parse_schema()
        .map_err(DeltaTableError::from)?
        .fields()
        .map(|field| field.name().clone())
        .collect();

    let (_, stream) = DeltaOps(table).load().await?;
    let scanned = stream.schema();
    let batches = collect(stream).await?;
    ArrowTable::from_scan(scanned, &column_order, batches)
}

#[instrument(skip_all, fields(table_uri = %location))]
pub async fn read_metadata(location: &str, storage_options: StorageOptions) -> Result<TableInfo> {
    let result = open_table(location, storage_options)
        .await
        .and_then(|table| table_info(&table));

    match &result {
        Ok(info) => info!(version = info.version, "loaded Delta table metadata"),
        Err(e) => error!(error = %e, "error reading Delta table metadata"),
    }
    result
}

fn table_info(table: &DeltaTable) -> Result<TableInfo> {
    let snapshot = table.snapshot()?;
    let metadata = snapshot.metadata();
    let protocol = snapshot.protocol();
    let schema = metadata
        .parse_schema()
        .map_err(DeltaTableError::from)?;
    let schema = serde_json::to_value(schema)?;

    Ok(TableInfo {
        metadata: TableMetadata {
            id: metadata.id().to_string(),
            name: metadata.name().map(str::to_string),
            description: metadata.description().map(str::to_string),
            partition_columns: metadata.partition_columns().clone(),
            configuration: metadata.configuration().clone(),
            created_time: metadata.created_time(),
            min_reader_version: protocol.min_reader_version(),
            min_writer_version: protocol.min_writer_version(),
        },
        schema,
        version: snapshot.version(),
    })
}
