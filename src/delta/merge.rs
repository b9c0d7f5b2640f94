use deltalake::operations::DeltaOps;
use tracing::{error, info, instrument};

use super::errors::{DeltaUtilsError, Result};
use super::payload::TablePayload;
use super::table::{open_table, StorageOptions};

pub const SOURCE_ALIAS: &str = "source";
pub const TARGET_ALIAS: &str = "target";

fn qualified(alias: &str, column: &str) -> String {
    format!("{alias}.\"{column}\"")
}

/// Equality on the id column between the change set and the table.
pub fn merge_predicate(id_column: &str) -> String {
    format!(
        "{} = {}",
        qualified(SOURCE_ALIAS, id_column),
        qualified(TARGET_ALIAS, id_column)
    )
}

/// Replaces the contents of the table with `changes`, matched on `id_column`.
///
/// Matched rows are overwritten column by column, new ids are inserted and
/// every target row whose id is absent from `changes` is deleted. Callers
/// must therefore pass the full set of rows they want to keep.
#[instrument(skip_all, fields(table_uri = %location, id_column = %id_column))]
pub async fn upsert_table(
    changes: impl Into<TablePayload>,
    location: &str,
    id_column: &str,
    storage_options: StorageOptions,
) -> Result<()> {
    info!("initiating upsert on Delta table");

    let result = upsert_inner(changes.into(), location, id_column, storage_options).await;
    match &result {
        Ok(()) => info!("upsert completed"),
        Err(e) => error!(error = %e, "upsert failed"),
    }
    result
}

async fn upsert_inner(
    changes: TablePayload,
    location: &str,
    id_column: &str,
    storage_options: StorageOptions,
) -> Result<()> {
    if id_column.trim().is_empty() {
        return Err(DeltaUtilsError::invalid("id column must be provided"));
    }
    let schema = changes.schema();
    if schema.column_with_name(id_column).is_none() {
        return Err(DeltaUtilsError::invalid(format!(
            "id column '{id_column}' is not in the change set"
        )));
    }
    let columns: Vec<String> = schema.fields().iter().map(|f| f.name().clone()).collect();

    let source = changes.into_data_frame()?;
    let table = open_table(location, storage_options).await?;

    let (_, metrics) = DeltaOps(table)
        .merge(source, merge_predicate(id_column))
        .with_source_alias(SOURCE_ALIAS)
        .with_target_alias(TARGET_ALIAS)
        .when_matched_update(|update| {
            columns.iter().fold(update, |update, column| {
                update.update(column.as_str(), qualified(SOURCE_ALIAS, column))
            })
        })?
        .when_not_matched_insert(|insert| {
            columns.iter().fold(insert, |insert, column| {
                insert.set(column.as_str(), qualified(SOURCE_ALIAS, column))
            })
        })?
        .when_not_matched_by_source_delete(|delete| delete)?
        .await?;

    info!(
        inserted = metrics.num_target_rows_inserted,
        updated = metrics.num_target_rows_updated,
        deleted = metrics.num_target_rows_deleted,
        "merge metrics"
    );
    Ok(())
}
