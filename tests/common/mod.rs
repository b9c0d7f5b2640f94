#![allow(dead_code)]

use std::sync::Arc;

use deltalake::arrow::array::{ArrayRef, AsArray, Int64Array, StringArray};
use deltalake::arrow::datatypes::{DataType, Field, Int64Type, Schema, SchemaRef};
use deltalake::arrow::record_batch::RecordBatch;
use delta_table_utils::{ArrowTable, TablePayload};

pub fn people_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("name", DataType::Utf8, true),
        Field::new("country", DataType::Utf8, true),
    ]))
}

pub fn people(rows: &[(i64, &str, &str)]) -> ArrowTable {
    let ids: ArrayRef = Arc::new(Int64Array::from(
        rows.iter().map(|(id, _, _)| *id).collect::<Vec<_>>(),
    ));
    let names: ArrayRef = Arc::new(StringArray::from(
        rows.iter().map(|(_, name, _)| Some(*name)).collect::<Vec<_>>(),
    ));
    let countries: ArrayRef = Arc::new(StringArray::from(
        rows.iter().map(|(_, _, c)| Some(*c)).collect::<Vec<_>>(),
    ));
    let batch = RecordBatch::try_new(people_schema(), vec![ids, names, countries]).unwrap();
    ArrowTable::from_batches(vec![batch]).unwrap()
}

/// Rows as `(id, name, country)`, sorted by id. Panics unless the columns
/// carry the types they were written with.
pub fn rows_of(table: &ArrowTable) -> Vec<(i64, String, String)> {
    let mut rows = Vec::new();
    for batch in table.batches() {
        let ids = batch.column_by_name("id").unwrap().as_primitive::<Int64Type>();
        let names = batch.column_by_name("name").unwrap().as_string::<i32>();
        let countries = batch.column_by_name("country").unwrap().as_string::<i32>();
        for i in 0..batch.num_rows() {
            rows.push((
                ids.value(i),
                names.value(i).to_string(),
                countries.value(i).to_string(),
            ));
        }
    }
    rows.sort();
    rows
}

/// `(name, type)` for every column, in order.
pub fn field_types(schema: &SchemaRef) -> Vec<(String, DataType)> {
    schema
        .fields()
        .iter()
        .map(|f| (f.name().clone(), f.data_type().clone()))
        .collect()
}

pub async fn rows_of_payload(payload: TablePayload) -> Vec<(i64, String, String)> {
    rows_of(&payload.into_arrow().await.unwrap())
}

pub fn owned(rows: &[(i64, &str, &str)]) -> Vec<(i64, String, String)> {
    let mut rows: Vec<_> = rows
        .iter()
        .map(|(id, name, country)| (*id, name.to_string(), country.to_string()))
        .collect();
    rows.sort();
    rows
}

pub fn location(dir: &tempfile::TempDir, name: &str) -> String {
    dir.path().join(name).to_str().unwrap().to_string()
}
