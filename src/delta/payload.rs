use std::sync::Arc;

use deltalake::arrow::compute::cast;
use deltalake::arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use deltalake::arrow::error::ArrowError;
use deltalake::arrow::record_batch::RecordBatch;
use deltalake::datafusion::datasource::MemTable;
use deltalake::datafusion::prelude::{DataFrame, SessionContext};

use super::errors::{DeltaUtilsError, Result};

/// An in-memory columnar table: a schema plus the record batches holding its rows.
#[derive(Debug, Clone)]
pub struct ArrowTable {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl ArrowTable {
    pub fn try_new(schema: SchemaRef, batches: Vec<RecordBatch>) -> Result<Self> {
        for (idx, batch) in batches.iter().enumerate() {
            if batch.schema().fields() != schema.fields() {
                return Err(DeltaUtilsError::invalid(format!(
                    "record batch {idx} does not match the table schema"
                )));
            }
        }
        Ok(Self { schema, batches })
    }

    /// Builds a table from batches, taking the schema from the first one.
    pub fn from_batches(batches: Vec<RecordBatch>) -> Result<Self> {
        let schema = batches
            .first()
            .map(RecordBatch::schema)
            .ok_or_else(|| {
                DeltaUtilsError::invalid("a columnar table needs at least one record batch")
            })?;
        Self::try_new(schema, batches)
    }

    /// Batches produced by a scan or a dataframe already agree with the schema.
    pub(crate) fn from_parts(schema: SchemaRef, batches: Vec<RecordBatch>) -> Self {
        Self { schema, batches }
    }

    /// Batches from a table scan, put back into the table's column order and
    /// declared types. Scans hand partition columns back dictionary-encoded
    /// and last, and may use view types for strings.
    pub(crate) fn from_scan(
        scanned: SchemaRef,
        column_order: &[String],
        batches: Vec<RecordBatch>,
    ) -> Result<Self> {
        let mut indices: Vec<usize> = column_order
            .iter()
            .filter_map(|name| scanned.index_of(name).ok())
            .collect();
        for idx in 0..scanned.fields().len() {
            if !indices.contains(&idx) {
                indices.push(idx);
            }
        }

        let fields: Vec<Field> = indices
            .iter()
            .map(|&idx| {
                let field = scanned.field(idx);
                field.clone().with_data_type(declared_type(field.data_type()))
            })
            .collect();
        let schema = Arc::new(Schema::new_with_metadata(fields, scanned.metadata().clone()));

        let batches = batches
            .into_iter()
            .map(|batch| {
                let columns = indices
                    .iter()
                    .zip(schema.fields())
                    .map(|(&idx, field)| cast(batch.column(idx), field.data_type()))
                    .collect::<Result<Vec<_>, ArrowError>>()?;
                Ok(RecordBatch::try_new(schema.clone(), columns)?)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { schema, batches })
    }

    pub fn empty(schema: SchemaRef) -> Self {
        Self {
            schema,
            batches: Vec::new(),
        }
    }

    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.schema.column_with_name(name).is_some()
    }

    pub fn into_batches(self) -> Vec<RecordBatch> {
        self.batches
    }

    pub async fn from_data_frame(df: DataFrame) -> Result<Self> {
        let schema = Arc::new(df.schema().as_arrow().clone());
        let batches = df.collect().await?;
        Ok(Self::from_parts(schema, batches))
    }

    pub fn into_data_frame(self) -> Result<DataFrame> {
        let ctx = SessionContext::new();
        let provider = MemTable::try_new(self.schema, vec![self.batches])?;
        Ok(ctx.read_table(Arc::new(provider))?)
    }
}

fn declared_type(data_type: &DataType) -> DataType {
    match data_type {
        DataType::Dictionary(_, value) => declared_type(value),
        DataType::Utf8View => DataType::Utf8,
        DataType::BinaryView => DataType::Binary,
        other => other.clone(),
    }
}

/// Either representation a caller may hand to a write or upsert.
#[derive(Debug)]
pub enum TablePayload {
    Arrow(ArrowTable),
    DataFrame(DataFrame),
}

impl TablePayload {
    pub async fn into_arrow(self) -> Result<ArrowTable> {
        match self {
            TablePayload::Arrow(table) => Ok(table),
            TablePayload::DataFrame(df) => {
                tracing::debug!("converting dataframe to columnar table");
                ArrowTable::from_data_frame(df).await
            }
        }
    }

    pub fn into_data_frame(self) -> Result<DataFrame> {
        match self {
            TablePayload::Arrow(table) => {
                tracing::debug!("converting columnar table to dataframe");
                table.into_data_frame()
            }
            TablePayload::DataFrame(df) => Ok(df),
        }
    }

    pub fn schema(&self) -> SchemaRef {
        match self {
            TablePayload::Arrow(table) => table.schema(),
            TablePayload::DataFrame(df) => Arc::new(df.schema().as_arrow().clone()),
        }
    }
}

impl From<ArrowTable> for TablePayload {
    fn from(table: ArrowTable) -> Self {
        TablePayload::Arrow(table)
    }
}

impl From<DataFrame> for TablePayload {
    fn from(df: DataFrame) -> Self {
        TablePayload::DataFrame(df)
    }
}

/// Representation requested from a read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadFormat {
    #[default]
    Arrow,
    DataFrame,
}

#[cfg(test)]
mod tests {
    use super::*;
    use deltalake::arrow::array::{
        Array, AsArray, DictionaryArray, Int64Array, StringArray, StringViewArray,
    };
    use deltalake::arrow::datatypes::UInt16Type;

    fn batch(ids: Vec<i64>) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Int64, false)]));
        RecordBatch::try_new(schema, vec![Arc::new(Int64Array::from(ids))]).unwrap()
    }

    #[test]
    fn from_batches_requires_a_batch() {
        let err = ArrowTable::from_batches(Vec::new()).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn mismatched_batches_are_rejected() {
        let other_schema = Arc::new(Schema::new(vec![Field::new("name", DataType::Utf8, true)]));
        let other = RecordBatch::try_new(
            other_schema,
            vec![Arc::new(StringArray::from(vec![Some("a")]))],
        )
        .unwrap();

        let err = ArrowTable::from_batches(vec![batch(vec![1]), other]).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn counts_rows_across_batches() {
        let table = ArrowTable::from_batches(vec![batch(vec![1, 2]), batch(vec![3])]).unwrap();
        assert_eq!(table.num_rows(), 3);
        assert!(table.has_column("id"));
        assert!(!table.has_column("missing"));
    }

    #[tokio::test]
    async fn dataframe_conversion_keeps_rows_and_schema() {
        let table = ArrowTable::from_batches(vec![batch(vec![1, 2, 3])]).unwrap();
        let schema = table.schema();

        let df = TablePayload::from(table).into_data_frame().unwrap();
        let back = TablePayload::from(df).into_arrow().await.unwrap();

        assert_eq!(back.schema().fields(), schema.fields());
        assert_eq!(back.num_rows(), 3);
    }

    #[tokio::test]
    async fn empty_table_converts_to_empty_dataframe() {
        let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Int64, false)]));
        let df = ArrowTable::empty(schema).into_data_frame().unwrap();
        assert_eq!(df.count().await.unwrap(), 0);
    }

    #[test]
    fn scan_batches_get_declared_types_and_order() {
        let country: DictionaryArray<UInt16Type> = vec!["uk", "us"].into_iter().collect();
        let scanned = Arc::new(Schema::new(vec![
            Field::new("name", DataType::Utf8View, true),
            Field::new("id", DataType::Int64, false),
            Field::new(
                "country",
                DataType::Dictionary(Box::new(DataType::UInt16), Box::new(DataType::Utf8)),
                true,
            ),
        ]));
        let batch = RecordBatch::try_new(
            scanned.clone(),
            vec![
                Arc::new(StringViewArray::from(vec!["ada", "grace"])),
                Arc::new(Int64Array::from(vec![1, 2])),
                Arc::new(country),
            ],
        )
        .unwrap();
        let order = ["id", "name", "country"].map(String::from);

        let table = ArrowTable::from_scan(scanned, &order, vec![batch]).unwrap();

        let fields: Vec<_> = table
            .schema()
            .fields()
            .iter()
            .map(|f| (f.name().clone(), f.data_type().clone()))
            .collect();
        assert_eq!(
            fields,
            vec![
                ("id".to_string(), DataType::Int64),
                ("name".to_string(), DataType::Utf8),
                ("country".to_string(), DataType::Utf8),
            ]
        );
        let batch = &table.batches()[0];
        assert_eq!(batch.schema().fields(), table.schema().fields());
        let countries = batch.column(2).as_string::<i32>();
        assert_eq!(countries.len(), 2);
        assert_eq!(countries.value(1), "us");
    }

    #[test]
    fn scan_keeps_columns_missing_from_the_order() {
        let scanned = Arc::new(Schema::new(vec![Field::new("id", DataType::Int64, false)]));
        let table = ArrowTable::from_scan(scanned, &[], Vec::new()).unwrap();
        assert_eq!(table.schema().field(0).name(), "id");
        assert_eq!(table.num_rows(), 0);
    }
}
