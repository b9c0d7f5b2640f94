use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use deltalake::datafusion::prelude::{
    CsvReadOptions, DataFrame, NdJsonReadOptions, ParquetReadOptions, SessionContext,
};

use crate::config::object_store::load_s3_config;
use crate::config::storage::load_storage_options;
use crate::delta::{
    check_if_delta_table, read_metadata, read_table, upsert_table, write_table, ReadFormat,
    StorageOptions, TablePayload, WriteOptions, DEFAULT_WRITE_MODE,
};
use crate::s3::{connect_s3, ensure_bucket_exists};
use crate::telemetry::metrics::OperationMetrics;

/// Inspect and modify Delta tables and S3 buckets.
#[derive(Debug, Parser)]
#[command(name = "delta-table-utils")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Storage option forwarded to the object store, as KEY=VALUE. Overrides `AWS_*` variables.
    #[arg(long = "option", short = 'o', global = true, value_parser = parse_key_value)]
    pub options: Vec<(String, String)>,

    /// Default log filter when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print whether a Delta table exists at the location.
    Exists(LocationArgs),
    /// Print the current contents of a table.
    Read(ReadArgs),
    /// Print metadata, schema and version as JSON.
    Metadata(LocationArgs),
    /// Write a CSV, Parquet or NDJSON file to a table.
    Write(WriteArgs),
    /// Merge a file into a table on an id column, deleting ids the file lacks.
    Upsert(UpsertArgs),
    /// Create a bucket unless it already exists.
    EnsureBucket(BucketArgs),
}

#[derive(Debug, Args)]
pub struct LocationArgs {
    pub location: String,
}

#[derive(Debug, Args)]
pub struct ReadArgs {
    pub location: String,

    /// Maximum number of rows to print.
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Args)]
pub struct WriteArgs {
    pub location: String,

    #[arg(long, short = 'i')]
    pub input: PathBuf,

    #[arg(long, default_value = DEFAULT_WRITE_MODE)]
    pub mode: String,

    #[arg(long = "partition-by")]
    pub partition_by: Vec<String>,
}

#[derive(Debug, Args)]
pub struct UpsertArgs {
    pub location: String,

    #[arg(long, short = 'i')]
    pub input: PathBuf,

    #[arg(long)]
    pub id_column: String,
}

#[derive(Debug, Args)]
pub struct BucketArgs {
    pub bucket: String,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

impl Cli {
    /// Environment storage options with command-line overrides applied.
    pub fn storage_options(&self) -> StorageOptions {
        let mut opts = load_storage_options();
        opts.extend(self.options.iter().cloned());
        opts
    }
}

pub async fn run(cli: Cli, metrics: &OperationMetrics) -> Result<()> {
    let storage_options = cli.storage_options();

    match cli.command {
        Commands::Exists(args) => {
            let exists = metrics
                .observe("exists", check_if_delta_table(&args.location, storage_options))
                .await?;
            println!("{exists}");
        }
        Commands::Read(args) => {
            let payload = metrics
                .observe(
                    "read",
                    read_table(&args.location, storage_options, ReadFormat::DataFrame),
                )
                .await?;
            let df = payload.into_data_frame()?;
            match args.limit {
                Some(limit) => df.show_limit(limit).await?,
                None => df.show().await?,
            }
        }
        Commands::Metadata(args) => {
            let info = metrics
                .observe("metadata", read_metadata(&args.location, storage_options))
                .await?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Commands::Write(args) => {
            let df = load_input(&args.input).await?;
            let options = WriteOptions::default()
                .with_mode(args.mode)
                .with_partition_by(args.partition_by)
                .with_storage_options(storage_options);
            metrics
                .observe("write", write_table(df, &args.location, options))
                .await?;
        }
        Commands::Upsert(args) => {
            let df = load_input(&args.input).await?;
            metrics
                .observe(
                    "upsert",
                    upsert_table(df, &args.location, &args.id_column, storage_options),
                )
                .await?;
        }
        Commands::EnsureBucket(args) => {
            let config = load_s3_config()?;
            let client = connect_s3(&config)?;
            metrics
                .observe("ensure_bucket", ensure_bucket_exists(&client, &args.bucket))
                .await?;
        }
    }

    Ok(())
}

async fn load_input(path: &Path) -> Result<TablePayload> {
    let ctx = SessionContext::new();
    let path_str = path
        .to_str()
        .with_context(|| format!("input path is not valid UTF-8: {}", path.display()))?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let df: DataFrame = match extension.as_deref() {
        Some("csv") => ctx.read_csv(path_str, CsvReadOptions::new()).await?,
        Some("parquet") => ctx.read_parquet(path_str, ParquetReadOptions::default()).await?,
        Some("json" | "ndjson") => {
            ctx.read_json(path_str, NdJsonReadOptions::default()).await?
        }
        _ => bail!(
            "unsupported input '{}': expected .csv, .parquet or .json",
            path.display()
        ),
    };
    Ok(TablePayload::DataFrame(df))
}
