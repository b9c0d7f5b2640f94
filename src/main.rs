use clap::Parser;
use opentelemetry::global;

use delta_table_utils::cli::{run, Cli};
use delta_table_utils::telemetry::metrics::OperationMetrics;
use delta_table_utils::telemetry::tracing::{init_tracing, DEFAULT_SERVICE_NAME};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _telemetry_guard = init_tracing(&cli.log_level);

    let metrics = OperationMetrics::new(global::meter(DEFAULT_SERVICE_NAME));
    run(cli, &metrics).await
}
