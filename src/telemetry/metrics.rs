use std::future::Future;
use std::time::Instant;

use opentelemetry::metrics::{Counter, Histogram, Meter};
use opentelemetry::KeyValue;

/// Counters and latency for facade operations, tagged with the operation name.
#[derive(Clone)]
pub struct OperationMetrics {
    operation_counter: Counter<u64>,
    error_counter: Counter<u64>,
    latency_histogram: Histogram<f64>,
}

impl OperationMetrics {
    pub fn new(meter: Meter) -> Self {
        let operation_counter = meter
            .u64_counter("delta_table_utils.operations")
            .with_description("Total table and bucket operations executed.")
            .build();
        let error_counter = meter
            .u64_counter("delta_table_utils.errors")
            .with_description("Total operations that returned an error.")
            .build();
        let latency_histogram = meter
            .f64_histogram("delta_table_utils.latency_ms")
            .with_description("Operation latency in milliseconds.")
            .with_unit("ms")
            .build();

        Self {
            operation_counter,
            error_counter,
            latency_histogram,
        }
    }

    pub async fn observe<F, T, E>(&self, operation: &'static str, fut: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
    {
        let start = Instant::now();
        let result = fut.await;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1_000.0;

        let outcome = if result.is_ok() { "ok" } else { "error" };
        let attributes = [
            KeyValue::new("operation", operation),
            KeyValue::new("outcome", outcome),
        ];

        self.operation_counter.add(1, &attributes);
        if result.is_err() {
            self.error_counter.add(1, &attributes);
        }
        self.latency_histogram.record(elapsed_ms, &attributes);

        result
    }
}
