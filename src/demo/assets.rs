//! Demo job: materialize `raw_data`, then `processed_data` from it.

use serde::Serialize;

use crate::sensor::RunRequest;

const RAW_ROWS: usize = 10;

/// One synthesized source row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RawRow {
    pub id: usize,
    pub value: u32,
}

/// Summary written by the processing step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessedData {
    pub status: &'static str,
    pub record_count: usize,
}

/// Simulate fetching raw data from an external source.
pub fn raw_data() -> Vec<RawRow> {
    (0..RAW_ROWS)
        .map(|id| RawRow {
            id,
            value: fastrand::u32(1..=100),
        })
        .collect()
}

/// Simulate processing the raw data.
pub fn processed_data(rows: &[RawRow]) -> ProcessedData {
    ProcessedData {
        status: "processed",
        record_count: rows.len(),
    }
}

/// Run both assets for one launched request.
pub fn refresh_data_job(sensor: &str, request: &RunRequest) -> ProcessedData {
    let rows = raw_data();
    tracing::info!(
        sensor,
        run_key = request.run_key.as_deref().unwrap_or("-"),
        rows = rows.len(),
        "Materialized raw_data"
    );
    let processed = processed_data(&rows);
    tracing::info!(
        sensor,
        run_key = request.run_key.as_deref().unwrap_or("-"),
        record_count = processed.record_count,
        "Materialized processed_data"
    );
    processed
}
