use std::{
    fs::File,
    io::{Read, Write},
    path::Path,
    sync::Arc,
};

use chrono::{DateTime, SecondsFormat, Utc};
use csv::{QuoteStyle, ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    observation::Observation,
    store::{ResultStore, StoreError},
};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("row {row}: invalid timestamp '{value}': {reason}")]
    Timestamp {
        row: usize,
        value: String,
        reason: String,
    },
}

/// One CSV line. Column names are consumed by external dashboards.
#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    #[serde(rename = "Endpoint")]
    endpoint: String,
    #[serde(rename = "LatencyMs")]
    latency_ms: u64,
    #[serde(rename = "StatusCode")]
    status_code: u16,
    #[serde(rename = "Timestamp")]
    timestamp: String,
}

const HEADER: &str = "Endpoint,LatencyMs,StatusCode,Timestamp";

/// Write `observations` as CSV, in the order given.
///
/// The header is bare. In data rows text columns are quoted; timestamps are
/// RFC 3339 with microseconds and an explicit offset.
pub fn write_csv<W: Write>(observations: &[Observation], mut writer: W) -> Result<(), ExportError> {
    writeln!(writer, "{HEADER}")?;
    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::NonNumeric)
        .from_writer(writer);

    for obs in observations {
        wtr.serialize(CsvRow {
            endpoint: obs.endpoint.clone(),
            latency_ms: obs.latency_ms,
            status_code: obs.status_code,
            timestamp: obs.timestamp.to_rfc3339_opts(SecondsFormat::Micros, false),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Parse a CSV produced by [`write_csv`].
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<Observation>, ExportError> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);
    rdr.deserialize::<CsvRow>()
        .enumerate()
        .map(|(idx, row)| {
            let row = row?;
            let timestamp = DateTime::parse_from_rfc3339(&row.timestamp)
                .map_err(|e| ExportError::Timestamp {
                    row: idx + 1,
                    value: row.timestamp.clone(),
                    reason: e.to_string(),
                })?
                .with_timezone(&Utc);
            Ok(Observation {
                endpoint: row.endpoint,
                latency_ms: row.latency_ms,
                status_code: row.status_code,
                timestamp,
            })
        })
        .collect()
}

/// Dumps every observation in a store to CSV.
pub struct CsvExporter {
    store: Arc<dyn ResultStore>,
}

impl CsvExporter {
    pub fn new(store: Arc<dyn ResultStore>) -> Self {
        Self { store }
    }

    /// Returns the number of rows written.
    pub async fn export<W: Write>(&self, writer: W) -> Result<usize, ExportError> {
        let observations = self.store.query_all().await?;
        write_csv(&observations, writer)?;
        Ok(observations.len())
    }

    pub async fn export_to_path(&self, path: impl AsRef<Path>) -> Result<usize, ExportError> {
        let rows = self.export(File::create(path.as_ref())?).await?;
        tracing::info!("Exported {rows} results to {}", path.as_ref().display());
        Ok(rows)
    }
}
