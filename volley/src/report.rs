use std::{collections::BTreeMap, fmt, io::Write, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    aggregate::{Aggregate, LatencyAggregate},
    observation::TRANSPORT_ERROR_STATUS,
    store::{ResultStore, StoreError},
};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

/// Statistics derived from a non-empty [`LatencyAggregate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub count: u64,
    pub avg_latency_ms: f64,
    pub min_latency_ms: u64,
    pub max_latency_ms: u64,
    pub median_latency_ms: f64,
    /// Percentage of observations that were transport failures or 4xx/5xx.
    pub error_rate: f64,
    /// Occurrences per status code, ordered by status code.
    pub status_codes: BTreeMap<u16, u64>,
}

/// Outcome of summarizing a run. An empty run is `NoData`, not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Report {
    NoData,
    Summary(Summary),
}

impl From<LatencyAggregate> for Report {
    fn from(agg: LatencyAggregate) -> Self {
        let (Some(min), Some(max)) = (agg.min_latency_ms, agg.max_latency_ms) else {
            return Report::NoData;
        };

        let count = agg.count;
        let mid = count / 2;
        let median = if count % 2 == 0 {
            let lo = agg.nth_latency(mid - 1).unwrap_or(min);
            let hi = agg.nth_latency(mid).unwrap_or(max);
            (lo + hi) as f64 / 2.0
        } else {
            agg.nth_latency(mid).unwrap_or(min) as f64
        };

        Report::Summary(Summary {
            count,
            avg_latency_ms: agg.total_latency_ms as f64 / count as f64,
            min_latency_ms: min,
            max_latency_ms: max,
            median_latency_ms: median,
            error_rate: agg.error_count as f64 / count as f64 * 100.0,
            status_codes: agg.status_codes,
        })
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = match self {
            Report::NoData => return writeln!(f, "No results to summarize."),
            Report::Summary(summary) => summary,
        };

        writeln!(f, "=== Benchmark Summary ===")?;
        writeln!(f, "Total Requests: {}", summary.count)?;
        writeln!(f, "Avg Latency: {:.2} ms", summary.avg_latency_ms)?;
        writeln!(f, "Min Latency: {} ms", summary.min_latency_ms)?;
        writeln!(f, "Max Latency: {} ms", summary.max_latency_ms)?;
        writeln!(f, "Median Latency: {:.2} ms", summary.median_latency_ms)?;
        writeln!(f, "Error Rate: {:.2}%", summary.error_rate)?;
        writeln!(f)?;
        writeln!(f, "Status Code Distribution:")?;
        for (status, count) in &summary.status_codes {
            if *status == TRANSPORT_ERROR_STATUS {
                writeln!(f, "  transport error: {count} requests")?;
            } else {
                writeln!(f, "  {status}: {count} requests")?;
            }
        }
        writeln!(f, "==========================")
    }
}

/// Reads every observation of a run and derives its [`Report`].
#[derive(Clone)]
pub struct SummaryReporter {
    store: Arc<dyn ResultStore>,
}

impl SummaryReporter {
    pub fn new(store: Arc<dyn ResultStore>) -> Self {
        Self { store }
    }

    /// Summarize the store's current contents. Has no side effects, so
    /// calling it twice on an unchanged store yields the same report.
    pub async fn summarize(&self) -> Result<Report, StoreError> {
        let observations = self.store.query_all().await?;
        let mut agg = LatencyAggregate::new();
        agg.aggregate(&observations);
        Ok(Report::from(agg))
    }
}

/// Sends a [`Report`] somewhere (stdout, a file, a service).
#[async_trait]
pub trait Reporter {
    async fn report(&self, report: &Report) -> Result<(), ReportError>;
}

/// Human-readable text on stdout.
pub struct StdoutReporter;

#[async_trait]
impl Reporter for StdoutReporter {
    async fn report(&self, report: &Report) -> Result<(), ReportError> {
        let mut out = std::io::stdout().lock();
        write!(out, "{report}")?;
        out.flush()?;
        Ok(())
    }
}

/// A single pretty-printed JSON document on stdout.
pub struct JsonReporter;

impl JsonReporter {
    pub fn write_to<W: Write>(&self, report: &Report, mut out: W) -> Result<(), ReportError> {
        serde_json::to_writer_pretty(&mut out, report)?;
        writeln!(out)?;
        out.flush()?;
        Ok(())
    }
}

#[async_trait]
impl Reporter for JsonReporter {
    async fn report(&self, report: &Report) -> Result<(), ReportError> {
        self.write_to(report, std::io::stdout().lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{observation::Observation, store::MemoryStore};

    async fn store_with(items: &[(u64, u16)]) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        for &(latency, status) in items {
            store
                .append(Observation::new("http://x", latency, status))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn empty_store_is_no_data() {
        let reporter = SummaryReporter::new(Arc::new(MemoryStore::new()));
        assert_eq!(reporter.summarize().await.unwrap(), Report::NoData);
    }

    #[tokio::test]
    async fn summarizes_observations() {
        let store = store_with(&[(10, 200), (20, 200), (35, 500), (1, TRANSPORT_ERROR_STATUS)]).await;
        let Report::Summary(summary) = SummaryReporter::new(store).summarize().await.unwrap() else {
            panic!("expected a summary");
        };

        assert_eq!(summary.count, 4);
        assert_eq!(summary.avg_latency_ms, 16.5);
        assert_eq!(summary.min_latency_ms, 1);
        assert_eq!(summary.max_latency_ms, 35);
        assert_eq!(summary.median_latency_ms, 15.0);
        assert_eq!(summary.error_rate, 50.0);
        assert_eq!(
            summary.status_codes,
            BTreeMap::from([(TRANSPORT_ERROR_STATUS, 1), (200, 2), (500, 1)])
        );
    }

    #[tokio::test]
    async fn average_is_not_truncated() {
        let store = store_with(&[(1, 200), (2, 200)]).await;
        let Report::Summary(summary) = SummaryReporter::new(store).summarize().await.unwrap() else {
            panic!("expected a summary");
        };
        assert_eq!(summary.avg_latency_ms, 1.5);
        assert_eq!(summary.median_latency_ms, 1.5);
    }

    #[tokio::test]
    async fn summarize_is_idempotent() {
        let store = store_with(&[(3, 200), (7, 404), (5, 200)]).await;
        let reporter = SummaryReporter::new(store);
        let first = reporter.summarize().await.unwrap();
        let second = reporter.summarize().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.to_string(), second.to_string());
    }

    #[tokio::test]
    async fn transport_only_run_still_summarizes() {
        let store = store_with(&[(4, TRANSPORT_ERROR_STATUS), (4, TRANSPORT_ERROR_STATUS)]).await;
        let Report::Summary(summary) = SummaryReporter::new(store).summarize().await.unwrap() else {
            panic!("expected a summary");
        };
        assert_eq!(summary.min_latency_ms, 4);
        assert_eq!(summary.max_latency_ms, 4);
        assert_eq!(summary.avg_latency_ms, 4.0);
        assert_eq!(summary.error_rate, 100.0);
    }

    #[test]
    fn text_lists_statuses_in_order() {
        let mut agg = LatencyAggregate::new();
        agg.aggregate(&[
            Observation::new("http://x", 2, 503),
            Observation::new("http://x", 2, 200),
            Observation::new("http://x", 2, TRANSPORT_ERROR_STATUS),
        ]);
        let text = Report::from(agg).to_string();

        let transport = text.find("transport error: 1").unwrap();
        let ok = text.find("200: 1").unwrap();
        let unavailable = text.find("503: 1").unwrap();
        assert!(transport < ok && ok < unavailable);
        assert!(text.contains("Total Requests: 3"));
        assert_eq!(Report::NoData.to_string(), "No results to summarize.\n");
    }

    #[test]
    fn json_is_tagged() {
        let json = serde_json::to_value(Report::NoData).unwrap();
        assert_eq!(json, serde_json::json!({ "result": "no_data" }));

        let mut agg = LatencyAggregate::new();
        agg.aggregate(&[Observation::new("http://x", 2, 200)]);
        let json = serde_json::to_value(Report::from(agg)).unwrap();
        assert_eq!(json["result"], "summary");
        assert_eq!(json["count"], 1);
        assert_eq!(json["status_codes"]["200"], 1);
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }
    }

    #[test]
    fn json_reporter_surfaces_write_errors() {
        let err = JsonReporter
            .write_to(&Report::NoData, ClosedPipe)
            .unwrap_err();
        assert!(matches!(err, ReportError::Json(_) | ReportError::Io(_)));

        let mut out = Vec::new();
        JsonReporter.write_to(&Report::NoData, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\n  \"result\": \"no_data\"\n}\n"
        );
    }
}
