//! Volley, a fixed-duration HTTP load generator.
//!
//! Volley drives a fixed number of concurrent workers against a single endpoint
//! for a fixed wall-clock window, records every request attempt, and summarizes
//! the run afterwards. It does not shape traffic: every worker sends its next
//! request as soon as the previous one completes.
//!
//! # Architecture
//!
//! - [`LoadEngine`]: validates a [`LoadTestConfig`], spawns the workers, owns the
//!   run's deadline and waits for every worker to quiesce.
//! - [`Transport`]: issues one request and reports its status. [`HttpTransport`]
//!   wraps a shared `reqwest` client.
//! - [`Observation`]: one measured attempt (endpoint, latency, status, timestamp).
//! - [`ResultStore`]: append-only persistence for observations, with a full scan.
//!   [`SqliteStore`] and [`MemoryStore`] are provided.
//! - [`Aggregate`]: mergeable raw tallies over observations.
//! - [`Report`]: statistics derived from an aggregate; [`SummaryReporter`]
//!   produces one from a store and a [`Reporter`] sends it somewhere.
//! - [`CsvExporter`]: dumps a store as CSV for external dashboards.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use volley::{
//!     HttpTransport, LoadEngine, LoadTestConfig, MemoryStore, Reporter, StdoutReporter,
//!     SummaryReporter,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryStore::new());
//!     let engine = LoadEngine::builder()
//!         .transport(Arc::new(HttpTransport::new()))
//!         .store(store.clone())
//!         .build();
//!
//!     let config = LoadTestConfig {
//!         concurrent_requests: 4,
//!         duration_seconds: 5,
//!         ..LoadTestConfig::new("http://localhost:3000")
//!     };
//!     engine.run(&config).await?;
//!
//!     let report = SummaryReporter::new(store).summarize().await?;
//!     StdoutReporter.report(&report).await?;
//!     Ok(())
//! }
//! ```

/// Raw, mergeable tallies
pub mod aggregate;
/// Load test configuration and validation
pub mod config;
/// Worker lifecycle and the run deadline
pub mod engine;
/// CSV export
pub mod export;
/// Single measured request attempts
pub mod observation;
/// Reports and Reporters
pub mod report;
/// Observation persistence
pub mod store;
/// Request dispatch
pub mod transport;

pub use aggregate::{Aggregate, LatencyAggregate};
pub use config::{ConfigError, HttpMethod, LoadTestConfig, RunPlan};
pub use engine::{EngineError, LoadEngine};
pub use export::{read_csv, write_csv, CsvExporter, ExportError};
pub use observation::{Observation, TRANSPORT_ERROR_STATUS};
pub use report::{JsonReporter, Report, ReportError, Reporter, StdoutReporter, Summary, SummaryReporter};
pub use store::{MemoryStore, ResultStore, SqliteStore, StoreError};
pub use transport::{HttpTransport, Transport, TransportError};
