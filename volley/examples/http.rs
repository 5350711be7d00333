use std::sync::Arc;

use volley::{
    CsvExporter, HttpTransport, LoadEngine, LoadTestConfig, Reporter, SqliteStore,
    StdoutReporter, SummaryReporter,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    // One client for the whole run; the transport is shared by every worker
    let transport = Arc::new(HttpTransport::new());
    let store = Arc::new(SqliteStore::create("example_results.db").await?);

    let config = LoadTestConfig {
        http_method: "GET".to_string(),
        concurrent_requests: 8,
        duration_seconds: 5,
        ..LoadTestConfig::new("http://localhost:3000")
    };

    LoadEngine::builder()
        .transport(transport)
        .store(store.clone())
        .build()
        .run(&config)
        .await?;

    let report = SummaryReporter::new(store.clone()).summarize().await?;
    StdoutReporter.report(&report).await?;

    CsvExporter::new(store).export_to_path("example_results.csv").await?;
    Ok(())
}
