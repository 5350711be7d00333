use std::{path::PathBuf, process::ExitCode, sync::Arc};

use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use volley::{
    CsvExporter, HttpTransport, JsonReporter, LoadEngine, LoadTestConfig, Reporter, SqliteStore,
    StdoutReporter, SummaryReporter,
};

#[derive(Parser, Debug)]
#[command(name = "volley")]
#[command(about = "Fixed-duration HTTP load generator", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON load test config (apiUrl, httpMethod, concurrentRequests, durationSeconds)
    config: PathBuf,

    /// SQLite database the run is recorded into. Rows from earlier runs are dropped.
    #[arg(long, default_value = "benchmark_results.db")]
    db: PathBuf,

    /// Also export every observation to this CSV file
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // help and version go to stdout and are not failures
            let failed = e.use_stderr();
            let _ = e.print();
            return if failed {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // printed directly so it survives RUST_LOG=off
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = LoadTestConfig::load(&cli.config)?;
    // reject bad configs before touching the database
    config.validate()?;

    let store = Arc::new(SqliteStore::create(&cli.db).await?);
    let engine = LoadEngine::builder()
        .transport(Arc::new(HttpTransport::new()))
        .store(store.clone())
        .build();

    engine.run_until(&config, interrupted()).await?;
    info!("Results logged to {}", cli.db.display());

    let report = SummaryReporter::new(store.clone()).summarize().await?;
    if cli.json {
        JsonReporter.report(&report).await?;
    } else {
        StdoutReporter.report(&report).await?;
    }

    if let Some(path) = &cli.csv {
        CsvExporter::new(store.clone()).export_to_path(path).await?;
    }

    store.close().await;
    Ok(())
}

/// Resolves on Ctrl-C. Never resolves if the handler can't be installed.
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
