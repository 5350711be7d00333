use std::sync::Arc;

use tokio::sync::watch::{self, Receiver, Sender};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::{
    aggregate::{Aggregate, LatencyAggregate},
    config::RunPlan,
    observation::{Observation, TRANSPORT_ERROR_STATUS},
    store::{ResultStore, StoreError},
    transport::Transport,
};

/// State shared by every worker of a run. Workers only ever read it.
#[derive(Clone)]
pub struct ExecutionContext {
    pub plan: Arc<RunPlan>,
    /// Flips to `true` once when the run must stop.
    pub shutdown: Receiver<bool>,
}

impl ExecutionContext {
    pub fn new(plan: RunPlan) -> (Self, Sender<bool>) {
        let (tx, rx) = watch::channel(false);
        (
            Self {
                plan: Arc::new(plan),
                shutdown: rx,
            },
            tx,
        )
    }
}

/// Spawn `workers` Tokio tasks, each running [`request_loop`].
pub fn spawn_workers(
    ctx: ExecutionContext,
    workers: usize,
    transport: Arc<dyn Transport>,
    store: Arc<dyn ResultStore>,
) -> Vec<JoinHandle<Result<LatencyAggregate, StoreError>>> {
    (0..workers)
        .map(|_| {
            tokio::spawn(request_loop(
                ctx.clone(),
                transport.clone(),
                store.clone(),
            ))
        })
        .collect()
}

/// Issue requests back to back until shutdown, appending one observation per
/// completed attempt.
///
/// Shutdown is checked before every attempt. If it fires while a request is
/// outstanding the request is dropped and nothing is recorded for it; a
/// request that already has its status is recorded even if shutdown fires
/// right after. Transport failures are recorded with
/// [`TRANSPORT_ERROR_STATUS`] and never stop the loop. Store failures do.
///
/// Returns a tally of everything this worker recorded.
pub async fn request_loop(
    mut ctx: ExecutionContext,
    transport: Arc<dyn Transport>,
    store: Arc<dyn ResultStore>,
) -> Result<LatencyAggregate, StoreError> {
    let plan = ctx.plan.clone();
    let mut tally = LatencyAggregate::new();

    loop {
        if *ctx.shutdown.borrow() {
            break;
        }

        let start = Instant::now();
        let outcome = tokio::select! {
            biased;
            res = transport.send(plan.method, &plan.url) => res,
            _ = ctx.shutdown.wait_for(|stop| *stop) => break,
        };
        let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        let status_code = match outcome {
            Ok(status) => status,
            Err(e) => {
                debug!(error = %e, latency_ms, "Request failed");
                TRANSPORT_ERROR_STATUS
            }
        };

        let observation = Observation::new(plan.endpoint.as_str(), latency_ms, status_code);
        tally.consume(&observation);
        if let Err(e) = store.append(observation).await {
            warn!(error = %e, "Failed to record observation, stopping worker");
            return Err(e);
        }
    }

    Ok(tally)
}
