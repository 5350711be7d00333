//! Engine: fixed-duration, fixed-concurrency request generation
//!
//! [`LoadEngine::run`] validates a [`LoadTestConfig`], spawns exactly
//! `concurrentRequests` workers and stops them all when the run's single
//! deadline passes. Every worker targets the same endpoint; there is no work
//! partitioning and no rate control.
//!
//! # High-level flow
//! 1. Validate the config. Nothing is spawned and nothing is sent if this fails.
//! 2. Compute the deadline (`now + durationSeconds`) once for the whole run.
//! 3. Spawn the workers (see [`worker::request_loop`]). Each one issues
//!    requests back to back and appends one [`Observation`](crate::Observation)
//!    per completed attempt to the [`ResultStore`].
//! 4. Wait for the deadline (or an external stop), then flip the shared
//!    `shutdown` watch channel.
//! 5. Join every worker. `run` returns only once all of them have exited, so no
//!    write reaches the store after it returns.
//!
//! # Cancellation
//! Workers check `shutdown` between attempts and race it against the
//! outstanding request. A request interrupted by shutdown is dropped without
//! an observation; one whose status arrived first is recorded. The run
//! therefore ends at most one request-completion after the deadline.
//!
//! # Errors
//! Transport failures never leave a worker: they become observations carrying
//! [`TRANSPORT_ERROR_STATUS`](crate::TRANSPORT_ERROR_STATUS). Store failures
//! stop the failing worker and fail the run once every worker has exited.
pub mod worker;
pub use worker::{request_loop, spawn_workers, ExecutionContext};

use std::{future::Future, sync::Arc};

use futures::future::join_all;
use thiserror::Error;
use tokio::task::JoinError;
use tokio::time::Instant;
use tracing::info;
use typed_builder::TypedBuilder;

use crate::{
    aggregate::{Aggregate, LatencyAggregate},
    config::{ConfigError, LoadTestConfig},
    store::{ResultStore, StoreError},
    transport::Transport,
};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("result store error: {0}")]
    Store(#[from] StoreError),
    #[error("worker task failed: {0}")]
    Worker(#[from] JoinError),
}

/// Drives one load test run against a [`Transport`], recording into a [`ResultStore`].
#[derive(TypedBuilder)]
pub struct LoadEngine {
    transport: Arc<dyn Transport>,
    store: Arc<dyn ResultStore>,
}

impl LoadEngine {
    /// Run for the configured duration.
    pub async fn run(&self, config: &LoadTestConfig) -> Result<(), EngineError> {
        self.run_until(config, std::future::pending()).await
    }

    /// Like [`run`](Self::run), but `stop` resolving ends the run early.
    /// Workers are still drained before this returns.
    pub async fn run_until<S>(&self, config: &LoadTestConfig, stop: S) -> Result<(), EngineError>
    where
        S: Future<Output = ()> + Send,
    {
        let plan = config.validate()?;
        let deadline = plan.deadline_from(Instant::now())?;
        let workers = plan.workers;
        info!(
            "Starting load test: {} workers, {} {} for {}s",
            workers,
            plan.method,
            plan.endpoint,
            plan.duration.as_secs()
        );

        let (ctx, shutdown_tx) = ExecutionContext::new(plan);
        let handles = spawn_workers(ctx, workers, self.transport.clone(), self.store.clone());

        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => {}
            _ = stop => info!("Stop requested, ending run early"),
        }
        shutdown_tx.send_replace(true);

        info!("Waiting for workers to finish...");
        let mut total = LatencyAggregate::new();
        let mut first_error: Option<EngineError> = None;
        for result in join_all(handles).await {
            match result {
                Ok(Ok(tally)) => total.merge(tally),
                Ok(Err(e)) => first_error = first_error.or(Some(EngineError::Store(e))),
                Err(e) => first_error = first_error.or(Some(EngineError::Worker(e))),
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        info!(
            "Load test completed: {} requests, {} failed",
            total.count, total.error_count
        );
        Ok(())
    }
}
