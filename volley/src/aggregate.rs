use std::collections::BTreeMap;
use std::fmt::Debug;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::observation::Observation;

/// The `Aggregate` trait defines how raw items are collected into a compact,
/// mergeable representation that preserves what later analysis needs.
///
/// Aggregates should **not** compute final statistics such as averages or
/// medians. Those belong in a [`Report`](crate::report::Report), which is
/// converted from an aggregate and performs the final processing.
///
/// # Implementor notes
/// - `merge` must be **associative** and **commutative**: worker-local
///   aggregates are merged in whatever order the workers finish.
/// - Keep the representation serializable so aggregates can be persisted or
///   shipped between processes.
pub trait Aggregate
where
    Self: Serialize + DeserializeOwned + PartialEq + Send + Sync + Debug + Clone,
{
    /// The item type this aggregate summarizes.
    type Item;

    /// Create a new, empty instance of the aggregate.
    fn new() -> Self;

    /// Aggregate multiple items into the current instance.
    fn aggregate(&mut self, items: &[Self::Item]) {
        items.iter().for_each(|i| self.consume(i));
    }

    /// Incorporate a single item into the aggregate.
    fn consume(&mut self, item: &Self::Item);

    /// Combine two different aggregates into one.
    fn merge(&mut self, other: Self);
}

/// Raw tallies over a set of [`Observation`]s.
///
/// Latencies are bucketed per whole millisecond, which is also the resolution
/// they are measured at, so order statistics derived from the histogram are
/// exact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencyAggregate {
    pub count: u64,
    pub total_latency_ms: u64,
    pub min_latency_ms: Option<u64>,
    pub max_latency_ms: Option<u64>,
    pub error_count: u64,
    pub latencies: BTreeMap<u64, u64>,
    pub status_codes: BTreeMap<u16, u64>,
}

impl LatencyAggregate {
    /// The `n`-th smallest latency (zero based), if there are that many samples.
    pub fn nth_latency(&self, n: u64) -> Option<u64> {
        let mut seen = 0;
        for (&latency, &count) in &self.latencies {
            seen += count;
            if n < seen {
                return Some(latency);
            }
        }
        None
    }
}

impl Aggregate for LatencyAggregate {
    type Item = Observation;

    fn new() -> Self {
        LatencyAggregate::default()
    }

    fn consume(&mut self, obs: &Self::Item) {
        self.count += 1;
        self.total_latency_ms = self.total_latency_ms.saturating_add(obs.latency_ms);
        self.min_latency_ms = Some(self.min_latency_ms.map_or(obs.latency_ms, |m| m.min(obs.latency_ms)));
        self.max_latency_ms = Some(self.max_latency_ms.map_or(obs.latency_ms, |m| m.max(obs.latency_ms)));
        self.error_count += u64::from(obs.is_error());
        *self.latencies.entry(obs.latency_ms).or_default() += 1;
        *self.status_codes.entry(obs.status_code).or_default() += 1;
    }

    fn merge(&mut self, other: Self) {
        self.count += other.count;
        self.total_latency_ms = self.total_latency_ms.saturating_add(other.total_latency_ms);
        self.min_latency_ms = match (self.min_latency_ms, other.min_latency_ms) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.max_latency_ms = match (self.max_latency_ms, other.max_latency_ms) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        self.error_count += other.error_count;
        for (latency, count) in other.latencies {
            *self.latencies.entry(latency).or_default() += count;
        }
        for (status, count) in other.status_codes {
            *self.status_codes.entry(status).or_default() += count;
        }
    }
}
