use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{ResultStore, StoreError};
use crate::observation::Observation;

/// Keeps observations in process memory. Useful for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    observations: Mutex<Vec<Observation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn append(&self, observation: Observation) -> Result<(), StoreError> {
        self.observations.lock().await.push(observation);
        Ok(())
    }

    async fn query_all(&self) -> Result<Vec<Observation>, StoreError> {
        Ok(self.observations.lock().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn concurrent_appends_are_not_lost() {
        let store = Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let store = store.clone();
                tokio::spawn(async move {
                    for i in 0..50 {
                        let obs = Observation::new("http://x", i, 200 + worker);
                        store.append(obs).await.unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let all = store.query_all().await.unwrap();
        assert_eq!(all.len(), 8 * 50);
        // per-worker order survives interleaving
        for worker in 0..8 {
            let latencies: Vec<u64> = all
                .iter()
                .filter(|o| o.status_code == 200 + worker)
                .map(|o| o.latency_ms)
                .collect();
            assert_eq!(latencies, (0..50).collect::<Vec<_>>());
        }
    }
}
