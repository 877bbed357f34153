//! Bounded pool of concurrently running tests.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::{ProcessOutcome, TestExecutor};
use crate::discovery::TestDescriptor;
use crate::error::{DriverError, DriverResult};

/// Runs tests with at most `jobs` of them in flight.
///
/// Completions are handed to the callback one at a time on the calling task, in the order
/// the tests finish, so the callback never needs synchronization.
#[derive(Debug, Clone, Copy)]
pub struct MainLoop {
    jobs: usize,
}

impl MainLoop {
    pub fn new(jobs: usize) -> DriverResult<Self> {
        if jobs == 0 {
            return Err(DriverError::InvalidJobs);
        }
        Ok(Self { jobs })
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Run every test and feed each outcome to `on_complete`.
    ///
    /// An error from `on_complete` stops the loop; tests still running are killed when
    /// their tasks are dropped.
    #[tracing::instrument(skip_all, fields(tests = tests.len(), jobs = self.jobs))]
    pub async fn run<E, F>(&self, tests: Vec<TestDescriptor>, executor: Arc<E>, mut on_complete: F) -> DriverResult<()>
    where
        E: TestExecutor,
        F: FnMut(&TestDescriptor, ProcessOutcome) -> DriverResult<()>,
    {
        let permits = Arc::new(Semaphore::new(self.jobs));
        let mut running = JoinSet::new();

        for test in tests {
            let permits = Arc::clone(&permits);
            let executor = Arc::clone(&executor);
            running.spawn(async move {
                // The semaphore is never closed, so acquiring only waits.
                let _permit = permits.acquire_owned().await.ok();
                let outcome = executor.execute(&test).await;
                (test, outcome)
            });
        }

        while let Some(joined) = running.join_next().await {
            let (test, outcome) = joined.map_err(|e| DriverError::Join(e.to_string()))?;
            on_complete(&test, outcome)?;
        }

        Ok(())
    }
}
