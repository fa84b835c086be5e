use crate::failover::{DispatchOutcome, LogicalRequest, RequestDriver, RunReport, TcpAttemptExecutor};
use tokio::time::Duration;

/// FailoverClient is the application's handle to the replica pool. Each replica is an
/// independent counter; the client makes no attempt to keep them consistent with one another.
pub struct FailoverClient {
    driver: RequestDriver<TcpAttemptExecutor>,
    request_interval: Duration,
}

impl FailoverClient {
    pub(super) fn new(driver: RequestDriver<TcpAttemptExecutor>, request_interval: Duration) -> Self {
        FailoverClient {
            driver,
            request_interval,
        }
    }

    /// Dispatches a single logical request and waits for its terminal outcome.
    pub async fn send(&self, request: &LogicalRequest) -> DispatchOutcome {
        self.driver.dispatcher().dispatch(request).await
    }

    /// Runs all requests concurrently, bounded by the configured in-flight limit.
    pub async fn run_all(&self, requests: Vec<LogicalRequest>) -> RunReport {
        self.driver.run_all(requests).await
    }

    /// Runs requests one at a time, pausing the configured request interval in between.
    pub async fn run_sequential(&self, requests: Vec<LogicalRequest>) -> RunReport {
        self.driver.run_sequential(requests, self.request_interval).await
    }
}
