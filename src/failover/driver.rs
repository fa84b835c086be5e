use crate::failover::attempt::{AttemptErrorKind, AttemptExecutor};
use crate::failover::dispatcher::{DispatchOutcome, FailoverDispatcher, LogicalRequest};
use crate::failover::time::{Clock, RealClock};
use crate::failover::{ConcurrencyLimiter, ReplicaAddress, ReplicaSet};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::time::Duration;

/// How many logical requests one replica served during a run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReplicaTally {
    pub replica: ReplicaAddress,
    pub successes: u64,
}

/// A logical request whose task died before reaching an outcome. It is counted as failed.
#[derive(Debug, thiserror::Error)]
#[error("logical request task did not complete: {reason}")]
pub struct RequestAborted {
    reason: String,
}

#[derive(Debug)]
pub struct RequestReport {
    pub request_id: u64,
    pub outcome: Result<DispatchOutcome, RequestAborted>,
}

impl RequestReport {
    pub fn is_success(&self) -> bool {
        matches!(&self.outcome, Ok(outcome) if outcome.is_success())
    }
}

/// RunReport is the aggregate of one run. Every logical request shows up exactly once in
/// `requests`, sorted by id, and is counted in exactly one of `succeeded`/`failed`.
#[derive(Debug)]
pub struct RunReport {
    pub requests: Vec<RequestReport>,
    pub succeeded: usize,
    pub failed: usize,
    /// Every configured replica, in configured order, including the ones that served nothing.
    pub replica_stats: Vec<ReplicaTally>,
}

/// ReplicaStats counts successes per replica. The whole map sits behind one lock, so concurrent
/// completions never observe or produce a partial update.
struct ReplicaStats {
    order: Vec<ReplicaAddress>,
    successes: Mutex<HashMap<ReplicaAddress, u64>>,
}

impl ReplicaStats {
    fn new(replicas: &ReplicaSet) -> Self {
        let mut order = Vec::with_capacity(replicas.len());
        let mut successes = HashMap::with_capacity(replicas.len());
        for replica in replicas.iter() {
            if successes.insert(replica.clone(), 0).is_none() {
                order.push(replica.clone());
            }
        }

        ReplicaStats {
            order,
            successes: Mutex::new(successes),
        }
    }

    fn record_success(&self, replica: &ReplicaAddress) {
        let mut successes = self.successes.lock().expect("ReplicaStats mutex guard poison");
        *successes.entry(replica.clone()).or_insert(0) += 1;
    }

    fn snapshot(&self) -> Vec<ReplicaTally> {
        let successes = self.successes.lock().expect("ReplicaStats mutex guard poison");
        self.order
            .iter()
            .map(|replica| ReplicaTally {
                replica: replica.clone(),
                successes: successes.get(replica).copied().unwrap_or(0),
            })
            .collect()
    }
}

/// RequestDriver issues a batch of logical requests and aggregates their outcomes. It never fails
/// on behalf of a single logical request; failures are counted and the run continues.
pub(crate) struct RequestDriver<E, C = RealClock>
where
    E: AttemptExecutor,
    C: Clock,
{
    logger: slog::Logger,
    dispatcher: Arc<FailoverDispatcher<E, C>>,
    limiter: ConcurrencyLimiter,
}

impl<E, C> RequestDriver<E, C>
where
    E: AttemptExecutor + 'static,
    C: Clock + 'static,
{
    pub(crate) fn new(
        logger: slog::Logger,
        dispatcher: Arc<FailoverDispatcher<E, C>>,
        limiter: ConcurrencyLimiter,
    ) -> Self {
        RequestDriver {
            logger,
            dispatcher,
            limiter,
        }
    }

    pub(crate) fn dispatcher(&self) -> &FailoverDispatcher<E, C> {
        &self.dispatcher
    }

    /// Runs every request as its own task. At most `max_in_flight` of them are dispatching at any
    /// moment; the rest wait for a slot. Completion order between requests is unspecified.
    pub(crate) async fn run_all(&self, requests: Vec<LogicalRequest>) -> RunReport {
        let stats = Arc::new(ReplicaStats::new(self.dispatcher.replicas()));
        slog::info!(
            self.logger,
            "Starting {} logical requests", requests.len();
            "max_in_flight" => self.limiter.max_in_flight()
        );

        let mut tasks = Vec::with_capacity(requests.len());
        for request in requests {
            let request_id = request.id;
            let logger = self.logger.clone();
            let dispatcher = self.dispatcher.clone();
            let limiter = self.limiter.clone();
            let stats = stats.clone();

            let task = tokio::spawn(async move {
                let _permit = limiter.acquire().await;
                slog::info!(logger, "=== Logical Request {} ===", request.id; "free_slots" => limiter.available());
                let outcome = dispatcher.dispatch(&request).await;
                if let DispatchOutcome::Success { served_by, .. } = &outcome {
                    stats.record_success(served_by);
                }
                log_outcome(&logger, request.id, &outcome);
                outcome
            });
            tasks.push((request_id, task));
        }

        let mut reports = Vec::with_capacity(tasks.len());
        for (request_id, task) in tasks {
            let outcome = task.await.map_err(|e| {
                slog::error!(self.logger, "Logical Request {} aborted: {}", request_id, e);
                RequestAborted { reason: e.to_string() }
            });
            reports.push(RequestReport { request_id, outcome });
        }

        self.finish(reports, &stats)
    }

    /// Runs requests one after another, waiting `interval` between consecutive requests.
    pub(crate) async fn run_sequential(&self, requests: Vec<LogicalRequest>, interval: Duration) -> RunReport {
        let stats = ReplicaStats::new(self.dispatcher.replicas());
        let mut reports = Vec::with_capacity(requests.len());

        let mut requests = requests.into_iter().peekable();
        while let Some(request) = requests.next() {
            slog::info!(self.logger, "=== Request {} ===", request.id);
            let outcome = self.dispatcher.dispatch(&request).await;
            if let DispatchOutcome::Success { served_by, .. } = &outcome {
                stats.record_success(served_by);
            }
            log_outcome(&self.logger, request.id, &outcome);
            reports.push(RequestReport {
                request_id: request.id,
                outcome: Ok(outcome),
            });

            if requests.peek().is_some() {
                self.dispatcher.clock().sleep(interval).await;
            }
        }

        self.finish(reports, &stats)
    }

    fn finish(&self, mut reports: Vec<RequestReport>, stats: &ReplicaStats) -> RunReport {
        reports.sort_by_key(|r| r.request_id);
        let succeeded = reports.iter().filter(|r| r.is_success()).count();
        let failed = reports.len() - succeeded;

        slog::info!(
            self.logger,
            "Run complete";
            "succeeded" => succeeded,
            "failed" => failed
        );

        RunReport {
            requests: reports,
            succeeded,
            failed,
            replica_stats: stats.snapshot(),
        }
    }
}

fn log_outcome(logger: &slog::Logger, request_id: u64, outcome: &DispatchOutcome) {
    match outcome {
        DispatchOutcome::Success { reply, served_by } => {
            slog::info!(logger, "Request {} served by {} with reply \"{}\"", request_id, served_by, reply);
        }
        DispatchOutcome::Exhausted {
            total_attempts,
            last_error,
        } => {
            let kind: AttemptErrorKind = last_error.kind();
            slog::warn!(
                logger,
                "Request {} failed: all replicas failed after {} attempts. Last error: {}",
                request_id, total_attempts, last_error;
                "last_error_kind" => ?kind
            );
        }
    }
}
