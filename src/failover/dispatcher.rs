use crate::failover::attempt::{AttemptError, AttemptErrorKind, AttemptExecutor};
use crate::failover::time::{Clock, RealClock};
use crate::failover::{ReplicaAddress, ReplicaSet};
use crate::wire::GET_COUNTER;
use std::num::NonZeroU32;
use std::sync::Arc;
use tokio::time::Duration;

/// LogicalRequest is one end-to-end client operation. It may take many attempts to complete.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LogicalRequest {
    pub id: u64,
    pub payload: String,
}

impl LogicalRequest {
    pub fn new(id: u64, payload: impl Into<String>) -> Self {
        LogicalRequest {
            id,
            payload: payload.into(),
        }
    }

    pub fn get_counter(id: u64) -> Self {
        Self::new(id, GET_COUNTER)
    }
}

/// The terminal result of dispatching one logical request.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Some replica produced a well-formed reply line. The reply may itself be an `ERROR` line.
    Success { reply: String, served_by: ReplicaAddress },
    /// Every replica failed in every round. `last_error` is the failure of the final attempt.
    Exhausted { total_attempts: u64, last_error: AttemptError },
}

impl DispatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DispatchOutcome::Success { .. })
    }

    pub fn served_by(&self) -> Option<&ReplicaAddress> {
        match self {
            DispatchOutcome::Success { served_by, .. } => Some(served_by),
            DispatchOutcome::Exhausted { .. } => None,
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct DispatchPolicy {
    pub(crate) attempt_timeout: Duration,
    pub(crate) max_rounds: NonZeroU32,
    pub(crate) inter_round_delay: Duration,
}

/// AttemptRecord only exists to be logged. Control flow never looks at it beyond pass/fail.
struct AttemptRecord<'a> {
    request_id: u64,
    replica: &'a ReplicaAddress,
    round_index: u32,
    attempt_index: u64,
    outcome: Result<&'a str, AttemptErrorKind>,
}

impl AttemptRecord<'_> {
    fn log(&self, logger: &slog::Logger) {
        match self.outcome {
            Ok(reply) => slog::debug!(
                logger,
                "Attempt succeeded";
                "request_id" => self.request_id,
                "replica" => %self.replica,
                "round" => self.round_index,
                "attempt" => self.attempt_index,
                "reply" => reply
            ),
            Err(kind) => slog::debug!(
                logger,
                "Attempt failed";
                "request_id" => self.request_id,
                "replica" => %self.replica,
                "round" => self.round_index,
                "attempt" => self.attempt_index,
                "error" => ?kind
            ),
        }
    }
}

/// FailoverDispatcher drives one logical request through the replica set:
///
/// - Replicas are tried strictly one at a time, in declared order, every round. A replica that
///   failed in an earlier round is still tried in the next one.
/// - The first success ends the dispatch. A failure moves on to the next replica.
/// - Between rounds (never after the last) the dispatcher waits `inter_round_delay`.
///
/// The dispatcher holds no per-request state, so one instance serves any number of concurrent
/// logical requests.
pub(crate) struct FailoverDispatcher<E, C = RealClock>
where
    E: AttemptExecutor,
    C: Clock,
{
    logger: slog::Logger,
    replicas: Arc<ReplicaSet>,
    executor: E,
    clock: C,
    policy: DispatchPolicy,
}

impl<E, C> FailoverDispatcher<E, C>
where
    E: AttemptExecutor,
    C: Clock,
{
    pub(crate) fn new(
        logger: slog::Logger,
        replicas: Arc<ReplicaSet>,
        executor: E,
        clock: C,
        policy: DispatchPolicy,
    ) -> Self {
        FailoverDispatcher {
            logger,
            replicas,
            executor,
            clock,
            policy,
        }
    }

    pub(crate) fn replicas(&self) -> &ReplicaSet {
        &self.replicas
    }

    pub(crate) fn clock(&self) -> &C {
        &self.clock
    }

    #[cfg(test)]
    pub(crate) fn executor(&self) -> &E {
        &self.executor
    }

    pub(crate) async fn dispatch(&self, request: &LogicalRequest) -> DispatchOutcome {
        let max_rounds = self.policy.max_rounds.get();
        let mut total_attempts: u64 = 0;
        let mut last_error = None;

        for round_index in 0..max_rounds {
            for replica in self.replicas.iter() {
                total_attempts += 1;
                slog::info!(
                    self.logger,
                    "Attempt {}: trying replica {}", total_attempts, replica;
                    "request_id" => request.id
                );

                let result = self
                    .executor
                    .attempt(replica, &request.payload, self.policy.attempt_timeout)
                    .await;

                AttemptRecord {
                    request_id: request.id,
                    replica,
                    round_index,
                    attempt_index: total_attempts,
                    outcome: result.as_deref().map_err(AttemptError::kind),
                }
                .log(&self.logger);

                match result {
                    Ok(reply) => {
                        slog::info!(
                            self.logger,
                            "Success from {} -> {}", replica, reply;
                            "request_id" => request.id
                        );
                        return DispatchOutcome::Success {
                            reply,
                            served_by: replica.clone(),
                        };
                    }
                    Err(e) => {
                        slog::warn!(
                            self.logger,
                            "Failed with {}: {}", replica, e;
                            "request_id" => request.id
                        );
                        last_error = Some(e);
                    }
                }
            }

            if round_index + 1 < max_rounds {
                self.clock.sleep(self.policy.inter_round_delay).await;
            }
        }

        DispatchOutcome::Exhausted {
            total_attempts,
            last_error: last_error
                .expect("non-empty replica set and max_rounds >= 1 guarantee an attempt"),
        }
    }
}
