use crate::failover::attempt::{AttemptError, AttemptErrorKind, AttemptExecutor};
use crate::failover::time::Clock;
use crate::failover::ReplicaAddress;
use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::time::Duration;

pub(crate) fn replica(port: u16) -> ReplicaAddress {
    ReplicaAddress::new("10.0.0.1", port)
}

pub(crate) fn error_of_kind(kind: AttemptErrorKind) -> AttemptError {
    match kind {
        AttemptErrorKind::ConnectFailed => {
            AttemptError::ConnectFailed(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"))
        }
        AttemptErrorKind::Timeout => AttemptError::Timeout(Duration::from_millis(1)),
        AttemptErrorKind::EmptyResponse => AttemptError::EmptyResponse,
        AttemptErrorKind::MalformedResponse => AttemptError::MalformedResponse("garbage".into()),
    }
}

/// ScriptedExecutor stands in for the network. Replicas listed as faulty always fail with their
/// configured kind; everyone else answers `OK <n>` from one shared counter. Every call is traced.
#[derive(Default)]
pub(crate) struct ScriptedExecutor {
    faulty: HashMap<ReplicaAddress, AttemptErrorKind>,
    heal_after_calls: Option<usize>,
    latency: Option<Duration>,
    counter: AtomicU64,
    trace: Mutex<Vec<ReplicaAddress>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedExecutor {
    pub(crate) fn healthy() -> Self {
        ScriptedExecutor::default()
    }

    pub(crate) fn with_fault(mut self, replica: ReplicaAddress, kind: AttemptErrorKind) -> Self {
        self.faulty.insert(replica, kind);
        self
    }

    /// Faults only apply to the first `calls` attempts overall; afterwards every replica answers.
    pub(crate) fn with_faults_healing_after(mut self, calls: usize) -> Self {
        self.heal_after_calls = Some(calls);
        self
    }

    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub(crate) fn trace(&self) -> Vec<ReplicaAddress> {
        self.trace.lock().expect("trace mutex poisoned").clone()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AttemptExecutor for ScriptedExecutor {
    async fn attempt(
        &self,
        replica: &ReplicaAddress,
        _message: &str,
        _timeout: Duration,
    ) -> Result<String, AttemptError> {
        let call_number = {
            let mut trace = self.trace.lock().expect("trace mutex poisoned");
            trace.push(replica.clone());
            trace.len()
        };
        let healed = matches!(self.heal_after_calls, Some(calls) if call_number > calls);

        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let result = match self.faulty.get(replica) {
            Some(kind) if !healed => Err(error_of_kind(*kind)),
            _ => Ok(format!("OK {}", self.counter.fetch_add(1, Ordering::SeqCst) + 1)),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// RecordingClock returns immediately and remembers every requested sleep.
#[derive(Default)]
pub(crate) struct RecordingClock {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingClock {
    pub(crate) fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().expect("sleeps mutex poisoned").clone()
    }
}

#[async_trait::async_trait]
impl Clock for RecordingClock {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().expect("sleeps mutex poisoned").push(duration);
    }
}
