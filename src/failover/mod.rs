//! The client-side failover engine: try one replica at a time, round after round, until one
//! answers. Many logical requests run side by side under a bounded number of in-flight slots.
mod attempt;
mod dispatcher;
mod driver;
mod limiter;
mod replica_set;
mod time;

#[cfg(test)]
mod test_utils;

pub use attempt::AttemptError;
pub use attempt::AttemptErrorKind;
pub use dispatcher::DispatchOutcome;
pub use dispatcher::LogicalRequest;
pub use driver::ReplicaTally;
pub use driver::RequestAborted;
pub use driver::RequestReport;
pub use driver::RunReport;
pub use replica_set::EmptyReplicaSetError;
pub use replica_set::ParseReplicaAddressError;
pub use replica_set::ReplicaAddress;

pub(crate) use attempt::TcpAttemptExecutor;
pub(crate) use dispatcher::DispatchPolicy;
pub(crate) use dispatcher::FailoverDispatcher;
pub(crate) use driver::RequestDriver;
pub(crate) use limiter::ConcurrencyLimiter;
pub(crate) use replica_set::ReplicaSet;
pub(crate) use time::RealClock;
