mod api;
mod failover;
mod replica;
mod wire;

pub use api::try_create_failover_client;
pub use api::FailoverClient;
pub use api::FailoverClientConfig;
pub use api::FailoverClientCreationError;
pub use api::FailoverOptions;
pub use failover::AttemptError;
pub use failover::AttemptErrorKind;
pub use failover::DispatchOutcome;
pub use failover::EmptyReplicaSetError;
pub use failover::LogicalRequest;
pub use failover::ParseReplicaAddressError;
pub use failover::ReplicaAddress;
pub use failover::ReplicaTally;
pub use failover::RequestAborted;
pub use failover::RequestReport;
pub use failover::RunReport;
pub use replica::shutdown_signal;
pub use replica::try_create_replica;
pub use replica::ReplicaConfig;
pub use replica::ReplicaCreationError;
pub use replica::ReplicaExit;
pub use replica::ReplicaOptions;
pub use replica::ReplicaServer;
pub use replica::ReplicaShutdownHandle;
pub use replica::ReplicaShutdownSignal;
pub use wire::Command;
pub use wire::Reply;
pub use wire::GET_COUNTER;

