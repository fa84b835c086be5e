//! A replica endpoint: one counter, served over the line protocol, with injected crash faults.
mod counter;
mod fault;
mod options;
mod server;
mod shutdown;
mod wiring;

pub use options::ReplicaOptions;
pub use server::ReplicaExit;
pub use server::ReplicaServer;
pub use shutdown::shutdown_signal;
pub use shutdown::ReplicaShutdownHandle;
pub use shutdown::ReplicaShutdownSignal;
pub use wiring::try_create_replica;
pub use wiring::ReplicaConfig;
pub use wiring::ReplicaCreationError;
