use crate::replica::counter;
use crate::replica::fault::CrashFault;
use crate::replica::options::ReplicaOptionsValidated;
use crate::replica::{ReplicaOptions, ReplicaServer};
use std::convert::TryFrom;
use std::io;
use std::net::SocketAddr;
use tokio::net::TcpListener;

pub struct ReplicaConfig {
    pub replica_id: String,
    /// Port 0 picks a free port; see `ReplicaServer::local_addr()`.
    pub bind_addr: SocketAddr,
    pub info_logger: slog::Logger,
    pub options: ReplicaOptions,
}

#[derive(Debug, thiserror::Error)]
pub enum ReplicaCreationError {
    #[error("Illegal options for configuring replica: {0}")]
    IllegalReplicaOptions(String),
    #[error("Failed to bind listener")]
    Bind(#[source] io::Error),
}

/// Binds the listener and starts the counter actor. The returned server does not accept
/// connections until `run()` is awaited.
pub async fn try_create_replica(config: ReplicaConfig) -> Result<ReplicaServer, ReplicaCreationError> {
    let options = ReplicaOptionsValidated::try_from(config.options)
        .map_err(|e| ReplicaCreationError::IllegalReplicaOptions(e.to_string()))?;

    let logger = config
        .info_logger
        .new(slog::o!("replica_id" => config.replica_id));

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .map_err(ReplicaCreationError::Bind)?;

    let (counter_client, counter_actor) = counter::create(logger.clone(), 64);
    tokio::spawn(counter_actor.run_event_loop());

    Ok(ReplicaServer::new(
        logger,
        listener,
        counter_client,
        CrashFault::new(options.crash_probability),
    ))
}
