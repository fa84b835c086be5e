//! This mod is responsible for configuring and creating a `FailoverClient` for the application.

use crate::api::options::FailoverOptionsValidated;
use crate::failover::{
    ConcurrencyLimiter, DispatchPolicy, FailoverDispatcher, RealClock, ReplicaAddress, ReplicaSet, RequestDriver,
    TcpAttemptExecutor,
};
use crate::{FailoverClient, FailoverOptions};
use std::convert::TryFrom;
use std::sync::Arc;

pub struct FailoverClientConfig {
    /// Tried in exactly this order, every round.
    pub replicas: Vec<ReplicaAddress>,
    pub info_logger: slog::Logger,
    pub options: FailoverOptions,
}

#[derive(Debug, thiserror::Error)]
pub enum FailoverClientCreationError {
    #[error("Replica list must not be empty")]
    EmptyReplicaSet,
    #[error("Illegal options for configuring client: {0}")]
    IllegalClientOptions(String),
}

pub fn try_create_failover_client(config: FailoverClientConfig) -> Result<FailoverClient, FailoverClientCreationError> {
    let replicas = ReplicaSet::new(config.replicas).map_err(|_| FailoverClientCreationError::EmptyReplicaSet)?;

    let options = FailoverOptionsValidated::try_from(config.options)
        .map_err(|e| FailoverClientCreationError::IllegalClientOptions(e.to_string()))?;

    let logger = config.info_logger;
    slog::debug!(
        logger,
        "Creating failover client";
        "replicas" => replicas.len(),
        "attempt_timeout" => ?options.attempt_timeout,
        "max_rounds" => options.max_rounds.get(),
        "inter_round_delay" => ?options.inter_round_delay,
        "max_in_flight" => options.max_in_flight.get()
    );

    let dispatcher = FailoverDispatcher::new(
        logger.clone(),
        Arc::new(replicas),
        TcpAttemptExecutor,
        RealClock,
        DispatchPolicy {
            attempt_timeout: options.attempt_timeout,
            max_rounds: options.max_rounds,
            inter_round_delay: options.inter_round_delay,
        },
    );
    let limiter = ConcurrencyLimiter::new(options.max_in_flight);
    let driver = RequestDriver::new(logger, Arc::new(dispatcher), limiter);

    Ok(FailoverClient::new(driver, options.request_interval))
}
