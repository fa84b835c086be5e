use crate::failover::ReplicaAddress;
use crate::wire::{LineStream, ReadLineError};
use std::io;
use tokio::net::TcpStream;
use tokio::time::Duration;

/// Why a single attempt against a single replica failed. Every variant is retryable against the
/// next replica.
#[derive(Debug, thiserror::Error)]
pub enum AttemptError {
    #[error("could not reach replica: {0}")]
    ConnectFailed(io::Error),
    #[error("no reply within {0:?}")]
    Timeout(Duration),
    #[error("replica closed the connection without replying")]
    EmptyResponse,
    #[error("malformed reply: {0}")]
    MalformedResponse(String),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AttemptErrorKind {
    ConnectFailed,
    Timeout,
    EmptyResponse,
    MalformedResponse,
}

impl AttemptError {
    pub fn kind(&self) -> AttemptErrorKind {
        match self {
            AttemptError::ConnectFailed(_) => AttemptErrorKind::ConnectFailed,
            AttemptError::Timeout(_) => AttemptErrorKind::Timeout,
            AttemptError::EmptyResponse => AttemptErrorKind::EmptyResponse,
            AttemptError::MalformedResponse(_) => AttemptErrorKind::MalformedResponse,
        }
    }
}

/// AttemptExecutor performs exactly one request/response exchange with one replica. It never
/// retries; that is the dispatcher's job.
#[async_trait::async_trait]
pub(crate) trait AttemptExecutor: Send + Sync {
    async fn attempt(&self, replica: &ReplicaAddress, message: &str, timeout: Duration)
        -> Result<String, AttemptError>;
}

/// TcpAttemptExecutor opens a fresh connection for every attempt, so a replica that crashed or
/// came back is always probed cleanly.
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct TcpAttemptExecutor;

impl TcpAttemptExecutor {
    async fn exchange(replica: &ReplicaAddress, message: &str) -> Result<String, AttemptError> {
        let stream = TcpStream::connect((replica.host(), replica.port()))
            .await
            .map_err(AttemptError::ConnectFailed)?;
        let mut lines = LineStream::new(stream);

        // A peer that vanished between accept and write shows up as a reset here.
        lines.write_line(message).await.map_err(AttemptError::ConnectFailed)?;

        match lines.read_line().await {
            Ok(Some(reply)) => Ok(reply.trim().to_string()),
            Ok(None) => Err(AttemptError::EmptyResponse),
            Err(ReadLineError::Io(_)) => Err(AttemptError::EmptyResponse),
            Err(e) => Err(AttemptError::MalformedResponse(e.to_string())),
        }
    }
}

#[async_trait::async_trait]
impl AttemptExecutor for TcpAttemptExecutor {
    /// `timeout` bounds the whole exchange: connect, write and read. The connection is dropped,
    /// and therefore closed, on every exit path including the timeout.
    async fn attempt(
        &self,
        replica: &ReplicaAddress,
        message: &str,
        timeout: Duration,
    ) -> Result<String, AttemptError> {
        match tokio::time::timeout(timeout, Self::exchange(replica, message)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(AttemptError::Timeout(timeout)),
        }
    }
}
