use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

/// ReplicaAddress identifies one replica by the (host, port) pair it listens on.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ReplicaAddress {
    host: String,
    port: u16,
}

impl ReplicaAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        ReplicaAddress {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for ReplicaAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl From<SocketAddr> for ReplicaAddress {
    fn from(addr: SocketAddr) -> Self {
        ReplicaAddress::new(addr.ip().to_string(), addr.port())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseReplicaAddressError {
    #[error("expected `host:port`, got '{0}'")]
    MissingPort(String),
    #[error("host is empty in '{0}'")]
    EmptyHost(String),
    #[error("invalid port in '{0}'")]
    InvalidPort(String),
}

impl FromStr for ReplicaAddress {
    type Err = ParseReplicaAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| ParseReplicaAddressError::MissingPort(s.to_string()))?;
        if host.is_empty() {
            return Err(ParseReplicaAddressError::EmptyHost(s.to_string()));
        }
        let port = port
            .parse()
            .map_err(|_| ParseReplicaAddressError::InvalidPort(s.to_string()))?;

        Ok(ReplicaAddress::new(host, port))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("replica set must contain at least one replica")]
pub struct EmptyReplicaSetError;

/// ReplicaSet is the ordered list of replicas a dispatcher walks through each round. The order is
/// fixed at construction. Duplicates are kept as-is; a duplicated replica is tried twice per round.
#[derive(Debug)]
pub(crate) struct ReplicaSet {
    replicas: Vec<ReplicaAddress>,
}

impl ReplicaSet {
    pub(crate) fn new(replicas: Vec<ReplicaAddress>) -> Result<Self, EmptyReplicaSetError> {
        if replicas.is_empty() {
            return Err(EmptyReplicaSetError);
        }

        Ok(ReplicaSet { replicas })
    }

    pub(crate) fn iter(&self) -> std::slice::Iter<'_, ReplicaAddress> {
        self.replicas.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.replicas.len()
    }
}
