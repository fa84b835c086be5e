//! Newline-delimited text protocol spoken between the failover client and the replicas.
mod framing;
mod protocol;

pub(crate) use framing::LineStream;
pub(crate) use framing::ReadLineError;
pub use protocol::Command;
pub use protocol::Reply;
pub use protocol::GET_COUNTER;
