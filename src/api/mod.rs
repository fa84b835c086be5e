//! This mod is meant to hold most of the code for the library's client-facing API.
mod client;
mod options;
mod wiring;

pub use client::FailoverClient;
pub use options::FailoverOptions;
pub use wiring::try_create_failover_client;
pub use wiring::FailoverClientConfig;
pub use wiring::FailoverClientCreationError;
