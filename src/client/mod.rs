//! Client-side pieces: the optimistic replica and transport retry

mod reconnect;
mod replica;

pub use reconnect::{connect_with_retry, ConnectionStatus, ReconnectPolicy};
pub use replica::LocalReplica;
