use crate::gateway::GatewayError;
use thiserror::Error;

/// Broker boundary failures.
///
/// Both classes are recoverable: the coordinator tears the channel down and
/// reconnects with a fixed backoff, it never crashes the process.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The connection could not be established or was lost.
    #[error("broker connection error: {0}")]
    Connection(String),

    /// The channel was closed out from under us; propagates to connection
    /// teardown.
    #[error("broker channel closed: {0}")]
    Channel(String),
}

/// Composite error for coordinator operations.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("broker error: {0}")]
    Broker(#[from] BrokerError),

    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),
}
